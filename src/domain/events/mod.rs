//! Domain events
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Configurator(ConfiguratorEvent),
    Submission(SubmissionEvent),
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Configurator(ConfiguratorEvent::QuantitiesChanged { .. }) => "configurator.quantities_changed",
            Self::Submission(SubmissionEvent::Completed { .. }) => "configurator.submission.completed",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConfiguratorEvent {
    QuantitiesChanged { product_id: String, total: u64 },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SubmissionEvent {
    Completed { product_id: String, succeeded: usize, failed: usize, at: DateTime<Utc> },
}
