//! Configurator domain: catalog model, enumeration, ledger, submission
pub mod aggregates;
pub mod events;
pub mod value_objects;
