//! OpenSASE Variation Configurator - grid ordering and batched add-to-cart

use anyhow::Result;
use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post}, Json, Router};
use opensase_configurator::domain::aggregates::{
    BaseProductGroup, Combination, DeliveryMode, InfoEntry, PickupLocation, PurchaseKind, SubmissionError, SubmissionOutcome,
    VariationAxis,
};
use opensase_configurator::infrastructure::{self, EventPublisher, PgCartPort, PgCatalog};
use opensase_configurator::{AppConfig, CombinationKey, ConfiguratorError, RequestedQuantity};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use std::collections::BTreeMap;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use validator::Validate;

const MAX_SESSION_LEN: usize = 128;

#[derive(Clone)] pub struct AppState { pub db: sqlx::PgPool, pub catalog: PgCatalog, pub events: EventPublisher, pub click_and_collect: bool }

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&config.log_filter)).with(tracing_subscriber::fmt::layer()).init();
    let db = PgPoolOptions::new().max_connections(config.database_max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let state = AppState { catalog: PgCatalog::new(db.clone()), db, events, click_and_collect: config.click_and_collect };

    let addr = config.bind_addr();
    tracing::info!(click_and_collect = config.click_and_collect, "🚀 OpenSASE Configurator listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, router(state)).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-configurator"})) }))
        .route("/api/v1/products/:id/combinations", get(get_combinations))
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/variations", post(add_variations))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

fn reject(e: impl Into<ConfiguratorError>) -> (StatusCode, String) {
    let e = e.into();
    let status = match &e {
        ConfiguratorError::ProductNotFound => StatusCode::NOT_FOUND,
        ConfiguratorError::Ledger(_) => StatusCode::BAD_REQUEST,
        ConfiguratorError::Submission(SubmissionError::EmptySelection) => StatusCode::UNPROCESSABLE_ENTITY,
        ConfiguratorError::Submission(_) | ConfiguratorError::Matrix(_) | ConfiguratorError::Catalog(_) | ConfiguratorError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() { tracing::error!(error = %e, "request failed"); }
    (status, e.to_string())
}

fn check_session(session: &str) -> Result<(), (StatusCode, String)> {
    if session.is_empty() || session.len() > MAX_SESSION_LEN { return Err((StatusCode::BAD_REQUEST, "Invalid cart session".to_string())); }
    Ok(())
}

#[derive(Debug, Serialize)] pub struct GridResponse { pub rows: Vec<String>, pub columns: Vec<String>, pub cells: Vec<Vec<CombinationKey>> }
#[derive(Debug, Serialize)] pub struct CombinationsResponse { pub product_id: String, pub name: String, pub axes: Vec<VariationAxis>, pub combinations: Vec<Combination>, pub available: usize, pub grid: Option<GridResponse> }

async fn get_combinations(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CombinationsResponse>, (StatusCode, String)> {
    let loaded = s.catalog.load_product(id).await.map_err(reject)?;
    let product = &loaded.product;
    let set = product.combinations();
    let grid = set.grid().map(|g| GridResponse {
        rows: product.axes()[0].options.iter().map(|o| o.label().to_string()).collect(),
        columns: product.axes()[1].options.iter().map(|o| o.label().to_string()).collect(),
        cells: (0..g.rows()).map(|r| g.row(r).iter().map(|c| c.key.clone()).collect()).collect(),
    });
    Ok(Json(CombinationsResponse {
        product_id: product.id().to_string(), name: product.name().to_string(), axes: product.axes().to_vec(),
        combinations: set.as_slice().to_vec(), available: set.available_count(), grid,
    }))
}

#[derive(Debug, Serialize, Deserialize)] pub struct QuantityInput { pub combination_key: CombinationKey, pub quantity: RequestedQuantity }

#[derive(Debug, Deserialize, Validate)]
pub struct AddVariationsRequest {
    pub product_id: Uuid,
    #[validate(length(max = 1000))] pub quantities: Vec<QuantityInput>,
    #[serde(default)] pub delivery_mode: Option<DeliveryMode>,
    #[serde(default)] pub location: Option<PickupLocation>,
    #[serde(default)] #[validate(length(max = 50))] pub custom_inputs: Vec<InfoEntry>,
    #[serde(default)] pub purchase: PurchaseKind,
}

async fn add_variations(State(s): State<AppState>, Path(session): Path<String>, Json(r): Json<AddVariationsRequest>) -> Result<Json<SubmissionOutcome>, (StatusCode, String)> {
    check_session(&session)?;
    r.validate().map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let mut loaded = s.catalog.load_product(r.product_id).await.map_err(reject)?;
    loaded.product.set_quantities(r.quantities.iter().map(|q| (&q.combination_key, q.quantity.clone()))).map_err(reject)?;

    let mut ctx = loaded.line_item_context();
    ctx.custom_inputs = r.custom_inputs;
    ctx.purchase = r.purchase;
    if s.click_and_collect {
        let mode = r.delivery_mode.unwrap_or(DeliveryMode::HomeDelivery);
        ctx.delivery_mode = Some(mode);
        ctx.location = r.location.filter(|_| mode == DeliveryMode::ClickAndCollect);
    }

    let port = PgCartPort::new(s.db.clone(), session);
    let outcome = loaded.product.submit(&port, &ctx).await.map_err(reject)?;
    s.events.publish(loaded.product.take_events()).await;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)] pub struct GroupResponse { #[serde(flatten)] pub group: BaseProductGroup, pub summary: String }
#[derive(Debug, Serialize)] pub struct CartResponse { pub home_delivery: Vec<GroupResponse>, pub click_and_collect: BTreeMap<String, Vec<GroupResponse>>, pub total_quantity: u64 }

fn with_summaries(groups: Vec<BaseProductGroup>) -> Vec<GroupResponse> {
    groups.into_iter().map(|group| GroupResponse { summary: group.summary(), group }).collect()
}

async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartResponse>, (StatusCode, String)> {
    check_session(&session)?;
    let lines = infrastructure::list_cart_lines(&s.db, &session).await.map_err(reject)?;
    let total_quantity: u64 = lines.iter().map(|l| u64::from(l.quantity)).sum();
    let grouped = opensase_configurator::domain::aggregates::group_cart_lines(&lines);
    Ok(Json(CartResponse {
        home_delivery: with_summaries(grouped.home_delivery),
        click_and_collect: grouped.click_and_collect.into_iter().map(|(k, v)| (k, with_summaries(v))).collect(),
        total_quantity,
    }))
}

async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode, (StatusCode, String)> {
    check_session(&session)?;
    infrastructure::clear_cart(&s.db, &session).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> AppState {
        let db = PgPoolOptions::new().connect_lazy("postgres://localhost/unused").unwrap();
        AppState { catalog: PgCatalog::new(db.clone()), db, events: EventPublisher::disabled(), click_and_collect: false }
    }

    #[tokio::test]
    async fn test_health() {
        let res = router(state()).oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oversized_session_rejected_before_storage() {
        let body = serde_json::json!({ "product_id": Uuid::nil(), "quantities": [] }).to_string();
        let uri = format!("/api/v1/cart/{}/variations", "s".repeat(MAX_SESSION_LEN + 1));
        let req = Request::builder().method("POST").uri(uri).header("content-type", "application/json").body(Body::from(body)).unwrap();
        let res = router(state()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(reject(ConfiguratorError::ProductNotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(reject(SubmissionError::EmptySelection).0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(reject(SubmissionError::UnresolvedCombination("a|b".into())).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_accepts_mixed_quantity_shapes() {
        let r: AddVariationsRequest = serde_json::from_value(serde_json::json!({
            "product_id": Uuid::nil(),
            "quantities": [{ "combination_key": "red|m", "quantity": 2.9 }, { "combination_key": "red|s", "quantity": "x" }],
            "delivery_mode": "Click & Collect",
            "purchase": { "type": "subscription", "offering_id": "o", "plan_id": "p", "pricing_option_id": "po" }
        })).unwrap();
        assert_eq!(r.quantities[0].quantity.committed(), 2);
        assert_eq!(r.quantities[1].quantity.committed(), 0);
        assert_eq!(r.delivery_mode, Some(DeliveryMode::ClickAndCollect));
        assert!(matches!(r.purchase, PurchaseKind::Subscription { .. }));
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_request_limits_quantity_lines() {
        let line = QuantityInput { combination_key: "red|m".into(), quantity: RequestedQuantity::from(1u32) };
        let body = serde_json::json!({ "product_id": Uuid::nil(), "quantities": vec![serde_json::to_value(&line).unwrap(); 1001] });
        let r: AddVariationsRequest = serde_json::from_value(body).unwrap();
        assert!(r.validate().is_err());
    }
}
