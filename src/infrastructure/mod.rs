//! Storage and messaging adapters
pub mod events;
pub mod postgres;

pub use events::EventPublisher;
pub use postgres::{clear_cart, list_cart_lines, CatalogProduct, PgCartPort, PgCatalog};
