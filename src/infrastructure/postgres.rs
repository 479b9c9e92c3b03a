//! Postgres catalog and cart storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;
use crate::domain::aggregates::{
    CartLine, CartMutationPort, CombinationMatrix, ItemMutationFailure, LineItemContext, LineItemMetadata,
    VariationAxis, VariationProduct, Vendor,
};
use crate::domain::value_objects::Sku;
use crate::{ConfiguratorError, Result};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    variations: Json<serde_json::Value>,
    variation_matrix: Json<serde_json::Value>,
    vendor_name: Option<String>,
    vendor_store_id: Option<String>,
    image_url: Option<String>,
}

/// A base product ready for a configurator view
#[derive(Debug)]
pub struct CatalogProduct {
    pub product: VariationProduct,
    pub vendor: Option<Vendor>,
    pub image_url: Option<String>,
}

impl CatalogProduct {
    /// Line-item context carrying this product's identity and vendor.
    pub fn line_item_context(&self) -> LineItemContext {
        let mut context = LineItemContext::new(self.product.id(), self.product.name());
        context.vendor = self.vendor.clone();
        context.image_url = self.image_url.clone();
        context
    }
}

#[derive(Clone)]
pub struct PgCatalog {
    db: PgPool,
}

impl PgCatalog {
    pub fn new(db: PgPool) -> Self { Self { db } }

    pub async fn load_product(&self, id: Uuid) -> Result<CatalogProduct> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, variations, variation_matrix, vendor_name, vendor_store_id, image_url FROM products WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ConfiguratorError::ProductNotFound)?;

        let axes: Vec<VariationAxis> = serde_json::from_value(row.variations.0)?;
        let matrix = CombinationMatrix::from_nested(&axes, &row.variation_matrix.0)?;
        tracing::debug!(product = %row.id, axes = axes.len(), matrix_entries = matrix.len(), "loaded variation catalog");

        let vendor = row.vendor_name.filter(|n| !n.is_empty()).map(|name| Vendor { name, store_id: row.vendor_store_id });
        Ok(CatalogProduct {
            product: VariationProduct::load(row.id.to_string(), row.name, axes, matrix),
            vendor,
            image_url: row.image_url,
        })
    }
}

/// Cart backend for one shopper session
#[derive(Clone)]
pub struct PgCartPort {
    db: PgPool,
    session_id: String,
}

impl PgCartPort {
    pub fn new(db: PgPool, session_id: impl Into<String>) -> Self {
        Self { db, session_id: session_id.into() }
    }
}

fn storage_failure(e: sqlx::Error) -> ItemMutationFailure {
    tracing::error!(error = %e, "cart storage error");
    ItemMutationFailure::new("Cart is temporarily unavailable")
}

/// Stock left after what this session already holds. `None` stock is unlimited.
fn check_stock(sku: &Sku, inventory: Option<i32>, in_cart: i32, requested: i32) -> std::result::Result<(), ItemMutationFailure> {
    let Some(available) = inventory else { return Ok(()) };
    let available = available.max(0);
    if i64::from(in_cart) + i64::from(requested) > i64::from(available) {
        tracing::info!(%sku, available, in_cart, requested, "insufficient stock");
        return Err(ItemMutationFailure::new(format!("Insufficient stock: {available} available")));
    }
    Ok(())
}

#[async_trait]
impl CartMutationPort for PgCartPort {
    async fn add_item(&self, sku: &Sku, quantity: u32, metadata: &LineItemMetadata) -> std::result::Result<(), ItemMutationFailure> {
        let requested = i32::try_from(quantity).map_err(|_| ItemMutationFailure::new(format!("Quantity {quantity} is too large")))?;

        // product row lock held until commit
        let mut tx = self.db.begin().await.map_err(storage_failure)?;
        let child: Option<(String, Option<i32>)> = sqlx::query_as(
            "SELECT status, inventory_quantity FROM products WHERE id::text = $1 OR sku = $1 LIMIT 1 FOR UPDATE",
        )
        .bind(sku.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_failure)?;

        let Some((status, inventory)) = child else {
            return Err(ItemMutationFailure::new(format!("Product {sku} not found")));
        };
        if status != "active" {
            return Err(ItemMutationFailure::new(format!("Product {sku} is not available")));
        }

        if inventory.is_some() {
            let in_cart: Option<i32> = sqlx::query_scalar("SELECT quantity FROM cart_items WHERE session_id = $1 AND product_id = $2")
                .bind(&self.session_id)
                .bind(sku.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_failure)?;
            check_stock(sku, inventory, in_cart.unwrap_or(0), requested)?;
        }

        sqlx::query(
            "INSERT INTO cart_items (id, session_id, product_id, quantity, metadata, created_at) VALUES ($1, $2, $3, $4, $5, NOW()) \
             ON CONFLICT (session_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, metadata = EXCLUDED.metadata",
        )
        .bind(Uuid::now_v7())
        .bind(&self.session_id)
        .bind(sku.as_str())
        .bind(requested)
        .bind(Json(metadata))
        .execute(&mut *tx)
        .await
        .map_err(storage_failure)?;
        tx.commit().await.map_err(storage_failure)?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: Uuid,
    product_id: String,
    name: String,
    quantity: i32,
    metadata: Json<LineItemMetadata>,
    created_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.id.to_string(),
            product_id: row.product_id,
            name: row.name,
            quantity: u32::try_from(row.quantity).unwrap_or(0),
            metadata: row.metadata.0,
            created_at: row.created_at,
        }
    }
}

pub async fn list_cart_lines(db: &PgPool, session_id: &str) -> Result<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        "SELECT c.id, c.product_id, COALESCE(p.name, c.product_id) AS name, c.quantity, c.metadata, c.created_at \
         FROM cart_items c LEFT JOIN products p ON p.id::text = c.product_id \
         WHERE c.session_id = $1 ORDER BY c.created_at, c.id",
    )
    .bind(session_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(CartLine::from).collect())
}

pub async fn clear_cart(db: &PgPool, session_id: &str) -> Result<u64> {
    let done = sqlx::query("DELETE FROM cart_items WHERE session_id = $1").bind(session_id).execute(db).await?;
    Ok(done.rows_affected())
}
