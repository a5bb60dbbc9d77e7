//! Product variation repository.
//!
//! The default flag is only ever moved inside a transaction that holds the
//! parent product's row lock, so concurrent swaps serialize and the partial
//! unique index `product_variation_one_default` never trips.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use pulse_threads_core::{ProductId, SalePricing, UserId, VariationId};

use super::RepositoryError;
use super::price_history::{PriceHistoryRepository, PriceTransition};
use crate::models::{NewVariation, PriceChange, Priceable, Variation};

#[derive(sqlx::FromRow)]
struct VariationRow {
    id: i32,
    product_id: i32,
    sku: String,
    color: Option<String>,
    size: Option<String>,
    material: Option<String>,
    style: Option<String>,
    price: Decimal,
    sale_price: Option<Decimal>,
    stock_quantity: i32,
    barcode: Option<String>,
    image_url: Option<String>,
    is_default: bool,
}

impl From<VariationRow> for Variation {
    fn from(r: VariationRow) -> Self {
        Self {
            id: VariationId::new(r.id),
            product_id: ProductId::new(r.product_id),
            sku: r.sku,
            color: r.color,
            size: r.size,
            material: r.material,
            style: r.style,
            price: r.price,
            sale_price: r.sale_price,
            stock_quantity: r.stock_quantity,
            barcode: r.barcode,
            image_url: r.image_url,
            is_default: r.is_default,
        }
    }
}

const COLUMNS: &str = "id, product_id, sku, color, size, material, style, price, sale_price, \
    stock_quantity, barcode, image_url, is_default";

/// Repository for product variations.
pub struct VariationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VariationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Live variations of a product in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<Variation>, RepositoryError> {
        let rows: Vec<VariationRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM mall.product_variation \
             WHERE product_id = $1 AND deleted_at IS NULL ORDER BY id"
        ))
        .bind(product)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a variation. A new default takes the flag from any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is gone and
    /// `RepositoryError::Conflict` if the SKU is taken.
    pub async fn create(
        &self,
        product: ProductId,
        input: &NewVariation,
    ) -> Result<Variation, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, product).await?;

        if input.is_default {
            clear_default(&mut tx, product).await?;
        }

        let row: VariationRow = sqlx::query_as(&format!(
            "INSERT INTO mall.product_variation \
                (product_id, sku, color, size, material, style, price, sale_price, \
                 stock_quantity, barcode, image_url, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        ))
        .bind(product)
        .bind(input.sku.trim())
        .bind(input.color.as_deref())
        .bind(input.size.as_deref())
        .bind(input.material.as_deref())
        .bind(input.style.as_deref())
        .bind(input.price)
        .bind(input.sale_price)
        .bind(input.stock_quantity)
        .bind(input.barcode.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "variation sku already exists"))?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Make `variation` the product's only default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is gone or the
    /// variation does not belong to it.
    pub async fn set_default(
        &self,
        product: ProductId,
        variation: VariationId,
    ) -> Result<Variation, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_product(&mut tx, product).await?;

        let exists: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM mall.product_variation \
             WHERE id = $1 AND product_id = $2 AND deleted_at IS NULL",
        )
        .bind(variation)
        .bind(product)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound("Variation"));
        }

        clear_default(&mut tx, product).await?;
        let row: VariationRow = sqlx::query_as(&format!(
            "UPDATE mall.product_variation SET is_default = TRUE, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(variation)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Set a variation's price and sale price, logging the change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variation does not belong
    /// to a live product.
    pub async fn update_price(
        &self,
        product: ProductId,
        variation: VariationId,
        change: &PriceChange,
        changed_by: Option<UserId>,
    ) -> Result<Variation, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(Decimal, Option<Decimal>)> = sqlx::query_as(
            "SELECT v.price, v.sale_price FROM mall.product_variation v \
             JOIN mall.product p ON p.id = v.product_id AND p.deleted_at IS NULL \
             WHERE v.id = $1 AND v.product_id = $2 AND v.deleted_at IS NULL \
             FOR UPDATE OF v",
        )
        .bind(variation)
        .bind(product)
        .fetch_optional(&mut *tx)
        .await?;
        let (price, sale_price) = current.ok_or(RepositoryError::NotFound("Variation"))?;
        let old = SalePricing::new(price, sale_price);

        let row: VariationRow = sqlx::query_as(&format!(
            "UPDATE mall.product_variation SET price = $2, sale_price = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(variation)
        .bind(change.price.unwrap_or(old.price))
        .bind(change.resolve_sale_price(old.sale_price))
        .fetch_one(&mut *tx)
        .await?;

        let updated = Variation::from(row);
        PriceHistoryRepository::record(
            &mut tx,
            PriceTransition {
                priceable: Priceable::ProductVariation,
                priceable_id: variation.as_i32(),
                old,
                new: updated.pricing(),
                changed_by,
                reason: change.reason.as_deref(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }
}

/// Lock the parent product row; serializes default swaps per product.
async fn lock_product(conn: &mut PgConnection, product: ProductId) -> Result<(), RepositoryError> {
    let locked: Option<i32> = sqlx::query_scalar(
        "SELECT id FROM mall.product WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(product)
    .fetch_optional(conn)
    .await?;
    locked.map(|_| ()).ok_or(RepositoryError::NotFound("Product"))
}

async fn clear_default(conn: &mut PgConnection, product: ProductId) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE mall.product_variation SET is_default = FALSE, updated_at = NOW() \
         WHERE product_id = $1 AND is_default",
    )
    .bind(product)
    .execute(conn)
    .await?;
    Ok(())
}
