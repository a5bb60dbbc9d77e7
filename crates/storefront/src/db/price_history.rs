//! Price history repository.
//!
//! Rows are only ever inserted, inside the transaction that changed the price.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use pulse_threads_core::{PriceHistoryId, SalePricing, UserId};

use super::{RepositoryError, parse_column};
use crate::models::{PriceHistoryEntry, Priceable};

#[derive(sqlx::FromRow)]
struct PriceHistoryRow {
    id: i32,
    priceable_type: String,
    priceable_id: i32,
    old_price: Option<Decimal>,
    new_price: Decimal,
    old_sale_price: Option<Decimal>,
    new_sale_price: Option<Decimal>,
    changed_by: Option<i32>,
    reason: Option<String>,
    changed_at: DateTime<Utc>,
}

impl TryFrom<PriceHistoryRow> for PriceHistoryEntry {
    type Error = RepositoryError;

    fn try_from(r: PriceHistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PriceHistoryId::new(r.id),
            priceable_type: parse_column(&r.priceable_type)?,
            priceable_id: r.priceable_id,
            old_price: r.old_price,
            new_price: r.new_price,
            old_sale_price: r.old_sale_price,
            new_sale_price: r.new_sale_price,
            changed_by: r.changed_by.map(UserId::new),
            reason: r.reason,
            changed_at: r.changed_at,
        })
    }
}

/// A price transition about to be logged.
#[derive(Debug, Clone, Copy)]
pub struct PriceTransition<'r> {
    pub priceable: Priceable,
    pub priceable_id: i32,
    pub old: SalePricing,
    pub new: SalePricing,
    pub changed_by: Option<UserId>,
    pub reason: Option<&'r str>,
}

impl PriceTransition<'_> {
    /// Only a real change to price or sale price is worth a row.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

/// Repository for price history.
pub struct PriceHistoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PriceHistoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// History for one product or variation, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for(
        &self,
        priceable: Priceable,
        id: i32,
    ) -> Result<Vec<PriceHistoryEntry>, RepositoryError> {
        let rows: Vec<PriceHistoryRow> = sqlx::query_as(
            "SELECT id, priceable_type, priceable_id, old_price, new_price, old_sale_price, \
                    new_sale_price, changed_by, reason, changed_at \
             FROM mall.price_history \
             WHERE priceable_type = $1 AND priceable_id = $2 \
             ORDER BY changed_at DESC, id DESC",
        )
        .bind(priceable.as_str())
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Log a transition on an open connection if it changes anything.
    ///
    /// Returns whether a row was written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(
        conn: &mut PgConnection,
        transition: PriceTransition<'_>,
    ) -> Result<bool, RepositoryError> {
        if !transition.is_change() {
            return Ok(false);
        }
        sqlx::query(
            "INSERT INTO mall.price_history \
                (priceable_type, priceable_id, old_price, new_price, old_sale_price, \
                 new_sale_price, changed_by, reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(transition.priceable.as_str())
        .bind(transition.priceable_id)
        .bind(transition.old.price)
        .bind(transition.new.price)
        .bind(transition.old.sale_price)
        .bind(transition.new.sale_price)
        .bind(transition.changed_by)
        .bind(transition.reason)
        .execute(conn)
        .await?;
        Ok(true)
    }
}
