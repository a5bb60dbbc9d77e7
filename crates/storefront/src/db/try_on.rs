//! Try-on session repository.
//!
//! Sessions are scoped to their owner. Placement follows [`Outfit`]: a garment
//! displaces the current occupant of its category, accessories accumulate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use pulse_threads_core::{
    BodyMeasurements, CartOwner, ClothingCategory, ModelType, Outfit, ProductId, TryOnItemId,
    TryOnSessionId, UserId,
};

use super::carts::upsert_cart;
use super::{RepositoryError, parse_column};
use crate::models::{
    AddTryOnItem, NewTryOnSession, PlacedItem, TryOnItem, TryOnProduct, TryOnSession,
    TryOnSessionDetail,
};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i32,
    user_id: Option<i32>,
    model_type: String,
    has_user_photo: bool,
    body_measurements: Option<Json<BodyMeasurements>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for TryOnSession {
    type Error = RepositoryError;

    fn try_from(r: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TryOnSessionId::new(r.id),
            user_id: r.user_id.map(UserId::new),
            model_type: parse_column::<ModelType>(&r.model_type)?,
            has_user_photo: r.has_user_photo,
            body_measurements: r.body_measurements.map(|m| m.0).unwrap_or_default(),
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i32,
    clothing_category: String,
    size: Option<String>,
    color_variant: Option<String>,
    position_data: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    product_id: i32,
    product_name: String,
    product_slug: String,
    product_price: Decimal,
    product_sale_price: Option<Decimal>,
    product_image_url: Option<String>,
    product_model_path: Option<String>,
}

impl TryFrom<ItemRow> for TryOnItem {
    type Error = RepositoryError;

    fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TryOnItemId::new(r.id),
            clothing_category: parse_column(&r.clothing_category)?,
            size: r.size,
            color_variant: r.color_variant,
            position_data: r.position_data,
            product: TryOnProduct {
                id: ProductId::new(r.product_id),
                name: r.product_name,
                slug: r.product_slug,
                price: r.product_price,
                sale_price: r.product_sale_price,
                image_url: r.product_image_url,
                try_on_model_path: r.product_model_path,
            },
            created_at: r.created_at,
        })
    }
}

const SESSION_COLUMNS: &str = "s.id, s.user_id, s.model_type, s.has_user_photo, \
    s.body_measurements, s.is_active, s.created_at, s.updated_at";

/// Binds `$1` user ID and `$2` session token.
const OWNER_MATCH: &str = "(s.user_id = $1 OR s.session_token = $2)";

const ITEM_SELECT: &str = "SELECT i.id, i.clothing_category, i.size, i.color_variant, \
        i.position_data, i.created_at, p.id AS product_id, p.name AS product_name, \
        p.slug AS product_slug, p.price AS product_price, \
        p.sale_price AS product_sale_price, p.image_url AS product_image_url, \
        p.try_on_model_path AS product_model_path \
    FROM mall.try_on_item i \
    JOIN mall.product p ON p.id = i.product_id";

/// Lock the owner's session row for the rest of the transaction.
async fn lock_session(
    conn: &mut PgConnection,
    owner: &CartOwner,
    id: TryOnSessionId,
) -> Result<(), RepositoryError> {
    let locked: Option<i32> = sqlx::query_scalar(&format!(
        "SELECT s.id FROM mall.try_on_session s WHERE {OWNER_MATCH} AND s.id = $3 FOR UPDATE"
    ))
    .bind(owner.user_id())
    .bind(owner.session_token())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    locked
        .map(|_| ())
        .ok_or(RepositoryError::NotFound("Try-on session"))
}

/// Repository for try-on sessions and their items.
pub struct TryOnRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TryOnRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Start a new session. Earlier sessions stay active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        owner: &CartOwner,
        input: &NewTryOnSession,
    ) -> Result<TryOnSession, RepositoryError> {
        let measurements =
            (!input.body_measurements.is_empty()).then_some(Json(input.body_measurements));
        let row: SessionRow = sqlx::query_as(&format!(
            "INSERT INTO mall.try_on_session AS s \
                (user_id, session_token, model_type, has_user_photo, body_measurements) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(owner.user_id())
        .bind(owner.session_token())
        .bind(input.model_type.as_str())
        .bind(input.has_user_photo)
        .bind(measurements)
        .fetch_one(self.pool)
        .await?;
        row.try_into()
    }

    /// A session with its outfit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no such session.
    pub async fn get_detail(
        &self,
        owner: &CartOwner,
        id: TryOnSessionId,
    ) -> Result<TryOnSessionDetail, RepositoryError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM mall.try_on_session s \
             WHERE {OWNER_MATCH} AND s.id = $3"
        ))
        .bind(owner.user_id())
        .bind(owner.session_token())
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        let session: TryOnSession = row
            .ok_or(RepositoryError::NotFound("Try-on session"))?
            .try_into()?;

        let rows: Vec<ItemRow> =
            sqlx::query_as(&format!("{ITEM_SELECT} WHERE i.session_id = $1 ORDER BY i.id"))
                .bind(id)
                .fetch_all(self.pool)
                .await?;
        let items = rows
            .into_iter()
            .map(TryOnItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TryOnSessionDetail::new(session, items))
    }

    /// Put a product on the model, replacing the garment in the same category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the session or product does not exist.
    pub async fn add_item(
        &self,
        owner: &CartOwner,
        input: &AddTryOnItem,
        category: ClothingCategory,
    ) -> Result<PlacedItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_session(&mut tx, owner, input.session_id).await?;

        let product: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM mall.product WHERE id = $1 AND is_active AND deleted_at IS NULL",
        )
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?;
        if product.is_none() {
            return Err(RepositoryError::NotFound("Product"));
        }

        let worn: Vec<(i32, String)> = sqlx::query_as(
            "SELECT id, clothing_category FROM mall.try_on_item WHERE session_id = $1 ORDER BY id",
        )
        .bind(input.session_id)
        .fetch_all(&mut *tx)
        .await?;
        let worn = worn
            .into_iter()
            .map(|(id, category)| {
                parse_column::<ClothingCategory>(&category)
                    .map(|category| (category, Some(TryOnItemId::new(id))))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut outfit = Outfit::from_items(worn);

        let replaced_item_id = outfit.place(category, None).flatten();
        if let Some(replaced) = replaced_item_id {
            sqlx::query("DELETE FROM mall.try_on_item WHERE id = $1")
                .bind(replaced)
                .execute(&mut *tx)
                .await?;
        }

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO mall.try_on_item \
                (session_id, product_id, clothing_category, size, color_variant, position_data) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(input.session_id)
        .bind(input.product_id)
        .bind(category.as_str())
        .bind(input.size.as_deref())
        .bind(input.color_variant.as_deref())
        .bind(input.position_data.as_ref())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE mall.try_on_session SET updated_at = NOW() WHERE id = $1")
            .bind(input.session_id)
            .execute(&mut *tx)
            .await?;

        let row: ItemRow = sqlx::query_as(&format!("{ITEM_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(PlacedItem {
            item: row.try_into()?,
            replaced_item_id,
        })
    }

    /// Take one item off the model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the session is not the owner's
    /// or the item is not in it.
    pub async fn remove_item(
        &self,
        owner: &CartOwner,
        session: TryOnSessionId,
        item: TryOnItemId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_session(&mut tx, owner, session).await?;

        let result = sqlx::query("DELETE FROM mall.try_on_item WHERE id = $1 AND session_id = $2")
            .bind(item)
            .bind(session)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Item"));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Copy every worn item into the owner's cart as new lines.
    ///
    /// Lines are never merged, so repeating the call adds the items again.
    /// Returns the number of lines added. Lines are priced the way
    /// `CartRepository::add` prices them: the sale price when one is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no such session.
    pub async fn add_all_to_cart(
        &self,
        owner: &CartOwner,
        session: TryOnSessionId,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_session(&mut tx, owner, session).await?;
        let cart = upsert_cart(&mut tx, owner).await?;

        let result = sqlx::query(
            "INSERT INTO mall.cart_item (cart_id, product_id, name, price, quantity, attributes) \
             SELECT $1, p.id, p.name, COALESCE(p.sale_price, p.price), 1, \
                    jsonb_strip_nulls(jsonb_build_object( \
                        'size', i.size, \
                        'color_variant', i.color_variant, \
                        'from_try_on', TRUE)) \
             FROM mall.try_on_item i \
             JOIN mall.product p ON p.id = i.product_id AND p.deleted_at IS NULL \
             WHERE i.session_id = $2 \
             ORDER BY i.id",
        )
        .bind(cart)
        .bind(session)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
