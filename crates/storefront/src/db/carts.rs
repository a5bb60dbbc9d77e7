//! Cart repository.
//!
//! Every query is scoped to a [`CartOwner`]; an item ID from someone else's
//! cart behaves exactly like a missing one.

use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use pulse_threads_core::{CartId, CartItemId, CartOwner, LineAttributes, ProductId};

use super::RepositoryError;
use crate::models::{AddToCart, Cart, CartItem, MAX_LINE_QUANTITY};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    product_id: i32,
    name: String,
    price: Decimal,
    quantity: i32,
    attributes: Json<LineAttributes>,
    image_url: Option<String>,
}

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(r.id),
            product_id: ProductId::new(r.product_id),
            name: r.name,
            price: r.price,
            quantity: r.quantity,
            attributes: r.attributes.0,
            image_url: r.image_url,
        }
    }
}

/// Matches the owner's cart. Binds `$1` user ID and `$2` session token; the
/// unset one is NULL and never equal.
const OWNER_MATCH: &str = "(c.user_id = $1 OR c.session_token = $2)";

/// Unique column the owner's cart is keyed on.
const fn owner_column(owner: &CartOwner) -> &'static str {
    match owner {
        CartOwner::Authenticated(_) => "user_id",
        CartOwner::Anonymous(_) => "session_token",
    }
}

/// Find or create the owner's cart and lock it for this transaction.
pub(crate) async fn upsert_cart(
    conn: &mut PgConnection,
    owner: &CartOwner,
) -> Result<CartId, RepositoryError> {
    let column = owner_column(owner);
    let id: i32 = sqlx::query_scalar(&format!(
        "INSERT INTO mall.cart (user_id, session_token) VALUES ($1, $2) \
         ON CONFLICT ({column}) DO UPDATE SET updated_at = NOW() \
         RETURNING id"
    ))
    .bind(owner.user_id())
    .bind(owner.session_token())
    .fetch_one(conn)
    .await?;
    Ok(CartId::new(id))
}

async fn find_cart(
    conn: &mut PgConnection,
    owner: &CartOwner,
    lock: bool,
) -> Result<Option<CartId>, RepositoryError> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    let id: Option<i32> = sqlx::query_scalar(&format!(
        "SELECT c.id FROM mall.cart c WHERE {OWNER_MATCH}{suffix}"
    ))
    .bind(owner.user_id())
    .bind(owner.session_token())
    .fetch_optional(conn)
    .await?;
    Ok(id.map(CartId::new))
}

async fn load_items(
    conn: &mut PgConnection,
    cart: CartId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let rows: Vec<CartItemRow> = sqlx::query_as(
        "SELECT ci.id, ci.product_id, ci.name, ci.price, ci.quantity, ci.attributes, p.image_url \
         FROM mall.cart_item ci \
         JOIN mall.product p ON p.id = ci.product_id \
         WHERE ci.cart_id = $1 \
         ORDER BY ci.id",
    )
    .bind(cart)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The owner's cart, or an empty one if they have never added anything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let Some(cart) = find_cart(&mut conn, owner, false).await? else {
            return Ok(Cart::empty());
        };
        let items = load_items(&mut conn, cart).await?;
        Ok(Cart::new(Some(cart), items))
    }

    /// Add a product, merging into a line with the same product and attributes.
    ///
    /// Name and price are snapshotted from the product on insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    pub async fn add(&self, owner: &CartOwner, input: &AddToCart) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product: Option<(String, Decimal)> = sqlx::query_as(
            "SELECT name, COALESCE(sale_price, price) FROM mall.product \
             WHERE id = $1 AND is_active AND deleted_at IS NULL",
        )
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (name, price) = product.ok_or(RepositoryError::NotFound("Product"))?;

        let cart = upsert_cart(&mut tx, owner).await?;

        let merged = sqlx::query(
            "UPDATE mall.cart_item SET quantity = LEAST(quantity + $4, $5), updated_at = NOW() \
             WHERE cart_id = $1 AND product_id = $2 AND attributes = $3",
        )
        .bind(cart)
        .bind(input.product_id)
        .bind(Json(&input.attributes))
        .bind(input.quantity)
        .bind(MAX_LINE_QUANTITY)
        .execute(&mut *tx)
        .await?;

        if merged.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO mall.cart_item (cart_id, product_id, name, price, quantity, attributes) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(cart)
            .bind(input.product_id)
            .bind(&name)
            .bind(price)
            .bind(input.quantity)
            .bind(Json(&input.attributes))
            .execute(&mut *tx)
            .await?;
        }

        let items = load_items(&mut tx, cart).await?;
        tx.commit().await?;
        Ok(Cart::new(Some(cart), items))
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not in the owner's cart.
    pub async fn update_quantity(
        &self,
        owner: &CartOwner,
        item: CartItemId,
        quantity: i32,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart: Option<i32> = sqlx::query_scalar(&format!(
            "UPDATE mall.cart_item ci SET quantity = $4, updated_at = NOW() \
             FROM mall.cart c \
             WHERE ci.cart_id = c.id AND {OWNER_MATCH} AND ci.id = $3 \
             RETURNING c.id"
        ))
        .bind(owner.user_id())
        .bind(owner.session_token())
        .bind(item)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await?;
        let cart = CartId::new(cart.ok_or(RepositoryError::NotFound("Cart item"))?);

        let items = load_items(&mut tx, cart).await?;
        tx.commit().await?;
        Ok(Cart::new(Some(cart), items))
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not in the owner's cart.
    pub async fn remove(
        &self,
        owner: &CartOwner,
        item: CartItemId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart: Option<i32> = sqlx::query_scalar(&format!(
            "DELETE FROM mall.cart_item ci USING mall.cart c \
             WHERE ci.cart_id = c.id AND {OWNER_MATCH} AND ci.id = $3 \
             RETURNING c.id"
        ))
        .bind(owner.user_id())
        .bind(owner.session_token())
        .bind(item)
        .fetch_optional(&mut *tx)
        .await?;
        let cart = CartId::new(cart.ok_or(RepositoryError::NotFound("Cart item"))?);

        let items = load_items(&mut tx, cart).await?;
        tx.commit().await?;
        Ok(Cart::new(Some(cart), items))
    }

    /// Remove every line. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, owner: &CartOwner) -> Result<u64, RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM mall.cart_item ci USING mall.cart c \
             WHERE ci.cart_id = c.id AND {OWNER_MATCH}"
        ))
        .bind(owner.user_id())
        .bind(owner.session_token())
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Empty the cart and hand back what was in it, atomically.
    ///
    /// An empty cart is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn take(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let Some(cart) = find_cart(&mut tx, owner, true).await? else {
            return Ok(Cart::empty());
        };
        let items = load_items(&mut tx, cart).await?;
        if !items.is_empty() {
            sqlx::query("DELETE FROM mall.cart_item WHERE cart_id = $1")
                .bind(cart)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(Cart::new(Some(cart), items))
    }
}
