//! Product repository: listing, detail, management, and product pricing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use pulse_threads_core::{
    ClothingCategory, FeatureId, ProductId, SalePricing, StorefrontId, UserId, slugify,
};

use super::price_history::{PriceHistoryRepository, PriceTransition};
use super::variations::VariationRepository;
use super::{RepositoryError, parse_column};
use crate::models::{
    NewProduct, PageRequest, Paginated, PriceChange, Priceable, Product, ProductDetail,
    ProductFeature, ProductFilter, ProductUpdate, ProductView,
};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    storefront_id: Option<i32>,
    name: String,
    slug: String,
    description: Option<String>,
    category: Option<String>,
    sku: String,
    price: Decimal,
    price_usd: Option<Decimal>,
    sale_price: Option<Decimal>,
    stock_quantity: i32,
    is_active: bool,
    is_featured: bool,
    clothing_category: Option<String>,
    available_sizes: Json<Vec<String>>,
    color_variants: Json<Vec<String>>,
    try_on_model_path: Option<String>,
    is_try_on_enabled: bool,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let clothing_category = r
            .clothing_category
            .as_deref()
            .map(parse_column::<ClothingCategory>)
            .transpose()?;
        Ok(Self {
            id: ProductId::new(r.id),
            storefront_id: r.storefront_id.map(StorefrontId::new),
            name: r.name,
            slug: r.slug,
            description: r.description,
            category: r.category,
            sku: r.sku,
            price: r.price,
            price_usd: r.price_usd,
            sale_price: r.sale_price,
            stock_quantity: r.stock_quantity,
            is_active: r.is_active,
            is_featured: r.is_featured,
            clothing_category,
            available_sizes: r.available_sizes.0,
            color_variants: r.color_variants.0,
            try_on_model_path: r.try_on_model_path,
            is_try_on_enabled: r.is_try_on_enabled,
            image_url: r.image_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FeatureRow {
    id: i32,
    product_id: i32,
    feature_name: String,
}

impl From<FeatureRow> for ProductFeature {
    fn from(r: FeatureRow) -> Self {
        Self {
            id: FeatureId::new(r.id),
            product_id: ProductId::new(r.product_id),
            feature_name: r.feature_name,
        }
    }
}

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.storefront_id, p.name, p.slug, p.description, \
    p.category, p.sku, p.price, p.price_usd, p.sale_price, p.stock_quantity, p.is_active, \
    p.is_featured, p.clothing_category, p.available_sizes, p.color_variants, \
    p.try_on_model_path, p.is_try_on_enabled, p.image_url, p.created_at, p.updated_at";

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `SELECT <select> FROM mall.product p WHERE ...` for a listing filter.
fn filtered_query(select: &str, filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {select} FROM mall.product p WHERE p.deleted_at IS NULL AND p.is_active"
    ));

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if filter.in_stock {
        qb.push(" AND p.stock_quantity > 0");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND p.category = ").push_bind(category.clone());
    }
    if let Some(slug) = &filter.storefront_slug {
        qb.push(
            " AND p.storefront_id IN \
             (SELECT s.id FROM mall.storefront s WHERE s.deleted_at IS NULL AND s.slug = ",
        )
        .push_bind(slug.clone())
        .push(")");
    }
    if filter.try_on_only {
        qb.push(" AND p.is_try_on_enabled");
    }
    qb
}

fn list_query(filter: &ProductFilter, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = filtered_query(PRODUCT_COLUMNS, filter);
    let direction = filter.direction.keyword();
    qb.push(format!(
        " ORDER BY p.{} {direction}, p.id {direction}",
        filter.sort.column()
    ));
    qb.push(" LIMIT ").push_bind(page.limit());
    qb.push(" OFFSET ").push_bind(page.offset());
    qb
}

/// Slug for a product. The SKU suffix keeps it unique.
#[must_use]
pub fn product_slug(name: &str, sku: &str) -> String {
    slugify(&format!("{name} {sku}"))
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, sorted, paginated listing of live products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Paginated<ProductView>, RepositoryError> {
        let total: i64 = filtered_query("COUNT(*)", filter)
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let rows: Vec<ProductRow> = list_query(filter, page)
            .build_query_as()
            .fetch_all(self.pool)
            .await?;

        let data = rows
            .into_iter()
            .map(|r| Product::try_from(r).map(ProductView::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated::new(data, page, total))
    }

    /// Get a live product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM mall.product p WHERE p.id = $1 AND p.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        row.map(Product::try_from).transpose()
    }

    /// Product page data: the product, its variations, and features.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is missing or inactive.
    pub async fn detail(&self, id: ProductId) -> Result<ProductDetail, RepositoryError> {
        let product = self
            .get(id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(RepositoryError::NotFound("Product"))?;
        let variations = VariationRepository::new(self.pool)
            .list_for_product(id)
            .await?;
        let features = self.features(id).await?;
        Ok(ProductDetail::new(product, variations, features))
    }

    /// Features of a product in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn features(&self, id: ProductId) -> Result<Vec<ProductFeature>, RepositoryError> {
        let rows: Vec<FeatureRow> = sqlx::query_as(
            "SELECT id, product_id, feature_name FROM mall.product_feature \
             WHERE product_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active products of one storefront, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_storefront(
        &self,
        storefront: StorefrontId,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM mall.product p \
             WHERE p.storefront_id = $1 AND p.is_active AND p.deleted_at IS NULL \
             ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(storefront)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter()
            .map(|r| Product::try_from(r).map(ProductView::from))
            .collect()
    }

    /// Active products enabled for virtual try-on, grouped by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_try_on(&self) -> Result<Vec<ProductView>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM mall.product p \
             WHERE p.is_try_on_enabled AND p.is_active AND p.deleted_at IS NULL \
             ORDER BY p.clothing_category, p.name, p.id"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter()
            .map(|r| Product::try_from(r).map(ProductView::from))
            .collect()
    }

    /// Active, in-stock products for the search index.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_searchable(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM mall.product p \
             WHERE p.is_active AND p.deleted_at IS NULL AND p.stock_quantity > 0 \
             ORDER BY p.id"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Create a product and its features from a validated payload.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU is taken.
    pub async fn create(
        &self,
        input: &NewProduct,
        storefront: Option<StorefrontId>,
    ) -> Result<Product, RepositoryError> {
        let name = input.name.as_deref().unwrap_or_default().trim();
        let sku = input.sku.as_deref().unwrap_or_default().trim();
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO mall.product AS p \
                (storefront_id, name, slug, description, category, sku, price, price_usd, \
                 sale_price, stock_quantity, is_active, is_featured, clothing_category, \
                 available_sizes, color_variants, try_on_model_path, is_try_on_enabled, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(storefront)
        .bind(name)
        .bind(product_slug(name, sku))
        .bind(input.description.as_deref())
        .bind(input.category.as_deref())
        .bind(sku)
        .bind(input.price.unwrap_or_default())
        .bind(input.price_usd)
        .bind(input.sale_price)
        .bind(input.stock_quantity.unwrap_or_default())
        .bind(input.is_active)
        .bind(input.is_featured)
        .bind(input.clothing_category.map(ClothingCategory::as_str))
        .bind(Json(&input.available_sizes))
        .bind(Json(&input.color_variants))
        .bind(input.try_on_model_path.as_deref())
        .bind(input.is_try_on_enabled)
        .bind(input.image_url.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product sku already exists"))?;

        if !input.features.is_empty() {
            sqlx::query(
                "INSERT INTO mall.product_feature (product_id, feature_name) \
                 SELECT $1, f FROM UNNEST($2::text[]) AS f",
            )
            .bind(row.id)
            .bind(&input.features)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        row.try_into()
    }

    /// Apply a partial update, logging a price change if there is one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is gone and
    /// `RepositoryError::Conflict` if the new SKU is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductUpdate,
        changed_by: Option<UserId>,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let old = lock_pricing(&mut tx, id).await?;

        let row: ProductRow = sqlx::query_as(&format!(
            "UPDATE mall.product AS p SET \
                name = COALESCE($2, p.name), \
                description = COALESCE($3, p.description), \
                category = COALESCE($4, p.category), \
                sku = COALESCE($5, p.sku), \
                price = COALESCE($6, p.price), \
                price_usd = COALESCE($7, p.price_usd), \
                sale_price = COALESCE($8, p.sale_price), \
                stock_quantity = COALESCE($9, p.stock_quantity), \
                is_active = COALESCE($10, p.is_active), \
                is_featured = COALESCE($11, p.is_featured), \
                clothing_category = COALESCE($12, p.clothing_category), \
                available_sizes = COALESCE($13, p.available_sizes), \
                color_variants = COALESCE($14, p.color_variants), \
                try_on_model_path = COALESCE($15, p.try_on_model_path), \
                is_try_on_enabled = COALESCE($16, p.is_try_on_enabled), \
                image_url = COALESCE($17, p.image_url), \
                updated_at = NOW() \
             WHERE p.id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.category.as_deref())
        .bind(input.sku.as_deref().map(str::trim))
        .bind(input.price)
        .bind(input.price_usd)
        .bind(input.sale_price)
        .bind(input.stock_quantity)
        .bind(input.is_active)
        .bind(input.is_featured)
        .bind(input.clothing_category.map(ClothingCategory::as_str))
        .bind(input.available_sizes.as_ref().map(Json))
        .bind(input.color_variants.as_ref().map(Json))
        .bind(input.try_on_model_path.as_deref())
        .bind(input.is_try_on_enabled)
        .bind(input.image_url.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product sku already exists"))?;

        let product = Product::try_from(row)?;
        PriceHistoryRepository::record(
            &mut *tx,
            PriceTransition {
                priceable: Priceable::Product,
                priceable_id: id.as_i32(),
                old,
                new: product.pricing(),
                changed_by,
                reason: input.reason.as_deref(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Set a product's price and sale price, logging the change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is gone.
    pub async fn update_price(
        &self,
        id: ProductId,
        change: &PriceChange,
        changed_by: Option<UserId>,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let old = lock_pricing(&mut tx, id).await?;
        let new_price = change.price.unwrap_or(old.price);
        let new_sale = change.resolve_sale_price(old.sale_price);

        let row: ProductRow = sqlx::query_as(&format!(
            "UPDATE mall.product AS p SET price = $2, sale_price = $3, updated_at = NOW() \
             WHERE p.id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(new_price)
        .bind(new_sale)
        .fetch_one(&mut *tx)
        .await?;

        let product = Product::try_from(row)?;
        PriceHistoryRepository::record(
            &mut *tx,
            PriceTransition {
                priceable: Priceable::Product,
                priceable_id: id.as_i32(),
                old,
                new: product.pricing(),
                changed_by,
                reason: change.reason.as_deref(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it is already gone.
    pub async fn soft_delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE mall.product SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Product"));
        }
        Ok(())
    }
}

/// Lock a live product row and return its current pricing.
async fn lock_pricing(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    id: ProductId,
) -> Result<SalePricing, RepositoryError> {
    let row: Option<(Decimal, Option<Decimal>)> = sqlx::query_as(
        "SELECT price, sale_price FROM mall.product \
         WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    let (price, sale_price) = row.ok_or(RepositoryError::NotFound("Product"))?;
    Ok(SalePricing::new(price, sale_price))
}
