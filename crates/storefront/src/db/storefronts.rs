//! Storefront repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pulse_threads_core::{StorefrontId, UserId};

use super::RepositoryError;
use crate::models::storefront::{DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR};
use crate::models::{
    NewStorefront, PageRequest, Paginated, Storefront, StorefrontSummary, StorefrontUpdate,
};

#[derive(sqlx::FromRow)]
struct StorefrontRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    owner_id: Option<i32>,
    logo_url: Option<String>,
    banner_url: Option<String>,
    primary_color: String,
    secondary_color: String,
    theme_settings: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StorefrontRow> for Storefront {
    fn from(r: StorefrontRow) -> Self {
        Self {
            id: StorefrontId::new(r.id),
            name: r.name,
            slug: r.slug,
            description: r.description,
            owner_id: r.owner_id.map(UserId::new),
            logo_url: r.logo_url,
            banner_url: r.banner_url,
            primary_color: r.primary_color,
            secondary_color: r.secondary_color,
            theme_settings: r.theme_settings,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    storefront: StorefrontRow,
    products_count: i64,
}

const COLUMNS: &str = "s.id, s.name, s.slug, s.description, s.owner_id, s.logo_url, \
    s.banner_url, s.primary_color, s.secondary_color, s.theme_settings, s.is_active, \
    s.created_at, s.updated_at";

/// Storefronts shown per listing page.
pub const STOREFRONTS_PER_PAGE: u32 = 10;

/// Map unique violations to the conflict the client caused.
fn map_conflict(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let message = if db_err.constraint() == Some("storefront_one_per_owner") {
            "user already owns a storefront"
        } else {
            "storefront slug already taken"
        };
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}

/// Repository for storefront database operations.
pub struct StorefrontRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StorefrontRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active storefronts with live product counts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_active(
        &self,
        page: PageRequest,
    ) -> Result<Paginated<StorefrontSummary>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM mall.storefront WHERE is_active AND deleted_at IS NULL",
        )
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<SummaryRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS}, \
                (SELECT COUNT(*) FROM mall.product p \
                 WHERE p.storefront_id = s.id AND p.deleted_at IS NULL) AS products_count \
             FROM mall.storefront s \
             WHERE s.is_active AND s.deleted_at IS NULL \
             ORDER BY s.created_at DESC, s.id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let data = rows
            .into_iter()
            .map(|r| StorefrontSummary {
                storefront: r.storefront.into(),
                products_count: r.products_count,
            })
            .collect();
        Ok(Paginated::new(data, page, total))
    }

    /// Get a live storefront by slug, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Storefront>, RepositoryError> {
        let row: Option<StorefrontRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM mall.storefront s WHERE s.slug = $1 AND s.deleted_at IS NULL"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Get a live storefront by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StorefrontId) -> Result<Option<Storefront>, RepositoryError> {
        let row: Option<StorefrontRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM mall.storefront s WHERE s.id = $1 AND s.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// The live storefront a user owns, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(&self, owner: UserId) -> Result<Option<Storefront>, RepositoryError> {
        let row: Option<StorefrontRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM mall.storefront s \
             WHERE s.owner_id = $1 AND s.deleted_at IS NULL"
        ))
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Create a storefront with an already validated payload and slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the owner
    /// already has a storefront.
    pub async fn create(
        &self,
        input: &NewStorefront,
        slug: &str,
        owner: Option<UserId>,
    ) -> Result<Storefront, RepositoryError> {
        let row: StorefrontRow = sqlx::query_as(&format!(
            "INSERT INTO mall.storefront AS s \
                (name, slug, description, owner_id, logo_url, banner_url, \
                 primary_color, secondary_color, theme_settings, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        ))
        .bind(input.name.as_deref().map(str::trim))
        .bind(slug)
        .bind(input.description.as_deref())
        .bind(owner)
        .bind(input.logo_url.as_deref())
        .bind(input.banner_url.as_deref())
        .bind(input.primary_color.as_deref().unwrap_or(DEFAULT_PRIMARY_COLOR))
        .bind(input.secondary_color.as_deref().unwrap_or(DEFAULT_SECONDARY_COLOR))
        .bind(
            input
                .theme_settings
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
        )
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.pool)
        .await
        .map_err(map_conflict)?;
        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the storefront is gone and
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: StorefrontId,
        input: &StorefrontUpdate,
        slug: Option<&str>,
    ) -> Result<Storefront, RepositoryError> {
        let row: Option<StorefrontRow> = sqlx::query_as(&format!(
            "UPDATE mall.storefront AS s SET \
                name = COALESCE($2, s.name), \
                slug = COALESCE($3, s.slug), \
                description = COALESCE($4, s.description), \
                logo_url = COALESCE($5, s.logo_url), \
                banner_url = COALESCE($6, s.banner_url), \
                primary_color = COALESCE($7, s.primary_color), \
                secondary_color = COALESCE($8, s.secondary_color), \
                theme_settings = COALESCE($9, s.theme_settings), \
                is_active = COALESCE($10, s.is_active), \
                updated_at = NOW() \
             WHERE s.id = $1 AND s.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(slug)
        .bind(input.description.as_deref())
        .bind(input.logo_url.as_deref())
        .bind(input.banner_url.as_deref())
        .bind(input.primary_color.as_deref())
        .bind(input.secondary_color.as_deref())
        .bind(input.theme_settings.clone())
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(map_conflict)?;
        row.map(Into::into).ok_or(RepositoryError::NotFound("Storefront"))
    }

    /// Soft-delete a storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it is already gone.
    pub async fn soft_delete(&self, id: StorefrontId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE mall.storefront SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Storefront"));
        }
        Ok(())
    }
}
