//! Seed the catalog from a YAML file.
//!
//! The file lists users and storefronts, each storefront with its products
//! and their variations. Seeding is idempotent: users with a known email
//! and storefronts with a known slug are left alone, and products whose SKU
//! already exists are skipped with a warning.
//!
//! ```yaml
//! users:
//!   - email: owner@example.com
//!     name: Store Owner
//!     role: store_owner
//! storefronts:
//!   - name: Fashion Hub
//!     slug: fashion-hub
//!     owner_email: owner@example.com
//!     products:
//!       - name: Classic Denim Jacket
//!         sku: FH-DENIM-001
//!         price: "89.99"
//!         stock_quantity: 25
//!         variations:
//!           - sku: FH-DENIM-001-M
//!             size: M
//!             price: "89.99"
//!             is_default: true
//! ```

use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info, warn};

use pulse_threads_core::{Email, StorefrontId, UserId, UserRole};
use pulse_threads_storefront::db::{
    ProductRepository, RepositoryError, StorefrontRepository, UserRepository, VariationRepository,
};
use pulse_threads_storefront::models::{NewProduct, NewStorefront, NewVariation};

/// Top level of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub users: Vec<UserSeed>,
    #[serde(default)]
    pub storefronts: Vec<StorefrontSeed>,
}

#[derive(Debug, Deserialize)]
pub struct UserSeed {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct StorefrontSeed {
    #[serde(flatten)]
    pub storefront: NewStorefront,
    /// Email of a seeded or existing user who owns this storefront.
    pub owner_email: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    #[serde(flatten)]
    pub product: NewProduct,
    #[serde(default)]
    pub variations: Vec<NewVariation>,
}

/// Counts reported once seeding finishes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub users: usize,
    pub storefronts: usize,
    pub products: usize,
    pub variations: usize,
    pub skipped: usize,
}

/// Check every entry with the same rules the API applies.
///
/// Returns one message per problem; an empty list means the file is valid.
#[must_use]
pub fn validate_seed(seed: &CatalogSeed) -> Vec<String> {
    let mut problems = Vec::new();

    for user in &seed.users {
        if let Err(e) = Email::parse(&user.email) {
            problems.push(format!("user {}: {e}", user.email));
        }
        if user.name.trim().is_empty() {
            problems.push(format!("user {}: name is empty", user.email));
        }
    }

    for store in &seed.storefronts {
        let label = store.storefront.name.as_deref().unwrap_or("<unnamed>");
        if let Err(errors) = store.storefront.validate() {
            problems.push(format!("storefront {label}: {errors}"));
        }
        if let Some(owner) = &store.owner_email
            && Email::parse(owner).is_err()
        {
            problems.push(format!("storefront {label}: invalid owner email {owner}"));
        }

        for item in &store.products {
            let sku = item.product.sku.as_deref().unwrap_or("<no sku>");
            if let Err(errors) = item.product.validate() {
                problems.push(format!("product {sku}: {errors}"));
            }
            let defaults = item.variations.iter().filter(|v| v.is_default).count();
            if defaults > 1 {
                problems.push(format!("product {sku}: {defaults} default variations"));
            }
            for variation in &item.variations {
                if let Err(errors) = variation.validate() {
                    problems.push(format!("variation {}: {errors}", variation.sku));
                }
            }
        }
    }

    problems
}

/// Seed users, storefronts, products, and variations from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let problems = validate_seed(&seed);
    if !problems.is_empty() {
        error!("Seed validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(format!("{} validation errors found", problems.len()).into());
    }

    info!(
        users = seed.users.len(),
        storefronts = seed.storefronts.len(),
        "Seed file validated"
    );

    let pool = super::connect().await?;
    let result = apply(&pool, &seed).await?;

    info!(
        users = result.users,
        storefronts = result.storefronts,
        products = result.products,
        variations = result.variations,
        skipped = result.skipped,
        "Seeding complete"
    );
    Ok(())
}

async fn apply(pool: &PgPool, seed: &CatalogSeed) -> Result<SeedResult, Box<dyn std::error::Error>> {
    let mut result = SeedResult::default();
    let users = UserRepository::new(pool);
    let storefronts = StorefrontRepository::new(pool);

    for user in &seed.users {
        let email = Email::parse(&user.email)?;
        if users.get_by_email(&email).await?.is_some() {
            result.skipped += 1;
            continue;
        }
        users.create(&email, user.name.trim(), user.role).await?;
        result.users += 1;
    }

    for store in &seed.storefronts {
        let slug = store.storefront.validate()?;
        if storefronts.get_by_slug(&slug).await?.is_some() {
            info!(%slug, "Storefront exists, skipping");
            result.skipped += 1;
            continue;
        }

        let owner = owner_id(&users, store.owner_email.as_deref()).await?;
        let storefront = storefronts.create(&store.storefront, &slug, owner).await?;
        result.storefronts += 1;

        for item in &store.products {
            seed_product(pool, storefront.id, item, &mut result).await?;
        }
    }

    Ok(result)
}

async fn owner_id(
    users: &UserRepository<'_>,
    email: Option<&str>,
) -> Result<Option<UserId>, Box<dyn std::error::Error>> {
    let Some(email) = email else {
        return Ok(None);
    };
    let email = Email::parse(email)?;
    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| format!("Owner {email} does not exist"))?;
    Ok(Some(user.id))
}

async fn seed_product(
    pool: &PgPool,
    storefront: StorefrontId,
    item: &ProductSeed,
    result: &mut SeedResult,
) -> Result<(), RepositoryError> {
    let product = match ProductRepository::new(pool)
        .create(&item.product, Some(storefront))
        .await
    {
        Ok(product) => product,
        Err(RepositoryError::Conflict(reason)) => {
            warn!(sku = ?item.product.sku, %reason, "Skipping product");
            result.skipped += 1;
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    result.products += 1;

    let variations = VariationRepository::new(pool);
    for variation in &item.variations {
        match variations.create(product.id, variation).await {
            Ok(_) => result.variations += 1,
            Err(RepositoryError::Conflict(reason)) => {
                warn!(sku = %variation.sku, %reason, "Skipping variation");
                result.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
