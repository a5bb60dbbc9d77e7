//! Catalog domain types: products, variations, features, listing filters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pulse_threads_core::{
    ClothingCategory, FeatureId, Price, ProductId, SalePricing, StorefrontId, VariationId,
};

use super::pagination::PageRequest;
use crate::validation::{MAX_NAME_LENGTH, ValidationErrors};

/// Products per page when the client does not ask for a size.
pub const DEFAULT_PER_PAGE: u32 = 12;
/// Largest page a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub storefront_id: Option<StorefrontId>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sku: String,
    /// Price in kwacha.
    pub price: Decimal,
    /// Optional dollar display price.
    pub price_usd: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub clothing_category: Option<ClothingCategory>,
    pub available_sizes: Vec<String>,
    pub color_variants: Vec<String>,
    pub try_on_model_path: Option<String>,
    pub is_try_on_enabled: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn pricing(&self) -> SalePricing {
        SalePricing::new(self.price, self.sale_price)
    }

    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Product with derived pricing fields, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub current_price: Decimal,
    pub is_on_sale: bool,
    pub discount_percentage: Option<u32>,
    pub in_stock: bool,
    /// Current price formatted in kwacha, e.g. `K1250.00`.
    pub formatted_price: String,
    pub formatted_price_usd: Option<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let pricing = product.pricing();
        Self {
            current_price: pricing.current(),
            is_on_sale: pricing.is_on_sale(),
            discount_percentage: pricing.discount_percentage(),
            in_stock: product.is_in_stock(),
            formatted_price: Price::kwacha(pricing.current()).display(),
            formatted_price_usd: product.price_usd.map(|usd| Price::usd(usd).display()),
            product,
        }
    }
}

/// A product variant (colour, size, material...).
#[derive(Debug, Clone, Serialize)]
pub struct Variation {
    pub id: VariationId,
    pub product_id: ProductId,
    pub sku: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub style: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    pub is_default: bool,
}

impl Variation {
    #[must_use]
    pub const fn pricing(&self) -> SalePricing {
        SalePricing::new(self.price, self.sale_price)
    }

    /// `"Red / XL / Cotton"` from whichever parts are set, else `"Default"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<String> = [
            self.color.as_deref().map(capitalize),
            self.size.as_deref().map(str::to_uppercase),
            self.material.as_deref().map(capitalize),
        ]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect();

        if parts.is_empty() {
            "Default".to_string()
        } else {
            parts.join(" / ")
        }
    }
}

/// Variation with derived fields, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct VariationView {
    #[serde(flatten)]
    pub variation: Variation,
    pub display_name: String,
    pub current_price: Decimal,
    pub is_on_sale: bool,
    pub discount_percentage: Option<u32>,
}

impl From<Variation> for VariationView {
    fn from(variation: Variation) -> Self {
        let pricing = variation.pricing();
        Self {
            display_name: variation.display_name(),
            current_price: pricing.current(),
            is_on_sale: pricing.is_on_sale(),
            discount_percentage: pricing.discount_percentage(),
            variation,
        }
    }
}

/// A bullet-point feature of a product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductFeature {
    pub id: FeatureId,
    pub product_id: ProductId,
    pub feature_name: String,
}

/// Full product page payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductView,
    pub variations: Vec<VariationView>,
    pub features: Vec<ProductFeature>,
    /// The flagged default, else the first variation.
    pub default_variation: Option<VariationView>,
}

impl ProductDetail {
    #[must_use]
    pub fn new(product: Product, variations: Vec<Variation>, features: Vec<ProductFeature>) -> Self {
        let variations: Vec<VariationView> = variations.into_iter().map(Into::into).collect();
        let default_variation = variations
            .iter()
            .find(|v| v.variation.is_default)
            .or_else(|| variations.first())
            .cloned();
        Self {
            product: product.into(),
            variations,
            features,
            default_variation,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// =============================================================================
// Create / Update payloads
// =============================================================================

/// Payload for creating a product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub price_usd: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub clothing_category: Option<ClothingCategory>,
    #[serde(default)]
    pub available_sizes: Vec<String>,
    #[serde(default)]
    pub color_variants: Vec<String>,
    pub try_on_model_path: Option<String>,
    #[serde(default)]
    pub is_try_on_enabled: bool,
    pub image_url: Option<String>,
    pub storefront_id: Option<StorefrontId>,
    #[serde(default)]
    pub features: Vec<String>,
}

const fn default_true() -> bool {
    true
}

impl NewProduct {
    /// Check field rules.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        errors.require_text("sku", self.sku.as_deref(), MAX_NAME_LENGTH);
        if self.price.is_none() {
            errors.add("price", "The price field is required.");
        }
        match self.stock_quantity {
            None => errors.add("stock_quantity", "The stock quantity field is required."),
            Some(q) if q < 0 => errors.add("stock_quantity", "The stock quantity field must be at least 0."),
            Some(_) => {}
        }
        validate_common(
            &mut errors,
            self.price,
            self.price_usd,
            self.sale_price,
            self.image_url.as_deref(),
        );
        if self.is_try_on_enabled && self.clothing_category.is_none() {
            errors.add(
                "clothing_category",
                "Try-on products need a clothing category.",
            );
        }
        errors.into_result()
    }
}

/// Payload for updating a product. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub price_usd: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub clothing_category: Option<ClothingCategory>,
    pub available_sizes: Option<Vec<String>>,
    pub color_variants: Option<Vec<String>>,
    pub try_on_model_path: Option<String>,
    pub is_try_on_enabled: Option<bool>,
    pub image_url: Option<String>,
    /// Recorded in price history when the price changes.
    pub reason: Option<String>,
}

impl ProductUpdate {
    /// Check the provided fields.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.is_some() {
            errors.require_text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        }
        if self.sku.is_some() {
            errors.require_text("sku", self.sku.as_deref(), MAX_NAME_LENGTH);
        }
        if self.stock_quantity.is_some_and(|q| q < 0) {
            errors.add("stock_quantity", "The stock quantity field must be at least 0.");
        }
        validate_common(
            &mut errors,
            self.price,
            self.price_usd,
            self.sale_price,
            self.image_url.as_deref(),
        );
        errors.into_result()
    }
}

fn validate_common(
    errors: &mut ValidationErrors,
    price: Option<Decimal>,
    price_usd: Option<Decimal>,
    sale_price: Option<Decimal>,
    image_url: Option<&str>,
) {
    errors.price("price", price);
    errors.price("price_usd", price_usd);
    errors.price("sale_price", sale_price);
    errors.url("image_url", image_url);
}

/// Payload for creating a variation (used by catalog seeding).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVariation {
    pub sku: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub style: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl NewVariation {
    /// Check field rules.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("sku", Some(&self.sku), MAX_NAME_LENGTH);
        errors.price("price", Some(self.price));
        errors.price("sale_price", self.sale_price);
        if self.stock_quantity < 0 {
            errors.add("stock_quantity", "The stock quantity field must be at least 0.");
        }
        errors.url("image_url", self.image_url.as_deref());
        errors.into_result()
    }
}

// =============================================================================
// Listing filters
// =============================================================================

/// Raw listing query parameters.
///
/// Everything arrives as text so bad values become field errors rather than
/// extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub in_stock: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub price_range: Option<String>,
    pub category: Option<String>,
    pub storefront: Option<String>,
    pub try_on: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Column a listing may be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    #[default]
    Price,
    Name,
    CreatedAt,
    StockQuantity,
}

impl SortColumn {
    /// Column name for `ORDER BY`. Only these fixed identifiers reach SQL.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Name => "name",
            Self::CreatedAt => "created_at",
            Self::StockQuantity => "stock_quantity",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "price" => Some(Self::Price),
            "name" => Some(Self::Name),
            "created_at" => Some(Self::CreatedAt),
            "stock_quantity" => Some(Self::StockQuantity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated product listing filter. Price bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub in_stock: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub category: Option<String>,
    pub storefront_slug: Option<String>,
    pub try_on_only: bool,
    pub sort: SortColumn,
    pub direction: SortDirection,
}

impl ProductFilter {
    /// Parse and validate listing query parameters.
    ///
    /// `price_range` (`"min,max"`) narrows `min_price`/`max_price` when both
    /// are given.
    ///
    /// # Errors
    ///
    /// Returns a field error for each unparseable value, negative prices,
    /// a minimum above the maximum, or an unknown sort column or direction.
    pub fn parse(query: &ProductListQuery) -> Result<(Self, PageRequest), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let mut min_price = parse_price(&mut errors, "min_price", query.min_price.as_deref());
        let mut max_price = parse_price(&mut errors, "max_price", query.max_price.as_deref());

        if let Some(range) = non_blank(query.price_range.as_deref()) {
            match range.split_once(',') {
                Some((lo, hi)) => {
                    let lo = parse_price(&mut errors, "price_range", Some(lo.trim()));
                    let hi = parse_price(&mut errors, "price_range", Some(hi.trim()));
                    min_price = max_option(min_price, lo);
                    max_price = min_option(max_price, hi);
                }
                None => errors.add("price_range", "The price range must look like min,max."),
            }
        }

        if let (Some(lo), Some(hi)) = (min_price, max_price)
            && lo > hi
        {
            errors.add("min_price", "The minimum price must not exceed the maximum price.");
        }

        let sort = match non_blank(query.sort_by.as_deref()) {
            None => SortColumn::default(),
            Some(s) => SortColumn::parse(s).unwrap_or_else(|| {
                errors.add(
                    "sort_by",
                    "The sort by field must be one of price, name, created_at, stock_quantity.",
                );
                SortColumn::default()
            }),
        };
        let direction = match non_blank(query.sort_dir.as_deref()).map(str::to_ascii_lowercase) {
            None => SortDirection::default(),
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(_) => {
                errors.add("sort_dir", "The sort dir field must be asc or desc.");
                SortDirection::default()
            }
        };

        let page = PageRequest::parse(
            non_blank(query.page.as_deref()),
            non_blank(query.per_page.as_deref()),
            DEFAULT_PER_PAGE,
            MAX_PER_PAGE,
            &mut errors,
        );

        let filter = Self {
            search: non_blank(query.search.as_deref()).map(str::to_owned),
            in_stock: flag(query.in_stock.as_deref()),
            min_price,
            max_price,
            category: non_blank(query.category.as_deref()).map(str::to_owned),
            storefront_slug: non_blank(query.storefront.as_deref()).map(str::to_owned),
            try_on_only: flag(query.try_on.as_deref()),
            sort,
            direction,
        };

        errors.into_result().map(|()| (filter, page))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A present parameter is on unless it spells out false.
fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
}

fn parse_price(errors: &mut ValidationErrors, field: &str, value: Option<&str>) -> Option<Decimal> {
    let value = non_blank(value)?;
    match value.parse::<Decimal>() {
        Ok(price) if price.is_sign_negative() && !price.is_zero() => {
            errors.add(field, format!("The {} must be at least 0.", field.replace('_', " ")));
            None
        }
        Ok(price) => Some(price),
        Err(_) => {
            errors.add(field, format!("The {} must be a number.", field.replace('_', " ")));
            None
        }
    }
}

fn max_option(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn min_option(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn variation(color: Option<&str>, size: Option<&str>, material: Option<&str>) -> Variation {
        Variation {
            id: VariationId::new(1),
            product_id: ProductId::new(1),
            sku: "PT-1".into(),
            color: color.map(Into::into),
            size: size.map(Into::into),
            material: material.map(Into::into),
            style: None,
            price: dec("100.00"),
            sale_price: None,
            stock_quantity: 3,
            barcode: None,
            image_url: None,
            is_default: false,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            variation(Some("red"), Some("xl"), Some("cotton")).display_name(),
            "Red / XL / Cotton"
        );
        assert_eq!(variation(None, Some("m"), None).display_name(), "M");
        assert_eq!(variation(None, None, None).display_name(), "Default");
    }

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(1),
            storefront_id: None,
            name: "Sandals".into(),
            slug: "sandals-pt-sh-1".into(),
            description: None,
            category: Some("shoes".into()),
            sku: "PT-SH-1".into(),
            price: dec("200.00"),
            price_usd: None,
            sale_price: Some(dec("150.00")),
            stock_quantity: 0,
            is_active: true,
            is_featured: false,
            clothing_category: Some(ClothingCategory::Shoes),
            available_sizes: vec![],
            color_variants: vec![],
            try_on_model_path: None,
            is_try_on_enabled: false,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_default_variation_falls_back_to_first() {
        let mut a = variation(Some("red"), None, None);
        a.id = VariationId::new(10);
        let mut b = variation(Some("blue"), None, None);
        b.id = VariationId::new(11);

        let detail = ProductDetail::new(product(), vec![a.clone(), b.clone()], vec![]);
        assert_eq!(
            detail.default_variation.map(|v| v.variation.id),
            Some(VariationId::new(10))
        );

        b.is_default = true;
        let detail = ProductDetail::new(product(), vec![a, b], vec![]);
        assert_eq!(
            detail.default_variation.map(|v| v.variation.id),
            Some(VariationId::new(11))
        );
    }

    #[test]
    fn test_filter_defaults() {
        let (filter, page) = ProductFilter::parse(&ProductListQuery::default()).unwrap();
        assert_eq!(filter.sort, SortColumn::Price);
        assert_eq!(filter.direction, SortDirection::Asc);
        assert!(!filter.in_stock);
        assert_eq!(page, PageRequest::fixed(1, DEFAULT_PER_PAGE));
    }

    #[test]
    fn test_filter_price_bounds() {
        let query = ProductListQuery {
            min_price: Some("100".into()),
            max_price: Some("500.50".into()),
            ..ProductListQuery::default()
        };
        let (filter, _) = ProductFilter::parse(&query).unwrap();
        assert_eq!(filter.min_price, Some(dec("100")));
        assert_eq!(filter.max_price, Some(dec("500.50")));
    }

    #[test]
    fn test_price_range_intersects_bounds() {
        let query = ProductListQuery {
            min_price: Some("50".into()),
            price_range: Some("100, 300".into()),
            ..ProductListQuery::default()
        };
        let (filter, _) = ProductFilter::parse(&query).unwrap();
        assert_eq!(filter.min_price, Some(dec("100")));
        assert_eq!(filter.max_price, Some(dec("300")));
    }

    #[test]
    fn test_filter_rejects_bad_values() {
        let query = ProductListQuery {
            min_price: Some("-5".into()),
            max_price: Some("abc".into()),
            sort_by: Some("password".into()),
            sort_dir: Some("sideways".into()),
            ..ProductListQuery::default()
        };
        let errors = ProductFilter::parse(&query).unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["max_price", "min_price", "sort_by", "sort_dir"]
        );
    }

    #[test]
    fn test_min_above_max_rejected() {
        let query = ProductListQuery {
            min_price: Some("300".into()),
            max_price: Some("100".into()),
            ..ProductListQuery::default()
        };
        assert!(ProductFilter::parse(&query).is_err());
    }

    #[test]
    fn test_flags() {
        assert!(flag(Some("")));
        assert!(flag(Some("1")));
        assert!(flag(Some("true")));
        assert!(!flag(Some("false")));
        assert!(!flag(None));
    }

    #[test]
    fn test_new_product_validation() {
        let errors = NewProduct::default().validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["name", "price", "sku", "stock_quantity"]
        );

        let valid = NewProduct {
            name: Some("Chitenge Wrap Dress".into()),
            sku: Some("PT-DRS-001".into()),
            price: Some(dec("450.00")),
            stock_quantity: Some(4),
            ..NewProduct::default()
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_try_on_requires_category() {
        let product = NewProduct {
            name: Some("Beaded Necklace".into()),
            sku: Some("PT-ACC-9".into()),
            price: Some(dec("80")),
            stock_quantity: Some(1),
            is_try_on_enabled: true,
            ..NewProduct::default()
        };
        let errors = product.validate().unwrap_err();
        assert!(errors.get("clothing_category").is_some());
    }

    #[test]
    fn test_product_view_pricing() {
        let view = ProductView::from(product());
        assert_eq!(view.current_price, dec("150.00"));
        assert!(view.is_on_sale);
        assert_eq!(view.discount_percentage, Some(25));
        assert!(!view.in_stock);
        assert_eq!(view.formatted_price, "K150.00");
    }
}
