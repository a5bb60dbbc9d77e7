//! Domain models for the mall API.
//!
//! These are the validated types handlers work with and serialize. Row types
//! that mirror table layouts live next to their queries in [`crate::db`].

pub mod cart;
pub mod pagination;
pub mod price_history;
pub mod product;
pub mod session;
pub mod storefront;
pub mod try_on;
pub mod user;

pub use cart::{
    AddToCart, Cart, CartItem, CheckoutDetails, CheckoutRequest, MAX_LINE_QUANTITY, OrderSummary,
    UpdateQuantity, validate_quantity,
};
pub use pagination::{PageRequest, Paginated};
pub use price_history::{PriceChange, PriceHistoryEntry, Priceable};
pub use product::{
    NewProduct, NewVariation, Product, ProductDetail, ProductFeature, ProductFilter,
    ProductListQuery, ProductUpdate, ProductView, SortColumn, SortDirection, Variation,
    VariationView,
};
pub use session::{CurrentUser, keys as session_keys};
pub use storefront::{NewStorefront, Storefront, StorefrontSummary, StorefrontUpdate};
pub use try_on::{
    AddTryOnItem, NewTryOnSession, PlacedItem, RemoveTryOnItem, TryOnItem, TryOnProduct,
    TryOnSession, TryOnSessionDetail, TryOnSessionRef,
};
pub use user::User;
