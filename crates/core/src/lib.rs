//! Pulse & Threads Core - Shared domain types.
//!
//! This crate provides the types used across all virtual mall components:
//! - `storefront` - The JSON API service (catalog, cart, checkout, try-on)
//! - `cli` - Command-line tools for migrations, users, and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP. Database encoding for IDs is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, roles, and slugs
//! - [`try_on`] - Try-on categories, measurements, and the outfit placement rule
//! - [`cart`] - Cart ownership, line attributes, and cart totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod try_on;
pub mod types;

pub use cart::{
    CartOwner, CartTotals, LineAttributes, PaymentMethod, SessionToken, flat_shipping,
};
pub use try_on::{BodyMeasurements, ClothingCategory, ModelType, Outfit};
pub use types::*;
