//! Core types for the virtual mall.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod slug;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, SalePricing};
pub use role::{ParseEnumError, UserRole};
pub use slug::slugify;
