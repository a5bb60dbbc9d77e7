//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create ID wrappers that prevent accidentally
//! passing a cart item ID where a try-on item ID is expected.

/// Macro to define a type-safe ID wrapper around a `SERIAL` primary key.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `sqlx::Type` as a transparent `INTEGER` (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use pulse_threads_core::define_id;
/// define_id!(ShelfId);
/// define_id!(RackId);
///
/// let shelf = ShelfId::new(1);
/// assert_eq!(shelf.as_i32(), 1);
/// // let _: RackId = shelf; // different types, does not compile
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(StorefrontId);
define_id!(ProductId);
define_id!(VariationId);
define_id!(FeatureId);
define_id!(PriceHistoryId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(TryOnSessionId);
define_id!(TryOnItemId);
