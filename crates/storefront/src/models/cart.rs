//! Cart and checkout types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pulse_threads_core::{
    CartId, CartItemId, CartTotals, Email, LineAttributes, PaymentMethod, ProductId,
    flat_shipping,
};

use crate::validation::{MAX_NAME_LENGTH, ValidationErrors};

/// A cart line. Name and price are snapshots from when the line was added.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub attributes: LineAttributes,
    pub image_url: Option<String>,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Cart with totals. `id` is `None` until the owner first adds something.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: Option<CartId>,
    pub items: Vec<CartItem>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl Cart {
    #[must_use]
    pub fn new(id: Option<CartId>, items: Vec<CartItem>) -> Self {
        let totals = CartTotals::from_lines(items.iter().map(|i| (i.price, i.quantity)));
        Self {
            id,
            items,
            item_count: totals.item_count,
            subtotal: totals.subtotal,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(None, Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `POST /api/cart` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
    #[serde(default)]
    pub attributes: LineAttributes,
}

const fn one() -> i32 {
    1
}

/// `PATCH /api/cart/item/{id}` body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i32,
}

/// Most units a single cart line holds. Merged lines are capped here too.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Reject quantities below one or above [`MAX_LINE_QUANTITY`].
///
/// # Errors
///
/// Returns a `quantity` field error.
pub fn validate_quantity(quantity: i32) -> Result<(), ValidationErrors> {
    if quantity < 1 {
        return Err(ValidationErrors::single(
            "quantity",
            "The quantity field must be at least 1.",
        ));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationErrors::single(
            "quantity",
            format!("The quantity field must not be greater than {MAX_LINE_QUANTITY}."),
        ));
    }
    Ok(())
}

/// `POST /api/checkout` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub payment_method: Option<String>,
}

/// Checkout fields after validation.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub email: Email,
    pub name: String,
    pub address: String,
    pub city: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<CheckoutDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = match self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            None => {
                errors.add("email", "The email field is required.");
                None
            }
            Some(raw) => Email::parse(raw)
                .map_err(|_| errors.add("email", "The email must be a valid email address."))
                .ok(),
        };
        errors.require_text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        errors.require_text("address", self.address.as_deref(), MAX_NAME_LENGTH);
        errors.require_text("city", self.city.as_deref(), MAX_NAME_LENGTH);

        let payment_method = match self.payment_method.as_deref() {
            None | Some("") => {
                errors.add("payment_method", "The payment method field is required.");
                None
            }
            Some(raw) => raw
                .parse::<PaymentMethod>()
                .map_err(|_| {
                    errors.add(
                        "payment_method",
                        "The selected payment method is invalid.",
                    );
                })
                .ok(),
        };

        match (email, payment_method) {
            (Some(email), Some(payment_method)) if errors.is_empty() => Ok(CheckoutDetails {
                email,
                name: trimmed(self.name.as_deref()),
                address: trimmed(self.address.as_deref()),
                city: trimmed(self.city.as_deref()),
                payment_method,
            }),
            _ => Err(errors),
        }
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_owned()
}

/// Order confirmation returned by checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_number: String,
    pub email: Email,
    pub name: String,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
}

impl OrderSummary {
    #[must_use]
    pub fn new(order_number: String, details: CheckoutDetails, cart: Cart) -> Self {
        let shipping = flat_shipping();
        Self {
            order_number,
            email: details.email,
            name: details.name,
            total: cart.subtotal + shipping,
            subtotal: cart.subtotal,
            shipping,
            items: cart.items,
            payment_method: details.payment_method,
        }
    }
}
