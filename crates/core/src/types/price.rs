//! Type-safe price representation using decimal arithmetic.
//!
//! The mall prices everything in Zambian kwacha with an optional US dollar
//! display price, so [`CurrencyCode`] only carries those two.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (kwacha, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Price in kwacha.
    #[must_use]
    pub const fn kwacha(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::ZMW)
    }

    /// Price in US dollars.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Format for display, e.g. `K1250.00` or `$68.50`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{}{rounded:.2}", self.currency_code.symbol())
    }
}

/// ISO 4217 currency codes accepted by the mall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ZMW,
    USD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ZMW => "K",
            Self::USD => "$",
        }
    }

    /// Three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ZMW => "ZMW",
            Self::USD => "USD",
        }
    }
}

/// Regular price plus optional sale price, shared by products and variations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalePricing {
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
}

impl SalePricing {
    #[must_use]
    pub const fn new(price: Decimal, sale_price: Option<Decimal>) -> Self {
        Self { price, sale_price }
    }

    /// The price a shopper pays right now: the sale price when set.
    #[must_use]
    pub fn current(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    /// A sale only counts when it is strictly cheaper than the regular price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.sale_price.is_some_and(|sale| sale < self.price)
    }

    /// Whole-number discount percentage, rounded half away from zero.
    ///
    /// Returns `None` when not on sale or when the regular price is zero.
    #[must_use]
    pub fn discount_percentage(&self) -> Option<u32> {
        if !self.is_on_sale() || self.price.is_zero() {
            return None;
        }
        let sale = self.sale_price?;
        ((self.price - sale) / self.price * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
    }
}
