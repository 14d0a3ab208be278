//! Normalized monetary values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency attached to an amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Currency symbol as printed (e.g. `$`, `Rp`).
    pub symbol: Option<String>,

    /// ISO 4217 code (e.g. `USD`, `IDR`).
    pub code: Option<String>,
}

impl Currency {
    pub fn new(symbol: Option<String>, code: Option<String>) -> Self {
        Self { symbol, code }
    }

    /// Indonesian rupiah.
    pub fn rupiah() -> Self {
        Self::new(Some("Rp".to_string()), Some("IDR".to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_none() && self.code.is_none()
    }

    /// Fill missing members from `other`.
    pub fn or(self, other: &Currency) -> Currency {
        Currency {
            symbol: self.symbol.or_else(|| other.symbol.clone()),
            code: self.code.or_else(|| other.code.clone()),
        }
    }
}

/// An amount with its currency.
///
/// A `Money` without an amount never carries a currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Option<Decimal>,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Option<Decimal>, currency: Currency) -> Self {
        match amount {
            Some(_) => Self { amount, currency },
            None => Self::empty(),
        }
    }

    /// Amount without a known currency.
    pub fn amount_only(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            currency: Currency::default(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
    }
}
