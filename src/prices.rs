//! Prices

use std::ops::Deref;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

/// Represents a price in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    value: u64,
}

impl Price {
    /// Creates a new Price
    #[must_use]
    pub fn new(value: u64) -> Self {
        Price { value }
    }

    /// The price as a decimal amount, for derived arithmetic.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.value)
    }

    /// Format the price for display in the given currency.
    #[must_use]
    pub fn formatted(self, currency: &'static Currency) -> String {
        format_amount(self.to_decimal(), currency)
    }
}

impl Deref for Price {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl From<u64> for Price {
    fn from(value: u64) -> Self {
        Price { value }
    }
}

/// Format a decimal amount for display in the given currency.
#[must_use]
pub fn format_amount(amount: Decimal, currency: &'static Currency) -> String {
    Money::from_decimal(amount, currency).to_string()
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::AOA;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_price() {
        let price = Price::new(1000);

        assert_eq!(price.value, 1000);
    }

    #[test]
    fn price_derefs_to_u64() {
        let price = Price { value: 100 };

        assert_eq!(*price, 100);
    }

    #[test]
    fn price_converts_to_decimal() {
        let price = Price::new(74_000);

        assert_eq!(price.to_decimal(), Decimal::from(74_000_u64));
    }

    #[test]
    fn price_serializes_as_bare_number() -> TestResult {
        let price = Price::new(2500);

        assert_eq!(serde_json::to_string(&price)?, "2500");
        assert_eq!(serde_json::from_str::<Price>("2500")?, price);

        Ok(())
    }

    #[test]
    fn formatted_price_carries_the_currency() {
        let rendered = Price::new(100).formatted(AOA);

        assert!(
            rendered.contains("100"),
            "expected the amount in {rendered:?}"
        );
    }
}
