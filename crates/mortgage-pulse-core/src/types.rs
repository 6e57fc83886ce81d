use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.044 = 4.4%). Never as percentages.
pub type Rate = Decimal;

/// Fractional year counts
pub type Years = Decimal;

/// Annual rate per loan category (e.g. "prime" -> 0.061)
pub type RateTable = BTreeMap<String, Rate>;

/// Fractional weight per loan category, nominally summing to 1
pub type Distribution = BTreeMap<String, Decimal>;

/// Market rates a refinanced portfolio would be priced at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRates {
    /// Annual rate per mortgage category.
    pub mortgage_rates: RateTable,
    /// Share of the new mortgage placed in each category.
    pub distribution: Distribution,
    /// Annual rate applied to consolidated non-mortgage loans.
    pub other_loans_rate: Rate,
}

/// Balances to refinance, priced against a set of market rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub primary_balance: Money,
    pub other_loans_balance: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lump_sum_reduction: Option<Money>,
    pub rates: LoanRates,
}

impl LoanParameters {
    /// Principal left to finance after the lump sum, never negative.
    pub fn total_amount(&self) -> Money {
        let lump_sum = self.lump_sum_reduction.unwrap_or(Decimal::ZERO);
        (self.primary_balance + self.other_loans_balance - lump_sum).max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BorrowerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_value: Option<Money>,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_loans(lump_sum: Option<Money>) -> LoanParameters {
        LoanParameters {
            primary_balance: dec!(400_000),
            other_loans_balance: dec!(50_000),
            lump_sum_reduction: lump_sum,
            rates: LoanRates {
                mortgage_rates: RateTable::new(),
                distribution: Distribution::new(),
                other_loans_rate: dec!(0.08),
            },
        }
    }

    #[test]
    fn test_total_amount_subtracts_lump_sum() {
        assert_eq!(sample_loans(Some(dec!(30_000))).total_amount(), dec!(420_000));
        assert_eq!(sample_loans(None).total_amount(), dec!(450_000));
    }

    #[test]
    fn test_total_amount_never_negative() {
        assert_eq!(sample_loans(Some(dec!(1_000_000))).total_amount(), Decimal::ZERO);
    }
}
