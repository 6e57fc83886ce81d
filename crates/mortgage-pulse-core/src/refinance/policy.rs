//! Thresholds that decide which refinancing terms are worth presenting.
//!
//! Shared by the term-window solver and the scenario search, and shipped with
//! each market parameter snapshot.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::refinance::regulatory::MAX_SUPPORTED_TERM_YEARS;
use crate::types::Money;
use crate::RefiResult;

/// Monthly reduction a scenario must reach to be offered.
pub const DEFAULT_MIN_MONTHLY_SAVINGS: Money = dec!(500);

/// Upper bound of the "insufficient savings" band.
pub const DEFAULT_INSUFFICIENT_SAVINGS_CEILING: Money = dec!(1000);

/// Payment cap relative to the current payment when solving the shortest term.
pub const DEFAULT_REASONABLE_PAYMENT_MULTIPLIER: Decimal = dec!(2.5);

/// Regulatory floor for a new mortgage term, in years.
pub const DEFAULT_MIN_TERM_YEARS: u32 = 5;

/// Thresholds governing which scenarios are worth presenting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioPolicy {
    pub min_monthly_savings: Money,
    pub insufficient_savings_ceiling: Money,
    pub reasonable_payment_multiplier: Decimal,
    pub min_term_years: u32,
}

impl Default for ScenarioPolicy {
    fn default() -> Self {
        ScenarioPolicy {
            min_monthly_savings: DEFAULT_MIN_MONTHLY_SAVINGS,
            insufficient_savings_ceiling: DEFAULT_INSUFFICIENT_SAVINGS_CEILING,
            reasonable_payment_multiplier: DEFAULT_REASONABLE_PAYMENT_MULTIPLIER,
            min_term_years: DEFAULT_MIN_TERM_YEARS,
        }
    }
}

impl ScenarioPolicy {
    pub fn validate(&self) -> RefiResult<()> {
        if self.min_monthly_savings < Decimal::ZERO {
            return Err(RefiError::policy("min_monthly_savings", "must be non-negative"));
        }
        if self.insufficient_savings_ceiling < self.min_monthly_savings {
            return Err(RefiError::policy(
                "insufficient_savings_ceiling",
                "must not be below min_monthly_savings",
            ));
        }
        if self.reasonable_payment_multiplier <= Decimal::ZERO {
            return Err(RefiError::policy(
                "reasonable_payment_multiplier",
                "must be greater than zero",
            ));
        }
        if self.min_term_years == 0 || self.min_term_years > MAX_SUPPORTED_TERM_YEARS {
            return Err(RefiError::policy(
                "min_term_years",
                format!("must be between 1 and {MAX_SUPPORTED_TERM_YEARS}"),
            ));
        }
        Ok(())
    }
}
