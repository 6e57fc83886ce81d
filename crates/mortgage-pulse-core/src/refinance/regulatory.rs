//! Regulatory checks for a proposed (principal, payment, term).
//!
//! Every rule is evaluated independently and every breach is reported, so a
//! caller can still present an invalid scenario together with its reasons.
//! Breaches are data; only a malformed [`ConstraintSet`] is an error.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub use crate::amortization::MAX_SUPPORTED_TERM_YEARS;

use crate::error::RefiError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Years};
use crate::RefiResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lending policy supplied with the current market parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Longest term a new mortgage may run, in years.
    pub max_term_years: u32,
    /// Age the borrower may reach by the end of the term.
    pub max_borrower_age: u32,
    /// Maximum loan-to-value ratio (e.g. 0.75 = 75%).
    pub max_ltv: Rate,
    /// Smallest monthly payment a lender will accept.
    pub min_monthly_payment: Money,
}

impl ConstraintSet {
    /// Reject policies that would make every check meaningless.
    pub fn validate(&self) -> RefiResult<()> {
        if self.max_term_years == 0 || self.max_term_years > MAX_SUPPORTED_TERM_YEARS {
            return Err(RefiError::policy(
                "max_term_years",
                format!("must be between 1 and {MAX_SUPPORTED_TERM_YEARS}"),
            ));
        }
        if self.max_borrower_age == 0 {
            return Err(RefiError::policy("max_borrower_age", "must be greater than zero"));
        }
        if self.max_ltv <= Decimal::ZERO {
            return Err(RefiError::policy("max_ltv", "must be greater than zero"));
        }
        if self.min_monthly_payment < Decimal::ZERO {
            return Err(RefiError::policy("min_monthly_payment", "must be non-negative"));
        }
        Ok(())
    }
}

/// A single breached rule with the values that breached it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    TermExceedsMax {
        max_term_years: u32,
        term_years: Years,
    },
    TermExceedsAgeLimit {
        max_borrower_age: u32,
        age: u32,
        allowed_years: i64,
        term_years: Years,
    },
    PaymentBelowMinimum {
        min_monthly_payment: Money,
        monthly_payment: Money,
    },
    LtvExceedsMax {
        max_ltv: Rate,
        ltv: Rate,
    },
    PropertyValueNotPositive {
        property_value: Money,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::TermExceedsMax {
                max_term_years,
                term_years,
            } => write!(
                f,
                "Term of {} years exceeds the maximum of {} years",
                term_years.normalize(),
                max_term_years
            ),
            Violation::TermExceedsAgeLimit {
                max_borrower_age,
                age,
                allowed_years,
                term_years,
            } => write!(
                f,
                "Term of {} years would run past age {} (borrower is {}, at most {} years allowed)",
                term_years.normalize(),
                max_borrower_age,
                age,
                (*allowed_years).max(0)
            ),
            Violation::PaymentBelowMinimum {
                min_monthly_payment,
                monthly_payment,
            } => write!(
                f,
                "Monthly payment of {} is below the minimum of {}",
                monthly_payment.round_dp(2),
                min_monthly_payment.round_dp(2)
            ),
            Violation::LtvExceedsMax { max_ltv, ltv } => write!(
                f,
                "Loan-to-value of {}% exceeds the maximum of {}%",
                (ltv * dec!(100)).round_dp(1),
                (max_ltv * dec!(100)).round_dp(1)
            ),
            Violation::PropertyValueNotPositive { property_value } => write!(
                f,
                "Property value of {} cannot secure the loan",
                property_value.round_dp(2)
            ),
        }
    }
}

/// Outcome of checking one candidate against a [`ConstraintSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Every breached rule, in check order.
    pub violations: Vec<Violation>,
    /// Longest term policy and age allow. Absent when no term is possible.
    pub max_allowed_term: Option<i64>,
}

impl ValidationResult {
    /// Plain-text rendering of each violation.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

/// Serializable request for [`validate_terms`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationInput {
    pub principal: Money,
    pub monthly_payment: Money,
    pub term_years: Years,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub property_value: Option<Money>,
    pub constraints: ConstraintSet,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check a candidate against every rule in `constraints`.
pub fn validate(
    principal: Money,
    monthly_payment: Money,
    term_years: Years,
    age: Option<u32>,
    property_value: Option<Money>,
    constraints: &ConstraintSet,
) -> ValidationResult {
    let mut violations = Vec::new();
    let mut max_allowed_term = i64::from(constraints.max_term_years);

    if term_years > Decimal::from(constraints.max_term_years) {
        violations.push(Violation::TermExceedsMax {
            max_term_years: constraints.max_term_years,
            term_years,
        });
    }

    if let Some(age) = age {
        let allowed_by_age = i64::from(constraints.max_borrower_age) - i64::from(age);
        if Decimal::from(allowed_by_age) < term_years {
            violations.push(Violation::TermExceedsAgeLimit {
                max_borrower_age: constraints.max_borrower_age,
                age,
                allowed_years: allowed_by_age,
                term_years,
            });
        }
        max_allowed_term = max_allowed_term.min(allowed_by_age);
    }

    if monthly_payment < constraints.min_monthly_payment {
        violations.push(Violation::PaymentBelowMinimum {
            min_monthly_payment: constraints.min_monthly_payment,
            monthly_payment,
        });
    }

    if let Some(property_value) = property_value {
        if principal > Decimal::ZERO {
            if property_value <= Decimal::ZERO {
                violations.push(Violation::PropertyValueNotPositive { property_value });
            } else {
                let ltv = principal / property_value;
                if ltv > constraints.max_ltv {
                    violations.push(Violation::LtvExceedsMax {
                        max_ltv: constraints.max_ltv,
                        ltv,
                    });
                }
            }
        }
    }

    ValidationResult {
        is_valid: violations.is_empty(),
        violations,
        max_allowed_term: (max_allowed_term > 0).then_some(max_allowed_term),
    }
}

/// Validate a serialized request, wrapping the result in the standard
/// output envelope.
pub fn validate_terms(input: &ValidationInput) -> RefiResult<ComputationOutput<ValidationResult>> {
    let start = Instant::now();
    input.constraints.validate()?;

    let result = validate(
        input.principal,
        input.monthly_payment,
        input.term_years,
        input.age,
        input.property_value,
        &input.constraints,
    );
    let warnings = result.messages();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Regulatory constraint check (term, borrower age, minimum payment, LTV)",
        input,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
