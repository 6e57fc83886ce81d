//! Refinancing scenario search.
//!
//! Produces up to three (term, payment) recommendations for the balances a
//! household wants to consolidate, or a special-case tag when no term in the
//! admissible window saves enough to be worth presenting.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::amortization::monthly_payment;
use crate::error::RefiError;
use crate::refinance::policy::ScenarioPolicy;
use crate::refinance::rate_blend::{distribution_total, effective_rate};
use crate::refinance::regulatory::{validate, ConstraintSet, ValidationResult};
use crate::refinance::term_range::{first_term_where, solve_term_range, TermRange};
use crate::types::{with_metadata, BorrowerProfile, ComputationOutput, LoanParameters, Money, Rate};
use crate::RefiResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Tolerance before a distribution is reported as not summing to 1.
const DISTRIBUTION_TOLERANCE: Decimal = dec!(0.0001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Minimum,
    Middle,
    Maximum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialCase {
    None,
    /// Some saving exists but stays below the presentation threshold.
    InsufficientSavings,
    /// No term in the window lowers the current payment.
    NoMortgageSavings,
    /// The policy/age limit leaves no term at or above the minimum workable one.
    NoEligibleTerm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub kind: ScenarioKind,
    pub years: u32,
    pub monthly_payment: Money,
    /// Current payment minus the new one.
    pub monthly_reduction: Money,
    /// Monthly reduction sustained over the whole new term.
    pub total_savings: Money,
    pub is_valid: bool,
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub scenarios: Vec<ScenarioResult>,
    pub has_valid_scenarios: bool,
    pub special_case: SpecialCase,
    pub total_amount: Money,
    pub weighted_rate: Rate,
    pub term_range: TermRange,
}

impl ScenarioSet {
    pub fn scenario(&self, kind: ScenarioKind) -> Option<&ScenarioResult> {
        self.scenarios.iter().find(|s| s.kind == kind)
    }
}

/// Everything one scenario search needs, bound to a single policy snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub loans: LoanParameters,
    #[serde(default)]
    pub borrower: BorrowerProfile,
    /// What the household pays today across all balances being refinanced.
    pub current_monthly_payment: Money,
    pub constraints: ConstraintSet,
    #[serde(default)]
    pub policy: ScenarioPolicy,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Search the term window for refinancing scenarios.
pub fn generate_scenarios(input: &ScenarioInput) -> RefiResult<ComputationOutput<ScenarioSet>> {
    let start = Instant::now();
    input.constraints.validate()?;
    input.policy.validate()?;
    validate_request(input)?;

    let mut warnings: Vec<String> = Vec::new();
    let loans = &input.loans;

    let weight_sum = distribution_total(&loans.rates.distribution);
    if (weight_sum - Decimal::ONE).abs() > DISTRIBUTION_TOLERANCE {
        warnings.push(format!(
            "Distribution weights sum to {} rather than 1",
            weight_sum.normalize()
        ));
    }
    if let Some(lump_sum) = loans.lump_sum_reduction {
        if lump_sum > loans.primary_balance + loans.other_loans_balance {
            warnings.push("Lump sum exceeds the balances being refinanced".to_string());
        }
    }

    let total_amount = loans.total_amount();
    let weighted_rate = effective_rate(loans)?;
    let current = input.current_monthly_payment;
    let range = solve_term_range(
        total_amount,
        weighted_rate,
        current,
        input.borrower.age,
        &input.constraints,
        &input.policy,
    );
    if range.exceeds_regulatory_limit() {
        warnings.push(format!(
            "Regulatory limit of {} years is below the minimum workable term of {} years",
            range.absolute_max_years, range.min_years
        ));
    }

    let reduction_at = |years: u32| current - monthly_payment(total_amount, weighted_rate, Decimal::from(years));
    let min_valid_years = first_term_where(&range, |years| {
        reduction_at(years) >= input.policy.min_monthly_savings
    });

    let set = match min_valid_years {
        None => {
            let best_reduction = reduction_at(range.absolute_max_years);
            let special_case = if range.absolute_max_years == 0 {
                SpecialCase::NoEligibleTerm
            } else {
                classify_shortfall(best_reduction, range.has_admissible_terms(), &input.policy)?
            };
            debug!(
                ?special_case,
                %best_reduction,
                absolute_max_years = range.absolute_max_years,
                "no term reaches the savings threshold"
            );
            ScenarioSet {
                scenarios: Vec::new(),
                has_valid_scenarios: false,
                special_case,
                total_amount,
                weighted_rate,
                term_range: range,
            }
        }
        Some(min_years) => {
            let max_years = range.absolute_max_years;
            let middle_years = (min_years + max_years + 1) / 2;
            debug!(min_years, middle_years, max_years, "building scenarios");

            let scenarios: Vec<ScenarioResult> = [
                (ScenarioKind::Minimum, min_years),
                (ScenarioKind::Middle, middle_years),
                (ScenarioKind::Maximum, max_years),
            ]
            .into_iter()
            .map(|(kind, years)| build_scenario(kind, years, total_amount, weighted_rate, input))
            .collect();

            check_ordering(&scenarios)?;

            let invalid = scenarios.iter().filter(|s| !s.is_valid).count();
            if invalid > 0 {
                warnings.push(format!(
                    "{invalid} of {} scenarios breach regulatory constraints",
                    scenarios.len()
                ));
            }

            ScenarioSet {
                has_valid_scenarios: scenarios.iter().any(|s| s.is_valid),
                scenarios,
                special_case: SpecialCase::None,
                total_amount,
                weighted_rate,
                term_range: range,
            }
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinancing scenario search (bounded term scan with regulatory validation)",
        input,
        warnings,
        elapsed,
        set,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_request(input: &ScenarioInput) -> RefiResult<()> {
    let loans = &input.loans;
    if loans.primary_balance < Decimal::ZERO {
        return Err(RefiError::input("primary_balance", "must be non-negative"));
    }
    if loans.other_loans_balance < Decimal::ZERO {
        return Err(RefiError::input("other_loans_balance", "must be non-negative"));
    }
    if loans.lump_sum_reduction.is_some_and(|l| l < Decimal::ZERO) {
        return Err(RefiError::input("lump_sum_reduction", "must be non-negative"));
    }
    if input.current_monthly_payment < Decimal::ZERO {
        return Err(RefiError::input("current_monthly_payment", "must be non-negative"));
    }
    Ok(())
}

/// Tag for a window in which no term reaches `min_monthly_savings`.
/// `best_reduction` is taken at the longest admissible term.
fn classify_shortfall(
    best_reduction: Money,
    scanned: bool,
    policy: &ScenarioPolicy,
) -> RefiResult<SpecialCase> {
    if best_reduction <= Decimal::ZERO {
        Ok(SpecialCase::NoMortgageSavings)
    } else if best_reduction < policy.insufficient_savings_ceiling {
        Ok(SpecialCase::InsufficientSavings)
    } else if !scanned {
        Ok(SpecialCase::NoEligibleTerm)
    } else {
        Err(RefiError::InvariantViolation(format!(
            "reduction of {best_reduction} missed by the savings scan"
        )))
    }
}

/// Single constructor for every scenario so each one is validated.
fn build_scenario(
    kind: ScenarioKind,
    years: u32,
    total_amount: Money,
    weighted_rate: Rate,
    input: &ScenarioInput,
) -> ScenarioResult {
    let term = Decimal::from(years);
    let payment = monthly_payment(total_amount, weighted_rate, term);
    let monthly_reduction = input.current_monthly_payment - payment;
    let validation = validate(
        total_amount,
        payment,
        term,
        input.borrower.age,
        input.borrower.property_value,
        &input.constraints,
    );

    ScenarioResult {
        kind,
        years,
        monthly_payment: payment,
        monthly_reduction,
        total_savings: monthly_reduction * dec!(12) * term,
        is_valid: validation.is_valid,
        validation,
    }
}

fn check_ordering(scenarios: &[ScenarioResult]) -> RefiResult<()> {
    let ordered = scenarios.windows(2).all(|pair| pair[0].years <= pair[1].years);
    debug_assert!(ordered, "scenario terms out of order");
    if !ordered {
        let terms: Vec<u32> = scenarios.iter().map(|s| s.years).collect();
        return Err(RefiError::InvariantViolation(format!(
            "scenario terms out of order: {terms:?}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refinance::regulatory::Violation;
    use crate::types::{Distribution, LoanRates, RateTable};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn flat_rates(rate: Rate) -> LoanRates {
        LoanRates {
            mortgage_rates: RateTable::from([("fixed".to_string(), rate)]),
            distribution: Distribution::from([("fixed".to_string(), Decimal::ONE)]),
            other_loans_rate: rate,
        }
    }

    fn standard_input(current_payment: Money) -> ScenarioInput {
        ScenarioInput {
            loans: LoanParameters {
                primary_balance: dec!(300_000),
                other_loans_balance: Decimal::ZERO,
                lump_sum_reduction: None,
                rates: flat_rates(dec!(0.04)),
            },
            borrower: BorrowerProfile::default(),
            current_monthly_payment: current_payment,
            constraints: ConstraintSet {
                max_term_years: 30,
                max_borrower_age: 75,
                max_ltv: dec!(0.75),
                min_monthly_payment: dec!(1000),
            },
            policy: ScenarioPolicy::default(),
        }
    }

    fn years_of(set: &ScenarioSet) -> Vec<u32> {
        set.scenarios.iter().map(|s| s.years).collect()
    }

    #[test]
    fn test_three_valid_scenarios() {
        let out = generate_scenarios(&standard_input(dec!(3000))).unwrap();
        let set = out.result;
        assert_eq!(set.special_case, SpecialCase::None);
        assert!(set.has_valid_scenarios);
        // 13y is the first term saving 500+/month; middle rounds 21.5 up
        assert_eq!(years_of(&set), vec![13, 22, 30]);
        assert!(set.scenarios.iter().all(|s| s.is_valid));
        assert!(out.warnings.is_empty());

        let max = set.scenario(ScenarioKind::Maximum).unwrap();
        assert!((max.monthly_payment - dec!(1432.25)).abs() < dec!(0.05));
        assert_eq!(max.total_savings, max.monthly_reduction * dec!(360));
    }

    #[test]
    fn test_reductions_follow_term_order() {
        let set = generate_scenarios(&standard_input(dec!(3000))).unwrap().result;
        let reductions: Vec<Money> = set.scenarios.iter().map(|s| s.monthly_reduction).collect();
        assert!(reductions[0] <= reductions[1] && reductions[1] <= reductions[2]);
        assert!(reductions[0] >= dec!(500));
    }

    #[test]
    fn test_insufficient_savings() {
        // Best case is 1900 - 1432 ≈ 468/month
        let set = generate_scenarios(&standard_input(dec!(1900))).unwrap().result;
        assert_eq!(set.special_case, SpecialCase::InsufficientSavings);
        assert!(set.scenarios.is_empty());
        assert!(!set.has_valid_scenarios);
    }

    #[test]
    fn test_no_mortgage_savings() {
        let set = generate_scenarios(&standard_input(dec!(1400))).unwrap().result;
        assert_eq!(set.special_case, SpecialCase::NoMortgageSavings);
        assert!(set.scenarios.is_empty());
    }

    #[test]
    fn test_age_shortens_window() {
        let mut input = standard_input(dec!(3000));
        input.borrower.age = Some(60);
        let set = generate_scenarios(&input).unwrap().result;
        assert_eq!(years_of(&set), vec![13, 14, 15]);
        assert!(set.scenarios.iter().all(|s| s.is_valid));
    }

    #[test]
    fn test_age_limit_below_floor_yields_no_scenarios() {
        // Max age 75 at 72 leaves 3 years; best case 9000 - 8857 ≈ 143/month
        let mut input = standard_input(dec!(9000));
        input.borrower.age = Some(72);
        let out = generate_scenarios(&input).unwrap();
        let set = &out.result;

        assert_eq!(set.term_range.absolute_max_years, 3);
        assert_eq!(set.special_case, SpecialCase::InsufficientSavings);
        assert!(set.scenarios.is_empty());
        assert!(!set.has_valid_scenarios);
        assert!(out.warnings.iter().any(|w| w.contains("below the minimum workable term")));
    }

    #[test]
    fn test_age_limit_below_floor_with_large_saving_has_no_eligible_term() {
        let mut input = standard_input(dec!(20_000));
        input.borrower.age = Some(72);
        let set = generate_scenarios(&input).unwrap().result;
        assert_eq!(set.special_case, SpecialCase::NoEligibleTerm);
        assert!(set.scenarios.is_empty());
    }

    #[test]
    fn test_borrower_at_max_age_has_no_eligible_term() {
        let mut input = standard_input(dec!(3000));
        input.borrower.age = Some(75);
        let set = generate_scenarios(&input).unwrap().result;
        assert_eq!(set.term_range.absolute_max_years, 0);
        assert_eq!(set.special_case, SpecialCase::NoEligibleTerm);
    }

    #[test]
    fn test_invalid_scenarios_are_kept_with_reasons() {
        let mut input = standard_input(dec!(3000));
        input.constraints.min_monthly_payment = dec!(2000);
        let out = generate_scenarios(&input).unwrap();
        let set = &out.result;

        assert!(set.has_valid_scenarios);
        assert!(set.scenario(ScenarioKind::Minimum).unwrap().is_valid);
        let max = set.scenario(ScenarioKind::Maximum).unwrap();
        assert!(!max.is_valid);
        assert!(matches!(
            max.validation.violations[0],
            Violation::PaymentBelowMinimum { .. }
        ));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_ltv_breach_invalidates_every_scenario() {
        let mut input = standard_input(dec!(3000));
        input.borrower.property_value = Some(dec!(350_000));
        let set = generate_scenarios(&input).unwrap().result;
        assert_eq!(set.scenarios.len(), 3);
        assert!(!set.has_valid_scenarios);
    }

    #[test]
    fn test_lump_sum_reduces_amount() {
        let mut input = standard_input(dec!(3000));
        input.loans.lump_sum_reduction = Some(dec!(100_000));
        let set = generate_scenarios(&input).unwrap().result;
        assert_eq!(set.total_amount, dec!(200_000));
        assert_eq!(set.scenario(ScenarioKind::Minimum).unwrap().years, 8);
    }

    #[test]
    fn test_blends_other_loans() {
        let mut input = standard_input(dec!(3000));
        input.loans.other_loans_balance = dec!(100_000);
        input.loans.rates.other_loans_rate = dec!(0.08);
        let set = generate_scenarios(&input).unwrap().result;
        assert_eq!(set.total_amount, dec!(400_000));
        assert_eq!(set.weighted_rate, dec!(0.05));
    }

    #[test]
    fn test_distribution_warning() {
        let mut input = standard_input(dec!(3000));
        input.loans.rates.distribution = Distribution::from([("fixed".to_string(), dec!(0.9))]);
        let out = generate_scenarios(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("0.9")));
    }

    #[test]
    fn test_rejects_negative_balance() {
        let mut input = standard_input(dec!(3000));
        input.loans.primary_balance = dec!(-1);
        assert!(matches!(
            generate_scenarios(&input),
            Err(RefiError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_savings_thresholds() {
        let mut input = standard_input(dec!(3000));
        input.policy.min_monthly_savings = dec!(1500);
        assert!(matches!(
            generate_scenarios(&input),
            Err(RefiError::UnconfiguredPolicy { .. })
        ));
    }

    #[test]
    fn test_special_case_serializes_kebab_case() {
        let json = serde_json::to_string(&SpecialCase::InsufficientSavings).unwrap();
        assert_eq!(json, "\"insufficient-savings\"");
        let json = serde_json::to_string(&SpecialCase::NoEligibleTerm).unwrap();
        assert_eq!(json, "\"no-eligible-term\"");
        let json = serde_json::to_string(&ScenarioKind::Middle).unwrap();
        assert_eq!(json, "\"middle\"");
    }
}
