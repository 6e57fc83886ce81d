//! Admissible term window for a refinancing.
//!
//! The lower bound is solved in closed form from the payment cap; everything
//! that has to respect regulatory clamping is a bounded ascending scan over
//! whole years. Payment falls monotonically with term, so the first hit of a
//! scan is the shortest qualifying term. Scans never pass the policy/age
//! limit, even when the reported window has been widened to keep
//! `min_years <= max_years`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::amortization::{monthly_payment, term_years_for_payment};
use crate::error::RefiError;
use crate::refinance::regulatory::ConstraintSet;
use crate::refinance::policy::ScenarioPolicy;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RefiResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inclusive whole-year window. `min_years <= max_years` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRange {
    pub min_years: u32,
    pub max_years: u32,
    /// Policy/age limit before clamping against `min_years`.
    pub absolute_max_years: u32,
}

impl TermRange {
    pub fn years(&self) -> impl Iterator<Item = u32> {
        self.min_years..=self.max_years
    }

    /// Terms a loan may actually be written for: `[min_years, absolute_max_years]`.
    /// Empty when the limit sits below the minimum workable term.
    pub fn admissible_years(&self) -> impl Iterator<Item = u32> {
        self.min_years..=self.absolute_max_years
    }

    pub fn has_admissible_terms(&self) -> bool {
        self.min_years <= self.absolute_max_years
    }

    /// True when the window had to be widened past the regulatory limit.
    pub fn exceeds_regulatory_limit(&self) -> bool {
        self.max_years > self.absolute_max_years
    }
}

/// Payment at one whole-year term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermPoint {
    pub years: u32,
    pub monthly_payment: Money,
}

/// Serializable request for [`analyze_term_range`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermRangeInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub current_monthly_payment: Money,
    #[serde(default)]
    pub age: Option<u32>,
    pub constraints: ConstraintSet,
    pub policy: ScenarioPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermRangeOutput {
    pub range: TermRange,
    /// Shortest term with a payment strictly below the current one.
    pub shortest_improving_term: Option<u32>,
    pub payment_curve: Vec<TermPoint>,
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Longest term allowed by policy and, when known, the borrower's age.
pub fn absolute_max_years(constraints: &ConstraintSet, age: Option<u32>) -> u32 {
    let by_age = age.map_or(constraints.max_term_years, |age| {
        constraints.max_borrower_age.saturating_sub(age)
    });
    constraints.max_term_years.min(by_age)
}

/// Derive the term window for refinancing `principal` at `annual_rate`.
///
/// `min_years` is the shortest term whose payment stays within
/// `current_payment × reasonable_payment_multiplier`, never below the
/// policy floor. When that cap cannot be met inside the window, `min_years`
/// sits at the top of it.
pub fn solve_term_range(
    principal: Money,
    annual_rate: Rate,
    current_payment: Money,
    age: Option<u32>,
    constraints: &ConstraintSet,
    policy: &ScenarioPolicy,
) -> TermRange {
    let absolute_max = absolute_max_years(constraints, age);
    let floor = policy.min_term_years;
    let window_top = absolute_max.max(floor);

    let payment_cap = current_payment * policy.reasonable_payment_multiplier;
    // Trim decimal noise so an exact whole-year solution does not ceil up.
    let solved = term_years_for_payment(principal, annual_rate, payment_cap)
        .round_dp(6)
        .ceil();

    let min_years = if solved >= Decimal::from(window_top) {
        window_top
    } else {
        solved.to_u32().unwrap_or(window_top).max(floor)
    };

    let range = TermRange {
        min_years,
        max_years: absolute_max.max(min_years),
        absolute_max_years: absolute_max,
    };
    debug!(
        min_years = range.min_years,
        max_years = range.max_years,
        absolute_max_years = range.absolute_max_years,
        "solved term range"
    );
    range
}

/// First admissible year (ascending) satisfying `predicate`, or `None` when
/// no year up to `absolute_max_years` does.
pub fn first_term_where<F>(range: &TermRange, mut predicate: F) -> Option<u32>
where
    F: FnMut(u32) -> bool,
{
    range.admissible_years().find(|&years| predicate(years))
}

/// Shortest term whose payment is strictly below `current_payment`.
pub fn shortest_improving_term(
    principal: Money,
    annual_rate: Rate,
    current_payment: Money,
    range: &TermRange,
) -> Option<u32> {
    first_term_where(range, |years| {
        monthly_payment(principal, annual_rate, Decimal::from(years)) < current_payment
    })
}

/// Payment at every whole year of the window.
pub fn payment_curve(principal: Money, annual_rate: Rate, range: &TermRange) -> Vec<TermPoint> {
    range
        .years()
        .map(|years| TermPoint {
            years,
            monthly_payment: monthly_payment(principal, annual_rate, Decimal::from(years)),
        })
        .collect()
}

/// Term window, shortest improving term and payment curve for a request.
pub fn analyze_term_range(input: &TermRangeInput) -> RefiResult<ComputationOutput<TermRangeOutput>> {
    let start = Instant::now();
    input.constraints.validate()?;
    input.policy.validate()?;
    if input.principal < Decimal::ZERO {
        return Err(RefiError::input("principal", "must be non-negative"));
    }

    let mut warnings: Vec<String> = Vec::new();
    let range = solve_term_range(
        input.principal,
        input.annual_rate,
        input.current_monthly_payment,
        input.age,
        &input.constraints,
        &input.policy,
    );
    if range.exceeds_regulatory_limit() {
        warnings.push(format!(
            "Regulatory limit of {} years is below the minimum workable term of {} years",
            range.absolute_max_years, range.min_years
        ));
    }

    let shortest = shortest_improving_term(
        input.principal,
        input.annual_rate,
        input.current_monthly_payment,
        &range,
    );
    if shortest.is_none() {
        warnings.push("No term in the window lowers the current payment".to_string());
    }

    let output = TermRangeOutput {
        range,
        shortest_improving_term: shortest,
        payment_curve: payment_curve(input.principal, input.annual_rate, &range),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Closed-form minimum term with bounded whole-year scan",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
