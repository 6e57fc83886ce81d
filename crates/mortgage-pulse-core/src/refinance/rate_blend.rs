//! Effective interest rate for a mix of loan categories and pools.

use rust_decimal::Decimal;

use crate::amortization::MAX_ANNUAL_RATE;
use crate::error::RefiError;
use crate::types::{Distribution, LoanParameters, Money, Rate, RateTable};
use crate::RefiResult;

/// Σ rate_i × fraction_i over the categories of `distribution`.
///
/// Fractions are expected to sum to 1 but this is not enforced. A weighted
/// category with no entry in `rates`, or whose rate is not a fraction in
/// `[0, MAX_ANNUAL_RATE]`, is an unconfigured policy.
pub fn weighted_rate(rates: &RateTable, distribution: &Distribution) -> RefiResult<Rate> {
    distribution
        .iter()
        .try_fold(Decimal::ZERO, |acc, (category, fraction)| {
            let rate = rates.get(category).ok_or_else(|| {
                RefiError::policy(
                    "mortgage_rates",
                    format!("no rate configured for category '{category}'"),
                )
            })?;
            check_policy_rate("mortgage_rates", category, *rate)?;
            Ok(acc + rate * fraction)
        })
}

/// Policy-side rate bound shared with market snapshot validation.
pub(crate) fn check_policy_rate(field: &str, label: &str, rate: Rate) -> RefiResult<()> {
    if rate.is_sign_negative() || rate > MAX_ANNUAL_RATE {
        return Err(RefiError::policy(
            field,
            format!("rate {rate} for '{label}' must be a fraction between 0 and {MAX_ANNUAL_RATE}"),
        ));
    }
    Ok(())
}

/// Principal-weighted average of two pools. Falls back to `rate_a` when the
/// combined principal is zero.
pub fn blended_portfolio_rate(principal_a: Money, rate_a: Rate, principal_b: Money, rate_b: Rate) -> Rate {
    let total = principal_a + principal_b;
    if total.is_zero() {
        return rate_a;
    }
    (principal_a * rate_a + principal_b * rate_b) / total
}

/// Sum of all distribution weights.
pub fn distribution_total(distribution: &Distribution) -> Decimal {
    distribution.values().copied().sum()
}

/// Rate for the whole refinanced amount: the distribution-weighted mortgage
/// rate for the primary balance blended with the other-loans rate.
pub fn effective_rate(loans: &LoanParameters) -> RefiResult<Rate> {
    let mortgage_rate = weighted_rate(&loans.rates.mortgage_rates, &loans.rates.distribution)?;
    check_policy_rate("other_loans_rate", "other loans", loans.rates.other_loans_rate)?;
    Ok(blended_portfolio_rate(
        loans.primary_balance.max(Decimal::ZERO),
        mortgage_rate,
        loans.other_loans_balance.max(Decimal::ZERO),
        loans.rates.other_loans_rate,
    ))
}
