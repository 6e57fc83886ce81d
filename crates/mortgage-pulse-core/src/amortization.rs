//! Level-payment amortization: the PMT formula, its logarithmic inverse and
//! yearly schedules. Nothing here rounds; use [`round_currency`] at the
//! presentation boundary only.

use rust_decimal::MathematicalOps;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::types::{Money, Rate, Years};
use crate::RefiResult;

/// Term reported when a payment never retires the principal.
pub const NON_AMORTIZING_TERM_YEARS: Years = dec!(999);

/// Longest term any policy may allow. Bounds every term scan and schedule.
pub const MAX_SUPPORTED_TERM_YEARS: u32 = 50;

/// Largest annual rate accepted as a fraction; anything above is almost
/// certainly a percentage (4.4 rather than 0.044).
pub const MAX_ANNUAL_RATE: Rate = dec!(1);

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Balance below which a schedule treats the loan as repaid.
const BALANCE_EPSILON: Decimal = dec!(0.000001);

/// One year of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub opening_balance: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub closing_balance: Money,
}

/// Monthly payment for a fully amortizing loan.
///
/// Returns `principal / months` for a zero rate and `0` for a non-positive
/// principal or term. Non-positive rates are treated as zero.
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_years: Years) -> Money {
    if principal <= Decimal::ZERO || term_years <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let months = term_years * MONTHS_PER_YEAR;
    if annual_rate <= Decimal::ZERO {
        return principal / months;
    }

    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    // 1 - (1 + r)^-n. Growth past the Decimal range discounts to nothing.
    let annuity_factor = match (Decimal::ONE + monthly_rate).checked_powd(months) {
        Some(growth) if growth > Decimal::ONE => Decimal::ONE - Decimal::ONE / growth,
        Some(_) => return principal / months,
        None => Decimal::ONE,
    };

    principal * monthly_rate / annuity_factor
}

/// Reject a rate outside `[0, MAX_ANNUAL_RATE]`.
pub fn check_annual_rate(field: &str, annual_rate: Rate) -> RefiResult<()> {
    if annual_rate.is_sign_negative() || annual_rate > MAX_ANNUAL_RATE {
        return Err(RefiError::input(
            field,
            format!("{annual_rate} is not an annual rate between 0 and {MAX_ANNUAL_RATE}"),
        ));
    }
    Ok(())
}

/// Term in (fractional) years after which `monthly_payment` retires
/// `principal`.
///
/// n = -ln(1 - P·r / M) / ln(1 + r), in months. A payment that does not
/// cover the first month's interest yields [`NON_AMORTIZING_TERM_YEARS`].
pub fn term_years_for_payment(principal: Money, annual_rate: Rate, monthly_payment: Money) -> Years {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if monthly_payment <= Decimal::ZERO {
        return NON_AMORTIZING_TERM_YEARS;
    }
    if annual_rate <= Decimal::ZERO {
        return (principal / monthly_payment / MONTHS_PER_YEAR).min(NON_AMORTIZING_TERM_YEARS);
    }

    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let interest = principal * annual_rate / MONTHS_PER_YEAR;
    if monthly_payment <= interest {
        return NON_AMORTIZING_TERM_YEARS;
    }

    let months = -(Decimal::ONE - interest / monthly_payment).ln() / (Decimal::ONE + monthly_rate).ln();
    (months / MONTHS_PER_YEAR).min(NON_AMORTIZING_TERM_YEARS)
}

/// Interest paid over the life of the loan.
pub fn total_interest(principal: Money, annual_rate: Rate, term_years: Years) -> Money {
    let payment = monthly_payment(principal, annual_rate, term_years);
    if payment.is_zero() {
        return Decimal::ZERO;
    }
    (payment * term_years * MONTHS_PER_YEAR - principal).max(Decimal::ZERO)
}

/// Year-by-year schedule for a whole-year term of at most
/// [`MAX_SUPPORTED_TERM_YEARS`].
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
) -> RefiResult<Vec<AmortizationYear>> {
    if term_years > MAX_SUPPORTED_TERM_YEARS {
        return Err(RefiError::input(
            "term_years",
            format!("must not exceed {MAX_SUPPORTED_TERM_YEARS}"),
        ));
    }
    let payment = monthly_payment(principal, annual_rate, Decimal::from(term_years));
    if payment.is_zero() {
        return Ok(Vec::new());
    }

    let monthly_rate = annual_rate.max(Decimal::ZERO) / MONTHS_PER_YEAR;
    let mut balance = principal;
    let mut schedule = Vec::with_capacity(term_years as usize);

    for year in 1..=term_years {
        let opening_balance = balance;
        let mut principal_paid = Decimal::ZERO;
        let mut interest_paid = Decimal::ZERO;

        for _ in 0..12 {
            if balance < BALANCE_EPSILON {
                break;
            }
            let interest = balance * monthly_rate;
            let scheduled = (payment - interest).min(balance).max(Decimal::ZERO);
            interest_paid += interest;
            principal_paid += scheduled;
            balance -= scheduled;
        }

        // Residual from decimal division on the final month.
        if year == term_years {
            principal_paid += balance;
            balance = Decimal::ZERO;
        }

        schedule.push(AmortizationYear {
            year,
            opening_balance,
            principal_paid,
            interest_paid,
            closing_balance: balance,
        });
    }

    Ok(schedule)
}

/// Round to currency units (2dp, midpoint away from zero).
pub fn round_currency(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
