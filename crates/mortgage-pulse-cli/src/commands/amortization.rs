use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use mortgage_pulse_core::amortization::{
    self, AmortizationYear, MAX_SUPPORTED_TERM_YEARS, NON_AMORTIZING_TERM_YEARS,
};

/// Arguments for the monthly payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate as a decimal (e.g. 0.044 for 4.4%)
    #[arg(long)]
    pub rate: Decimal,

    /// Term in years (fractional allowed)
    #[arg(long)]
    pub years: Decimal,
}

/// Arguments for solving the term that a payment implies
#[derive(Args)]
pub struct TermArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate as a decimal
    #[arg(long)]
    pub rate: Decimal,

    /// Monthly payment
    #[arg(long)]
    pub payment: Decimal,
}

/// Arguments for a yearly amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate as a decimal
    #[arg(long)]
    pub rate: Decimal,

    /// Term in whole years
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_SUPPORTED_TERM_YEARS as i64))]
    pub years: u32,
}

#[derive(Debug, Serialize)]
struct PaymentOutput {
    monthly_payment: Decimal,
    monthly_payment_rounded: Decimal,
    total_interest: Decimal,
    principal: Decimal,
    annual_rate: Decimal,
    term_years: Decimal,
}

#[derive(Debug, Serialize)]
struct TermOutput {
    term_years: Decimal,
    term_months: Decimal,
    amortizing: bool,
}

#[derive(Debug, Serialize)]
struct ScheduleOutput {
    monthly_payment: Decimal,
    total_interest: Decimal,
    schedule: Vec<AmortizationYear>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    amortization::check_annual_rate("rate", args.rate)?;
    let pmt = amortization::monthly_payment(args.principal, args.rate, args.years);
    let output = PaymentOutput {
        monthly_payment: pmt,
        monthly_payment_rounded: amortization::round_currency(pmt),
        total_interest: amortization::round_currency(amortization::total_interest(
            args.principal,
            args.rate,
            args.years,
        )),
        principal: args.principal,
        annual_rate: args.rate,
        term_years: args.years,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_term(args: TermArgs) -> Result<Value, Box<dyn std::error::Error>> {
    amortization::check_annual_rate("rate", args.rate)?;
    let years = amortization::term_years_for_payment(args.principal, args.rate, args.payment);
    let amortizing = years < NON_AMORTIZING_TERM_YEARS;
    let output = TermOutput {
        term_years: years.round_dp(4),
        term_months: (years * Decimal::from(12)).round_dp(2),
        amortizing,
    };
    if !amortizing {
        tracing::warn!(payment = %args.payment, "payment does not cover monthly interest");
    }
    Ok(serde_json::to_value(output)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    amortization::check_annual_rate("rate", args.rate)?;
    let term = Decimal::from(args.years);
    let schedule = amortization::amortization_schedule(args.principal, args.rate, args.years)?
        .into_iter()
        .map(|y| AmortizationYear {
            opening_balance: amortization::round_currency(y.opening_balance),
            principal_paid: amortization::round_currency(y.principal_paid),
            interest_paid: amortization::round_currency(y.interest_paid),
            closing_balance: amortization::round_currency(y.closing_balance),
            ..y
        })
        .collect();
    let output = ScheduleOutput {
        monthly_payment: amortization::round_currency(amortization::monthly_payment(
            args.principal,
            args.rate,
            term,
        )),
        total_interest: amortization::round_currency(amortization::total_interest(
            args.principal,
            args.rate,
            term,
        )),
        schedule,
    };
    Ok(serde_json::to_value(output)?)
}
