use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use mortgage_pulse_core::market::RefinanceRequest;
use mortgage_pulse_core::refinance::rate_blend;
use mortgage_pulse_core::refinance::regulatory::{self, ValidationInput};
use mortgage_pulse_core::refinance::scenarios;
use mortgage_pulse_core::refinance::term_range::{self, TermRangeInput};
use mortgage_pulse_core::{LoanParameters, Money};

use crate::input;

/// Arguments for blending loan rates
#[derive(Args)]
pub struct BlendArgs {
    /// Path to JSON file with balances, rate table and distribution
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for regulatory validation of a candidate loan
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON file with the full validation request
    #[arg(long, conflicts_with = "market")]
    pub input: Option<String>,

    /// Market parameter file (JSON or YAML) supplying the constraints
    #[arg(long, requires_all = ["principal", "payment", "years"])]
    pub market: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Proposed monthly payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Proposed term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Borrower age in whole years
    #[arg(long)]
    pub age: Option<u32>,

    /// Property value securing the loan
    #[arg(long)]
    pub property_value: Option<Decimal>,
}

/// Arguments for the admissible term window
#[derive(Args)]
pub struct RangeArgs {
    /// Path to JSON file with principal, rate, current payment and policy
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for refinancing scenario generation
#[derive(Args)]
pub struct ScenariosArgs {
    /// Market parameter file (JSON or YAML)
    #[arg(long)]
    pub market: String,

    /// Path to JSON file with the household's request (or pipe via stdin)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
struct BlendOutput {
    mortgage_rate: Decimal,
    effective_rate: Decimal,
    distribution_total: Decimal,
    total_amount: Money,
}

pub fn run_blend(args: BlendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loans: LoanParameters = input::load(args.input.as_deref(), "rate blending")?;
    let output = BlendOutput {
        mortgage_rate: rate_blend::weighted_rate(&loans.rates.mortgage_rates, &loans.rates.distribution)?,
        effective_rate: rate_blend::effective_rate(&loans)?,
        distribution_total: rate_blend::distribution_total(&loans.rates.distribution),
        total_amount: loans.total_amount(),
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match args.market {
        Some(ref path) => {
            let market = input::file::read_market(path)?;
            ValidationInput {
                principal: args.principal.ok_or("--principal is required with --market")?,
                monthly_payment: args.payment.ok_or("--payment is required with --market")?,
                term_years: args.years.ok_or("--years is required with --market")?,
                age: args.age,
                property_value: args.property_value,
                constraints: market.constraints,
            }
        }
        None => input::load(args.input.as_deref(), "regulatory validation")?,
    };
    let result = regulatory::validate_terms(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_range(args: RangeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: TermRangeInput = input::load(args.input.as_deref(), "term range analysis")?;
    let result = term_range::analyze_term_range(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let market = input::file::read_market(&args.market)?;
    let request: RefinanceRequest = input::load(args.input.as_deref(), "scenario generation")?;
    let result = scenarios::generate_scenarios(&market.scenario_input(&request))?;
    tracing::info!(
        special_case = ?result.result.special_case,
        scenarios = result.result.scenarios.len(),
        "generated refinancing scenarios"
    );
    Ok(serde_json::to_value(result)?)
}
