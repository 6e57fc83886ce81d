use std::sync::OnceLock;

use mortgage_pulse_core::amortization;
use mortgage_pulse_core::market::{MarketFeed, MarketParameters, RefinanceRequest};
use mortgage_pulse_core::refinance::{regulatory, scenarios, term_range};
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Serialize;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    value
        .parse::<Decimal>()
        .map_err(|e| to_napi_error(format!("{field}: {e}")))
}

fn parse_rate(field: &str, value: &str) -> NapiResult<Decimal> {
    let rate = parse_decimal(field, value)?;
    amortization::check_annual_rate(field, rate).map_err(to_napi_error)?;
    Ok(rate)
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PaymentResult {
    monthly_payment: Decimal,
    monthly_payment_rounded: Decimal,
}

/// Decimal arguments travel as strings so no precision is lost in JS numbers.
#[napi]
pub fn monthly_payment(principal: String, annual_rate: String, term_years: String) -> NapiResult<String> {
    let pmt = amortization::monthly_payment(
        parse_decimal("principal", &principal)?,
        parse_rate("annual_rate", &annual_rate)?,
        parse_decimal("term_years", &term_years)?,
    );
    let output = PaymentResult {
        monthly_payment: pmt,
        monthly_payment_rounded: amortization::round_currency(pmt),
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn term_for_payment(principal: String, annual_rate: String, monthly_payment: String) -> NapiResult<String> {
    let years = amortization::term_years_for_payment(
        parse_decimal("principal", &principal)?,
        parse_rate("annual_rate", &annual_rate)?,
        parse_decimal("monthly_payment", &monthly_payment)?,
    );
    Ok(years.to_string())
}

// ---------------------------------------------------------------------------
// Refinancing
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_terms(input_json: String) -> NapiResult<String> {
    let input: regulatory::ValidationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = regulatory::validate_terms(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn solve_term_range(input_json: String) -> NapiResult<String> {
    let input: term_range::TermRangeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = term_range::analyze_term_range(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_scenarios(input_json: String) -> NapiResult<String> {
    let input: scenarios::ScenarioInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = scenarios::generate_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Live market parameters
// ---------------------------------------------------------------------------

static MARKET: OnceLock<MarketFeed> = OnceLock::new();

/// Install or replace the market snapshot used by `scenarios_for_request`.
#[napi]
pub fn publish_market_parameters(params_json: String) -> NapiResult<()> {
    let params = MarketParameters::from_json_str(&params_json).map_err(to_napi_error)?;
    match MARKET.get() {
        Some(feed) => feed.publish(params).map(|_| ()).map_err(to_napi_error),
        None => {
            let feed = MarketFeed::new(params.clone()).map_err(to_napi_error)?;
            if MARKET.set(feed).is_err() {
                // Lost an initialisation race; publish through the winner.
                if let Some(current) = MARKET.get() {
                    current.publish(params).map_err(to_napi_error)?;
                }
            }
            Ok(())
        }
    }
}

/// Scenarios for a form request against the published market snapshot.
#[napi]
pub fn scenarios_for_request(request_json: String) -> NapiResult<String> {
    let feed = MARKET
        .get()
        .ok_or_else(|| to_napi_error("market parameters have not been published"))?;
    let request: RefinanceRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let snapshot = feed.snapshot();
    let output = scenarios::generate_scenarios(&snapshot.scenario_input(&request)).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
