//! Current market parameters as immutable, validated snapshots.
//!
//! Operators replace the whole snapshot; calculations hold an `Arc` to the
//! snapshot they started with and never observe a partial update.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::error::RefiError;
use crate::refinance::rate_blend::check_policy_rate;
use crate::refinance::regulatory::ConstraintSet;
use crate::refinance::policy::ScenarioPolicy;
use crate::refinance::scenarios::ScenarioInput;
use crate::types::{BorrowerProfile, LoanParameters, LoanRates, Money};
use crate::RefiResult;

/// Rates and policy in force for a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    pub rates: LoanRates,
    pub constraints: ConstraintSet,
    #[serde(default)]
    pub policy: ScenarioPolicy,
}

/// What the form layer submits for one household.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceRequest {
    pub primary_balance: Money,
    #[serde(default)]
    pub other_loans_balance: Money,
    #[serde(default)]
    pub lump_sum_reduction: Option<Money>,
    pub current_monthly_payment: Money,
    #[serde(default)]
    pub borrower: BorrowerProfile,
}

impl MarketParameters {
    /// Fail fast on any policy or rate table a calculation cannot trust.
    pub fn validate(&self) -> RefiResult<()> {
        self.constraints.validate()?;
        self.policy.validate()?;

        if self.rates.distribution.is_empty() {
            return Err(RefiError::policy("distribution", "must weight at least one category"));
        }
        for (category, weight) in &self.rates.distribution {
            if weight.is_sign_negative() {
                return Err(RefiError::policy(
                    "distribution",
                    format!("weight for '{category}' is negative"),
                ));
            }
            if !self.rates.mortgage_rates.contains_key(category) {
                return Err(RefiError::policy(
                    "mortgage_rates",
                    format!("no rate configured for category '{category}'"),
                ));
            }
        }
        for (category, rate) in &self.rates.mortgage_rates {
            check_policy_rate("mortgage_rates", category, *rate)?;
        }
        check_policy_rate("other_loans_rate", "other loans", self.rates.other_loans_rate)?;
        Ok(())
    }

    pub fn from_json_str(s: &str) -> RefiResult<Self> {
        let params: MarketParameters = serde_json::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_yaml_str(s: &str) -> RefiResult<Self> {
        let params: MarketParameters = serde_yaml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Bind a household's request to this snapshot.
    pub fn scenario_input(&self, request: &RefinanceRequest) -> ScenarioInput {
        ScenarioInput {
            loans: LoanParameters {
                primary_balance: request.primary_balance,
                other_loans_balance: request.other_loans_balance,
                lump_sum_reduction: request.lump_sum_reduction,
                rates: self.rates.clone(),
            },
            borrower: request.borrower.clone(),
            current_monthly_payment: request.current_monthly_payment,
            constraints: self.constraints.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// Shared handle to the live snapshot.
#[derive(Debug)]
pub struct MarketFeed {
    current: RwLock<Arc<MarketParameters>>,
}

impl MarketFeed {
    pub fn new(initial: MarketParameters) -> RefiResult<Self> {
        initial.validate()?;
        Ok(MarketFeed {
            current: RwLock::new(Arc::new(initial)),
        })
    }

    /// Snapshot to run one calculation against.
    pub fn snapshot(&self) -> Arc<MarketParameters> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Validate and atomically replace the live snapshot. A rejected
    /// snapshot leaves the previous one in force.
    pub fn publish(&self, next: MarketParameters) -> RefiResult<Arc<MarketParameters>> {
        if let Err(e) = next.validate() {
            warn!(error = %e, "rejected market parameter snapshot");
            return Err(e);
        }
        let next = Arc::new(next);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&next);
        info!(
            max_term_years = next.constraints.max_term_years,
            categories = next.rates.distribution.len(),
            "published market parameter snapshot"
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Distribution, RateTable};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::thread;

    fn params(max_term_years: u32) -> MarketParameters {
        MarketParameters {
            rates: LoanRates {
                mortgage_rates: RateTable::from([
                    ("prime".to_string(), dec!(0.05)),
                    ("fixed".to_string(), dec!(0.04)),
                ]),
                distribution: Distribution::from([
                    ("prime".to_string(), dec!(0.5)),
                    ("fixed".to_string(), dec!(0.5)),
                ]),
                other_loans_rate: dec!(0.07),
            },
            constraints: ConstraintSet {
                max_term_years,
                max_borrower_age: 75,
                max_ltv: dec!(0.75),
                min_monthly_payment: dec!(1000),
            },
            policy: ScenarioPolicy::default(),
        }
    }

    #[test]
    fn test_validate_accepts_consistent_snapshot() {
        assert!(params(30).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unpriced_category() {
        let mut p = params(30);
        p.rates.distribution.insert("variable".to_string(), dec!(0.1));
        assert!(matches!(p.validate(), Err(RefiError::UnconfiguredPolicy { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_distribution() {
        let mut p = params(30);
        p.rates.distribution.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let mut p = params(30);
        p.rates.other_loans_rate = dec!(-0.01);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_percentage_rates() {
        let json = r#"{
            "rates": {
                "mortgage_rates": {"fixed": "4.4"},
                "distribution": {"fixed": "1"},
                "other_loans_rate": "0.06"
            },
            "constraints": {
                "max_term_years": 30,
                "max_borrower_age": 75,
                "max_ltv": "0.75",
                "min_monthly_payment": "1000"
            }
        }"#;
        assert!(matches!(
            MarketParameters::from_json_str(json),
            Err(RefiError::UnconfiguredPolicy { .. })
        ));
    }

    #[test]
    fn test_from_json_missing_constraints_fails() {
        let json = r#"{"rates": {"mortgage_rates": {}, "distribution": {}, "other_loans_rate": "0.05"}}"#;
        assert!(matches!(
            MarketParameters::from_json_str(json),
            Err(RefiError::SerializationError(_))
        ));
    }

    #[test]
    fn test_from_yaml_defaults_policy() {
        let yaml = r#"
rates:
  mortgage_rates:
    fixed: "0.04"
  distribution:
    fixed: "1"
  other_loans_rate: "0.06"
constraints:
  max_term_years: 30
  max_borrower_age: 75
  max_ltv: "0.75"
  min_monthly_payment: "1000"
"#;
        let p = MarketParameters::from_yaml_str(yaml).unwrap();
        assert_eq!(p.policy, ScenarioPolicy::default());
        assert_eq!(p.rates.mortgage_rates["fixed"], dec!(0.04));
    }

    #[test]
    fn test_scenario_input_binds_snapshot() {
        let request = RefinanceRequest {
            primary_balance: dec!(300_000),
            other_loans_balance: dec!(20_000),
            lump_sum_reduction: Some(dec!(10_000)),
            current_monthly_payment: dec!(3000),
            borrower: BorrowerProfile {
                age: Some(40),
                property_value: None,
            },
        };
        let input = params(30).scenario_input(&request);
        assert_eq!(input.loans.total_amount(), dec!(310_000));
        assert_eq!(input.constraints.max_term_years, 30);
        assert_eq!(input.borrower.age, Some(40));
    }

    #[test]
    fn test_publish_swaps_whole_snapshot() {
        let feed = MarketFeed::new(params(30)).unwrap();
        let before = feed.snapshot();
        feed.publish(params(25)).unwrap();
        let after = feed.snapshot();

        assert_eq!(before.constraints.max_term_years, 30);
        assert_eq!(after.constraints.max_term_years, 25);
    }

    #[test]
    fn test_publish_rejects_invalid_and_keeps_current() {
        let feed = MarketFeed::new(params(30)).unwrap();
        let mut bad = params(30);
        bad.constraints.max_ltv = Decimal::ZERO;
        assert!(feed.publish(bad).is_err());
        assert_eq!(feed.snapshot().constraints.max_ltv, dec!(0.75));
    }

    #[test]
    fn test_readers_never_see_mixed_snapshots() {
        let feed = Arc::new(MarketFeed::new(params(30)).unwrap());

        let writer = {
            let feed = Arc::clone(&feed);
            thread::spawn(move || {
                for i in 0..50 {
                    let term = if i % 2 == 0 { 20 } else { 30 };
                    let mut next = params(term);
                    // Couple two fields so a torn read would be detectable.
                    next.constraints.max_borrower_age = 60 + term;
                    feed.publish(next).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let feed = Arc::clone(&feed);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = feed.snapshot();
                        let term = snap.constraints.max_term_years;
                        let age = snap.constraints.max_borrower_age;
                        assert!(age == 75 || age == 60 + term);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
