use mortgage_pulse_core::amortization::{monthly_payment, term_years_for_payment};
use mortgage_pulse_core::refinance::rate_blend::weighted_rate;
use mortgage_pulse_core::refinance::regulatory::ConstraintSet;
use mortgage_pulse_core::refinance::policy::ScenarioPolicy;
use mortgage_pulse_core::refinance::scenarios::{generate_scenarios, ScenarioInput, SpecialCase};
use mortgage_pulse_core::{BorrowerProfile, Distribution, LoanParameters, LoanRates, RateTable};
use proptest::collection::vec;
use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn bp(basis_points: u32) -> Decimal {
    Decimal::from(basis_points) / dec!(10_000)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn prop_payment_strictly_decreasing_in_term(
        principal in 10_000u32..5_000_000,
        rate_bp in 1u32..1500,
        short_years in 1u32..50,
        extra_years in 1u32..20,
    ) {
        let long_years = (short_years + extra_years).min(50);
        let p = Decimal::from(principal);
        let r = bp(rate_bp);
        let short = monthly_payment(p, r, Decimal::from(short_years));
        let long = monthly_payment(p, r, Decimal::from(long_years));
        prop_assert!(short > long, "{short} at {short_years}y vs {long} at {long_years}y");
    }

    #[test]
    fn prop_term_inverts_payment(
        principal in 10_000u32..5_000_000,
        rate_bp in 1u32..1500,
        months in 1u32..=600,
    ) {
        let p = Decimal::from(principal);
        let r = bp(rate_bp);
        let years = Decimal::from(months) / dec!(12);
        let pmt = monthly_payment(p, r, years);
        let solved = term_years_for_payment(p, r, pmt);
        prop_assert!(
            (solved - years).abs() < dec!(0.01),
            "expected {years}, solved {solved}"
        );
    }

    #[test]
    fn prop_weighted_rate_within_component_bounds(
        components in vec((1u32..2000, 1u32..100), 1..6),
    ) {
        let total_weight: u32 = components.iter().map(|(_, w)| w).sum();
        let mut rates = RateTable::new();
        let mut distribution = Distribution::new();
        for (i, (rate_bp, weight)) in components.iter().enumerate() {
            let category = format!("track-{i}");
            rates.insert(category.clone(), bp(*rate_bp));
            distribution.insert(category, Decimal::from(*weight) / Decimal::from(total_weight));
        }

        let blended = weighted_rate(&rates, &distribution).unwrap();
        let lo = rates.values().copied().min().unwrap();
        let hi = rates.values().copied().max().unwrap();
        let eps = dec!(0.000000000001);
        prop_assert!(blended >= lo - eps && blended <= hi + eps, "{blended} outside [{lo}, {hi}]");
    }

    #[test]
    fn prop_scenarios_ordered_by_term_and_reduction(
        principal in 50_000u32..2_000_000,
        rate_bp in 100u32..900,
        current_payment in 500u32..20_000,
        age in proptest::option::of(20u32..80),
    ) {
        let input = ScenarioInput {
            loans: LoanParameters {
                primary_balance: Decimal::from(principal),
                other_loans_balance: Decimal::ZERO,
                lump_sum_reduction: None,
                rates: LoanRates {
                    mortgage_rates: RateTable::from([("fixed".to_string(), bp(rate_bp))]),
                    distribution: Distribution::from([("fixed".to_string(), Decimal::ONE)]),
                    other_loans_rate: bp(rate_bp),
                },
            },
            borrower: BorrowerProfile { age, property_value: None },
            current_monthly_payment: Decimal::from(current_payment),
            constraints: ConstraintSet {
                max_term_years: 30,
                max_borrower_age: 75,
                max_ltv: dec!(0.75),
                min_monthly_payment: dec!(1000),
            },
            policy: ScenarioPolicy::default(),
        };

        let set = generate_scenarios(&input).unwrap().result;
        prop_assert!(set.term_range.min_years <= set.term_range.max_years);

        if set.scenarios.is_empty() {
            prop_assert!(set.special_case != SpecialCase::None);
        } else {
            prop_assert_eq!(set.scenarios.len(), 3);
            prop_assert_eq!(set.special_case, SpecialCase::None);
            for pair in set.scenarios.windows(2) {
                prop_assert!(pair[0].years <= pair[1].years);
                prop_assert!(pair[0].monthly_reduction <= pair[1].monthly_reduction);
            }
            prop_assert!(set.scenarios[0].monthly_reduction >= dec!(500));
            prop_assert_eq!(set.scenarios[2].years, set.term_range.absolute_max_years);
            prop_assert!(set.scenarios.iter().all(|s| s.years <= set.term_range.absolute_max_years));
        }
    }
}
