use cooling_tco_core::assumptions::{AssumptionSet, Bound};
use cooling_tco_core::comparison::{analyze, compare, ComparisonResult};
use cooling_tco_core::inputs::{
    AirCoolingConfig, ComparisonInput, EquipmentConfiguration, FinancialParameters,
    ImmersionCoolingConfig,
};
use cooling_tco_core::types::{CostCategory, Currency};
use cooling_tco_core::TcoError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

/// 100 racks x 15 x 1 kW servers, COP 2.5 chillers.
fn air_hall() -> EquipmentConfiguration {
    EquipmentConfiguration::AirCooling(AirCoolingConfig {
        label: Some("CRAH hall".into()),
        hvac_cop: Some(dec!(2.5)),
        ..AirCoolingConfig::new(100, 15, dec!(1.0), 1)
    })
}

/// Same 1.5 MW of IT in 50 tanks of 30 servers.
fn immersion_hall(tank_unit_cost: Decimal) -> EquipmentConfiguration {
    EquipmentConfiguration::ImmersionCooling(ImmersionCoolingConfig {
        label: Some("Single-phase tanks".into()),
        tank_unit_cost: Some(tank_unit_cost),
        ..ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1)
    })
}

fn us_financial() -> FinancialParameters {
    FinancialParameters {
        discount_rate: Some(dec!(0.08)),
        analysis_years: Some(5),
        energy_escalation: dec!(0.03),
        maintenance_escalation: dec!(0.025),
        labor_escalation: dec!(0.04),
        region: Some("US".into()),
        ..FinancialParameters::default()
    }
}

fn run(financial: &FinancialParameters) -> ComparisonResult {
    compare(
        &air_hall(),
        &immersion_hall(dec!(40000)),
        financial,
        &AssumptionSet::default(),
    )
    .unwrap()
}

fn violation_fields(err: &TcoError) -> Vec<String> {
    err.violations().iter().map(|v| v.field.clone()).collect()
}

// ===========================================================================
// Reference scenario
// ===========================================================================

#[test]
fn test_us_air_vs_immersion_reference() {
    let r = run(&us_financial());

    // Immersion costs more up front
    assert!(r.yearly[0].savings < Decimal::ZERO);
    assert_eq!(r.yearly[0].savings, -r.capex_premium);

    // Cumulative savings cross zero during year 3
    let payback = r.payback_period_years.unwrap();
    assert!(payback > dec!(2) && payback < dec!(3), "payback {payback}");
    assert_eq!(r.breakeven_year, Some(3));
    assert!(r.yearly[2].cumulative_savings < Decimal::ZERO);
    assert!(r.yearly[3].cumulative_savings >= Decimal::ZERO);
    assert!(r.breakeven);

    assert!(r.npv_savings > Decimal::ZERO);
    assert!(r.baseline.pue.pue > r.alternative.pue.pue);
    assert_eq!(r.currency, Currency::USD);
}

/// Immersion side pinned to a contracted PUE of 1.03, $25/L coolant and a
/// 24-month replacement cycle.
#[test]
fn test_contracted_pue_immersion_pays_back_in_year_three() {
    let tank = EquipmentConfiguration::ImmersionCooling(ImmersionCoolingConfig {
        label: Some("Single-phase tanks".into()),
        target_pue: Some(dec!(1.03)),
        coolant_cost_per_liter: Some(dec!(25)),
        coolant_replacement_cycle_months: Some(24),
        ..ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1)
    });
    let r = compare(&air_hall(), &tank, &us_financial(), &AssumptionSet::default()).unwrap();

    assert_eq!(r.alternative.pue.pue, dec!(1.03));
    assert!(r.yearly[0].savings < Decimal::ZERO);
    assert_eq!(r.yearly[0].savings, dec!(-2242500));

    // Holds at the default 10% top-up per cycle. A full drain every 24 months
    // (replacement fraction 1.0) costs 1.5M per event and pushes payback past
    // the five-year horizon.
    let payback = r.payback_period_years.unwrap();
    assert!(payback > dec!(2) && payback <= dec!(3), "payback {payback}");
    assert!(r.npv_savings > Decimal::ZERO);
}

#[test]
fn test_payback_interpolation_matches_cumulative_series() {
    let r = run(&us_financial());
    let year = r.breakeven_year.unwrap() as usize;
    let expected = Decimal::from(year as u32 - 1)
        + (-r.yearly[year - 1].cumulative_savings) / r.yearly[year].savings;
    assert_eq!(r.payback_period_years, Some(expected));
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn test_identical_inputs_give_identical_results() {
    let a = run(&us_financial());
    let b = run(&us_financial());
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_zero_escalation_gives_flat_operating_costs() {
    let financial = FinancialParameters {
        energy_escalation: Decimal::ZERO,
        maintenance_escalation: Decimal::ZERO,
        labor_escalation: Decimal::ZERO,
        analysis_years: Some(10),
        ..us_financial()
    };
    let tank = EquipmentConfiguration::ImmersionCooling(ImmersionCoolingConfig {
        coolant_replacement_cycle_months: Some(12),
        filtration_cycle_months: Some(12),
        ..ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1)
    });
    let r = compare(&air_hall(), &tank, &financial, &AssumptionSet::default()).unwrap();

    for scenario in [&r.baseline, &r.alternative] {
        let year_one = &scenario.cash_flows[1];
        for cf in &scenario.cash_flows[2..] {
            assert_eq!(cf.costs, year_one.costs, "year {}", cf.year);
        }
    }
    let operating: Vec<Decimal> = r.yearly[1..].iter().map(|y| y.savings).collect();
    assert!(operating.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_npv_identity_holds_across_rates() {
    for rate in [dec!(0.01), dec!(0.05), dec!(0.10), dec!(0.25)] {
        for years in [1, 5, 10] {
            let financial = FinancialParameters {
                discount_rate: Some(rate),
                analysis_years: Some(years),
                ..us_financial()
            };
            let r = run(&financial);
            let expected = r.baseline.npv_cost - r.alternative.npv_cost;
            let gap = (r.npv_savings - expected).abs();
            assert!(
                gap <= dec!(0.000000001) * expected.abs().max(Decimal::ONE),
                "rate {rate} years {years}: gap {gap}"
            );
        }
    }
}

#[test]
fn test_payback_never_shortens_as_alternative_capex_rises() {
    let financial = FinancialParameters {
        analysis_years: Some(10),
        ..us_financial()
    };
    let mut previous: Option<Decimal> = Some(Decimal::ZERO);
    for cost in [dec!(20000), dec!(40000), dec!(60000), dec!(100000), dec!(200000), dec!(400000)] {
        let r = compare(
            &air_hall(),
            &immersion_hall(cost),
            &financial,
            &AssumptionSet::default(),
        )
        .unwrap();
        let current = r.payback_period_years;
        match (previous, current) {
            (Some(p), Some(c)) => assert!(c >= p, "payback fell from {p} to {c} at tank cost {cost}"),
            (None, Some(c)) => panic!("payback reappeared ({c}) at tank cost {cost}"),
            _ => {}
        }
        previous = current;
    }
    assert_eq!(previous, None);
}

#[test]
fn test_identical_scenarios_are_degenerate() {
    let r = compare(
        &air_hall(),
        &air_hall(),
        &us_financial(),
        &AssumptionSet::default(),
    )
    .unwrap();

    assert!(r.yearly.iter().all(|y| y.savings.is_zero()));
    assert!(r.yearly.iter().all(|y| y.cumulative_savings.is_zero()));
    assert_eq!(r.npv_savings, Decimal::ZERO);
    assert_eq!(r.total_savings, Decimal::ZERO);
    assert_eq!(r.payback_period_years, Some(Decimal::ZERO));
    assert_eq!(r.breakeven_year, Some(0));
    assert_eq!(r.pue_improvement, Decimal::ZERO);
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_zero_racks_rejected() {
    let bad = EquipmentConfiguration::AirCooling(AirCoolingConfig::new(0, 15, dec!(1.0), 1));
    let err = compare(&bad, &immersion_hall(dec!(40000)), &us_financial(), &AssumptionSet::default())
        .unwrap_err();
    assert_eq!(violation_fields(&err), vec!["baseline.rack_count".to_string()]);
}

#[test]
fn test_discount_rate_above_bound_rejected() {
    let financial = FinancialParameters {
        discount_rate: Some(dec!(0.30)),
        ..us_financial()
    };
    let err = compare(&air_hall(), &immersion_hall(dec!(40000)), &financial, &AssumptionSet::default())
        .unwrap_err();
    assert_eq!(violation_fields(&err), vec!["financial.discount_rate".to_string()]);
}

#[test]
fn test_horizon_above_bound_rejected() {
    let financial = FinancialParameters {
        analysis_years: Some(11),
        ..us_financial()
    };
    let err = compare(&air_hall(), &immersion_hall(dec!(40000)), &financial, &AssumptionSet::default())
        .unwrap_err();
    assert_eq!(violation_fields(&err), vec!["financial.analysis_years".to_string()]);
    assert!(err.to_string().contains("financial.analysis_years = 11"));
}

#[test]
fn test_out_of_range_amounts_are_calculation_errors() {
    // A permissive bound set lets a 1e24 exchange rate through validation.
    let mut assumptions = AssumptionSet::default();
    assumptions.bounds.exchange_rate =
        Bound::new(dec!(0.0001), dec!(1000000000000000000000000));
    let financial = FinancialParameters {
        currency: Currency::JPY,
        exchange_rate: Some(dec!(1000000000000000000000000)),
        ..us_financial()
    };

    let err = compare(&air_hall(), &immersion_hall(dec!(40000)), &financial, &assumptions)
        .unwrap_err();
    assert!(matches!(err, TcoError::Calculation { .. }), "got {err}");
    assert!(err.violations().is_empty());
}

// ===========================================================================
// Envelope, serde and concurrency
// ===========================================================================

#[test]
fn test_json_payload_round_trip_through_analyze() {
    let payload = serde_json::json!({
        "baseline": {
            "type": "air_cooling",
            "rack_count": 100,
            "servers_per_rack": 15,
            "server_power_kw": "1.0",
            "server_height_u": 1,
            "hvac_cop": "2.5"
        },
        "alternative": {
            "type": "immersion_cooling",
            "tank_count": 50,
            "servers_per_tank": 30,
            "server_power_kw": "1.0",
            "server_height_u": 1
        },
        "financial": {
            "discount_rate": "0.08",
            "analysis_years": 5,
            "energy_escalation": "0.03",
            "maintenance_escalation": "0.025",
            "labor_escalation": "0.04",
            "region": "us"
        }
    });
    let input: ComparisonInput = serde_json::from_value(payload).unwrap();
    let out = analyze(&input, &AssumptionSet::default()).unwrap();

    let direct = compare(
        &input.baseline,
        &input.alternative,
        &input.financial,
        &AssumptionSet::default(),
    )
    .unwrap();
    assert_eq!(out.result, direct);
    assert_eq!(out.result.baseline.label, "Air cooling");
    assert!(out.result.baseline.category_total(CostCategory::Consumables).is_zero());
}

#[test]
fn test_public_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ComparisonResult>();
    assert_send_sync::<ComparisonInput>();
    assert_send_sync::<AssumptionSet>();
    assert_send_sync::<TcoError>();
}

#[test]
fn test_parallel_fan_out_matches_sequential() {
    let assumptions = AssumptionSet::default();
    let rates = [dec!(0.04), dec!(0.06), dec!(0.08), dec!(0.10), dec!(0.12)];
    let financials: Vec<FinancialParameters> = rates
        .iter()
        .map(|&rate| FinancialParameters {
            discount_rate: Some(rate),
            ..us_financial()
        })
        .collect();

    let sequential: Vec<ComparisonResult> = financials.iter().map(run).collect();
    let parallel: Vec<ComparisonResult> = std::thread::scope(|s| {
        let handles: Vec<_> = financials
            .iter()
            .map(|f| {
                let assumptions = &assumptions;
                s.spawn(move || {
                    compare(&air_hall(), &immersion_hall(dec!(40000)), f, assumptions).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
}
