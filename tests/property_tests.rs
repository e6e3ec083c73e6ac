//! Property-based tests for transforms and models.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated monthly series.

use approx::relative_eq;
use chrono::NaiveDate;
use fpi_forecast::core::TimeSeries;
use fpi_forecast::models::arima::{AutoARIMA, AutoARIMAConfig, SARIMA};
use fpi_forecast::models::Forecaster;
use fpi_forecast::transform::{diff, exp, log, undiff};
use proptest::prelude::*;

/// Create a monthly TimeSeries starting January 2000.
fn make_ts(values: &[f64]) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    TimeSeries::monthly_from(start, values.to_vec()).unwrap()
}

/// Strategy for strictly positive index values.
fn positive_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| prop::collection::vec(0.5..500.0_f64, len))
}

/// Strategy for a positive random walk with drift, like a price index.
fn index_walk_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (50.0..150.0_f64, prop::collection::vec(-0.01..0.015_f64, len)).prop_map(|(start, steps)| {
            let mut level = start;
            steps
                .into_iter()
                .map(|s| {
                    level *= 1.0 + s;
                    level
                })
                .collect()
        })
    })
}

// =============================================================================
// Property: transforms invert
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn log_then_exp_is_identity(values in positive_values_strategy(2, 200)) {
        let ts = make_ts(&values);
        let back = exp(&log(&ts).unwrap());
        prop_assert_eq!(back.len(), ts.len());
        prop_assert_eq!(back.timestamps(), ts.timestamps());
        for (a, b) in back.values().iter().zip(ts.values()) {
            prop_assert!(relative_eq!(*a, *b, max_relative = 1e-12));
        }
    }

    #[test]
    fn diff_then_undiff_reconstructs(values in positive_values_strategy(2, 200)) {
        let ts = make_ts(&values);
        let d = diff(&ts, 1).unwrap();
        prop_assert_eq!(d.len(), ts.len() - 1);
        prop_assert_eq!(d.timestamps()[0], ts.timestamps()[1]);

        let rebuilt = undiff(values[0], d.values());
        prop_assert_eq!(rebuilt.len(), values.len());
        for (a, b) in rebuilt.iter().zip(values.iter()) {
            prop_assert!(relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9));
        }
    }

    #[test]
    fn log_rejects_any_non_positive(
        mut values in positive_values_strategy(2, 50),
        at in 0usize..50,
        bad in -10.0..=0.0_f64
    ) {
        let index = at % values.len();
        values[index] = bad;
        prop_assert!(log(&make_ts(&values)).is_err());
    }
}

/// Strategy for a drifting index with a monthly seasonal pattern.
fn seasonal_index_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        (
            60.0..150.0_f64,
            prop::collection::vec(-0.03..0.03_f64, 12),
            prop::collection::vec(-0.004..0.008_f64, len),
        )
            .prop_map(|(start, pattern, steps)| {
                let mut level = start;
                steps
                    .into_iter()
                    .enumerate()
                    .map(|(i, s)| {
                        level *= 1.0 + s;
                        level * (1.0 + pattern[i % 12])
                    })
                    .collect()
            })
    })
}

// =============================================================================
// Property: model fitting is deterministic
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    #[test]
    fn auto_arima_fit_is_deterministic(values in index_walk_strategy(40, 90)) {
        let ts = log(&make_ts(&values)).unwrap();
        let config = AutoARIMAConfig::default().with_max_orders(2, 2, 2);

        let mut first = AutoARIMA::with_config(config.clone());
        first.fit(&ts).unwrap();
        let mut second = AutoARIMA::with_config(config);
        second.fit(&ts).unwrap();

        prop_assert_eq!(first.selected_spec(), second.selected_spec());
        let a = first.selected_model().unwrap().named_coefficients();
        let b = second.selected_model().unwrap().named_coefficients();
        prop_assert_eq!(a, b);
        prop_assert_eq!(first.model_scores().len(), second.model_scores().len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn seasonal_auto_arima_fit_is_deterministic(values in seasonal_index_strategy(60, 120)) {
        let ts = log(&make_ts(&values)).unwrap();
        let config = AutoARIMAConfig::default()
            .with_seasonal_period(12)
            .with_max_orders(2, 2, 2)
            .with_seasonal_orders(1, 1, 1);

        let mut first = AutoARIMA::with_config(config.clone());
        first.fit(&ts).unwrap();
        let mut second = AutoARIMA::with_config(config);
        second.fit(&ts).unwrap();

        let spec = first.selected_spec().unwrap();
        prop_assert_eq!(spec.s, 12);
        prop_assert_eq!(first.selected_spec(), second.selected_spec());
        prop_assert_eq!(first.differencing(), second.differencing());
        let a = first.selected_model().unwrap().named_coefficients();
        let b = second.selected_model().unwrap().named_coefficients();
        prop_assert_eq!(a, b);
        prop_assert_eq!(first.model_scores(), second.model_scores());
    }
}

// =============================================================================
// Property: nested prediction intervals
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn wider_level_contains_narrower(
        values in index_walk_strategy(40, 120),
        horizon in 1usize..24
    ) {
        let ts = log(&make_ts(&values)).unwrap();
        let mut model = SARIMA::arima(1, 1, 1);
        model.fit(&ts).unwrap();
        let forecast = model.predict_with_levels(horizon, &[0.99, 0.80, 0.95]).unwrap();

        prop_assert_eq!(forecast.horizon(), horizon);
        let levels: Vec<f64> = forecast.intervals().iter().map(|i| i.level).collect();
        prop_assert_eq!(levels, vec![0.80, 0.95, 0.99]);
        for pair in forecast.intervals().windows(2) {
            for h in 0..horizon {
                prop_assert!(pair[1].lower[h] <= pair[0].lower[h]);
                prop_assert!(pair[1].upper[h] >= pair[0].upper[h]);
            }
        }
        for h in 0..horizon {
            let p = forecast.point()[h];
            let narrowest = &forecast.intervals()[0];
            prop_assert!(narrowest.lower[h] <= p && p <= narrowest.upper[h]);
        }

        let index = forecast.map_values(f64::exp);
        for (i, interval) in index.intervals().iter().enumerate() {
            for h in 0..horizon {
                prop_assert!(interval.lower[h] > 0.0);
                prop_assert!(relative_eq!(
                    interval.upper[h],
                    forecast.intervals()[i].upper[h].exp(),
                    max_relative = 1e-12
                ));
            }
        }
    }
}
