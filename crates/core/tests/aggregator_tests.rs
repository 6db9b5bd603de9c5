// ═══════════════════════════════════════════════════════════════════
// PositionAggregator Tests — per-holding valuation, class buckets,
// class performance, determinism
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use std::collections::HashMap;

use portfolio_engine_core::models::holding::HoldingPosition;
use portfolio_engine_core::models::movement::Movement;
use portfolio_engine_core::services::position_aggregator::PositionAggregator;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn sample_movements() -> HashMap<String, Vec<Movement>> {
    let mut map = HashMap::new();
    map.insert(
        "PETR4".to_string(),
        vec![
            Movement::buy("PETR4", 100.0, 10.0, d(2023, 1, 1)),
            Movement::buy("PETR4", 50.0, 12.0, d(2023, 6, 1)),
            Movement::sell("PETR4", 30.0, 15.0, d(2024, 1, 1)),
        ],
    );
    map.insert(
        "HGLG11".to_string(),
        vec![Movement::buy("HGLG11", 10.0, 150.0, d(2023, 3, 1))],
    );
    map
}

// ── Per-holding ─────────────────────────────────────────────────────

mod per_holding {
    use super::*;

    #[test]
    fn unrealized_gain_from_fifo_average() {
        let holdings = vec![HoldingPosition::new("PETR4", "Ações", 120.0, 13.0)];
        let summary = PositionAggregator::default().summarize(&holdings, &sample_movements());

        let h = &summary.per_holding[0];
        let avg = 1300.0 / 120.0;
        assert_close(h.average_unit_price.unwrap(), avg);
        assert_close(h.unrealized_gain_abs.unwrap(), (13.0 - avg) * 120.0);
        assert_close(h.unrealized_gain_pct.unwrap(), (13.0 - avg) / avg * 100.0);
        assert_close(h.total_value, 1560.0);
        assert_close(h.realized_gain, 30.0 * 5.0);
        assert_close(h.quantity_drift, 0.0);
    }

    #[test]
    fn holding_without_movements_has_no_gain() {
        let holdings = vec![HoldingPosition::new("VALE3", "Ações", 10.0, 60.0)];
        let summary = PositionAggregator::default().summarize(&holdings, &HashMap::new());

        let h = &summary.per_holding[0];
        assert_eq!(h.average_unit_price, None);
        assert_eq!(h.unrealized_gain_abs, None);
        assert_eq!(h.unrealized_gain_pct, None);
        assert_close(h.total_invested, 0.0);
        assert_close(h.total_value, 600.0);
    }

    #[test]
    fn fully_sold_history_has_no_gain() {
        let mut movements = HashMap::new();
        movements.insert(
            "X".to_string(),
            vec![
                Movement::buy("X", 5.0, 10.0, d(2024, 1, 1)),
                Movement::sell("X", 5.0, 12.0, d(2024, 2, 1)),
            ],
        );
        let holdings = vec![HoldingPosition::new("X", "Stocks", 5.0, 12.0)];
        let summary = PositionAggregator::default().summarize(&holdings, &movements);

        let h = &summary.per_holding[0];
        assert_eq!(h.unrealized_gain_abs, None);
        assert_close(h.quantity_drift, 5.0);
    }

    #[test]
    fn ticker_lookup_ignores_case() {
        let mut movements = HashMap::new();
        movements.insert(
            "petr4".to_string(),
            vec![Movement::buy("petr4", 10.0, 20.0, d(2024, 1, 1))],
        );
        let holdings = vec![HoldingPosition::new(" Petr4 ", "Ações", 10.0, 25.0)];
        let summary = PositionAggregator::default().summarize(&holdings, &movements);

        let h = &summary.per_holding[0];
        assert_eq!(h.ticker, "PETR4");
        assert_close(h.average_unit_price.unwrap(), 20.0);
        assert_close(h.unrealized_gain_abs.unwrap(), 50.0);
    }

    #[test]
    fn allocation_sums_to_hundred() {
        let holdings = vec![
            HoldingPosition::new("PETR4", "Ações", 120.0, 13.0),
            HoldingPosition::new("HGLG11", "FIIs", 10.0, 160.0),
            HoldingPosition::new("TESOURO", "Renda Fixa", 1.0, 1000.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &sample_movements());

        let sum: f64 = summary.per_holding.iter().map(|h| h.allocation_pct).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_ticker_rows_are_merged() {
        let holdings = vec![
            HoldingPosition::new("PETR4", "Ações", 60.0, 13.0),
            HoldingPosition::new("HGLG11", "FIIs", 10.0, 160.0),
            HoldingPosition::new("petr4", "Ações", 60.0, 13.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &sample_movements());

        assert_eq!(summary.per_holding.len(), 2);
        let petr = &summary.per_holding[0];
        assert_eq!(petr.ticker, "PETR4");
        assert_close(petr.quantity, 120.0);
        assert_close(petr.total_invested, 1300.0);
        assert_close(petr.quantity_drift, 0.0);
        assert_close(summary.per_class["Ações"], 1560.0);

        let perf = summary
            .class_performance
            .iter()
            .find(|p| p.asset_class == "Ações")
            .unwrap();
        assert_close(perf.invested, 1300.0);
    }

    #[test]
    fn input_order_is_preserved() {
        let holdings = vec![
            HoldingPosition::new("ZZZ", "B", 1.0, 1.0),
            HoldingPosition::new("AAA", "A", 1.0, 1.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &HashMap::new());
        assert_eq!(summary.per_holding[0].ticker, "ZZZ");
        assert_eq!(summary.per_holding[1].ticker, "AAA");
    }
}

// ── Per-class ───────────────────────────────────────────────────────

mod per_class {
    use super::*;

    #[test]
    fn values_grouped_by_class() {
        let holdings = vec![
            HoldingPosition::new("PETR4", "Ações", 10.0, 30.0),
            HoldingPosition::new("VALE3", "Ações", 5.0, 60.0),
            HoldingPosition::new("HGLG11", "FIIs", 2.0, 150.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &HashMap::new());

        assert_eq!(summary.per_class.len(), 2);
        assert_close(summary.per_class["Ações"], 600.0);
        assert_close(summary.per_class["FIIs"], 300.0);
        assert_close(summary.portfolio_total, 900.0);
    }

    #[test]
    fn accent_and_plural_variants_share_a_bucket() {
        let holdings = vec![
            HoldingPosition::new("PETR4", "Ações", 10.0, 30.0),
            HoldingPosition::new("VALE3", "ação", 5.0, 60.0),
            HoldingPosition::new("ITUB4", "  ACOES ", 1.0, 100.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &HashMap::new());

        assert_eq!(summary.per_class.len(), 1);
        assert_close(summary.per_class["Ações"], 700.0);
        assert!(summary.per_holding.iter().all(|h| h.asset_class == "Ações"));
    }

    #[test]
    fn missing_class_goes_to_unknown() {
        let holdings = vec![
            HoldingPosition {
                ticker: "X".into(),
                asset_class: None,
                quantity: 1.0,
                current_price: 10.0,
            },
            HoldingPosition::new("Y", "   ", 1.0, 5.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &HashMap::new());

        assert_close(summary.per_class["Unknown"], 15.0);
    }

    #[test]
    fn custom_unknown_label() {
        let holdings = vec![HoldingPosition {
            ticker: "X".into(),
            asset_class: None,
            quantity: 1.0,
            current_price: 10.0,
        }];
        let summary = PositionAggregator::new("Desconhecido").summarize(&holdings, &HashMap::new());

        assert!(summary.per_class.contains_key("Desconhecido"));
    }

    #[test]
    fn class_performance_uses_snapshot_quantity() {
        let holdings = vec![
            HoldingPosition::new("PETR4", "Ações", 120.0, 13.0),
            HoldingPosition::new("VALE3", "Ações", 10.0, 60.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &sample_movements());

        let perf = summary
            .class_performance
            .iter()
            .find(|p| p.asset_class == "Ações")
            .unwrap();
        // VALE3 has no history, so only PETR4 counts
        assert_close(perf.invested, 1300.0);
        assert_close(perf.current, 1560.0);
        assert_close(perf.return_pct.unwrap(), 20.0);
    }

    #[test]
    fn class_without_history_has_no_return() {
        let holdings = vec![HoldingPosition::new("VALE3", "Ações", 10.0, 60.0)];
        let summary = PositionAggregator::default().summarize(&holdings, &HashMap::new());

        assert_eq!(summary.class_performance[0].return_pct, None);
    }
}

// ── Degenerate input ────────────────────────────────────────────────

mod degenerate {
    use super::*;

    #[test]
    fn empty_portfolio() {
        let summary = PositionAggregator::default().summarize(&[], &HashMap::new());
        assert!(summary.per_holding.is_empty());
        assert!(summary.per_class.is_empty());
        assert_close(summary.portfolio_total, 0.0);
    }

    #[test]
    fn zero_priced_holdings_have_zero_allocation() {
        let holdings = vec![HoldingPosition::new("X", "A", 10.0, 0.0)];
        let summary = PositionAggregator::default().summarize(&holdings, &HashMap::new());

        assert_close(summary.portfolio_total, 0.0);
        assert_close(summary.per_holding[0].allocation_pct, 0.0);
    }

    #[test]
    fn non_finite_price_counts_as_zero_value() {
        let holdings = vec![
            HoldingPosition::new("X", "A", 10.0, f64::NAN),
            HoldingPosition::new("Y", "A", 1.0, 10.0),
        ];
        let mut movements = HashMap::new();
        movements.insert("X".to_string(), vec![Movement::buy("X", 10.0, 5.0, d(2024, 1, 1))]);
        let summary = PositionAggregator::default().summarize(&holdings, &movements);

        assert_close(summary.portfolio_total, 10.0);
        assert!(summary.per_holding.iter().all(|h| h.allocation_pct.is_finite()
            && h.current_price.is_finite()
            && h.quantity_drift.is_finite()));

        // the unpriced holding is left out of its class return
        let perf = &summary.class_performance[0];
        assert!(perf.invested.is_finite() && perf.current.is_finite());
        assert_close(perf.invested, 0.0);
        assert_close(perf.current, 0.0);
        assert_eq!(perf.return_pct, None);
    }

    #[test]
    fn non_finite_quantity_does_not_leak() {
        let mut movements = HashMap::new();
        movements.insert("X".to_string(), vec![Movement::buy("X", 10.0, 5.0, d(2024, 1, 1))]);
        let holdings = vec![
            HoldingPosition::new("X", "A", f64::INFINITY, 6.0),
            HoldingPosition::new("Y", "A", 2.0, 10.0),
        ];
        let summary = PositionAggregator::default().summarize(&holdings, &movements);

        let x = &summary.per_holding[0];
        assert_close(x.quantity, 0.0);
        assert_close(x.quantity_drift, 0.0);
        assert_close(x.total_value, 0.0);
        assert!(summary.class_performance.iter().all(|p| p.invested.is_finite()
            && p.current.is_finite()));
    }

    #[test]
    fn same_input_gives_identical_output() {
        let holdings = vec![
            HoldingPosition::new("PETR4", "Ações", 120.0, 13.0),
            HoldingPosition::new("HGLG11", "FIIs", 10.0, 160.0),
        ];
        let aggregator = PositionAggregator::default();
        let a = aggregator.summarize(&holdings, &sample_movements());
        let b = aggregator.summarize(&holdings, &sample_movements());
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
