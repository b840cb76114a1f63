//! End-to-end sheet processing tests.

mod common;

use bid_optimizer::models::{BrandingCategory, Operation, Operator};
use bid_optimizer::pipeline::{is_eligible_sheet, select_sheets};
use bid_optimizer::{BidOptimizer, FilterGroupBuilder, OptimizerError, ScaleBasis};
use common::{
    assert_close, portfolio_sheet, record, sample_sp_sheet, sheet, SB_MULTI_SHEET, SB_SHEET, SP_SHEET,
};
use serde_json::json;

fn optimizer() -> BidOptimizer {
    BidOptimizer::builder().build().unwrap()
}

fn sb_sheet(name: &str) -> bid_optimizer::Sheet {
    let mut seen = record("Sponsored Brands", "SB Headline", "acme", 1.00, 0.0, 0.0, 0.0);
    seen["Impressions"] = json!(1500);
    let mut unseen = record("Sponsored Brands", "SB Headline", "widgets", 1.00, 0.0, 0.0, 0.0);
    unseen["Impressions"] = json!(800);
    sheet(name, &[seen, unseen])
}

// ---------------------------------------------------------------------------
// Row eligibility and results
// ---------------------------------------------------------------------------

#[test]
fn only_enabled_rows_with_clicks_are_processed() {
    let processed = optimizer().process_sheet(&sample_sp_sheet()).unwrap();

    assert_eq!(processed.results.len(), 2);
    assert_eq!(processed.table.len(), 2);
    let keywords: Vec<_> = processed
        .keyword_projections()
        .into_iter()
        .map(|k| k.keyword)
        .collect();
    assert_eq!(keywords, vec!["acme shoes", "running shoes"]);
}

#[test]
fn sample_sheet_recommendations() {
    let processed = optimizer().process_sheet(&sample_sp_sheet()).unwrap();
    let bids: Vec<(f64, f64)> = processed
        .results
        .iter()
        .map(|r| (r.old_bid(), r.new_bid()))
        .collect();

    assert_eq!(bids, vec![(0.50, 0.20), (0.30, 0.40)]);
    assert_eq!(processed.updates().count(), 2);
    assert_eq!(processed.results[0].row.branding, BrandingCategory::Branded);
    assert_eq!(processed.results[1].row.branding, BrandingCategory::NonBranded);
    assert!(processed.results.iter().all(|r| r.row.target_ratio == 0.15));
}

#[test]
fn sponsored_brands_rows_without_clicks_need_impressions() {
    let processed = optimizer().process_sheet(&sb_sheet(SB_SHEET)).unwrap();

    assert_eq!(processed.results.len(), 1);
    assert_eq!(processed.results[0].row.targeting.as_deref(), Some("acme"));
}

#[test]
fn rows_with_unknown_product_line_are_dropped() {
    let s = sheet(
        SP_SHEET,
        &[
            record("Sponsored Products", "Generic", "kept", 0.50, 10.0, 5.0, 20.0),
            record("Sponsored Television", "Generic", "dropped", 0.50, 10.0, 5.0, 20.0),
        ],
    );
    let processed = optimizer().process_sheet(&s).unwrap();

    assert_eq!(processed.results.len(), 1);
    assert_eq!(processed.results[0].row.targeting.as_deref(), Some("kept"));
}

#[test]
fn min_spend_excludes_low_spend_rows() {
    let optimizer = BidOptimizer::builder().min_spend(10.0).build().unwrap();
    let processed = optimizer.process_sheet(&sample_sp_sheet()).unwrap();

    assert_eq!(processed.results.len(), 1);
    assert_eq!(processed.results[0].row.metrics.spend, 20.0);
}

#[test]
fn filter_groups_set_row_targets() {
    let optimizer = BidOptimizer::builder()
        .filter_group(
            FilterGroupBuilder::new(0.30)
                .when("Campaign Name", Operator::Contains, "brand")
                .and("Campaign Name", Operator::NotContains, "non")
                .build(),
        )
        .build()
        .unwrap();
    let processed = optimizer.process_sheet(&sample_sp_sheet()).unwrap();

    let targets: Vec<f64> = processed.results.iter().map(|r| r.row.target_ratio).collect();
    assert_eq!(targets, vec![0.30, 0.15]);
}

// ---------------------------------------------------------------------------
// Output table
// ---------------------------------------------------------------------------

#[test]
fn output_table_carries_computed_columns() {
    let processed = optimizer().process_sheet(&sample_sp_sheet()).unwrap();
    let table = &processed.table;

    for column in [
        "Operation",
        "Old Bid",
        "Target ACoS",
        "Current ACoS",
        "EQ Bid",
        "Base Bid",
        "Max Increase Limit",
        "Min Decrease Limit",
        "Recommended Bid",
        "Branding Category",
        "Bid Change Ratio",
        "Current CPC",
        "Estimated New CPC",
        "Estimated New Clicks",
        "Estimated New Spend",
        "Estimated New Sales",
    ] {
        assert!(table.has_column(column), "missing {column}");
    }

    let op = table.column_index("Operation").unwrap();
    let bid = table.column_index("Bid").unwrap();
    let old = table.column_index("Old Bid").unwrap();
    let branding = table.column_index("Branding Category").unwrap();

    assert_eq!(table.text(0, op).as_deref(), Some("Update"));
    assert_eq!(table.number(0, bid), Some(0.20));
    assert_eq!(table.number(0, old), Some(0.50));
    assert_eq!(table.text(0, branding).as_deref(), Some("Branded"));
    assert_eq!(table.number(1, bid), Some(0.40));
    assert_eq!(table.text(1, branding).as_deref(), Some("Non-Branded"));
}

#[test]
fn unchanged_rows_keep_their_bid() {
    // Clamp would lift 0.10 to 0.1988, which anti-regret refuses.
    let s = sheet(
        SP_SHEET,
        &[record("Sponsored Products", "Generic", "cheap", 0.10, 100.0, 20.0, 50.0)],
    );
    let processed = optimizer().process_sheet(&s).unwrap();
    let table = &processed.table;

    assert_eq!(processed.results[0].decision.operation, Operation::Unchanged);
    let op = table.column_index("Operation").unwrap();
    let bid = table.column_index("Bid").unwrap();
    assert_eq!(table.text(0, op).as_deref(), Some("unchanged"));
    assert_eq!(table.number(0, bid), Some(0.10));
}

#[test]
fn untrimmed_headers_are_recognized() {
    let s = bid_optimizer::Sheet::new(
        SP_SHEET,
        &[" State ", "Product ", " Bid", "Clicks", "Spend", "Sales"],
        vec![vec![
            json!("enabled"),
            json!("Sponsored Products"),
            json!("0.50"),
            json!("100"),
            json!("$20.00"),
            json!("50"),
        ]],
    );
    let processed = optimizer().process_sheet(&s).unwrap();
    assert_eq!(processed.results.len(), 1);
    assert_eq!(processed.results[0].new_bid(), 0.20);
}

#[test]
fn deserialized_ragged_sheet_is_augmented() {
    let s: bid_optimizer::Sheet = serde_json::from_value(json!({
        "name": SP_SHEET,
        "columns": ["State", "Product", "Bid", "Clicks", "Spend", "Sales", "Keyword Text"],
        "rows": [["enabled", "Sponsored Products", 0.50, 100, 20.0, 50.0]]
    }))
    .unwrap();
    let report = optimizer().process(&[s]);

    assert!(report.is_clean());
    let table = &report.sheets[0].table;
    assert_eq!(table.rows[0].len(), table.columns.len());
    let bid = table.column_index("Bid").unwrap();
    assert_eq!(table.number(0, bid), Some(0.20));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn missing_state_column_lists_found_columns() {
    let s = sheet(
        SP_SHEET,
        &[json!({ "Product": "Sponsored Products", "Bid": 0.5, "Clicks": 3, "Spend": 1.0, "Sales": 0.0 })],
    );
    let err = optimizer().process_sheet(&s).unwrap_err();

    match &err {
        OptimizerError::MissingColumn { column, found, .. } => {
            assert_eq!(column, "State");
            assert!(found.iter().any(|c| c == "Bid"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Columns found"));
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

#[test]
fn sheets_without_product_lines_are_skipped() {
    assert!(!is_eligible_sheet(&portfolio_sheet()));
    assert!(is_eligible_sheet(&sample_sp_sheet()));

    let report = optimizer().process(&[portfolio_sheet(), sample_sp_sheet()]);
    assert!(report.eligible_found);
    assert_eq!(report.skipped, vec!["Portfolios".to_string()]);
    assert_eq!(report.sheets.len(), 1);
    assert!(report.sheet(SP_SHEET).is_some());
    assert!(report.is_clean());
}

#[test]
fn strict_run_requires_an_eligible_sheet() {
    let result = optimizer().process_strict(&[portfolio_sheet()]);
    assert!(matches!(result, Err(OptimizerError::NoEligibleSheets)));

    let report = optimizer().process(&[portfolio_sheet()]);
    assert!(!report.eligible_found);
    assert_eq!(report.stats.total_rows, 0);
}

#[test]
fn multi_ad_group_sheet_supersedes_legacy_brands_sheet() {
    let sheets = [sb_sheet(SB_SHEET), sb_sheet(SB_MULTI_SHEET)];
    let (kept, dropped) = select_sheets(&sheets);
    assert_eq!(kept.len(), 1);
    assert_eq!(dropped, vec![SB_SHEET.to_string()]);

    let report = optimizer().process(&sheets);
    assert_eq!(report.sheets.len(), 1);
    assert_eq!(report.sheets[0].name, SB_MULTI_SHEET);
    assert!(report.skipped.contains(&SB_SHEET.to_string()));
}

#[test]
fn legacy_brands_sheet_is_processed_alone() {
    let report = optimizer().process(&[sb_sheet(SB_SHEET)]);
    assert_eq!(report.sheets.len(), 1);
    assert!(report.skipped.is_empty());
}

#[test]
fn failed_sheet_leaves_no_trace_in_stats() {
    let broken = sheet(
        SB_SHEET,
        &[json!({ "State": "enabled", "Product": "Sponsored Brands", "Bid": 1.0, "Clicks": 5, "Spend": 3.0 })],
    );
    let report = optimizer().process(&[sample_sp_sheet(), broken]);
    let alone = optimizer().process_sheet(&sample_sp_sheet()).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].sheet, SB_SHEET);
    assert!(!report.is_clean());
    assert_eq!(report.stats, alone.stats);
}

#[test]
fn run_stats_merge_sheets_in_order() {
    let sheets = [sample_sp_sheet(), sb_sheet(SB_MULTI_SHEET)];
    let report = optimizer().process(&sheets);

    assert_eq!(report.stats.total_rows, 3);
    assert_eq!(report.stats.sp_count, 2);
    assert_eq!(report.stats.sb_count, 1);
    assert_eq!(report.stats, optimizer().summarize(&report.sheets));
}

#[test]
fn projected_spend_matches_row_estimates() {
    let report = optimizer().process(&[sample_sp_sheet(), sb_sheet(SB_MULTI_SHEET)]);
    let per_row: f64 = report
        .sheets
        .iter()
        .flat_map(|s| s.results.iter())
        .filter(|r| r.is_active())
        .map(|r| r.projection.new_spend)
        .sum();

    assert_close(report.stats.projected_total_spend, per_row);
}

#[test]
fn floored_rows_project_from_clamped_bid() {
    let optimizer = BidOptimizer::builder()
        .decrease_basis(Some(ScaleBasis::Clicks))
        .build()
        .unwrap();
    let s = sheet(
        SP_SHEET,
        &[record("Sponsored Products", "Generic", "free clicks", 0.50, 10.0, 0.0, 0.0)],
    );
    let processed = optimizer.process_sheet(&s).unwrap();
    let result = &processed.results[0];

    assert_eq!(result.decision.clamped_bid, 0.0);
    assert_eq!(result.new_bid(), 0.02);
    assert_eq!(result.projection.bid_change_ratio, 0.0);
    assert_eq!(result.projection.new_clicks, 0.0);
    assert_eq!(result.projection.new_spend, 0.0);

    let ratio = processed.table.column_index("Bid Change Ratio").unwrap();
    assert_eq!(processed.table.number(0, ratio), Some(0.0));
}

#[test]
fn runs_start_from_fresh_stats() {
    let optimizer = optimizer();
    let first = optimizer.process(&[sample_sp_sheet()]);
    let second = optimizer.process(&[sample_sp_sheet()]);
    assert_eq!(first.stats, second.stats);
}
