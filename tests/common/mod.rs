//! Shared fixtures for the bid optimizer integration tests.
//!
//! Sheets are built from `serde_json::json!` records the same way a bulk
//! export reader would hand them over; typed rows are built directly for
//! tests that exercise the engines in isolation.

#![allow(dead_code)]

use bid_optimizer::models::{BidRow, BrandingCategory, CostModel, ProductLine, RowMetrics};
use bid_optimizer::{Guardrails, ScaleBasis, Sheet};
use serde_json::{json, Value};

pub const SP_SHEET: &str = "Sponsored Products Campaigns";
pub const SB_SHEET: &str = "Sponsored Brands Campaigns";
pub const SB_MULTI_SHEET: &str = "SB Multi Ad Group Campaigns";
pub const SD_SHEET: &str = "Sponsored Display Campaigns";

/// Assert two floats agree to within `1e-9`.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ---------------------------------------------------------------------------
// Guardrails
// ---------------------------------------------------------------------------

/// Guardrails so loose that no realistic equilibrium bid is clamped.
pub fn wide_guardrails() -> Guardrails {
    Guardrails {
        increase_cap: 1.0,
        decrease_cap: 1.0,
        increase_basis: Some(ScaleBasis::Clicks),
        decrease_basis: Some(ScaleBasis::Clicks),
    }
}

// ---------------------------------------------------------------------------
// Typed rows
// ---------------------------------------------------------------------------

/// A CPC row with no orders, impressions or exported CPC.
pub fn cpc_row(product: ProductLine, old_bid: f64, clicks: f64, spend: f64, sales: f64, target_ratio: f64) -> BidRow {
    BidRow {
        source_index: 0,
        campaign: Some("Test Campaign".to_string()),
        targeting: Some("test keyword".to_string()),
        product,
        cost_model: CostModel::Cpc,
        is_video: false,
        branding: BrandingCategory::NonBranded,
        metrics: RowMetrics {
            spend,
            sales,
            clicks,
            old_bid,
            ..RowMetrics::default()
        },
        target_ratio,
    }
}

pub fn sp_row(old_bid: f64, clicks: f64, spend: f64, sales: f64, target_ratio: f64) -> BidRow {
    cpc_row(ProductLine::SponsoredProducts, old_bid, clicks, spend, sales, target_ratio)
}

/// A Sponsored Display VCPM row with an explicit rate.
pub fn sd_vcpm_row(old_bid: f64, rate: f64, clicks: f64, spend: f64, sales: f64, target_ratio: f64) -> BidRow {
    let mut row = cpc_row(ProductLine::SponsoredDisplay, old_bid, clicks, spend, sales, target_ratio);
    row.cost_model = CostModel::Vcpm;
    row.metrics.vcpm_rate = Some(rate);
    row
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

/// One bulk record with the required columns filled in.
pub fn record(product: &str, campaign: &str, keyword: &str, bid: f64, clicks: f64, spend: f64, sales: f64) -> Value {
    json!({
        "State": "enabled",
        "Product": product,
        "Campaign Name (Informational Only)": campaign,
        "Keyword Text": keyword,
        "Bid": bid,
        "Clicks": clicks,
        "Spend": spend,
        "Sales": sales,
    })
}

pub fn sheet(name: &str, records: &[Value]) -> Sheet {
    Sheet::from_records(name, records)
}

/// A small Sponsored Products sheet: one row to decrease, one to increase,
/// one paused and one without clicks.
///
/// With default settings the first row drops from 0.50 to 0.20 and the
/// second rises from 0.30 to 0.40 (20 orders widen its increase limit).
pub fn sample_sp_sheet() -> Sheet {
    let mut increase = record("Sponsored Products", "Non-Brand - Broad", "running shoes", 0.30, 40.0, 8.0, 200.0);
    increase["Orders"] = json!(20);

    sheet(
        SP_SHEET,
        &[
            record("Sponsored Products", "Brand - Exact", "acme shoes", 0.50, 100.0, 20.0, 50.0),
            increase,
            json!({
                "State": "paused",
                "Product": "Sponsored Products",
                "Campaign Name (Informational Only)": "Brand - Exact",
                "Keyword Text": "paused keyword",
                "Bid": 0.75,
                "Clicks": 10,
                "Spend": 5.0,
                "Sales": 0.0,
            }),
            record("Sponsored Products", "Generic", "no clicks", 0.40, 0.0, 0.0, 0.0),
        ],
    )
}

/// A sheet of campaign-level rows that carry no product line.
pub fn portfolio_sheet() -> Sheet {
    sheet(
        "Portfolios",
        &[json!({ "Portfolio Name": "Default", "Budget": 100.0 })],
    )
}
