//! Performance projection tests.

mod common;

use bid_optimizer::bidding::decide;
use bid_optimizer::models::ProjectionModel;
use bid_optimizer::projection::{bid_change_ratio, project};
use bid_optimizer::{Guardrails, ScaleBasis};
use common::{assert_close, sp_row};

// ---------------------------------------------------------------------------
// bid_change_ratio
// ---------------------------------------------------------------------------

#[test]
fn bid_change_ratio_branches() {
    assert_eq!(bid_change_ratio(0.50, 1.00), 2.0);
    assert_eq!(bid_change_ratio(0.50, 0.0), 0.0);
    assert_eq!(bid_change_ratio(0.0, 0.75), 1.0);
    assert_eq!(bid_change_ratio(0.0, 0.0), 1.0);
}

#[test]
fn row_without_old_bid_projects_as_unchanged() {
    let row = sp_row(0.0, 100.0, 20.0, 50.0, 0.15);
    let p = project(&row, 0.50);

    assert_eq!(p.bid_change_ratio, 1.0);
    assert_eq!(p.new_clicks, 100.0);
    assert_close(p.new_cpc, p.current_cpc);
    assert_eq!(p.new_spend, 20.0);
    assert_eq!(p.new_sales, 50.0);
}

// ---------------------------------------------------------------------------
// Elasticity model
// ---------------------------------------------------------------------------

#[test]
fn unchanged_bid_keeps_current_performance() {
    let row = sp_row(0.50, 100.0, 20.0, 50.0, 0.15);
    let p = project(&row, 0.50);

    assert_eq!(p.model, ProjectionModel::Elasticity);
    assert_eq!(p.new_clicks, 100.0);
    assert_close(p.new_cpc, 0.20);
    assert_eq!(p.new_spend, 20.0);
    assert_eq!(p.new_sales, 50.0);
    assert_eq!(p.new_impressions, None);
    assert_eq!(p.new_orders, None);
}

#[test]
fn bid_decrease_uses_downward_exponents() {
    // ratio 0.16: clicks 100 * 0.16^0.5 = 40, CPC 0.20 * 0.16^0.9.
    let row = sp_row(0.50, 100.0, 20.0, 50.0, 0.15);
    let p = project(&row, 0.08);

    assert_close(p.bid_change_ratio, 0.16);
    assert_eq!(p.new_clicks, 40.0);
    assert_close(p.new_cpc, 0.20 * 0.16_f64.powf(0.9));
    assert_eq!(p.new_spend, 1.54);
    assert_eq!(p.new_sales, 6.43);
}

#[test]
fn bid_increase_discounts_sales_for_positive_target() {
    let row = sp_row(0.50, 100.0, 20.0, 50.0, 0.15);
    let p = project(&row, 1.00);

    assert_eq!(p.new_clicks, 126.0);
    assert_eq!(p.new_spend, 40.94);
    let expected = 50.0 * (40.94_f64 / 20.0).powf(0.6) * 0.9;
    assert_close(p.new_sales, (expected * 100.0).round() / 100.0);
}

#[test]
fn zero_target_with_growing_spend_projects_no_sales() {
    let row = sp_row(0.50, 100.0, 20.0, 50.0, 0.0);
    let p = project(&row, 1.00);

    assert!(p.new_spend > 20.0);
    assert_eq!(p.new_sales, 0.0);
}

#[test]
fn sales_are_capped_at_three_times_current() {
    let row = sp_row(0.10, 30.0, 3.0, 10.0, 0.15);
    let p = project(&row, 10.00);

    assert!(p.new_spend > 300.0);
    assert_eq!(p.new_sales, 30.0);
}

#[test]
fn zero_projected_spend_means_zero_sales() {
    let row = sp_row(0.50, 0.0, 0.0, 10.0, 0.15);
    let p = project(&row, 0.60);

    assert_eq!(p.new_clicks, 0.0);
    assert_eq!(p.new_spend, 0.0);
    assert_eq!(p.new_sales, 0.0);
}

#[test]
fn impressions_without_orders_are_scaled_but_model_stays_elastic() {
    let mut row = sp_row(0.50, 100.0, 20.0, 50.0, 0.15);
    row.metrics.impressions = Some(1000.0);
    let p = project(&row, 1.00);

    assert_eq!(p.model, ProjectionModel::Elasticity);
    assert_close(p.new_impressions.unwrap(), 1000.0 * 2.0_f64.powf(0.4));
    assert_eq!(p.new_orders, None);
}

#[test]
fn projection_follows_clamped_bid_not_floor() {
    // Clicks without spend or sales: base CPC 0 pins the band at 0 and the
    // SP floor lifts the recommendation to 0.02.
    let row = sp_row(0.50, 10.0, 0.0, 0.0, 0.15);
    let guardrails = Guardrails {
        decrease_basis: Some(ScaleBasis::Clicks),
        ..Guardrails::default()
    };
    let d = decide(&row, &guardrails);
    assert_eq!(d.clamped_bid, 0.0);
    assert_eq!(d.recommended_bid, 0.02);

    let p = project(&row, d.clamped_bid);
    assert_eq!(p.bid_change_ratio, 0.0);
    assert_eq!(p.new_clicks, 0.0);
    assert_eq!(p.new_spend, 0.0);
    assert_eq!(p.new_sales, 0.0);
}

// ---------------------------------------------------------------------------
// Impression model
// ---------------------------------------------------------------------------

#[test]
fn impression_model_takes_precedence_when_inputs_present() {
    let mut row = sp_row(0.50, 100.0, 20.0, 50.0, 0.15);
    row.metrics.impressions = Some(1000.0);
    row.metrics.orders = Some(5.0);
    let p = project(&row, 1.00);

    assert_eq!(p.model, ProjectionModel::Impressions);

    let impressions = 1000.0 * 2.0_f64.powf(0.4);
    let ctr_lift = 1.0 + 0.1;
    let clicks = impressions * 0.1 * ctr_lift;
    assert_close(p.new_impressions.unwrap(), impressions);
    assert_close(p.new_clicks, clicks);
    assert_eq!(p.new_spend, 47.16);

    let orders = clicks * 0.05 * 1.05;
    assert_close(p.new_orders.unwrap(), orders);
    assert_eq!(p.new_sales, 76.2);
}

#[test]
fn impression_model_at_unchanged_bid_reproduces_current() {
    let mut row = sp_row(0.50, 100.0, 20.0, 50.0, 0.15);
    row.metrics.impressions = Some(1000.0);
    row.metrics.orders = Some(5.0);
    let p = project(&row, 0.50);

    assert_eq!(p.model, ProjectionModel::Impressions);
    assert_close(p.new_clicks, 100.0);
    assert_eq!(p.new_spend, 20.0);
    assert_close(p.new_orders.unwrap(), 5.0);
    assert_eq!(p.new_sales, 50.0);
}

#[test]
fn zero_impressions_fall_back_to_elasticity() {
    let mut row = sp_row(0.50, 100.0, 20.0, 50.0, 0.15);
    row.metrics.impressions = Some(0.0);
    row.metrics.orders = Some(5.0);

    assert_eq!(project(&row, 1.00).model, ProjectionModel::Elasticity);
}
