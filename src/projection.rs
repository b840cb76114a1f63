//! Performance projection under power-law response curves.
//!
//! Every curve is asymmetric: a bid increase moves clicks, CPC and sales less
//! than proportionally, and a decrease loses less than it saves. Two models
//! exist. The impression model needs impressions and order counts and, when
//! both are present, replaces the click/sales elasticity model entirely.

use crate::bidding::round_to_cents;
use crate::config::MAX_SALES_MULTIPLIER;
use crate::models::{BidRow, Projection, ProjectionModel};

const CLICKS_UP: f64 = 1.0 / 3.0;
const CLICKS_DOWN: f64 = 0.5;
const CPC_UP: f64 = 0.7;
const CPC_DOWN: f64 = 0.9;
const SALES_UP: f64 = 0.6;
const SALES_DOWN: f64 = 0.8;
const IMPRESSIONS_UP: f64 = 0.4;
const IMPRESSIONS_DOWN: f64 = 0.6;

/// Sales discount when spend grows against a positive target ratio.
const SCALE_UP_DISCOUNT: f64 = 0.9;

const CTR_MAX_LIFT: f64 = 0.10;
const CTR_MAX_DIP: f64 = 0.05;
const CVR_MAX_LIFT: f64 = 0.05;
const CVR_MAX_DIP: f64 = 0.03;

/// Ratio of new to old bid, with explicit zero branches.
///
/// A row without an old bid is treated as unchanged (`1.0`) rather than
/// infinitely increased.
pub fn bid_change_ratio(old_bid: f64, new_bid: f64) -> f64 {
    if old_bid > 0.0 {
        if new_bid > 0.0 {
            new_bid / old_bid
        } else {
            0.0
        }
    } else {
        1.0
    }
}

/// Project post-change performance for one row.
///
/// `bid` is the guardrail-clamped bid, before the minimum-bid floor, so a
/// clamp to zero projects no clicks.
pub fn project(row: &BidRow, bid: f64) -> Projection {
    let m = &row.metrics;
    let ratio = bid_change_ratio(m.old_bid, bid);
    let current_cpc = m.current_cpc();
    let new_cpc = current_cpc * elastic(ratio, CPC_UP, CPC_DOWN);

    let impression_inputs = match (m.impressions, m.orders) {
        (Some(impressions), Some(orders)) if impressions > 0.0 => Some((impressions, orders)),
        _ => None,
    };

    let (model, new_clicks, new_impressions, new_orders, raw_sales, new_spend) = match impression_inputs {
        Some((impressions, orders)) => {
            let new_impressions = impressions * elastic(ratio, IMPRESSIONS_UP, IMPRESSIONS_DOWN);
            let ctr = m.clicks / impressions;
            let new_clicks = new_impressions * ctr * ctr_factor(ratio);
            let new_spend = round_to_cents(new_clicks * new_cpc);

            let conversion = if m.clicks > 0.0 { orders / m.clicks } else { 0.0 };
            let aov = if orders > 0.0 { m.sales / orders } else { 0.0 };
            let new_orders = new_clicks * conversion * conversion_factor(ratio);
            let new_sales = new_orders * aov;

            (
                ProjectionModel::Impressions,
                new_clicks,
                Some(new_impressions),
                Some(new_orders),
                new_sales,
                new_spend,
            )
        }
        None => {
            let new_clicks = (m.clicks * elastic(ratio, CLICKS_UP, CLICKS_DOWN)).round_ties_even();
            let new_spend = round_to_cents(new_clicks * new_cpc);
            let new_impressions = m
                .impressions
                .map(|i| i * elastic(ratio, IMPRESSIONS_UP, IMPRESSIONS_DOWN));
            let new_sales = elasticity_sales(m.spend, m.sales, new_spend, row.target_ratio);

            (
                ProjectionModel::Elasticity,
                new_clicks,
                new_impressions,
                None,
                new_sales,
                new_spend,
            )
        }
    };

    let mut new_sales = raw_sales;
    if m.sales > 0.0 {
        new_sales = new_sales.min(m.sales * MAX_SALES_MULTIPLIER);
    }
    if new_spend == 0.0 {
        new_sales = 0.0;
    }

    Projection {
        model,
        bid_change_ratio: ratio,
        current_cpc,
        new_clicks,
        new_cpc,
        new_spend,
        new_sales: round_to_cents(new_sales),
        new_impressions,
        new_orders,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Apply `up` above a ratio of one and `down` below it.
fn elastic(ratio: f64, up: f64, down: f64) -> f64 {
    if ratio > 1.0 {
        ratio.powf(up)
    } else if ratio < 1.0 {
        ratio.powf(down)
    } else {
        1.0
    }
}

fn elasticity_sales(spend: f64, sales: f64, new_spend: f64, target_ratio: f64) -> f64 {
    let spend_ratio = if spend > 0.0 { new_spend / spend } else { 1.0 };
    let mut new_sales = sales * elastic(spend_ratio, SALES_UP, SALES_DOWN);

    let spend_grows = new_spend > spend;
    if spend_grows && target_ratio > 0.0 {
        new_sales *= SCALE_UP_DISCOUNT;
    }
    // A zero target cannot be met while spending more.
    if spend_grows && target_ratio == 0.0 {
        new_sales = 0.0;
    }
    new_sales
}

fn ctr_factor(ratio: f64) -> f64 {
    if ratio > 1.0 {
        1.0 + ((ratio - 1.0).sqrt() * 0.1).min(CTR_MAX_LIFT)
    } else if ratio < 1.0 {
        1.0 - ((1.0 - ratio).sqrt() * 0.05).min(CTR_MAX_DIP)
    } else {
        1.0
    }
}

fn conversion_factor(ratio: f64) -> f64 {
    if ratio > 1.0 {
        1.0 + ((ratio - 1.0).powf(0.3) * 0.05).min(CVR_MAX_LIFT)
    } else if ratio < 1.0 {
        1.0 - ((1.0 - ratio).powf(0.3) * 0.03).min(CVR_MAX_DIP)
    } else {
        1.0
    }
}
