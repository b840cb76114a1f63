//! Bid recommendation engine.
//!
//! Each row runs through a fixed decision sequence: cost model, current
//! efficiency, equilibrium bid, guardrail clamp, anti-regret cap, minimum-bid
//! floor, then rounding to cents. Every function here is pure.

use crate::config::{
    Guardrails, ScaleBasis, FLOOR_SB_CPC, FLOOR_SB_VCPM, FLOOR_SB_VIDEO_CPC, FLOOR_SB_VIDEO_VCPM,
    FLOOR_SD_CPC, FLOOR_SD_VCPM, FLOOR_SP,
};
use crate::models::{BidDecision, BidRow, CostModel, Operation, ProductLine, RowMetrics};

/// Round to two decimals, ties to even on the scaled value.
///
/// The scaling happens in binary floating point, so `0.075` becomes exactly
/// `7.5` and rounds to `0.08`.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Decide whether a row bills per click or per thousand viewable impressions.
pub fn classify_cost_model(
    product: ProductLine,
    campaign: Option<&str>,
    cost_type: Option<&str>,
    vcpm_rate: Option<f64>,
) -> CostModel {
    if campaign.is_some_and(|name| name.to_lowercase().contains("vcpm")) {
        return CostModel::Vcpm;
    }
    if product == ProductLine::SponsoredDisplay
        && (cost_type.is_some_and(|t| t.trim().eq_ignore_ascii_case("vcpm")) || vcpm_rate.is_some())
    {
        return CostModel::Vcpm;
    }
    CostModel::Cpc
}

/// Hard minimum bid for a product line, creative format and cost model.
pub fn minimum_bid(product: ProductLine, cost_model: CostModel, is_video: bool) -> f64 {
    match (product, is_video, cost_model) {
        (ProductLine::SponsoredDisplay, _, CostModel::Vcpm) => FLOOR_SD_VCPM,
        (ProductLine::SponsoredDisplay, _, CostModel::Cpc) => FLOOR_SD_CPC,
        (ProductLine::SponsoredBrands, true, CostModel::Vcpm) => FLOOR_SB_VIDEO_VCPM,
        (ProductLine::SponsoredBrands, true, CostModel::Cpc) => FLOOR_SB_VIDEO_CPC,
        (ProductLine::SponsoredBrands, false, CostModel::Vcpm) => FLOOR_SB_VCPM,
        (ProductLine::SponsoredBrands, false, CostModel::Cpc) => FLOOR_SB_CPC,
        (ProductLine::SponsoredProducts, _, _) => FLOOR_SP,
    }
}

/// Bid the guardrails are anchored to: the VCPM rate or the current CPC.
pub fn base_bid(row: &BidRow) -> f64 {
    match row.cost_model {
        CostModel::Vcpm => vcpm_rate(&row.metrics),
        CostModel::Cpc => row.metrics.base_cpc(),
    }
}

/// Bid implied by historical efficiency and the row's target ratio.
pub fn equilibrium_bid(row: &BidRow) -> f64 {
    let m = &row.metrics;
    match row.cost_model {
        CostModel::Vcpm => match m.current_ratio() {
            None => 0.0,
            Some(current) if current > 0.0 => vcpm_rate(m) * (row.target_ratio / current),
            // Sales without spend: any positive target justifies raising the bid.
            Some(_) if row.target_ratio > 0.0 && vcpm_rate(m) > 0.0 => f64::INFINITY,
            Some(_) => 0.0,
        },
        CostModel::Cpc => {
            if m.clicks > 0.0 && m.sales == 0.0 {
                0.0
            } else if m.clicks > 0.0 {
                row.target_ratio * m.sales / m.clicks
            } else {
                m.base_cpc()
            }
        }
    }
}

/// Run the full decision sequence for one row.
pub fn decide(row: &BidRow, guardrails: &Guardrails) -> BidDecision {
    let m = &row.metrics;
    let equilibrium = equilibrium_bid(row);
    let base = base_bid(row);

    let max_increase_limit = match guardrails.increase_basis {
        Some(basis) => base * (1.0 + guardrails.increase_cap * scale(basis, m)),
        None => base,
    };
    let min_decrease_limit = match guardrails.decrease_basis {
        Some(basis) => base * (1.0 - guardrails.decrease_cap * scale(basis, m)),
        None => base,
    };

    let mut clamped = if equilibrium == 0.0 && m.spend > 0.0 {
        // Spend without sales: step down per dollar spent, never below the band.
        (base * (1.0 - guardrails.decrease_cap * m.spend)).max(min_decrease_limit)
    } else if equilibrium < min_decrease_limit {
        min_decrease_limit
    } else if equilibrium > max_increase_limit {
        max_increase_limit
    } else {
        equilibrium
    };

    // Never raise past what both the equilibrium and the old bid support.
    if equilibrium < clamped && m.old_bid < clamped {
        clamped = m.old_bid;
    }

    let floor = minimum_bid(row.product, row.cost_model, row.is_video);
    let recommended_bid = round_to_cents(clamped.max(floor));
    let operation = if recommended_bid != round_to_cents(m.old_bid) {
        Operation::Update
    } else {
        Operation::Unchanged
    };

    BidDecision {
        cost_model: row.cost_model,
        current_ratio: m.current_ratio(),
        equilibrium_bid: equilibrium,
        base_bid: base,
        max_increase_limit,
        min_decrease_limit,
        clamped_bid: clamped,
        floor,
        recommended_bid,
        operation,
    }
}

/// Recommended bid for a row, rounded to cents and at or above its floor.
pub fn compute_recommended_bid(row: &BidRow, guardrails: &Guardrails) -> f64 {
    decide(row, guardrails).recommended_bid
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scale(basis: ScaleBasis, m: &RowMetrics) -> f64 {
    match basis {
        ScaleBasis::Clicks => m.clicks,
        ScaleBasis::Spend => m.spend / 100.0,
        ScaleBasis::Orders => m.orders.unwrap_or(0.0),
    }
}

fn vcpm_rate(m: &RowMetrics) -> f64 {
    m.vcpm_rate.unwrap_or(m.old_bid)
}
