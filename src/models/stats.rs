use serde::{Deserialize, Serialize};

use super::row::{BrandingCategory, ProductLine};

// ---------------------------------------------------------------------------
// ChangeBuckets — Histogram of bid-change magnitudes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeBuckets {
    pub up_to_10: u64,
    pub up_to_25: u64,
    pub up_to_50: u64,
    pub over_50: u64,
}

impl ChangeBuckets {
    pub fn total(&self) -> u64 {
        self.up_to_10 + self.up_to_25 + self.up_to_50 + self.over_50
    }
}

// ---------------------------------------------------------------------------
// SegmentTotals — Current vs projected subtotal for one category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentTotals {
    pub rows: u64,
    pub increased: u64,
    pub decreased: u64,
    pub unchanged: u64,
    pub current_spend: f64,
    pub current_sales: f64,
    pub current_clicks: f64,
    pub projected_spend: f64,
    pub projected_sales: f64,
    pub projected_clicks: f64,
    pub sum_old_bids: f64,
    pub sum_new_bids: f64,
    pub bid_count: u64,
}

impl SegmentTotals {
    pub fn current_ratio(&self) -> Option<f64> {
        ratio(self.current_spend, self.current_sales)
    }

    pub fn projected_ratio(&self) -> Option<f64> {
        ratio(self.projected_spend, self.projected_sales)
    }

    pub fn avg_old_bid(&self) -> Option<f64> {
        average(self.sum_old_bids, self.bid_count)
    }

    pub fn avg_new_bid(&self) -> Option<f64> {
        average(self.sum_new_bids, self.bid_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BrandingBreakdown {
    pub branded: SegmentTotals,
    pub non_branded: SegmentTotals,
    pub unknown: SegmentTotals,
}

impl BrandingBreakdown {
    pub fn get(&self, category: BrandingCategory) -> &SegmentTotals {
        match category {
            BrandingCategory::Branded => &self.branded,
            BrandingCategory::NonBranded => &self.non_branded,
            BrandingCategory::Unknown => &self.unknown,
        }
    }

    pub fn get_mut(&mut self, category: BrandingCategory) -> &mut SegmentTotals {
        match category {
            BrandingCategory::Branded => &mut self.branded,
            BrandingCategory::NonBranded => &mut self.non_branded,
            BrandingCategory::Unknown => &mut self.unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductBreakdown {
    pub sponsored_products: SegmentTotals,
    pub sponsored_brands: SegmentTotals,
    pub sponsored_display: SegmentTotals,
}

impl ProductBreakdown {
    pub fn get(&self, product: ProductLine) -> &SegmentTotals {
        match product {
            ProductLine::SponsoredProducts => &self.sponsored_products,
            ProductLine::SponsoredBrands => &self.sponsored_brands,
            ProductLine::SponsoredDisplay => &self.sponsored_display,
        }
    }

    pub fn get_mut(&mut self, product: ProductLine) -> &mut SegmentTotals {
        match product {
            ProductLine::SponsoredProducts => &mut self.sponsored_products,
            ProductLine::SponsoredBrands => &mut self.sponsored_brands,
            ProductLine::SponsoredDisplay => &mut self.sponsored_display,
        }
    }
}

// ---------------------------------------------------------------------------
// TopMover — One of the largest bid changes of a run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMover {
    pub campaign: Option<String>,
    pub target: Option<String>,
    pub old_bid: f64,
    pub new_bid: f64,
    /// Signed percent change; `None` when the old bid was zero.
    pub change_pct: Option<f64>,
    pub spend: f64,
    pub sales: f64,
    /// ACoS in percent, 0 without sales.
    pub acos: f64,
    pub current_cpc: f64,
    pub estimated_new_cpc: f64,
    /// Zero for CPC rows.
    pub vcpm: f64,
}

impl TopMover {
    pub fn abs_change(&self) -> f64 {
        (self.new_bid - self.old_bid).abs()
    }
}

/// Bounded list kept in descending order of absolute change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopMovers {
    pub entries: Vec<TopMover>,
}

// ---------------------------------------------------------------------------
// Heatmap — Changed rows by ACoS band and spend band
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AcosBand {
    #[serde(rename = "0-10%")]
    To10,
    #[serde(rename = "10-20%")]
    To20,
    #[serde(rename = "20-30%")]
    To30,
    #[serde(rename = "30-40%")]
    To40,
    #[serde(rename = "40-50%")]
    To50,
    #[serde(rename = "50-75%")]
    To75,
    #[serde(rename = "75-100%")]
    To100,
    #[serde(rename = "100%+")]
    Over100,
}

impl AcosBand {
    /// Band for an ACoS given in percent. Lower edges are inclusive.
    pub fn of(acos_pct: f64) -> Self {
        match acos_pct {
            a if a < 10.0 => AcosBand::To10,
            a if a < 20.0 => AcosBand::To20,
            a if a < 30.0 => AcosBand::To30,
            a if a < 40.0 => AcosBand::To40,
            a if a < 50.0 => AcosBand::To50,
            a if a < 75.0 => AcosBand::To75,
            a if a < 100.0 => AcosBand::To100,
            _ => AcosBand::Over100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpendBand {
    #[serde(rename = "$0-10")]
    To10,
    #[serde(rename = "$10-50")]
    To50,
    #[serde(rename = "$50-100")]
    To100,
    #[serde(rename = "$100-250")]
    To250,
    #[serde(rename = "$250-500")]
    To500,
    #[serde(rename = "$500-1000")]
    To1000,
    #[serde(rename = "$1000+")]
    Over1000,
}

impl SpendBand {
    pub fn of(spend: f64) -> Self {
        match spend {
            s if s < 10.0 => SpendBand::To10,
            s if s < 50.0 => SpendBand::To50,
            s if s < 100.0 => SpendBand::To100,
            s if s < 250.0 => SpendBand::To250,
            s if s < 500.0 => SpendBand::To500,
            s if s < 1000.0 => SpendBand::To1000,
            _ => SpendBand::Over1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub acos_range: AcosBand,
    pub spend_range: SpendBand,
    pub count: u64,
    pub bid_change: f64,
}

// ---------------------------------------------------------------------------
// AggregateStats — Accumulator for one processing run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_rows: u64,
    pub increased: u64,
    pub decreased: u64,
    pub unchanged: u64,
    pub total_increase_amount: f64,
    pub total_decrease_amount: f64,
    pub sum_old_bids: f64,
    pub sum_new_bids: f64,

    pub sp_count: u64,
    pub sb_count: u64,
    pub sd_count: u64,
    pub vcpm_count: u64,

    // -- Every processed row, for the portfolio projected ratio --
    pub all_rows_spend: f64,
    pub all_rows_sales: f64,
    pub all_rows_projected_spend: f64,
    pub all_rows_projected_sales: f64,

    // -- Active rows only (final bid above the threshold) --
    pub total_spend: f64,
    pub total_sales: f64,
    pub total_clicks: f64,
    pub total_impressions: f64,
    pub projected_total_spend: f64,
    pub projected_total_sales: f64,
    pub projected_total_clicks: f64,

    pub increased_by: ChangeBuckets,
    pub decreased_by: ChangeBuckets,

    pub branding: BrandingBreakdown,
    pub products: ProductBreakdown,

    pub top_increases: TopMovers,
    pub top_decreases: TopMovers,

    pub heatmap: Vec<HeatmapCell>,
}

pub(crate) fn ratio(spend: f64, sales: f64) -> Option<f64> {
    if sales > 0.0 {
        Some(spend / sales)
    } else {
        None
    }
}

fn average(sum: f64, count: u64) -> Option<f64> {
    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}
