use serde::{Deserialize, Serialize};

use crate::config::{ACTIVE_BID_THRESHOLD, SPONSORED_BRANDS, SPONSORED_DISPLAY, SPONSORED_PRODUCTS};

// ---------------------------------------------------------------------------
// ProductLine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductLine {
    #[serde(rename = "Sponsored Products")]
    SponsoredProducts,
    #[serde(rename = "Sponsored Brands")]
    SponsoredBrands,
    #[serde(rename = "Sponsored Display")]
    SponsoredDisplay,
}

impl ProductLine {
    /// Parse a `Product` cell, ignoring surrounding whitespace and case.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        if v.eq_ignore_ascii_case(SPONSORED_PRODUCTS) {
            Some(ProductLine::SponsoredProducts)
        } else if v.eq_ignore_ascii_case(SPONSORED_BRANDS) {
            Some(ProductLine::SponsoredBrands)
        } else if v.eq_ignore_ascii_case(SPONSORED_DISPLAY) {
            Some(ProductLine::SponsoredDisplay)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductLine::SponsoredProducts => SPONSORED_PRODUCTS,
            ProductLine::SponsoredBrands => SPONSORED_BRANDS,
            ProductLine::SponsoredDisplay => SPONSORED_DISPLAY,
        }
    }
}

// ---------------------------------------------------------------------------
// CostModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CostModel {
    Cpc,
    Vcpm,
}

// ---------------------------------------------------------------------------
// BrandingCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrandingCategory {
    Branded,
    #[serde(rename = "Non-Branded")]
    NonBranded,
    Unknown,
}

impl BrandingCategory {
    /// Classify a campaign by name. "non" wins over "brand" so that
    /// "Non-Brand" campaigns are not read as branded.
    pub fn classify(campaign_name: Option<&str>) -> Self {
        let Some(name) = campaign_name else {
            return BrandingCategory::Unknown;
        };
        let lower = name.to_lowercase();
        if lower.contains("non") {
            BrandingCategory::NonBranded
        } else if lower.contains("brand") {
            BrandingCategory::Branded
        } else {
            BrandingCategory::NonBranded
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BrandingCategory::Branded => "Branded",
            BrandingCategory::NonBranded => "Non-Branded",
            BrandingCategory::Unknown => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Operation — Marker written to the bulk sheet's Operation column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Update,
    #[serde(rename = "unchanged")]
    Unchanged,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Update => "Update",
            Operation::Unchanged => "unchanged",
        }
    }
}

// ---------------------------------------------------------------------------
// RowMetrics — Historical performance of one row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RowMetrics {
    pub spend: f64,
    pub sales: f64,
    pub clicks: f64,
    pub orders: Option<f64>,
    pub impressions: Option<f64>,
    pub viewable_impressions: Option<f64>,
    /// Bid in the export before optimization, rounded to cents.
    pub old_bid: f64,
    /// Average CPC reported by the export, when present.
    pub cpc: Option<f64>,
    pub vcpm_rate: Option<f64>,
}

impl RowMetrics {
    /// ACoS as a fraction; `None` when there are no sales to divide by.
    pub fn current_ratio(&self) -> Option<f64> {
        if self.sales > 0.0 {
            Some(self.spend / self.sales)
        } else {
            None
        }
    }

    /// Realised cost per click, falling back to the old bid without clicks.
    pub fn current_cpc(&self) -> f64 {
        if self.clicks > 0.0 {
            self.spend / self.clicks
        } else {
            self.old_bid
        }
    }

    /// CPC used as the guardrail base: the exported CPC when it is usable.
    pub fn base_cpc(&self) -> f64 {
        match self.cpc {
            Some(cpc) if cpc.is_finite() && cpc > 0.0 => cpc,
            _ => self.current_cpc(),
        }
    }
}

// ---------------------------------------------------------------------------
// BidRow — Strongly typed, schema-normalized input row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRow {
    /// Index of the row in its source sheet.
    pub source_index: usize,
    pub campaign: Option<String>,
    pub targeting: Option<String>,
    pub product: ProductLine,
    pub cost_model: CostModel,
    /// Sponsored Brands video creative (campaign name mentions SBV or Video).
    pub is_video: bool,
    pub branding: BrandingCategory,
    pub metrics: RowMetrics,
    pub target_ratio: f64,
}

// ---------------------------------------------------------------------------
// BidDecision — Every intermediate of the recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidDecision {
    pub cost_model: CostModel,
    /// `None` when sales are zero (unbounded ratio).
    pub current_ratio: Option<f64>,
    pub equilibrium_bid: f64,
    pub base_bid: f64,
    pub max_increase_limit: f64,
    pub min_decrease_limit: f64,
    pub clamped_bid: f64,
    pub floor: f64,
    pub recommended_bid: f64,
    pub operation: Operation,
}

// ---------------------------------------------------------------------------
// Projection — Estimated performance after the bid change
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionModel {
    /// Click and sales elasticity only.
    Elasticity,
    /// Impression share, CTR and conversion-rate model.
    Impressions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub model: ProjectionModel,
    pub bid_change_ratio: f64,
    pub current_cpc: f64,
    pub new_clicks: f64,
    pub new_cpc: f64,
    pub new_spend: f64,
    pub new_sales: f64,
    pub new_impressions: Option<f64>,
    pub new_orders: Option<f64>,
}

// ---------------------------------------------------------------------------
// RowResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidChange {
    Increased,
    Decreased,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowResult {
    pub row: BidRow,
    pub decision: BidDecision,
    pub projection: Projection,
}

impl RowResult {
    pub fn old_bid(&self) -> f64 {
        self.row.metrics.old_bid
    }

    pub fn new_bid(&self) -> f64 {
        self.decision.recommended_bid
    }

    /// Bid written back to the sheet.
    pub fn final_bid(&self) -> f64 {
        match self.decision.operation {
            Operation::Update => self.decision.recommended_bid,
            Operation::Unchanged => self.row.metrics.old_bid,
        }
    }

    /// Rows with a near-zero final bid are not meaningfully active.
    pub fn is_active(&self) -> bool {
        self.final_bid() > ACTIVE_BID_THRESHOLD
    }

    /// Direction of the change; rows without an old bid count as unchanged.
    pub fn change(&self) -> BidChange {
        let (old, new) = (self.old_bid(), self.new_bid());
        if old > 0.0 && new > old {
            BidChange::Increased
        } else if old > 0.0 && new < old {
            BidChange::Decreased
        } else {
            BidChange::Unchanged
        }
    }
}
