//! Schema normalization for bulk sheets.
//!
//! Header lookups happen once per sheet in [`SheetSchema::resolve`]; every
//! later read goes through the resolved indices and produces a typed
//! [`BidRow`]. Numeric cells that do not parse read as absent, and metrics
//! are clamped to be non-negative.

use crate::bidding::{classify_cost_model, round_to_cents};
use crate::config::TARGETING_COLUMNS;
use crate::error::{OptimizerError, Result};
use crate::filter::resolve_column;
use crate::models::{BidRow, BrandingCategory, ProductLine, RowMetrics};
use crate::sheet::Sheet;

/// Columns a bulk sheet must carry to be processed.
pub const REQUIRED_COLUMNS: [&str; 6] = ["State", "Product", "Bid", "Clicks", "Spend", "Sales"];

/// Resolved column indices for one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSchema {
    pub state: usize,
    pub product: usize,
    pub bid: usize,
    pub clicks: usize,
    pub spend: usize,
    pub sales: usize,
    pub orders: Option<usize>,
    pub impressions: Option<usize>,
    pub viewable_impressions: Option<usize>,
    pub vcpm: Option<usize>,
    pub cost_type: Option<usize>,
    pub cpc: Option<usize>,
    pub campaign: Option<usize>,
    pub targeting: Vec<usize>,
}

impl SheetSchema {
    /// Resolve every recognized column of `sheet`.
    ///
    /// Fails with [`OptimizerError::MissingColumn`] on the first required
    /// column that is absent, listing the columns that were found.
    pub fn resolve(sheet: &Sheet) -> Result<Self> {
        let required = |name: &str| {
            sheet
                .column_index(name)
                .ok_or_else(|| OptimizerError::MissingColumn {
                    sheet: sheet.name.clone(),
                    column: name.to_string(),
                    found: sheet.columns.clone(),
                })
        };

        let mut indices = [0; REQUIRED_COLUMNS.len()];
        for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = required(name)?;
        }
        let [state, product, bid, clicks, spend, sales] = indices;

        Ok(Self {
            state,
            product,
            bid,
            clicks,
            spend,
            sales,
            orders: sheet.column_index("Orders"),
            impressions: sheet.column_index("Impressions"),
            viewable_impressions: sheet.column_index("Viewable Impressions"),
            vcpm: sheet.column_index("VCPM"),
            cost_type: sheet.column_index("Cost Type"),
            cpc: sheet.column_index("CPC"),
            campaign: resolve_column(sheet, "Campaign Name"),
            targeting: TARGETING_COLUMNS
                .iter()
                .filter_map(|c| sheet.column_index(c))
                .collect(),
        })
    }

    // -- Raw accessors -----------------------------------------------------

    pub fn product(&self, sheet: &Sheet, row: usize) -> Option<ProductLine> {
        sheet
            .text(row, self.product)
            .and_then(|p| ProductLine::parse(&p))
    }

    pub fn is_enabled(&self, sheet: &Sheet, row: usize) -> bool {
        sheet
            .text(row, self.state)
            .is_some_and(|s| s.eq_ignore_ascii_case("enabled"))
    }

    pub fn bid(&self, sheet: &Sheet, row: usize) -> Option<f64> {
        sheet.number(row, self.bid)
    }

    pub fn clicks(&self, sheet: &Sheet, row: usize) -> f64 {
        non_negative(sheet.number(row, self.clicks))
    }

    pub fn spend(&self, sheet: &Sheet, row: usize) -> f64 {
        non_negative(sheet.number(row, self.spend))
    }

    pub fn impressions(&self, sheet: &Sheet, row: usize) -> Option<f64> {
        optional(sheet, row, self.impressions)
    }

    pub fn campaign(&self, sheet: &Sheet, row: usize) -> Option<String> {
        self.campaign.and_then(|c| sheet.text(row, c))
    }

    // -- Typed rows ----------------------------------------------------------

    /// Read one row into a [`BidRow`]. `None` when its product line is unknown.
    ///
    /// The target ratio is left at zero; the filter engine assigns it.
    pub fn read_row(&self, sheet: &Sheet, row: usize) -> Option<BidRow> {
        let product = self.product(sheet, row)?;
        let campaign = self.campaign(sheet, row);
        let cost_type = self.cost_type.and_then(|c| sheet.text(row, c));

        let spend = self.spend(sheet, row);
        let impressions = self.impressions(sheet, row);
        let viewable_impressions = optional(sheet, row, self.viewable_impressions);

        let mut vcpm_rate = optional(sheet, row, self.vcpm).filter(|r| *r > 0.0);
        let lower_campaign = campaign.as_deref().map(str::to_lowercase);
        let typed_vcpm = lower_campaign.as_deref().is_some_and(|c| c.contains("vcpm"))
            || (product == ProductLine::SponsoredDisplay
                && cost_type
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case("vcpm")));
        if typed_vcpm && vcpm_rate.is_none() {
            vcpm_rate = derive_vcpm_rate(product, spend, impressions, viewable_impressions)
                .filter(|r| *r > 0.0);
        }

        let cost_model = classify_cost_model(product, campaign.as_deref(), cost_type.as_deref(), vcpm_rate);
        let is_video = lower_campaign
            .as_deref()
            .is_some_and(|c| c.contains("sbv") || c.contains("video"));
        let targeting = self.targeting.iter().find_map(|&c| sheet.text(row, c));

        let metrics = RowMetrics {
            spend,
            sales: non_negative(sheet.number(row, self.sales)),
            clicks: self.clicks(sheet, row),
            orders: optional(sheet, row, self.orders),
            impressions,
            viewable_impressions,
            old_bid: round_to_cents(non_negative(self.bid(sheet, row))),
            cpc: optional(sheet, row, self.cpc),
            vcpm_rate,
        };

        Some(BidRow {
            source_index: row,
            branding: BrandingCategory::classify(campaign.as_deref()),
            campaign,
            targeting,
            product,
            cost_model,
            is_video,
            metrics,
            target_ratio: 0.0,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Cost per thousand impressions, preferring viewable impressions for
/// Sponsored Display.
fn derive_vcpm_rate(
    product: ProductLine,
    spend: f64,
    impressions: Option<f64>,
    viewable_impressions: Option<f64>,
) -> Option<f64> {
    let per_mille = |count: f64| round_to_cents(spend / (count / 1000.0));
    match (product, viewable_impressions, impressions) {
        (ProductLine::SponsoredDisplay, Some(v), _) if v > 0.0 => Some(per_mille(v)),
        (_, _, Some(i)) if i > 0.0 => Some(per_mille(i)),
        _ => None,
    }
}

fn optional(sheet: &Sheet, row: usize, col: Option<usize>) -> Option<f64> {
    col.and_then(|c| sheet.number(row, c)).map(|v| v.max(0.0))
}

fn non_negative(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0).max(0.0)
}
