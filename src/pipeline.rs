//! Sheet-level processing pipeline.
//!
//! A run walks the workbook's sheets in order. Each eligible sheet is
//! processed into its own [`ProcessedSheet`] with a private
//! [`AggregateStats`]; only sheets that finish are merged into the run totals,
//! so a sheet that fails leaves no trace in the statistics.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, info, warn};

use crate::bidding::decide;
use crate::config::{
    OptimizerConfig, PRODUCT_LINES, SB_LEGACY_SHEET, SB_MIN_IMPRESSIONS, SB_MULTI_AD_GROUP_SHEET,
};
use crate::error::{OptimizerError, Result};
use crate::filter::assign_target_ratios;
use crate::models::{AggregateStats, CostModel, Operation, ProductLine, RowResult};
use crate::projection::project;
use crate::schema::SheetSchema;
use crate::sheet::Sheet;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Current and projected performance of one keyword or target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordProjection {
    pub keyword: String,
    pub spend: f64,
    pub sales: f64,
    pub clicks: f64,
    pub impressions: Option<f64>,
    pub estimated_new_spend: f64,
    pub estimated_new_sales: f64,
    pub estimated_new_clicks: f64,
    pub estimated_new_impressions: Option<f64>,
}

/// Result of processing one sheet.
#[derive(Debug, Clone)]
pub struct ProcessedSheet {
    pub name: String,
    /// Eligible rows with every computed column appended, ready for export.
    pub table: Sheet,
    pub results: Vec<RowResult>,
    /// This sheet's contribution to the run statistics.
    pub stats: AggregateStats,
}

impl ProcessedSheet {
    /// Rows whose recommendation differs from the old bid.
    pub fn updates(&self) -> impl Iterator<Item = &RowResult> {
        self.results
            .iter()
            .filter(|r| r.decision.operation == Operation::Update)
    }

    pub fn keyword_projections(&self) -> Vec<KeywordProjection> {
        self.results
            .iter()
            .map(|r| {
                let m = &r.row.metrics;
                let p = &r.projection;
                KeywordProjection {
                    keyword: r
                        .row
                        .targeting
                        .clone()
                        .or_else(|| r.row.campaign.clone())
                        .unwrap_or_else(|| r.row.source_index.to_string()),
                    spend: m.spend,
                    sales: m.sales,
                    clicks: m.clicks,
                    impressions: m.impressions,
                    estimated_new_spend: p.new_spend,
                    estimated_new_sales: p.new_sales,
                    estimated_new_clicks: p.new_clicks,
                    estimated_new_impressions: p.new_impressions,
                }
            })
            .collect()
    }
}

/// A sheet that aborted with a fatal error.
#[derive(Debug)]
pub struct SheetFailure {
    pub sheet: String,
    pub error: OptimizerError,
}

/// Everything one processing run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub sheets: Vec<ProcessedSheet>,
    /// Sheets passed over: no known product line, or superseded.
    pub skipped: Vec<String>,
    pub failures: Vec<SheetFailure>,
    pub stats: AggregateStats,
    pub eligible_found: bool,
}

impl RunReport {
    pub fn sheet(&self, name: &str) -> Option<&ProcessedSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Sheet selection
// ---------------------------------------------------------------------------

/// Whether any row of `sheet` names one of the three product lines.
pub fn is_eligible_sheet(sheet: &Sheet) -> bool {
    let Some(col) = sheet.column_index("Product") else {
        return false;
    };
    (0..sheet.len()).any(|row| {
        sheet
            .text(row, col)
            .is_some_and(|p| PRODUCT_LINES.contains(&p.as_str()))
    })
}

/// Drop the legacy Sponsored Brands sheet when the multi ad group sheet is
/// also present. Returns the kept sheets and the names dropped.
pub fn select_sheets(sheets: &[Sheet]) -> (Vec<&Sheet>, Vec<String>) {
    let has_multi = sheets.iter().any(|s| s.name == SB_MULTI_AD_GROUP_SHEET);
    let mut kept = Vec::with_capacity(sheets.len());
    let mut dropped = Vec::new();
    for sheet in sheets {
        if has_multi && sheet.name == SB_LEGACY_SHEET {
            debug!(sheet = %sheet.name, "superseded by {}", SB_MULTI_AD_GROUP_SHEET);
            dropped.push(sheet.name.clone());
        } else {
            kept.push(sheet);
        }
    }
    (kept, dropped)
}

/// Indices of rows that pass the eligibility pre-filter.
///
/// A row must be enabled, carry a bid and a known product line, and show
/// activity: clicks, or for Sponsored Brands more than 1000 impressions.
/// Rows below `min_spend` are dropped when a threshold is set.
pub fn eligible_rows(sheet: &Sheet, schema: &SheetSchema, min_spend: Option<f64>) -> Vec<usize> {
    (0..sheet.len())
        .filter(|&row| {
            if !schema.is_enabled(sheet, row) || schema.bid(sheet, row).is_none() {
                return false;
            }
            let Some(product) = schema.product(sheet, row) else {
                return false;
            };
            let clicks = schema.clicks(sheet, row);
            let active = match product {
                ProductLine::SponsoredBrands => {
                    clicks > 0.0
                        || schema
                            .impressions(sheet, row)
                            .is_some_and(|i| i > SB_MIN_IMPRESSIONS)
                }
                _ => clicks > 0.0,
            };
            active && min_spend.map_or(true, |min| schema.spend(sheet, row) >= min)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// Process one sheet: filter, target, bid, project and aggregate.
pub fn process_sheet(sheet: &Sheet, config: &OptimizerConfig) -> Result<ProcessedSheet> {
    let schema = SheetSchema::resolve(sheet)?;
    let eligible = eligible_rows(sheet, &schema, config.min_spend);

    let mut rows: Vec<_> = eligible
        .iter()
        .filter_map(|&idx| schema.read_row(sheet, idx))
        .collect();
    assign_target_ratios(sheet, &mut rows, &config.filter_groups, config.default_target_ratio);

    let results: Vec<RowResult> = rows
        .into_iter()
        .map(|row| {
            let decision = decide(&row, &config.guardrails);
            let projection = project(&row, decision.clamped_bid);
            RowResult {
                row,
                decision,
                projection,
            }
        })
        .collect();

    let stats = AggregateStats::fold(&results);
    let table = augment(sheet, &results);
    debug!(
        sheet = %sheet.name,
        rows = sheet.len(),
        eligible = results.len(),
        updates = stats.increased + stats.decreased,
        "processed sheet"
    );

    Ok(ProcessedSheet {
        name: sheet.name.clone(),
        table,
        results,
        stats,
    })
}

/// Process a whole workbook with fresh statistics.
pub fn run(sheets: &[Sheet], config: &OptimizerConfig) -> RunReport {
    info!(sheets = sheets.len(), "starting bid optimization run");

    let (selected, superseded) = select_sheets(sheets);
    let mut report = RunReport {
        skipped: superseded,
        ..RunReport::default()
    };

    for sheet in selected {
        if !is_eligible_sheet(sheet) {
            debug!(sheet = %sheet.name, "no known product line, skipping");
            report.skipped.push(sheet.name.clone());
            continue;
        }
        report.eligible_found = true;

        match process_sheet(sheet, config) {
            Ok(processed) => {
                report.stats.merge(&processed.stats);
                report.sheets.push(processed);
            }
            Err(error) => {
                warn!(sheet = %sheet.name, %error, "sheet failed");
                report.failures.push(SheetFailure {
                    sheet: sheet.name.clone(),
                    error,
                });
            }
        }
    }

    info!(
        processed = report.sheets.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        rows = report.stats.total_rows,
        "bid optimization run finished"
    );
    report
}

// ---------------------------------------------------------------------------
// Output table
// ---------------------------------------------------------------------------

fn augment(sheet: &Sheet, results: &[RowResult]) -> Sheet {
    let indices: Vec<usize> = results.iter().map(|r| r.row.source_index).collect();
    let mut table = sheet.select_rows(&indices);
    let has_acos = table.has_column("ACoS");

    for (i, r) in results.iter().enumerate() {
        let m = &r.row.metrics;
        let d = &r.decision;
        let p = &r.projection;

        table.set(i, "Operation", Value::String(d.operation.label().to_string()));
        if d.operation == Operation::Update {
            table.set(i, "Bid", num(d.recommended_bid));
        }
        table.set(i, "Old Bid", num(m.old_bid));
        let cost_model = match d.cost_model {
            CostModel::Vcpm => "VCPM",
            CostModel::Cpc => "CPC",
        };
        table.set(i, "Cost Model", Value::String(cost_model.to_string()));
        table.set(i, "VCPM", opt(m.vcpm_rate));
        if !has_acos {
            table.set(i, "ACoS", opt(d.current_ratio));
        }
        table.set(i, "Target ACoS", num(r.row.target_ratio));
        table.set(i, "Current ACoS", opt(d.current_ratio));
        table.set(i, "EQ Bid", num(d.equilibrium_bid));
        table.set(i, "Base Bid", num(d.base_bid));
        table.set(i, "Max Increase Limit", num(d.max_increase_limit));
        table.set(i, "Min Decrease Limit", num(d.min_decrease_limit));
        table.set(i, "Recommended Bid", num(d.recommended_bid));
        table.set(i, "Branding Category", Value::String(r.row.branding.label().to_string()));
        table.set(i, "Bid Change Ratio", num(p.bid_change_ratio));
        table.set(i, "Current CPC", num(p.current_cpc));
        table.set(i, "Estimated New CPC", num(p.new_cpc));
        table.set(i, "Estimated New Clicks", num(p.new_clicks));
        table.set(i, "Estimated New Spend", num(p.new_spend));
        table.set(i, "Estimated New Sales", num(p.new_sales));
        table.set(i, "Estimated New Impressions", opt(p.new_impressions));
        table.set(i, "Estimated New Orders", opt(p.new_orders));
    }
    table
}

/// Non-finite values become empty cells.
fn num(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn opt(value: Option<f64>) -> Value {
    value.map(num).unwrap_or(Value::Null)
}
