//! Bid optimization engine for sponsored advertising bulk sheets.
//!
//! Takes the sheets of a bulk export, assigns each eligible row a target ACoS
//! through ordered filter groups, recommends a new bid within guardrails and
//! minimum-bid floors, projects the resulting clicks, spend and sales, and
//! aggregates the run into summary statistics.
//!
//! # Quick start
//!
//! ```
//! use bid_optimizer::{BidOptimizer, Sheet};
//! use serde_json::json;
//!
//! let optimizer = BidOptimizer::builder().target_ratio(0.20).build().unwrap();
//!
//! let sheet = Sheet::from_records(
//!     "Sponsored Products Campaigns",
//!     &[json!({
//!         "State": "enabled", "Product": "Sponsored Products",
//!         "Bid": 0.50, "Clicks": 100, "Spend": 20.0, "Sales": 50.0
//!     })],
//! );
//!
//! let report = optimizer.process(&[sheet]);
//! assert_eq!(report.stats.total_rows, 1);
//! ```

pub mod asin;
pub mod bidding;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod projection;
pub mod report;
pub mod schema;
pub mod sheet;

pub use config::{Guardrails, OptimizerConfig, ScaleBasis};
pub use error::{OptimizerError, Result};
pub use filter::FilterGroupBuilder;
pub use pipeline::{ProcessedSheet, RunReport, SheetFailure};
pub use sheet::Sheet;

use std::fmt;

use models::{AggregateStats, AsinPerformance, FilterGroup};

// ---------------------------------------------------------------------------
// BidOptimizerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`BidOptimizer`].
///
/// Starts from [`OptimizerConfig::default()`]. Use [`BidOptimizer::builder()`]
/// to obtain one, chain settings, and call [`build()`](BidOptimizerBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct BidOptimizerBuilder {
    config: OptimizerConfig,
}

impl BidOptimizerBuilder {
    /// Replace the whole configuration, e.g. one loaded with
    /// [`OptimizerConfig::from_path`].
    pub fn config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Target ACoS for rows no filter group matches. Defaults to `0.15`.
    pub fn target_ratio(mut self, ratio: f64) -> Self {
        self.config.default_target_ratio = ratio;
        self
    }

    pub fn guardrails(mut self, guardrails: Guardrails) -> Self {
        self.config.guardrails = guardrails;
        self
    }

    pub fn increase_cap(mut self, cap: f64) -> Self {
        self.config.guardrails.increase_cap = cap;
        self
    }

    pub fn decrease_cap(mut self, cap: f64) -> Self {
        self.config.guardrails.decrease_cap = cap;
        self
    }

    /// Metric scaling the increase cap; `None` pins the upper limit to the base bid.
    pub fn increase_basis(mut self, basis: Option<ScaleBasis>) -> Self {
        self.config.guardrails.increase_basis = basis;
        self
    }

    /// Metric scaling the decrease cap; `None` pins the lower limit to the base bid.
    pub fn decrease_basis(mut self, basis: Option<ScaleBasis>) -> Self {
        self.config.guardrails.decrease_basis = basis;
        self
    }

    /// Exclude rows spending less than `min_spend`.
    pub fn min_spend(mut self, min_spend: f64) -> Self {
        self.config.min_spend = Some(min_spend);
        self
    }

    /// Append a filter group. Later groups win when several match a row.
    pub fn filter_group(mut self, group: FilterGroup) -> Self {
        self.config.filter_groups.push(group);
        self
    }

    /// Validate the configuration and build the optimizer.
    pub fn build(self) -> Result<BidOptimizer> {
        self.config.validate()?;
        Ok(BidOptimizer {
            config: self.config,
        })
    }
}

// ---------------------------------------------------------------------------
// BidOptimizer
// ---------------------------------------------------------------------------

/// The main entry point: a validated configuration plus the run operations.
///
/// Every run starts with fresh statistics; nothing carries over between calls.
#[derive(Debug, Clone)]
pub struct BidOptimizer {
    config: OptimizerConfig,
}

impl BidOptimizer {
    /// Create a new builder with default settings.
    pub fn builder() -> BidOptimizerBuilder {
        BidOptimizerBuilder::default()
    }

    /// Build directly from a configuration, validating it first.
    pub fn from_config(config: OptimizerConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Replace the filter groups wholesale.
    pub fn set_filter_groups(&mut self, groups: Vec<FilterGroup>) -> Result<()> {
        let mut config = self.config.clone();
        config.filter_groups = groups;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    // -- Runs ----------------------------------------------------------------

    /// Process a workbook. Sheet-level failures are collected on the report.
    pub fn process(&self, sheets: &[Sheet]) -> RunReport {
        pipeline::run(sheets, &self.config)
    }

    /// Like [`process`](Self::process), but fails when no sheet names a
    /// known product line.
    pub fn process_strict(&self, sheets: &[Sheet]) -> Result<RunReport> {
        let report = self.process(sheets);
        if !report.eligible_found {
            return Err(OptimizerError::NoEligibleSheets);
        }
        Ok(report)
    }

    /// Process a single sheet in isolation.
    pub fn process_sheet(&self, sheet: &Sheet) -> Result<ProcessedSheet> {
        pipeline::process_sheet(sheet, &self.config)
    }

    /// Per-ASIN advertising and total-sales performance.
    pub fn asin_performance(&self, bulk: &[Sheet], sales_report: Option<&Sheet>) -> Vec<AsinPerformance> {
        asin::compute_asin_performance(bulk, sales_report, &self.config)
    }

    /// Fold already-processed sheets into one set of statistics.
    pub fn summarize(&self, sheets: &[ProcessedSheet]) -> AggregateStats {
        let mut stats = AggregateStats::new();
        for sheet in sheets {
            stats.merge(&sheet.stats);
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for BidOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.config.guardrails;
        write!(
            f,
            "BidOptimizer(target={:.2}%, increase_cap={}, decrease_cap={}, filter_groups={})",
            self.config.default_target_ratio * 100.0,
            g.increase_cap,
            g.decrease_cap,
            self.config.filter_groups.len()
        )
    }
}
