//! Optimizer configuration and fixed domain constants.
//!
//! [`OptimizerConfig`] is what the configuration provider hands the engine:
//! default target ratio, guardrail caps with their scaling basis, an optional
//! minimum-spend threshold and the ordered filter groups. It deserializes from
//! JSON with defaults for every field, so a partial document is valid.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};
use crate::models::FilterGroup;

pub const SPONSORED_PRODUCTS: &str = "Sponsored Products";
pub const SPONSORED_BRANDS: &str = "Sponsored Brands";
pub const SPONSORED_DISPLAY: &str = "Sponsored Display";

/// Product-line strings a sheet must contain at least one of to be processed.
pub const PRODUCT_LINES: [&str; 3] = [SPONSORED_BRANDS, SPONSORED_PRODUCTS, SPONSORED_DISPLAY];

/// When both sheets are present the multi ad group export supersedes the
/// legacy Sponsored Brands sheet.
pub const SB_MULTI_AD_GROUP_SHEET: &str = "SB Multi Ad Group Campaigns";
pub const SB_LEGACY_SHEET: &str = "Sponsored Brands Campaigns";

/// Sponsored Brands rows with no clicks stay eligible above this many impressions.
pub const SB_MIN_IMPRESSIONS: f64 = 1000.0;

/// Rows at or below this final bid are not counted as active in totals.
pub const ACTIVE_BID_THRESHOLD: f64 = 0.01;

/// Size of each top-movers list.
pub const TOP_N_MOVERS: usize = 10;

/// Projected sales never exceed this multiple of current sales.
pub const MAX_SALES_MULTIPLIER: f64 = 3.0;

/// Upper bound of a believable portfolio projected ratio (200% ACoS).
pub const MAX_PLAUSIBLE_RATIO: f64 = 2.0;

/// Upper edges (percent) of the bid-change magnitude buckets; the last bucket is open.
pub const CHANGE_BUCKET_EDGES: [f64; 3] = [10.0, 25.0, 50.0];

// -- Minimum bid floors (USD) ------------------------------------------------

pub const FLOOR_SD_VCPM: f64 = 1.00;
pub const FLOOR_SD_CPC: f64 = 0.10;
pub const FLOOR_SB_VIDEO_VCPM: f64 = 12.00;
pub const FLOOR_SB_VIDEO_CPC: f64 = 0.25;
pub const FLOOR_SB_VCPM: f64 = 8.00;
pub const FLOOR_SB_CPC: f64 = 0.10;
pub const FLOOR_SP: f64 = 0.02;

/// Columns searched, in order, for a row's targeting text.
pub const TARGETING_COLUMNS: [&str; 4] = [
    "Keyword Text",
    "Product Targeting Expression",
    "Product Targeting ID",
    "Ad Group Name",
];

// ---------------------------------------------------------------------------
// ScaleBasis
// ---------------------------------------------------------------------------

/// Row activity metric that scales a guardrail cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleBasis {
    Clicks,
    /// Spend in hundreds of dollars.
    Spend,
    Orders,
}

// ---------------------------------------------------------------------------
// SalesAttribution
// ---------------------------------------------------------------------------

/// Which sales column counts as ad sales for Sponsored Display rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SalesAttribution {
    #[default]
    #[serde(rename = "Sales")]
    Sales,
    #[serde(rename = "Sales (Views & Clicks)")]
    ViewsAndClicks,
}

impl SalesAttribution {
    pub fn column(&self) -> &'static str {
        match self {
            SalesAttribution::Sales => "Sales",
            SalesAttribution::ViewsAndClicks => "Sales (Views & Clicks)",
        }
    }
}

// ---------------------------------------------------------------------------
// Guardrails
// ---------------------------------------------------------------------------

/// Caps limiting how far a recommendation may move from the base bid.
///
/// Caps are fractions (`0.05` is 5%) applied per unit of the scale basis.
/// A `null` basis pins that side of the band to the base bid; an omitted
/// field takes its default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guardrails {
    pub increase_cap: f64,
    pub decrease_cap: f64,
    pub increase_basis: Option<ScaleBasis>,
    pub decrease_basis: Option<ScaleBasis>,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self {
            increase_cap: 0.05,
            decrease_cap: 0.03,
            increase_basis: Some(ScaleBasis::Orders),
            decrease_basis: Some(ScaleBasis::Spend),
        }
    }
}

// ---------------------------------------------------------------------------
// BrandedAsin
// ---------------------------------------------------------------------------

/// Catalogue entry for one of the client's own ASINs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrandedAsin {
    #[serde(default)]
    pub product_group: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
}

// ---------------------------------------------------------------------------
// OptimizerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Target ACoS applied to rows no filter group matches.
    pub default_target_ratio: f64,
    pub guardrails: Guardrails,
    /// Rows spending less than this are excluded before bidding.
    pub min_spend: Option<f64>,
    pub filter_groups: Vec<FilterGroup>,
    pub branded_asins: HashMap<String, BrandedAsin>,
    pub sd_attribution: SalesAttribution,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_target_ratio: 0.15,
            guardrails: Guardrails::default(),
            min_spend: None,
            filter_groups: Vec::new(),
            branded_asins: HashMap::new(),
            sd_attribution: SalesAttribution::Sales,
        }
    }
}

impl OptimizerConfig {
    /// Parse a configuration document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: OptimizerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject values the engine cannot use meaningfully.
    pub fn validate(&self) -> Result<()> {
        check_ratio("default_target_ratio", self.default_target_ratio)?;
        check_ratio("guardrails.increase_cap", self.guardrails.increase_cap)?;
        check_ratio("guardrails.decrease_cap", self.guardrails.decrease_cap)?;
        if let Some(min_spend) = self.min_spend {
            check_ratio("min_spend", min_spend)?;
        }
        for (i, group) in self.filter_groups.iter().enumerate() {
            if group.conditions.is_empty() {
                return Err(OptimizerError::InvalidConfig(format!(
                    "filter group {} has no conditions",
                    i + 1
                )));
            }
            check_ratio(&format!("filter group {} target ratio", i + 1), group.target_ratio)?;
        }
        Ok(())
    }
}

fn check_ratio(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(OptimizerError::InvalidConfig(format!(
            "{} must be a non-negative finite number, got {}",
            name, value
        )));
    }
    Ok(())
}
