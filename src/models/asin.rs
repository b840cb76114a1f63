use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AsinPerformance — Advertising vs total sales for one ASIN
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsinPerformance {
    pub asin: String,
    pub product_group: String,
    pub product_title: String,
    pub spend: f64,
    pub ad_sales: f64,
    pub total_sales: f64,
    pub clicks: f64,
    pub orders: f64,
    /// Spend over ad sales, in percent.
    pub acos: f64,
    /// Spend over total sales, in percent.
    pub tacos: f64,
    pub pct_of_spend: f64,
    pub pct_of_ad_sales: f64,
    pub pct_of_total_sales: f64,
}
