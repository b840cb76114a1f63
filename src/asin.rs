//! ASIN-level performance.
//!
//! Joins advertising activity from the bulk sheets with total sales from the
//! sales report, one record per ASIN. The ASIN set is the union of the report's
//! ASINs and the configured branded catalogue.

use std::collections::BTreeSet;

use tracing::debug;

use crate::bidding::round_to_cents;
use crate::config::{BrandedAsin, OptimizerConfig, SalesAttribution};
use crate::models::{AsinPerformance, ProductLine};
use crate::sheet::Sheet;

/// Sales report columns that may hold the ASIN, in lookup order.
const REPORT_ASIN_COLUMNS: [&str; 3] = ["ASIN", "child asin", "parent asin"];
const TOTAL_SALES_COLUMNS: [&str; 2] = ["Total Sales", "total_sales"];
const UNTAGGED_GROUP: &str = "Untagged Group";

#[derive(Debug, Default)]
struct AdTotals {
    spend: f64,
    ad_sales: f64,
    clicks: f64,
    orders: f64,
}

/// Build ASIN performance records, sorted by ASIN.
///
/// Bulk rows are attributed to an ASIN when any column whose header mentions
/// "asin" holds it; a row counts once even if several such columns match.
/// ACoS, TACoS and the share columns are percentages rounded to cents.
pub fn compute_asin_performance(
    bulk: &[Sheet],
    sales_report: Option<&Sheet>,
    config: &OptimizerConfig,
) -> Vec<AsinPerformance> {
    let report = sales_report.and_then(|sheet| {
        let asin = find_column(sheet, &REPORT_ASIN_COLUMNS)?;
        Some((sheet, asin, find_column(sheet, &TOTAL_SALES_COLUMNS)))
    });

    let mut asins = BTreeSet::new();
    if let Some((sheet, asin_col, _)) = report {
        asins.extend((0..sheet.len()).filter_map(|row| sheet.text(row, asin_col)).map(|a| normalize(&a)));
    }
    asins.extend(config.branded_asins.keys().map(|k| normalize(k)));
    asins.retain(|a| !a.is_empty());

    let mut records: Vec<AsinPerformance> = asins
        .into_iter()
        .map(|asin| {
            let ad = ad_totals(bulk, &asin, config.sd_attribution);
            let total_sales = match report {
                Some((sheet, asin_col, Some(total_col))) => (0..sheet.len())
                    .filter(|&row| sheet.text(row, asin_col).is_some_and(|a| normalize(&a) == asin))
                    .filter_map(|row| sheet.number(row, total_col))
                    .sum(),
                _ => 0.0,
            };

            let branded = lookup_branded(config, &asin);
            let product_group = branded
                .and_then(|b| b.product_group.clone())
                .unwrap_or_else(|| UNTAGGED_GROUP.to_string());
            let product_title = branded
                .and_then(|b| b.product_title.clone())
                .unwrap_or_else(|| format!("Unknown Product ({})", asin));

            AsinPerformance {
                acos: percent(ad.spend, ad.ad_sales),
                tacos: percent(ad.spend, total_sales),
                asin,
                product_group,
                product_title,
                spend: ad.spend,
                ad_sales: ad.ad_sales,
                total_sales,
                clicks: ad.clicks,
                orders: ad.orders,
                pct_of_spend: 0.0,
                pct_of_ad_sales: 0.0,
                pct_of_total_sales: 0.0,
            }
        })
        .collect();

    let total_spend: f64 = records.iter().map(|r| r.spend).sum();
    let total_ad_sales: f64 = records.iter().map(|r| r.ad_sales).sum();
    let total_sales: f64 = records.iter().map(|r| r.total_sales).sum();

    for r in &mut records {
        r.pct_of_spend = round_to_cents(percent(r.spend, total_spend));
        r.pct_of_ad_sales = round_to_cents(percent(r.ad_sales, total_ad_sales));
        r.pct_of_total_sales = round_to_cents(percent(r.total_sales, total_sales));
        r.spend = round_to_cents(r.spend);
        r.ad_sales = round_to_cents(r.ad_sales);
        r.total_sales = round_to_cents(r.total_sales);
        r.acos = round_to_cents(r.acos);
        r.tacos = round_to_cents(r.tacos);
    }

    debug!(asins = records.len(), "computed ASIN performance");
    records
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ad_totals(bulk: &[Sheet], asin: &str, attribution: SalesAttribution) -> AdTotals {
    let mut totals = AdTotals::default();

    for sheet in bulk {
        let asin_cols: Vec<usize> = sheet
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.to_lowercase().contains("asin"))
            .map(|(i, _)| i)
            .collect();
        if asin_cols.is_empty() {
            continue;
        }

        let product = sheet.column_index("Product");
        let sales = sheet.column_index("Sales");
        let sd_sales = sheet.column_index(attribution.column());
        let metric = |row: usize, col: Option<usize>| col.and_then(|c| sheet.number(row, c)).unwrap_or(0.0);
        let spend = sheet.column_index("Spend");
        let clicks = sheet.column_index("Clicks");
        let orders = sheet.column_index("Orders");

        for row in 0..sheet.len() {
            let matches = asin_cols
                .iter()
                .any(|&c| sheet.text(row, c).is_some_and(|a| normalize(&a) == asin));
            if !matches {
                continue;
            }

            totals.spend += metric(row, spend);
            totals.clicks += metric(row, clicks);
            totals.orders += metric(row, orders);

            let is_display = product
                .and_then(|c| sheet.text(row, c))
                .and_then(|p| ProductLine::parse(&p))
                == Some(ProductLine::SponsoredDisplay);
            totals.ad_sales += if is_display {
                metric(row, sd_sales)
            } else {
                metric(row, sales)
            };
        }
    }
    totals
}

fn lookup_branded<'a>(config: &'a OptimizerConfig, asin: &str) -> Option<&'a BrandedAsin> {
    config.branded_asins.get(asin).or_else(|| {
        config
            .branded_asins
            .iter()
            .find(|(k, _)| normalize(k) == asin)
            .map(|(_, v)| v)
    })
}

fn find_column(sheet: &Sheet, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|c| sheet.column_index(c))
}

fn normalize(asin: &str) -> String {
    asin.trim().to_uppercase()
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
