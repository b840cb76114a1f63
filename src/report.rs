//! Aggregation of per-row results into run-level statistics.
//!
//! [`AggregateStats`] is created fresh for each run, updated one row at a time
//! with [`AggregateStats::record`], and combined across sheets with
//! [`AggregateStats::merge`]. Sums commute; the top-mover lists and heatmap keep
//! insertion order, so merging in sheet order reproduces a sequential fold.

use tracing::debug;

use crate::config::{CHANGE_BUCKET_EDGES, MAX_PLAUSIBLE_RATIO, TOP_N_MOVERS};
use crate::models::stats::ratio;
use crate::models::{
    AcosBand, AggregateStats, BidChange, ChangeBuckets, CostModel, HeatmapCell, ProductLine,
    RowResult, SegmentTotals, SpendBand, TopMover, TopMovers,
};

// ---------------------------------------------------------------------------
// AggregateStats
// ---------------------------------------------------------------------------

impl AggregateStats {
    /// Empty accumulator for a new run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a set of row results into fresh statistics.
    pub fn fold<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a RowResult>,
    {
        let mut stats = Self::new();
        for result in results {
            stats.record(result);
        }
        stats
    }

    /// Add one row's outcome.
    pub fn record(&mut self, result: &RowResult) {
        let old = result.old_bid();
        let new = result.new_bid();
        let m = &result.row.metrics;
        let p = &result.projection;

        self.total_rows += 1;
        self.sum_old_bids += old;
        self.sum_new_bids += new;

        match result.change() {
            BidChange::Increased => {
                self.increased += 1;
                self.total_increase_amount += new - old;
                self.increased_by.record((new / old - 1.0) * 100.0);
            }
            BidChange::Decreased => {
                self.decreased += 1;
                self.total_decrease_amount += old - new;
                self.decreased_by.record((old / new - 1.0) * 100.0);
            }
            BidChange::Unchanged => self.unchanged += 1,
        }

        match result.row.product {
            ProductLine::SponsoredProducts => self.sp_count += 1,
            ProductLine::SponsoredBrands => self.sb_count += 1,
            ProductLine::SponsoredDisplay => self.sd_count += 1,
        }
        if result.row.cost_model == CostModel::Vcpm {
            self.vcpm_count += 1;
        }

        self.all_rows_spend += m.spend;
        self.all_rows_sales += m.sales;
        self.all_rows_projected_spend += p.new_spend;
        self.all_rows_projected_sales += p.new_sales;

        if result.is_active() {
            self.total_spend += m.spend;
            self.total_sales += m.sales;
            self.total_clicks += m.clicks;
            self.total_impressions += m.impressions.unwrap_or(0.0);
            self.projected_total_spend += p.new_spend;
            self.projected_total_sales += p.new_sales;
            self.projected_total_clicks += p.new_clicks;

            self.branding.get_mut(result.row.branding).record(result);
            self.products.get_mut(result.row.product).record(result);
        }

        if new != old {
            let mover = TopMover::from_result(result);
            if new > old {
                self.top_increases.push(mover);
            } else {
                self.top_decreases.push(mover);
            }

            if result.is_active() {
                let acos_pct = ratio(m.spend, m.sales).map(|r| r * 100.0).unwrap_or(0.0);
                self.add_heatmap(AcosBand::of(acos_pct), SpendBand::of(m.spend), 1, new - old);
            }
        }
    }

    /// Combine another accumulator into this one, as if its rows were
    /// recorded after this one's.
    pub fn merge(&mut self, other: &AggregateStats) {
        self.total_rows += other.total_rows;
        self.increased += other.increased;
        self.decreased += other.decreased;
        self.unchanged += other.unchanged;
        self.total_increase_amount += other.total_increase_amount;
        self.total_decrease_amount += other.total_decrease_amount;
        self.sum_old_bids += other.sum_old_bids;
        self.sum_new_bids += other.sum_new_bids;

        self.sp_count += other.sp_count;
        self.sb_count += other.sb_count;
        self.sd_count += other.sd_count;
        self.vcpm_count += other.vcpm_count;

        self.all_rows_spend += other.all_rows_spend;
        self.all_rows_sales += other.all_rows_sales;
        self.all_rows_projected_spend += other.all_rows_projected_spend;
        self.all_rows_projected_sales += other.all_rows_projected_sales;

        self.total_spend += other.total_spend;
        self.total_sales += other.total_sales;
        self.total_clicks += other.total_clicks;
        self.total_impressions += other.total_impressions;
        self.projected_total_spend += other.projected_total_spend;
        self.projected_total_sales += other.projected_total_sales;
        self.projected_total_clicks += other.projected_total_clicks;

        self.increased_by.merge(&other.increased_by);
        self.decreased_by.merge(&other.decreased_by);

        self.branding.branded.merge(&other.branding.branded);
        self.branding.non_branded.merge(&other.branding.non_branded);
        self.branding.unknown.merge(&other.branding.unknown);
        self.products.sponsored_products.merge(&other.products.sponsored_products);
        self.products.sponsored_brands.merge(&other.products.sponsored_brands);
        self.products.sponsored_display.merge(&other.products.sponsored_display);

        for mover in &other.top_increases.entries {
            self.top_increases.push(mover.clone());
        }
        for mover in &other.top_decreases.entries {
            self.top_decreases.push(mover.clone());
        }

        for cell in &other.heatmap {
            self.add_heatmap(cell.acos_range, cell.spend_range, cell.count, cell.bid_change);
        }
    }

    // -- Derived figures ---------------------------------------------------

    /// Spend over sales across active rows.
    pub fn current_ratio(&self) -> Option<f64> {
        ratio(self.total_spend, self.total_sales)
    }

    pub fn avg_old_bid(&self) -> Option<f64> {
        self.per_row(self.sum_old_bids)
    }

    pub fn avg_new_bid(&self) -> Option<f64> {
        self.per_row(self.sum_new_bids)
    }

    /// Sum of new bids over sum of old bids; 1 when there are no old bids.
    pub fn avg_bid_change_ratio(&self) -> f64 {
        if self.sum_old_bids > 0.0 {
            self.sum_new_bids / self.sum_old_bids
        } else {
            1.0
        }
    }

    /// Projected spend over projected sales across every processed row,
    /// sanity-checked.
    ///
    /// A projection outside `(0, 2.0]` is replaced by the all-rows current
    /// ratio scaled by the average bid change to the power 0.7. `None` without
    /// projected sales.
    pub fn projected_ratio(&self) -> Option<f64> {
        let projected = ratio(self.all_rows_projected_spend, self.all_rows_projected_sales)?;
        if projected > 0.0 && projected <= MAX_PLAUSIBLE_RATIO {
            return Some(projected);
        }

        let current = ratio(self.all_rows_spend, self.all_rows_sales).unwrap_or(0.0);
        let fallback = current * self.avg_bid_change_ratio().powf(0.7);
        debug!(projected, fallback, "projected ratio out of range, using bid-change fallback");
        Some(fallback)
    }

    fn per_row(&self, sum: f64) -> Option<f64> {
        if self.total_rows > 0 {
            Some(sum / self.total_rows as f64)
        } else {
            None
        }
    }

    fn add_heatmap(&mut self, acos_range: AcosBand, spend_range: SpendBand, count: u64, bid_change: f64) {
        match self
            .heatmap
            .iter_mut()
            .find(|c| c.acos_range == acos_range && c.spend_range == spend_range)
        {
            Some(cell) => {
                cell.count += count;
                cell.bid_change += bid_change;
            }
            None => self.heatmap.push(HeatmapCell {
                acos_range,
                spend_range,
                count,
                bid_change,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeBuckets
// ---------------------------------------------------------------------------

impl ChangeBuckets {
    /// Count a change given in percent. Non-positive changes are ignored.
    pub fn record(&mut self, pct: f64) {
        if pct.is_nan() || pct <= 0.0 {
            return;
        }
        let [to_10, to_25, to_50] = CHANGE_BUCKET_EDGES;
        if pct <= to_10 {
            self.up_to_10 += 1;
        } else if pct <= to_25 {
            self.up_to_25 += 1;
        } else if pct <= to_50 {
            self.up_to_50 += 1;
        } else {
            self.over_50 += 1;
        }
    }

    fn merge(&mut self, other: &ChangeBuckets) {
        self.up_to_10 += other.up_to_10;
        self.up_to_25 += other.up_to_25;
        self.up_to_50 += other.up_to_50;
        self.over_50 += other.over_50;
    }
}

// ---------------------------------------------------------------------------
// SegmentTotals
// ---------------------------------------------------------------------------

impl SegmentTotals {
    fn record(&mut self, result: &RowResult) {
        let (old, new) = (result.old_bid(), result.new_bid());
        let m = &result.row.metrics;
        let p = &result.projection;

        self.rows += 1;
        if new > old {
            self.increased += 1;
        } else if new < old {
            self.decreased += 1;
        } else {
            self.unchanged += 1;
        }
        self.current_spend += m.spend;
        self.current_sales += m.sales;
        self.current_clicks += m.clicks;
        self.projected_spend += p.new_spend;
        self.projected_sales += p.new_sales;
        self.projected_clicks += p.new_clicks;
        self.sum_old_bids += old;
        self.sum_new_bids += new;
        self.bid_count += 1;
    }

    fn merge(&mut self, other: &SegmentTotals) {
        self.rows += other.rows;
        self.increased += other.increased;
        self.decreased += other.decreased;
        self.unchanged += other.unchanged;
        self.current_spend += other.current_spend;
        self.current_sales += other.current_sales;
        self.current_clicks += other.current_clicks;
        self.projected_spend += other.projected_spend;
        self.projected_sales += other.projected_sales;
        self.projected_clicks += other.projected_clicks;
        self.sum_old_bids += other.sum_old_bids;
        self.sum_new_bids += other.sum_new_bids;
        self.bid_count += other.bid_count;
    }
}

// ---------------------------------------------------------------------------
// Top movers
// ---------------------------------------------------------------------------

impl TopMover {
    pub fn from_result(result: &RowResult) -> Self {
        let m = &result.row.metrics;
        let old = result.old_bid();
        let new = result.new_bid();
        let change_pct = if old > 0.0 {
            Some((new - old) / old * 100.0)
        } else {
            None
        };
        let vcpm = match result.row.cost_model {
            CostModel::Vcpm => m.vcpm_rate.unwrap_or(0.0),
            CostModel::Cpc => 0.0,
        };

        Self {
            campaign: result.row.campaign.clone(),
            target: result.row.targeting.clone(),
            old_bid: old,
            new_bid: new,
            change_pct,
            spend: m.spend,
            sales: m.sales,
            acos: ratio(m.spend, m.sales).map(|r| r * 100.0).unwrap_or(0.0),
            current_cpc: result.projection.current_cpc,
            estimated_new_cpc: result.projection.new_cpc,
            vcpm,
        }
    }
}

impl TopMovers {
    /// Insert keeping the list sorted by absolute change, largest first.
    ///
    /// Equal changes keep insertion order; the list never exceeds
    /// [`TOP_N_MOVERS`] entries.
    pub fn push(&mut self, mover: TopMover) {
        let change = mover.abs_change();
        let pos = self
            .entries
            .iter()
            .position(|e| e.abs_change() < change)
            .unwrap_or(self.entries.len());
        if pos >= TOP_N_MOVERS {
            return;
        }
        self.entries.insert(pos, mover);
        self.entries.truncate(TOP_N_MOVERS);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
