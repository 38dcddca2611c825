//! RFM (Recency / Frequency / Monetary) customer segmentation.
//!
//! Pure computation over the filtered enriched rows: per-customer raw
//! metrics, quartile-by-rank scores in 1..=4, and a fixed decision table
//! mapping the three scores to one of five named segments. Recomputed from
//! scratch on every window change; nothing is persisted.

use crate::dataset::EnrichedRow;
use chrono::{DateTime, Duration, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The five customer segments, in canonical reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Champions,
    #[serde(rename = "Loyal Customers")]
    LoyalCustomers,
    #[serde(rename = "Potential Loyalists")]
    PotentialLoyalists,
    #[serde(rename = "Need Attention")]
    NeedAttention,
    #[serde(rename = "Lost Customers")]
    LostCustomers,
}

impl Segment {
    /// All segments in canonical order.
    pub const ALL: [Segment; 5] = [
        Segment::Champions,
        Segment::LoyalCustomers,
        Segment::PotentialLoyalists,
        Segment::NeedAttention,
        Segment::LostCustomers,
    ];

    /// Human-readable segment name.
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Champions => "Champions",
            Segment::LoyalCustomers => "Loyal Customers",
            Segment::PotentialLoyalists => "Potential Loyalists",
            Segment::NeedAttention => "Need Attention",
            Segment::LostCustomers => "Lost Customers",
        }
    }

    /// The segment decision table, first match wins.
    ///
    /// The rule only consults F/M under R >= 3, so a customer with R=1 and
    /// maximal F/M still lands in Lost Customers. That asymmetry is part of
    /// the contract and is deliberately not rebalanced here.
    pub fn assign(r_score: u8, f_score: u8, m_score: u8) -> Segment {
        if r_score >= 3 && f_score >= 3 && m_score >= 3 {
            Segment::Champions
        } else if r_score >= 3 && f_score >= 2 {
            Segment::LoyalCustomers
        } else if r_score >= 3 {
            Segment::PotentialLoyalists
        } else if r_score == 2 {
            Segment::NeedAttention
        } else {
            Segment::LostCustomers
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One scored customer in the filtered window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmRecord {
    pub customer_unique_id: String,
    /// Whole days between the snapshot date and the customer's most recent
    /// in-window purchase; always >= 1 because the snapshot is one day after
    /// the latest purchase overall.
    pub recency: i64,
    /// Distinct in-window orders; always >= 1.
    pub frequency: usize,
    /// Sum of in-window revenue.
    pub monetary: f64,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub segment: Segment,
}

/// One row of the per-segment summary. All five segments always present,
/// in canonical order; percentages are shares of the window totals and zero
/// when the corresponding total is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub customers: usize,
    pub revenue: f64,
    pub customer_pct: f64,
    pub revenue_pct: f64,
}

struct CustomerMetrics {
    customer_unique_id: String,
    latest_purchase: DateTime<Utc>,
    orders: HashSet<String>,
    monetary: f64,
}

/// Computes the RFM table for the filtered window.
///
/// Customers appear in first-occurrence order over the input rows; that order
/// is the tie-break for all rank-based binning. Rows without a
/// `customer_unique_id` (missing customer record) cannot be attributed and
/// are skipped. An empty window yields an empty table.
pub fn compute_rfm(rows: &[&EnrichedRow]) -> Vec<RfmRecord> {
    let latest_overall = match rows.iter().map(|row| row.purchase_timestamp).max() {
        Some(ts) => ts,
        None => return Vec::new(),
    };
    let snapshot = latest_overall + Duration::days(1);

    // Accumulate per customer in first-appearance order.
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    let mut metrics: Vec<CustomerMetrics> = Vec::new();
    for row in rows {
        let Some(customer_id) = row.customer_unique_id.as_deref() else {
            continue;
        };
        let index = match index_of.get(customer_id) {
            Some(&index) => index,
            None => {
                index_of.insert(customer_id, metrics.len());
                metrics.push(CustomerMetrics {
                    customer_unique_id: customer_id.to_string(),
                    latest_purchase: row.purchase_timestamp,
                    orders: HashSet::new(),
                    monetary: 0.0,
                });
                metrics.len() - 1
            }
        };
        let entry = &mut metrics[index];
        if row.purchase_timestamp > entry.latest_purchase {
            entry.latest_purchase = row.purchase_timestamp;
        }
        entry.orders.insert(row.order_id.clone());
        entry.monetary += row.revenue;
    }

    if metrics.is_empty() {
        return Vec::new();
    }

    // Rank worst-to-best per metric. Recency ranks descending (a larger gap
    // since the last purchase is worse); frequency and monetary ascending.
    let n = metrics.len();
    let r_scores = quartile_scores(n, |order| {
        order.sort_by(|&a, &b| {
            let gap_a = snapshot - metrics[a].latest_purchase;
            let gap_b = snapshot - metrics[b].latest_purchase;
            gap_b.cmp(&gap_a)
        });
    });
    let f_scores = quartile_scores(n, |order| {
        order.sort_by_key(|&i| metrics[i].orders.len());
    });
    let m_scores = quartile_scores(n, |order| {
        order.sort_by_key(|&i| OrderedFloat(metrics[i].monetary));
    });

    metrics
        .into_iter()
        .enumerate()
        .map(|(index, customer)| {
            let recency = (snapshot - customer.latest_purchase).num_days();
            let (r, f, m) = (r_scores[index], f_scores[index], m_scores[index]);
            RfmRecord {
                customer_unique_id: customer.customer_unique_id,
                recency,
                frequency: customer.orders.len(),
                monetary: customer.monetary,
                r_score: r,
                f_score: f,
                m_score: m,
                segment: Segment::assign(r, f, m),
            }
        })
        .collect()
}

/// Quartile-by-rank binning: orders customer indices worst-to-best with the
/// supplied stable sort, then splits them positionally into 4 bins whose
/// sizes differ by at most 1, extra members in the earliest (lowest-score)
/// bins. Returns the 1..=4 score per original index.
///
/// Degenerate fallback: with fewer than 4 customers the binning is
/// under-determined, so every customer receives the top score.
fn quartile_scores<F>(n: usize, sort_worst_to_best: F) -> Vec<u8>
where
    F: FnOnce(&mut Vec<usize>),
{
    if n < 4 {
        return vec![4; n];
    }

    let mut order: Vec<usize> = (0..n).collect();
    sort_worst_to_best(&mut order);

    let base = n / 4;
    let extra = n % 4;
    let mut scores = vec![0u8; n];
    let mut position = 0;
    for bin in 0..4usize {
        let size = base + usize::from(bin < extra);
        for _ in 0..size {
            scores[order[position]] = (bin + 1) as u8;
            position += 1;
        }
    }
    scores
}

/// Per-segment summary over a computed RFM table.
pub fn segment_summary(rfm_table: &[RfmRecord]) -> Vec<SegmentSummary> {
    if rfm_table.is_empty() {
        return Vec::new();
    }

    let total_customers = rfm_table.len() as f64;
    let total_revenue: f64 = rfm_table.iter().map(|record| record.monetary).sum();

    Segment::ALL
        .iter()
        .map(|&segment| {
            let members: Vec<&RfmRecord> = rfm_table
                .iter()
                .filter(|record| record.segment == segment)
                .collect();
            let customers = members.len();
            let revenue: f64 = members.iter().map(|record| record.monetary).sum();
            SegmentSummary {
                segment,
                customers,
                revenue,
                customer_pct: 100.0 * customers as f64 / total_customers,
                revenue_pct: if total_revenue > 0.0 {
                    100.0 * revenue / total_revenue
                } else {
                    0.0
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(
        order_id: &str,
        customer: Option<&str>,
        day: u32,
        revenue: f64,
    ) -> EnrichedRow {
        EnrichedRow {
            order_id: order_id.to_string(),
            purchase_timestamp: Utc.with_ymd_and_hms(2017, 1, day, 12, 0, 0).unwrap(),
            customer_unique_id: customer.map(|c| c.to_string()),
            customer_state: None,
            product_id: None,
            product_category: None,
            revenue,
        }
    }

    fn refs(rows: &[EnrichedRow]) -> Vec<&EnrichedRow> {
        rows.iter().collect()
    }

    #[test]
    fn test_segment_decision_table() {
        assert_eq!(Segment::assign(3, 3, 3), Segment::Champions);
        assert_eq!(Segment::assign(4, 4, 4), Segment::Champions);
        assert_eq!(Segment::assign(3, 2, 1), Segment::LoyalCustomers);
        assert_eq!(Segment::assign(3, 3, 1), Segment::LoyalCustomers);
        assert_eq!(Segment::assign(3, 1, 1), Segment::PotentialLoyalists);
        assert_eq!(Segment::assign(4, 1, 4), Segment::PotentialLoyalists);
        assert_eq!(Segment::assign(2, 4, 4), Segment::NeedAttention);
        assert_eq!(Segment::assign(2, 1, 1), Segment::NeedAttention);
        assert_eq!(Segment::assign(1, 4, 4), Segment::LostCustomers);
        assert_eq!(Segment::assign(1, 1, 1), Segment::LostCustomers);
    }

    #[test]
    fn test_recency_relative_to_snapshot() {
        // Latest purchase overall: day 20 -> snapshot day 21
        let rows = vec![
            row("o1", Some("u1"), 20, 10.0),
            row("o2", Some("u2"), 11, 10.0),
            row("o3", Some("u3"), 16, 10.0),
            row("o4", Some("u4"), 1, 10.0),
        ];
        let rfm = compute_rfm(&refs(&rows));

        let by_id: HashMap<&str, &RfmRecord> = rfm
            .iter()
            .map(|record| (record.customer_unique_id.as_str(), record))
            .collect();
        assert_eq!(by_id["u1"].recency, 1);
        assert_eq!(by_id["u2"].recency, 10);
        assert_eq!(by_id["u3"].recency, 5);
        assert_eq!(by_id["u4"].recency, 20);
    }

    #[test]
    fn test_most_recent_customer_lands_in_top_recency_quartile() {
        // Recencies 1, 5, 10, 20 days across four customers
        let rows = vec![
            row("o1", Some("u1"), 20, 10.0),
            row("o2", Some("u2"), 16, 10.0),
            row("o3", Some("u3"), 11, 10.0),
            row("o4", Some("u4"), 1, 10.0),
        ];
        let rfm = compute_rfm(&refs(&rows));

        let u1 = rfm.iter().find(|r| r.customer_unique_id == "u1").unwrap();
        let u4 = rfm.iter().find(|r| r.customer_unique_id == "u4").unwrap();
        assert_eq!(u1.recency, 1);
        assert_eq!(u1.r_score, 4);
        assert_eq!(u4.recency, 20);
        assert_eq!(u4.r_score, 1);
    }

    #[test]
    fn test_frequency_counts_distinct_orders() {
        let rows = vec![
            row("o1", Some("u1"), 1, 10.0),
            row("o1", Some("u1"), 1, 20.0), // second item of the same order
            row("o2", Some("u1"), 2, 30.0),
            row("o3", Some("u2"), 3, 5.0),
            row("o4", Some("u3"), 4, 5.0),
            row("o5", Some("u4"), 5, 5.0),
        ];
        let rfm = compute_rfm(&refs(&rows));

        let u1 = rfm.iter().find(|r| r.customer_unique_id == "u1").unwrap();
        assert_eq!(u1.frequency, 2);
        assert_eq!(u1.monetary, 60.0);
    }

    #[test]
    fn test_bin_sizes_differ_by_at_most_one() {
        // 10 customers: monetary 1..=10, expect bins of 3, 3, 2, 2
        let ids: Vec<String> = (1..=10).map(|i| format!("u{}", i)).collect();
        let rows: Vec<EnrichedRow> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| row(&format!("o{}", i + 1), Some(id), (i + 1) as u32, (i + 1) as f64))
            .collect();
        let rfm = compute_rfm(&refs(&rows));

        for scores in [
            rfm.iter().map(|r| r.m_score).collect::<Vec<_>>(),
            rfm.iter().map(|r| r.f_score).collect::<Vec<_>>(),
            rfm.iter().map(|r| r.r_score).collect::<Vec<_>>(),
        ] {
            let mut counts = [0usize; 4];
            for score in scores {
                counts[(score - 1) as usize] += 1;
            }
            // floor(10/4) = 2, ceil = 3, extras in the earliest bins
            assert_eq!(counts, [3, 3, 2, 2]);
        }
    }

    #[test]
    fn test_ties_break_by_first_occurrence() {
        // All four customers identical on frequency and monetary: binning
        // falls back to input order, worst (score 1) first.
        let rows = vec![
            row("o1", Some("u1"), 1, 10.0),
            row("o2", Some("u2"), 1, 10.0),
            row("o3", Some("u3"), 1, 10.0),
            row("o4", Some("u4"), 1, 10.0),
        ];
        let rfm = compute_rfm(&refs(&rows));

        let f_scores: Vec<u8> = rfm.iter().map(|r| r.f_score).collect();
        let m_scores: Vec<u8> = rfm.iter().map(|r| r.m_score).collect();
        assert_eq!(f_scores, vec![1, 2, 3, 4]);
        assert_eq!(m_scores, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_fewer_than_four_customers_all_top_bin() {
        let rows = vec![
            row("o1", Some("u1"), 1, 100.0),
            row("o2", Some("u2"), 5, 1.0),
        ];
        let rfm = compute_rfm(&refs(&rows));

        assert_eq!(rfm.len(), 2);
        for record in &rfm {
            assert_eq!(record.r_score, 4);
            assert_eq!(record.f_score, 4);
            assert_eq!(record.m_score, 4);
            assert_eq!(record.segment, Segment::Champions);
        }
    }

    #[test]
    fn test_rows_without_customer_identity_skipped() {
        let rows = vec![
            row("o1", Some("u1"), 1, 10.0),
            row("o2", None, 2, 10.0),
        ];
        let rfm = compute_rfm(&refs(&rows));
        assert_eq!(rfm.len(), 1);
        assert_eq!(rfm[0].customer_unique_id, "u1");
    }

    #[test]
    fn test_empty_window_empty_table() {
        assert!(compute_rfm(&[]).is_empty());
        assert!(segment_summary(&[]).is_empty());
    }

    #[test]
    fn test_segment_summary_percentages() {
        let rows = vec![
            row("o1", Some("u1"), 20, 300.0),
            row("o2", Some("u2"), 16, 100.0),
            row("o3", Some("u3"), 11, 50.0),
            row("o4", Some("u4"), 1, 50.0),
        ];
        let rfm = compute_rfm(&refs(&rows));
        let summary = segment_summary(&rfm);

        assert_eq!(summary.len(), Segment::ALL.len());
        let customer_pct_total: f64 = summary.iter().map(|s| s.customer_pct).sum();
        let revenue_pct_total: f64 = summary.iter().map(|s| s.revenue_pct).sum();
        assert!((customer_pct_total - 100.0).abs() < 1e-9);
        assert!((revenue_pct_total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_rfm_deterministic() {
        let rows = vec![
            row("o1", Some("u1"), 20, 300.0),
            row("o2", Some("u2"), 16, 100.0),
            row("o3", Some("u3"), 11, 50.0),
            row("o4", Some("u4"), 1, 50.0),
            row("o5", Some("u2"), 18, 75.0),
        ];
        let first = compute_rfm(&refs(&rows));
        let second = compute_rfm(&refs(&rows));
        assert_eq!(first, second);
    }
}
