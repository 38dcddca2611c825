//! Structured narrative findings derived from the aggregate tables.
//!
//! Each generator consumes one summary table and emits an ordered list of
//! findings with a kind, the subject the finding is about, a templated
//! message, and the literal metric values substituted into it. Percentage
//! bases are always the filtered window's totals, recomputed per tab, so a
//! segmentation finding and a category finding use unrelated denominators.
//! An empty window produces no findings anywhere.

use crate::aggregate::{
    CategorySummary, DailySummary, HourlySummary, MonthlySummary, RegionSummary,
};
use crate::rfm::{Segment, SegmentSummary};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Classification of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Driver,
    Risk,
    Opportunity,
    Trend,
}

/// A named numeric value substituted into the finding message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
}

impl Metric {
    fn new(name: &str, value: f64) -> Self {
        Metric {
            name: name.to_string(),
            value,
        }
    }
}

/// One derived narrative finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    /// The group value the finding is about (segment name, category, state,
    /// weekday, ...).
    pub subject: String,
    pub message: String,
    pub metrics: Vec<Metric>,
}

/// First element maximizing `key`; ties resolve to the earliest element.
fn max_by_first<'a, T, F>(items: &'a [T], key: F) -> Option<&'a T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, OrderedFloat<f64>)> = None;
    for item in items {
        let value = OrderedFloat(key(item));
        match &best {
            Some((_, best_value)) if value <= *best_value => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

/// First element minimizing `key`; ties resolve to the earliest element.
fn min_by_first<'a, T, F>(items: &'a [T], key: F) -> Option<&'a T>
where
    F: Fn(&T) -> f64,
{
    max_by_first(items, |item| -key(item))
}

/// Findings for the customer-segmentation view.
pub fn segmentation_findings(summary: &[SegmentSummary]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if summary.iter().all(|s| s.customers == 0) {
        return findings;
    }

    // Revenue concentration: which segment drives the window's revenue.
    if let Some(top) = max_by_first(summary, |s| s.revenue) {
        findings.push(Finding {
            kind: FindingKind::Driver,
            subject: top.segment.label().to_string(),
            message: format!(
                "Segment {} contributes {:.1}% of total revenue while covering {:.1}% of customers.",
                top.segment, top.revenue_pct, top.customer_pct
            ),
            metrics: vec![
                Metric::new("revenue_pct", top.revenue_pct),
                Metric::new("customer_pct", top.customer_pct),
            ],
        });
    }

    // Attrition risk from the Lost Customers share.
    if let Some(lost) = summary
        .iter()
        .find(|s| s.segment == Segment::LostCustomers && s.customers > 0)
    {
        findings.push(Finding {
            kind: FindingKind::Risk,
            subject: lost.segment.label().to_string(),
            message: format!(
                "{:.1}% of customers sit in the Lost Customers segment, indicating revenue at risk without reactivation.",
                lost.customer_pct
            ),
            metrics: vec![Metric::new("customer_pct", lost.customer_pct)],
        });
    }

    // Growth opportunity from the mid-tier segments.
    let growable: Vec<&SegmentSummary> = summary
        .iter()
        .filter(|s| {
            s.segment == Segment::PotentialLoyalists || s.segment == Segment::NeedAttention
        })
        .collect();
    let growable_customers: usize = growable.iter().map(|s| s.customers).sum();
    if growable_customers > 0 {
        let combined_pct: f64 = growable.iter().map(|s| s.customer_pct).sum();
        findings.push(Finding {
            kind: FindingKind::Opportunity,
            subject: "Potential Loyalists + Need Attention".to_string(),
            message: format!(
                "Potential Loyalists and Need Attention together cover {:.1}% of the customer base and can be upgraded to high-value customers.",
                combined_pct
            ),
            metrics: vec![Metric::new("customer_pct", combined_pct)],
        });
    }

    findings
}

/// Findings for the temporal view.
pub fn temporal_findings(
    daily: &[DailySummary],
    hourly: &[HourlySummary],
    monthly: &[MonthlySummary],
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let total_transactions: usize = daily.iter().map(|d| d.transactions).sum();
    if total_transactions == 0 {
        return findings;
    }

    if let Some(peak_day) = max_by_first(daily, |d| d.transactions as f64) {
        findings.push(Finding {
            kind: FindingKind::Driver,
            subject: peak_day.day.clone(),
            message: format!(
                "{} is the peak transaction day with {} transactions; promotions and operations should be ready for it.",
                peak_day.day, peak_day.transactions
            ),
            metrics: vec![Metric::new("transactions", peak_day.transactions as f64)],
        });
    }

    if let Some(peak_hour) = max_by_first(hourly, |h| h.transactions as f64) {
        findings.push(Finding {
            kind: FindingKind::Opportunity,
            subject: format!("{:02}:00", peak_hour.hour),
            message: format!(
                "The busiest hour is {:02}:00 with {} transactions, critical for system, logistics and support capacity.",
                peak_hour.hour, peak_hour.transactions
            ),
            metrics: vec![
                Metric::new("hour", peak_hour.hour as f64),
                Metric::new("transactions", peak_hour.transactions as f64),
            ],
        });
    }

    // Weekend vs weekday dominance.
    let weekend: usize = daily
        .iter()
        .filter(|d| d.day == "Saturday" || d.day == "Sunday")
        .map(|d| d.transactions)
        .sum();
    let weekday = total_transactions - weekend;
    let (subject, message) = if weekend > weekday {
        (
            "Weekend",
            "Weekend transaction volume exceeds weekdays; campaigns and stock availability should focus on weekends.",
        )
    } else {
        (
            "Weekday",
            "Most transactions happen on weekdays; weekday fulfillment capacity is the key performance factor.",
        )
    };
    findings.push(Finding {
        kind: FindingKind::Risk,
        subject: subject.to_string(),
        message: message.to_string(),
        metrics: vec![
            Metric::new("weekend_transactions", weekend as f64),
            Metric::new("weekday_transactions", weekday as f64),
        ],
    });

    // Month-over-month trend needs at least two populated month buckets.
    if monthly.len() >= 2 {
        let latest = &monthly[monthly.len() - 1];
        let previous = &monthly[monthly.len() - 2];
        let delta = latest.transactions as f64 - previous.transactions as f64;
        let message = if delta > 0.0 {
            format!(
                "Transaction volume grew from {} to {} in {}, signalling positive momentum.",
                previous.transactions, latest.transactions, latest.month
            )
        } else {
            format!(
                "Transaction volume fell from {} to {} in {}, signalling a demand slowdown.",
                previous.transactions, latest.transactions, latest.month
            )
        };
        findings.push(Finding {
            kind: FindingKind::Trend,
            subject: latest.month.clone(),
            message,
            metrics: vec![
                Metric::new("delta", delta),
                Metric::new("latest", latest.transactions as f64),
                Metric::new("previous", previous.transactions as f64),
            ],
        });
    }

    findings
}

/// Findings for the category view.
pub fn category_findings(summary: &[CategorySummary]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if summary.is_empty() {
        return findings;
    }
    let total_revenue: f64 = summary.iter().map(|c| c.measures.total_revenue).sum();

    if let Some(top) = max_by_first(summary, |c| c.measures.total_revenue) {
        let revenue_pct = if total_revenue > 0.0 {
            100.0 * top.measures.total_revenue / total_revenue
        } else {
            0.0
        };
        findings.push(Finding {
            kind: FindingKind::Driver,
            subject: top.category.clone(),
            message: format!(
                "Category {} is the main revenue contributor with {:.1}% of total revenue.",
                top.category, revenue_pct
            ),
            metrics: vec![Metric::new("revenue_pct", revenue_pct)],
        });
    }

    if let Some(thin) = min_by_first(summary, |c| c.product_count as f64) {
        findings.push(Finding {
            kind: FindingKind::Risk,
            subject: thin.category.clone(),
            message: format!(
                "Category {} carries only {} distinct products, limiting its growth headroom if demand rises.",
                thin.category, thin.product_count
            ),
            metrics: vec![Metric::new("product_count", thin.product_count as f64)],
        });
    }

    // Groups with no orders have no AOV and are excluded from the ranking.
    let with_aov: Vec<&CategorySummary> =
        summary.iter().filter(|c| c.measures.aov.is_some()).collect();
    if let Some(premium) = max_by_first(&with_aov, |c| c.measures.aov.unwrap_or(0.0)) {
        let aov = premium.measures.aov.unwrap_or(0.0);
        findings.push(Finding {
            kind: FindingKind::Opportunity,
            subject: premium.category.clone(),
            message: format!(
                "Category {} has the highest average order value ({:.2}), a candidate for premium pricing or upselling.",
                premium.category, aov
            ),
            metrics: vec![Metric::new("aov", aov)],
        });
    }

    findings
}

/// Findings for the geographic view.
pub fn geographic_findings(summary: &[RegionSummary]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if summary.is_empty() {
        return findings;
    }
    let total_revenue: f64 = summary.iter().map(|s| s.measures.total_revenue).sum();
    let total_orders: usize = summary.iter().map(|s| s.measures.total_orders).sum();

    if let Some(top) = max_by_first(summary, |s| s.measures.total_revenue) {
        let revenue_pct = if total_revenue > 0.0 {
            100.0 * top.measures.total_revenue / total_revenue
        } else {
            0.0
        };
        findings.push(Finding {
            kind: FindingKind::Driver,
            subject: top.state.clone(),
            message: format!(
                "State {} is the largest revenue contributor with {:.1}% of total revenue.",
                top.state, revenue_pct
            ),
            metrics: vec![Metric::new("revenue_pct", revenue_pct)],
        });
    }

    if let Some(hotspot) = max_by_first(summary, |s| s.measures.total_orders as f64) {
        let order_pct = if total_orders > 0 {
            100.0 * hotspot.measures.total_orders as f64 / total_orders as f64
        } else {
            0.0
        };
        findings.push(Finding {
            kind: FindingKind::Opportunity,
            subject: hotspot.state.clone(),
            message: format!(
                "State {} records the highest order volume ({:.1}% of all orders), ideal for acquisition and operational scaling.",
                hotspot.state, order_pct
            ),
            metrics: vec![Metric::new("order_pct", order_pct)],
        });
    }

    let with_rpo: Vec<&RegionSummary> = summary
        .iter()
        .filter(|s| s.revenue_per_order.is_some())
        .collect();
    if let Some(high_value) = max_by_first(&with_rpo, |s| s.revenue_per_order.unwrap_or(0.0)) {
        let rpo = high_value.revenue_per_order.unwrap_or(0.0);
        findings.push(Finding {
            kind: FindingKind::Risk,
            subject: high_value.state.clone(),
            message: format!(
                "State {} shows the highest revenue per order ({:.2}); regional strategies should not be uniform.",
                high_value.state, rpo
            ),
            metrics: vec![Metric::new("revenue_per_order", rpo)],
        });
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{self, GroupMeasures};
    use crate::dataset::test_fixtures::sample_tables;
    use crate::dataset::{DateRange, Dataset};
    use crate::rfm;
    use chrono::NaiveDate;

    fn full_range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
        )
    }

    fn measures(revenue: f64, orders: usize) -> GroupMeasures {
        GroupMeasures {
            total_revenue: revenue,
            total_orders: orders,
            total_customers: orders,
            aov: if orders > 0 {
                Some(revenue / orders as f64)
            } else {
                None
            },
        }
    }

    #[test]
    fn test_segmentation_findings_kinds_and_order() {
        let dataset = Dataset::new(&sample_tables());
        let rows = dataset.filter(&full_range());
        let summary = rfm::segment_summary(&rfm::compute_rfm(&rows));
        let findings = segmentation_findings(&summary);

        assert!(!findings.is_empty());
        assert_eq!(findings[0].kind, FindingKind::Driver);
    }

    #[test]
    fn test_segmentation_findings_empty_summary() {
        assert!(segmentation_findings(&[]).is_empty());
    }

    #[test]
    fn test_temporal_trend_requires_two_months() {
        let dataset = Dataset::new(&sample_tables());
        // May 2017 only: one populated month bucket, so no trend finding
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2017, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2017, 5, 31).unwrap(),
        );
        let rows = dataset.filter(&range);
        let findings = temporal_findings(
            &aggregate::daily_summary(&rows),
            &aggregate::hourly_summary(&rows),
            &aggregate::monthly_summary(&rows),
        );
        assert!(findings.iter().all(|f| f.kind != FindingKind::Trend));
    }

    #[test]
    fn test_temporal_trend_emitted_with_two_months() {
        let dataset = Dataset::new(&sample_tables());
        let rows = dataset.filter(&full_range());
        let findings = temporal_findings(
            &aggregate::daily_summary(&rows),
            &aggregate::hourly_summary(&rows),
            &aggregate::monthly_summary(&rows),
        );

        let trend = findings
            .iter()
            .find(|f| f.kind == FindingKind::Trend)
            .unwrap();
        // 3 transactions in 2017-05, 2 in 2017-06
        assert_eq!(trend.subject, "2017-06");
        assert!(trend.message.contains("slowdown"));
        let delta = trend.metrics.iter().find(|m| m.name == "delta").unwrap();
        assert_eq!(delta.value, -1.0);
    }

    #[test]
    fn test_temporal_findings_empty_window() {
        let daily = aggregate::daily_summary(&[]);
        assert!(temporal_findings(&daily, &[], &[]).is_empty());
    }

    #[test]
    fn test_category_findings_exclude_undefined_aov() {
        let summary = vec![
            CategorySummary {
                category: "zero-orders".to_string(),
                measures: measures(0.0, 0),
                product_count: 1,
            },
            CategorySummary {
                category: "books".to_string(),
                measures: measures(100.0, 2),
                product_count: 5,
            },
        ];
        let findings = category_findings(&summary);
        let premium = findings
            .iter()
            .find(|f| f.kind == FindingKind::Opportunity)
            .unwrap();
        assert_eq!(premium.subject, "books");
    }

    #[test]
    fn test_category_top_revenue_tie_breaks_first() {
        let summary = vec![
            CategorySummary {
                category: "first".to_string(),
                measures: measures(100.0, 1),
                product_count: 1,
            },
            CategorySummary {
                category: "second".to_string(),
                measures: measures(100.0, 1),
                product_count: 1,
            },
        ];
        let findings = category_findings(&summary);
        assert_eq!(findings[0].subject, "first");
    }

    #[test]
    fn test_geographic_findings_percentage_bases() {
        let summary = vec![
            RegionSummary {
                state: "SP".to_string(),
                measures: measures(300.0, 3),
                revenue_per_order: Some(100.0),
            },
            RegionSummary {
                state: "RJ".to_string(),
                measures: measures(100.0, 1),
                revenue_per_order: Some(100.0),
            },
        ];
        let findings = geographic_findings(&summary);

        let driver = &findings[0];
        assert_eq!(driver.subject, "SP");
        assert_eq!(driver.metrics[0].value, 75.0);

        let hotspot = findings
            .iter()
            .find(|f| f.kind == FindingKind::Opportunity)
            .unwrap();
        assert_eq!(hotspot.metrics[0].value, 75.0);
    }

    #[test]
    fn test_max_by_first_prefers_earliest_on_tie() {
        let values = vec![1.0, 3.0, 3.0, 2.0];
        let best = max_by_first(&values, |v| *v).unwrap();
        assert!(std::ptr::eq(best, &values[1]));
    }
}
