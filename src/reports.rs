use std::cmp::Ordering;

use crate::models::Measure;
use crate::table::{margin_pct, Dimension, Filter, Metric, SalesTable};

// ---------------------------------------------------------------------------
// Key metrics
// ---------------------------------------------------------------------------

pub struct KeyMetrics {
    pub total_sales: f64,
    pub total_profit: f64,
    pub margin_pct: f64,
    pub unique_categories: usize,
    pub rows: usize,
}

pub fn get_key_metrics(table: &SalesTable) -> KeyMetrics {
    let total_sales = table.sum(Measure::TotalSales);
    let total_profit = table.sum(Measure::TotalProfit);
    KeyMetrics {
        total_sales,
        total_profit,
        margin_pct: margin_pct(total_profit, total_sales),
        unique_categories: table.count_unique(Dimension::CategoryFull),
        rows: table.len(),
    }
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RankBy {
    /// Summed Total Sales
    Sales,
    /// Summed Total Profit
    Profit,
    /// Mean per-row profit margin %
    Margin,
}

impl RankBy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sales => "Total Sales",
            Self::Profit => "Total Profit",
            Self::Margin => "Profit Margin %",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankItem {
    pub label: String,
    pub value: f64,
}

pub struct Ranking {
    pub by: RankBy,
    pub order: RankOrder,
    pub items: Vec<RankItem>,
}

impl Ranking {
    pub fn title(&self) -> String {
        let which = match self.order {
            RankOrder::Top => "Top",
            RankOrder::Bottom => "Bottom",
        };
        let by = match self.by {
            RankBy::Sales => "Sales",
            RankBy::Profit => "Profit",
            RankBy::Margin => "Profit Margin",
        };
        format!("{which} {} by {by}", self.items.len())
    }
}

/// Rank composite categories. Sales and profit are summed; margin is the mean
/// of each row's margin. Ties are broken by label.
pub fn get_ranking(table: &SalesTable, by: RankBy, order: RankOrder, limit: usize) -> Ranking {
    let dims = [Dimension::CategoryFull];
    let groups = match by {
        RankBy::Sales => table.group_sum(&dims, Metric::Measure(Measure::TotalSales)),
        RankBy::Profit => table.group_sum(&dims, Metric::Measure(Measure::TotalProfit)),
        RankBy::Margin => table.group_mean(&dims, Metric::MarginPct),
    };
    let mut items: Vec<RankItem> = groups
        .into_iter()
        .map(|g| RankItem {
            label: g.label(),
            value: g.value,
        })
        .collect();
    items.sort_by(|a, b| {
        let by_value = match order {
            RankOrder::Top => b.value.total_cmp(&a.value),
            RankOrder::Bottom => a.value.total_cmp(&b.value),
        };
        match by_value {
            Ordering::Equal => a.label.cmp(&b.label),
            other => other,
        }
    });
    items.truncate(limit);
    Ranking { by, order, items }
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

pub struct TrendRow {
    pub month: String,
    pub category_full: String,
    pub sales: f64,
    pub profit: f64,
}

pub struct TrendReport {
    /// Months in source file order.
    pub months: Vec<String>,
    pub rows: Vec<TrendRow>,
}

impl TrendReport {
    /// One line per category with its profit in each month (`None` = no rows that month).
    pub fn profit_pivot(&self) -> Vec<(String, Vec<Option<f64>>)> {
        let mut lines: Vec<(String, Vec<Option<f64>>)> = Vec::new();
        for row in &self.rows {
            let Some(col) = self.months.iter().position(|m| *m == row.month) else {
                continue;
            };
            let pos = match lines.iter().position(|(name, _)| *name == row.category_full) {
                Some(pos) => pos,
                None => {
                    lines.push((row.category_full.clone(), vec![None; self.months.len()]));
                    lines.len() - 1
                }
            };
            lines[pos].1[col] = Some(row.profit);
        }
        lines.sort_by(|a, b| a.0.cmp(&b.0));
        lines
    }

    /// (month, sales, profit) summed over all categories, in month order.
    pub fn month_totals(&self) -> Vec<(String, f64, f64)> {
        self.months
            .iter()
            .map(|month| {
                self.rows
                    .iter()
                    .filter(|r| r.month == *month)
                    .fold((month.clone(), 0.0, 0.0), |(m, s, p), r| {
                        (m, s + r.sales, p + r.profit)
                    })
            })
            .collect()
    }
}

pub fn get_trend(table: &SalesTable) -> TrendReport {
    let dims = [Dimension::Month, Dimension::CategoryFull];
    let sales = table.group_sum(&dims, Metric::Measure(Measure::TotalSales));
    let profit = table.group_sum(&dims, Metric::Measure(Measure::TotalProfit));
    let rows = sales
        .into_iter()
        .zip(profit)
        .map(|(s, p)| TrendRow {
            month: s.key[0].clone(),
            category_full: s.key[1].clone(),
            sales: s.value,
            profit: p.value,
        })
        .collect();
    TrendReport {
        months: table.unique(Dimension::Month),
        rows,
    }
}

// ---------------------------------------------------------------------------
// Filter options
// ---------------------------------------------------------------------------

pub struct FilterOptions {
    pub months: Vec<String>,
    pub categories: Vec<String>,
    /// Subcategories of the selected category, or of all categories.
    pub subcategories: Vec<String>,
}

pub fn get_filter_options(table: &SalesTable, category: Option<&str>) -> FilterOptions {
    let mut categories = table.unique(Dimension::Category);
    categories.sort();
    let mut subcategories = match category {
        Some(c) => table
            .filtered(&Filter {
                category: Some(c.to_string()),
                ..Default::default()
            })
            .unique(Dimension::Subcategory),
        None => table.unique(Dimension::Subcategory),
    };
    subcategories.sort();
    FilterOptions {
        months: table.unique(Dimension::Month),
        categories,
        subcategories,
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard {
    pub metrics: KeyMetrics,
    pub top_sales: Ranking,
    pub top_profit: Ranking,
    pub bottom_margin: Ranking,
    pub top_margin: Ranking,
    pub trend: TrendReport,
}

/// Everything the summary and the interactive dashboard show, for one filter selection.
pub fn get_dashboard(table: &SalesTable, filter: &Filter, top_n: usize) -> Dashboard {
    let view = table.filtered(filter);
    Dashboard {
        metrics: get_key_metrics(&view),
        top_sales: get_ranking(&view, RankBy::Sales, RankOrder::Top, top_n),
        top_profit: get_ranking(&view, RankBy::Profit, RankOrder::Top, top_n),
        bottom_margin: get_ranking(&view, RankBy::Margin, RankOrder::Bottom, top_n),
        top_margin: get_ranking(&view, RankBy::Margin, RankOrder::Top, top_n),
        trend: get_trend(&view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::composite_identity;
    use crate::models::{Measures, SalesRecord};

    fn record(month: &str, cat: &str, sub: &str, sales: f64, profit: f64) -> SalesRecord {
        let mut measures = Measures::default();
        measures.set(Measure::TotalSales, sales);
        measures.set(Measure::TotalProfit, profit);
        SalesRecord {
            month: month.to_string(),
            category: cat.to_string(),
            subcategory: sub.to_string(),
            category_full: composite_identity(cat, sub),
            measures,
        }
    }

    fn sample() -> SalesTable {
        SalesTable::from_records(vec![
            record("JUN", "Beverages", "Soda", 100.0, 20.0),
            record("JUN", "Snacks", "Chips", 400.0, 40.0),
            record("JUN", "Dairy", "Milk", 0.0, 50.0),
            record("JUL", "Beverages", "Soda", 300.0, 90.0),
            record("JUL", "Snacks", "Chips", 100.0, -10.0),
            record("JUL", "Beverages", "Tea", 50.0, 25.0),
        ])
    }

    #[test]
    fn test_key_metrics() {
        let m = get_key_metrics(&sample());
        assert_eq!(m.total_sales, 950.0);
        assert_eq!(m.total_profit, 215.0);
        assert!((m.margin_pct - 215.0 / 950.0 * 100.0).abs() < 1e-9);
        assert_eq!(m.unique_categories, 4);
        assert_eq!(m.rows, 6);
    }

    #[test]
    fn test_key_metrics_empty_table() {
        let m = get_key_metrics(&SalesTable::default());
        assert_eq!(m.total_sales, 0.0);
        assert_eq!(m.margin_pct, 0.0);
        assert_eq!(m.unique_categories, 0);
    }

    #[test]
    fn test_top_sales_ranking() {
        let r = get_ranking(&sample(), RankBy::Sales, RankOrder::Top, 2);
        assert_eq!(r.items.len(), 2);
        assert_eq!(r.items[0].label, "Snacks / Chips");
        assert_eq!(r.items[0].value, 500.0);
        assert_eq!(r.items[1].label, "Beverages / Soda");
        assert_eq!(r.title(), "Top 2 by Sales");
    }

    #[test]
    fn test_top_profit_ranking() {
        let r = get_ranking(&sample(), RankBy::Profit, RankOrder::Top, 10);
        assert_eq!(r.items.len(), 4);
        assert_eq!(r.items[0].label, "Beverages / Soda");
        assert_eq!(r.items[0].value, 110.0);
    }

    #[test]
    fn test_bottom_margin_uses_row_mean() {
        let r = get_ranking(&sample(), RankBy::Margin, RankOrder::Bottom, 10);
        // Chips: (10% + -10%) / 2 = 0; Milk has zero sales -> 0. Tie broken by label.
        assert_eq!(r.items[0].label, "Dairy / Milk");
        assert_eq!(r.items[0].value, 0.0);
        assert_eq!(r.items[1].label, "Snacks / Chips");
        assert!(r.items[1].value.abs() < 1e-9);
        assert_eq!(r.items[3].label, "Beverages / Tea");
        assert_eq!(r.items[3].value, 50.0);
    }

    #[test]
    fn test_top_margin_descending() {
        let r = get_ranking(&sample(), RankBy::Margin, RankOrder::Top, 1);
        assert_eq!(r.items.len(), 1);
        assert_eq!(r.items[0].label, "Beverages / Tea");
    }

    #[test]
    fn test_trend_groups_by_month_and_category() {
        let t = get_trend(&sample());
        assert_eq!(t.months, vec!["JUN", "JUL"]);
        assert_eq!(t.rows.len(), 6);
        assert_eq!(t.rows[0].month, "JUN");
        assert_eq!(t.rows[0].category_full, "Beverages / Soda");

        let pivot = t.profit_pivot();
        let tea = pivot.iter().find(|(n, _)| n == "Beverages / Tea").unwrap();
        assert_eq!(tea.1, vec![None, Some(25.0)]);
        let soda = pivot.iter().find(|(n, _)| n == "Beverages / Soda").unwrap();
        assert_eq!(soda.1, vec![Some(20.0), Some(90.0)]);
    }

    #[test]
    fn test_trend_month_totals() {
        let totals = get_trend(&sample()).month_totals();
        assert_eq!(
            totals,
            vec![
                ("JUN".to_string(), 500.0, 110.0),
                ("JUL".to_string(), 450.0, 105.0),
            ]
        );
    }

    #[test]
    fn test_filter_options_depend_on_category() {
        let t = sample();
        let all = get_filter_options(&t, None);
        assert_eq!(all.months, vec!["JUN", "JUL"]);
        assert_eq!(all.categories, vec!["Beverages", "Dairy", "Snacks"]);
        assert_eq!(all.subcategories, vec!["Chips", "Milk", "Soda", "Tea"]);

        let bev = get_filter_options(&t, Some("Beverages"));
        assert_eq!(bev.subcategories, vec!["Soda", "Tea"]);
    }

    #[test]
    fn test_dashboard_applies_filter() {
        let filter = Filter {
            month: Some("JUL".to_string()),
            ..Default::default()
        };
        let d = get_dashboard(&sample(), &filter, 10);
        assert_eq!(d.metrics.rows, 3);
        assert_eq!(d.metrics.total_sales, 450.0);
        assert_eq!(d.top_sales.items[0].label, "Beverages / Soda");
        assert_eq!(d.trend.months, vec!["JUL"]);
    }
}
