use std::collections::HashMap;

use crate::models::{Measure, SalesRecord};

/// A column the unified table can be filtered or grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Month,
    Category,
    Subcategory,
    /// The `"<category> / <subcategory>"` identity.
    CategoryFull,
}

impl Dimension {
    pub fn value<'a>(&self, record: &'a SalesRecord) -> &'a str {
        match self {
            Self::Month => &record.month,
            Self::Category => &record.category,
            Self::Subcategory => &record.subcategory,
            Self::CategoryFull => &record.category_full,
        }
    }
}

/// A per-row quantity that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Measure(Measure),
    /// Profit as a percentage of sales for the row.
    MarginPct,
}

impl Metric {
    pub fn value(&self, record: &SalesRecord) -> f64 {
        match self {
            Self::Measure(m) => record.measures.get(*m),
            Self::MarginPct => margin_pct(record.profit(), record.sales()),
        }
    }
}

/// Profit margin in percent. Zero (or negative) sales give 0 rather than dividing.
pub fn margin_pct(profit: f64, sales: f64) -> f64 {
    if sales > 0.0 {
        profit / sales * 100.0
    } else {
        0.0
    }
}

/// Equality filter over the three user-facing dimensions. `None` means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub month: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl Filter {
    pub fn matches(&self, record: &SalesRecord) -> bool {
        let check = |want: &Option<String>, dim: Dimension| {
            want.as_deref().map_or(true, |w| dim.value(record) == w)
        };
        check(&self.month, Dimension::Month)
            && check(&self.category, Dimension::Category)
            && check(&self.subcategory, Dimension::Subcategory)
    }

    pub fn is_empty(&self) -> bool {
        self.month.is_none() && self.category.is_none() && self.subcategory.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Vec<String>,
    pub value: f64,
}

impl Group {
    /// Key parts joined for display; single-dimension groups return the value itself.
    pub fn label(&self) -> String {
        self.key.join(" | ")
    }
}

/// All months' normalized records, in file order then row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn concat(tables: impl IntoIterator<Item = SalesTable>) -> Self {
        let records = tables.into_iter().flat_map(|t| t.records).collect();
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filtered(&self, filter: &Filter) -> SalesTable {
        if filter.is_empty() {
            return self.clone();
        }
        let records = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Self { records }
    }

    /// Distinct values of `dim` in order of first appearance.
    pub fn unique(&self, dim: Dimension) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .map(|r| dim.value(r))
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    pub fn count_unique(&self, dim: Dimension) -> usize {
        self.unique(dim).len()
    }

    pub fn sum(&self, measure: Measure) -> f64 {
        self.records.iter().map(|r| r.measures.get(measure)).sum()
    }

    pub fn group_sum(&self, dims: &[Dimension], metric: Metric) -> Vec<Group> {
        self.aggregate(dims, metric)
            .into_iter()
            .map(|(key, total, _)| Group { key, value: total })
            .collect()
    }

    pub fn group_mean(&self, dims: &[Dimension], metric: Metric) -> Vec<Group> {
        self.aggregate(dims, metric)
            .into_iter()
            .map(|(key, total, count)| Group {
                key,
                value: total / count as f64,
            })
            .collect()
    }

    /// (key, sum, row count) per group, groups in first-appearance order.
    fn aggregate(&self, dims: &[Dimension], metric: Metric) -> Vec<(Vec<String>, f64, usize)> {
        let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
        let mut groups: Vec<(Vec<String>, f64, usize)> = Vec::new();
        for record in &self.records {
            let key: Vec<&str> = dims.iter().map(|d| d.value(record)).collect();
            let slot = *index.entry(key).or_insert_with_key(|k| {
                groups.push((k.iter().map(|s| s.to_string()).collect(), 0.0, 0));
                groups.len() - 1
            });
            groups[slot].1 += metric.value(record);
            groups[slot].2 += 1;
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::composite_identity;
    use crate::models::Measures;

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
            record("JUN", "Snacks", "Chips", 50.0, 5.0),
            record("JUL", "Beverages", "Soda", 200.0, 60.0),
            record("JUL", "Beverages", "Tea", 0.0, 50.0),
        ])
    }

    #[test]
    fn test_margin_pct_handles_zero_sales() {
        assert_eq!(margin_pct(50.0, 0.0), 0.0);
        assert_eq!(margin_pct(50.0, -10.0), 0.0);
        assert_eq!(margin_pct(25.0, 100.0), 25.0);
        assert!(margin_pct(50.0, 0.0).is_finite());
    }

    #[test]
    fn test_concat_keeps_order() {
        let a = SalesTable::from_records(vec![record("JUN", "A", "a", 1.0, 0.0)]);
        let b = SalesTable::from_records(vec![
            record("JUL", "B", "b", 2.0, 0.0),
            record("JUL", "C", "c", 3.0, 0.0),
        ]);
        let merged = SalesTable::concat(vec![a, b]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.records()[0].month, "JUN");
        assert_eq!(merged.records()[2].category, "C");
    }

    #[test]
    fn test_filter_by_each_dimension() {
        let t = sample();
        let by_month = t.filtered(&Filter {
            month: Some("JUL".into()),
            ..Default::default()
        });
        assert_eq!(by_month.len(), 2);

        let by_cat = t.filtered(&Filter {
            category: Some("Beverages".into()),
            ..Default::default()
        });
        assert_eq!(by_cat.len(), 3);

        let by_all = t.filtered(&Filter {
            month: Some("JUL".into()),
            category: Some("Beverages".into()),
            subcategory: Some("Tea".into()),
        });
        assert_eq!(by_all.len(), 1);
        assert_eq!(by_all.records()[0].subcategory, "Tea");

        assert_eq!(t.filtered(&Filter::default()).len(), 4);
    }

    #[test]
    fn test_unique_first_appearance() {
        let t = sample();
        assert_eq!(t.unique(Dimension::Month), vec!["JUN", "JUL"]);
        assert_eq!(t.unique(Dimension::Category), vec!["Beverages", "Snacks"]);
        assert_eq!(t.count_unique(Dimension::CategoryFull), 3);
    }

    #[test]
    fn test_group_sum_and_mean() {
        let t = sample();
        let sums = t.group_sum(&[Dimension::CategoryFull], Metric::Measure(Measure::TotalSales));
        assert_eq!(sums.len(), 3);
        assert_eq!(sums[0].label(), "Beverages / Soda");
        assert_eq!(sums[0].value, 300.0);

        let margins = t.group_mean(&[Dimension::CategoryFull], Metric::MarginPct);
        // Soda: (20% + 30%) / 2
        assert!((margins[0].value - 25.0).abs() < 1e-9);
        // Tea has zero sales: margin is defined as 0
        assert_eq!(margins[2].value, 0.0);
    }

    #[test]
    fn test_group_by_two_dimensions() {
        let t = sample();
        let groups = t.group_sum(
            &[Dimension::Month, Dimension::Category],
            Metric::Measure(Measure::TotalProfit),
        );
        let keys: Vec<String> = groups.iter().map(|g| g.label()).collect();
        assert_eq!(
            keys,
            vec!["JUN | Beverages", "JUN | Snacks", "JUL | Beverages"]
        );
        assert_eq!(groups[2].value, 110.0);
    }

    #[test]
    fn test_sum_over_table() {
        let t = sample();
        assert_eq!(t.sum(Measure::TotalSales), 350.0);
        assert_eq!(t.sum(Measure::Vat), 0.0);
    }
}
