use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{load_table, FilterArgs, GlobalArgs};
use crate::error::Result;
use crate::fmt::{number, pct};
use crate::reports::{
    self, Dashboard, FilterOptions, KeyMetrics, RankBy, RankOrder, Ranking, TrendReport,
};
use crate::table::Filter;

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn filter_label(filter: &Filter) -> String {
    let part = |v: &Option<String>| v.clone().unwrap_or_else(|| "All".to_string());
    format!(
        "Month: {}  Category: {}  Subcategory: {}",
        part(&filter.month),
        part(&filter.category),
        part(&filter.subcategory)
    )
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub(crate) fn format_metrics(m: &KeyMetrics) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Total Sales", "Total Profit", "Profit Margin %", "Unique Categories"]);
    let profit = if m.total_profit >= 0.0 {
        number(m.total_profit).green().to_string()
    } else {
        number(m.total_profit).red().to_string()
    };
    table.add_row(vec![
        right(number(m.total_sales)),
        right(profit),
        right(pct(m.margin_pct)),
        right(m.unique_categories.to_string()),
    ]);
    format!("{}\n{table}", "Key Metrics".bold())
}

pub(crate) fn format_ranking(r: &Ranking) -> String {
    if r.items.is_empty() {
        return format!("{}\nNo data.", r.title().bold());
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Category / Subcategory", r.by.label()]);
    for (i, item) in r.items.iter().enumerate() {
        let value = match r.by {
            RankBy::Margin => pct(item.value),
            RankBy::Sales | RankBy::Profit => number(item.value),
        };
        table.add_row(vec![right((i + 1).to_string()), Cell::new(&item.label), right(value)]);
    }
    format!("{}\n{table}", r.title().bold())
}

pub(crate) fn format_trend(t: &TrendReport) -> String {
    let title = "Monthly Profit by Category".bold();
    if t.rows.is_empty() {
        return format!("{title}\nNo data.");
    }
    let mut header = vec!["Category / Subcategory".to_string()];
    header.extend(t.months.iter().cloned());
    let mut table = Table::new();
    table.set_header(header);
    for (name, values) in t.profit_pivot() {
        let mut row = vec![Cell::new(name)];
        for v in values {
            row.push(right(v.map(number).unwrap_or_else(|| "\u{2014}".to_string())));
        }
        table.add_row(row);
    }

    let mut totals = Table::new();
    totals.set_header(vec!["Month", "Total Sales", "Total Profit"]);
    for (month, sales, profit) in t.month_totals() {
        totals.add_row(vec![Cell::new(month), right(number(sales)), right(number(profit))]);
    }
    format!("{title}\n{table}\n\n{}\n{totals}", "Monthly Totals".bold())
}

pub(crate) fn format_options(o: &FilterOptions, category: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Months".bold()));
    for m in &o.months {
        out.push_str(&format!("  {m}\n"));
    }
    if category.is_none() {
        out.push_str(&format!("{}\n", "Categories".bold()));
        for c in &o.categories {
            out.push_str(&format!("  {c}\n"));
        }
    }
    let heading = match category {
        Some(c) => format!("Subcategories of {c}"),
        None => "Subcategories".to_string(),
    };
    out.push_str(&format!("{}\n", heading.bold()));
    for s in &o.subcategories {
        out.push_str(&format!("  {s}\n"));
    }
    out
}

pub(crate) fn format_summary(d: &Dashboard, filter: &Filter) -> String {
    [
        format!("{}\n{}", "Sales & Profit Summary".bold(), filter_label(filter)),
        format_metrics(&d.metrics),
        format_ranking(&d.top_sales),
        format_ranking(&d.top_profit),
        format_ranking(&d.bottom_margin),
        format_ranking(&d.top_margin),
        format_trend(&d.trend),
    ]
    .join("\n\n")
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn summary(global: &GlobalArgs, filter: &FilterArgs, top: Option<usize>) -> Result<()> {
    let settings = global.settings()?;
    let table = load_table(&settings)?;
    let filter = filter.to_filter();
    let data = reports::get_dashboard(&table, &filter, top.unwrap_or(settings.top_n));
    println!("{}", format_summary(&data, &filter));
    Ok(())
}

pub fn rank(
    global: &GlobalArgs,
    by: RankBy,
    bottom: bool,
    top: Option<usize>,
    filter: &FilterArgs,
) -> Result<()> {
    let settings = global.settings()?;
    let table = load_table(&settings)?.filtered(&filter.to_filter());
    let order = if bottom { RankOrder::Bottom } else { RankOrder::Top };
    let ranking = reports::get_ranking(&table, by, order, top.unwrap_or(settings.top_n));
    println!("{}", format_ranking(&ranking));
    Ok(())
}

pub fn trend(global: &GlobalArgs, filter: &FilterArgs) -> Result<()> {
    let settings = global.settings()?;
    let table = load_table(&settings)?.filtered(&filter.to_filter());
    println!("{}", format_trend(&reports::get_trend(&table)));
    Ok(())
}

pub fn categories(global: &GlobalArgs, category: Option<&str>) -> Result<()> {
    let settings = global.settings()?;
    let table = load_table(&settings)?;
    let options = reports::get_filter_options(&table, category);
    print!("{}", format_options(&options, category));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::composite_identity;
    use crate::models::{Measure, Measures, SalesRecord};
    use crate::table::SalesTable;

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
            record("JUN", "Beverages", "Soda", 1200.0, 300.0),
            record("JUL", "Beverages", "Soda", 800.0, 100.0),
            record("JUL", "Snacks", "Chips", 0.0, 50.0),
        ])
    }

    #[test]
    fn test_format_summary_sections() {
        colored::control::set_override(false);
        let filter = Filter::default();
        let d = reports::get_dashboard(&sample(), &filter, 10);
        let s = format_summary(&d, &filter);
        assert!(s.contains("Month: All  Category: All  Subcategory: All"));
        assert!(s.contains("2,000.00"));
        assert!(s.contains("Top 2 by Sales"));
        assert!(s.contains("Bottom 2 by Profit Margin"));
        assert!(s.contains("Monthly Profit by Category"));
        assert!(s.contains("Beverages / Soda"));
    }

    #[test]
    fn test_format_ranking_margin_uses_percent() {
        colored::control::set_override(false);
        let r = reports::get_ranking(&sample(), RankBy::Margin, RankOrder::Top, 5);
        let s = format_ranking(&r);
        assert!(s.contains("Profit Margin %"));
        assert!(s.contains("18.75%"));
        assert!(s.contains("0.00%"));
    }

    #[test]
    fn test_format_ranking_empty() {
        colored::control::set_override(false);
        let r = reports::get_ranking(&SalesTable::default(), RankBy::Sales, RankOrder::Top, 5);
        assert!(format_ranking(&r).contains("No data."));
    }

    #[test]
    fn test_format_trend_marks_missing_months() {
        colored::control::set_override(false);
        let s = format_trend(&reports::get_trend(&sample()));
        assert!(s.contains("JUN"));
        assert!(s.contains("JUL"));
        assert!(s.contains("\u{2014}"));
        assert!(s.contains("Monthly Totals"));
    }

    #[test]
    fn test_format_options_for_category() {
        colored::control::set_override(false);
        let o = reports::get_filter_options(&sample(), Some("Snacks"));
        let s = format_options(&o, Some("Snacks"));
        assert!(s.contains("Subcategories of Snacks"));
        assert!(s.contains("  Chips"));
        assert!(!s.contains("  Soda"));
    }
}
