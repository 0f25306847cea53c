use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame,
};

use crate::cli::{load_table, GlobalArgs};
use crate::error::Result;
use crate::fmt::{number, pct};
use crate::reports::{self, FilterOptions, RankBy, Ranking};
use crate::table::{Filter, SalesTable};
use crate::tui::{
    run_report_view, truncate, value_span, ReportView, ReportViewAction, AMOUNT_NEG_STYLE,
    AMOUNT_POS_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE,
};

const ALL: &str = "All";
const BAR_CHAR: &str = "\u{2588}";
const LABEL_WIDTH: usize = 40;

const TABS: &[&str] = &[
    "Top Sales",
    "Top Profit",
    "Bottom Margin",
    "Top Margin",
    "Monthly Trend",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Month,
    Category,
    Subcategory,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Month => Self::Category,
            Self::Category => Self::Subcategory,
            Self::Subcategory => Self::Month,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Month => Self::Subcategory,
            Self::Category => Self::Month,
            Self::Subcategory => Self::Category,
        }
    }
}

/// A select box: index 0 is "All", the rest index into `values`.
#[derive(Debug, Clone, Default)]
struct Selector {
    values: Vec<String>,
    index: usize,
}

impl Selector {
    fn new(values: Vec<String>) -> Self {
        Self { values, index: 0 }
    }

    fn selected(&self) -> Option<&str> {
        match self.index {
            0 => None,
            i => self.values.get(i - 1).map(String::as_str),
        }
    }

    fn label(&self) -> &str {
        self.selected().unwrap_or(ALL)
    }

    fn step(&mut self, delta: i32) {
        let len = self.values.len() as i32 + 1;
        self.index = (self.index as i32 + delta).rem_euclid(len) as usize;
    }
}

pub(crate) struct DashboardView {
    table: SalesTable,
    top_n: usize,
    month: Selector,
    category: Selector,
    subcategory: Selector,
    focus: Focus,
    tab: usize,
    data: reports::Dashboard,
}

impl DashboardView {
    pub(crate) fn new(table: SalesTable, top_n: usize) -> Self {
        let FilterOptions {
            months,
            categories,
            subcategories,
        } = reports::get_filter_options(&table, None);
        let data = reports::get_dashboard(&table, &Filter::default(), top_n);
        Self {
            table,
            top_n,
            month: Selector::new(months),
            category: Selector::new(categories),
            subcategory: Selector::new(subcategories),
            focus: Focus::Month,
            tab: 0,
            data,
        }
    }

    fn filter(&self) -> Filter {
        Filter {
            month: self.month.selected().map(str::to_string),
            category: self.category.selected().map(str::to_string),
            subcategory: self.subcategory.selected().map(str::to_string),
        }
    }

    /// Re-run filter and aggregation against the in-memory table.
    fn refresh(&mut self) {
        self.data = reports::get_dashboard(&self.table, &self.filter(), self.top_n);
    }

    fn change_selection(&mut self, delta: i32) {
        match self.focus {
            Focus::Month => self.month.step(delta),
            Focus::Category => {
                self.category.step(delta);
                let options = reports::get_filter_options(&self.table, self.category.selected());
                self.subcategory = Selector::new(options.subcategories);
            }
            Focus::Subcategory => self.subcategory.step(delta),
        }
        self.refresh();
    }

    fn reset(&mut self) {
        self.month.index = 0;
        self.category.index = 0;
        let options = reports::get_filter_options(&self.table, None);
        self.subcategory = Selector::new(options.subcategories);
        self.refresh();
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let [title_area, month_area, cat_area, sub_area, _] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Fill(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(" Filters").style(HEADER_STYLE), title_area);

        let selectors = [
            (Focus::Month, "Month", &self.month, month_area),
            (Focus::Category, "Main Category", &self.category, cat_area),
            (Focus::Subcategory, "Subcategory", &self.subcategory, sub_area),
        ];
        for (focus, title, selector, rect) in selectors {
            let focused = self.focus == focus;
            let border_style = if focused { HEADER_STYLE } else { FOOTER_STYLE };
            let width = rect.width.saturating_sub(6) as usize;
            let text = format!("\u{2039} {} \u{203a}", truncate(selector.label(), width));
            let style = if focused { SELECTED_STYLE } else { Style::default() };
            frame.render_widget(
                Paragraph::new(text).style(style).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(title),
                ),
                rect,
            );
        }
    }

    fn draw_metrics(&self, frame: &mut Frame, area: Rect) {
        let m = &self.data.metrics;
        let bold = Style::new().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(" Total Sales ", bold),
            Span::raw(number(m.total_sales)),
            Span::styled("   Total Profit ", bold),
            value_span(m.total_profit),
            Span::styled("   Profit Margin ", bold),
            Span::raw(pct(m.margin_pct)),
            Span::styled("   Unique Categories ", bold),
            Span::raw(m.unique_categories.to_string()),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM)),
            area,
        );
    }

    fn draw_ranking(&self, frame: &mut Frame, area: Rect, ranking: &Ranking) {
        if ranking.items.is_empty() {
            frame.render_widget(Paragraph::new(" No data for this selection."), area);
            return;
        }
        let max_abs = ranking
            .items
            .iter()
            .map(|i| i.value.abs())
            .fold(0.0f64, f64::max);
        let bar_width = area.width.saturating_sub(LABEL_WIDTH as u16 + 22) as usize;

        let rows: Vec<Row> = ranking
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let value = match ranking.by {
                    RankBy::Margin => pct(item.value),
                    RankBy::Sales | RankBy::Profit => number(item.value),
                };
                let style = if item.value < 0.0 {
                    AMOUNT_NEG_STYLE
                } else {
                    AMOUNT_POS_STYLE
                };
                let len = if max_abs > 0.0 {
                    ((item.value.abs() / max_abs) * bar_width as f64).round() as usize
                } else {
                    0
                };
                Row::new(vec![
                    Cell::from(format!("{:>2}", i + 1)).style(FOOTER_STYLE),
                    Cell::from(truncate(&item.label, LABEL_WIDTH)),
                    Cell::from(Line::from(value).right_aligned()).style(style),
                    Cell::from(BAR_CHAR.repeat(len)).style(style),
                ])
            })
            .collect();

        let header = Row::new(vec!["#", "Category / Subcategory", ranking.by.label(), ""])
            .style(Style::new().add_modifier(Modifier::BOLD))
            .bottom_margin(1);
        let widths = [
            Constraint::Length(2),
            Constraint::Length(LABEL_WIDTH as u16),
            Constraint::Length(16),
            Constraint::Fill(1),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(Block::default().title(ranking.title()).title_style(HEADER_STYLE));
        frame.render_widget(table, area);
    }

    fn draw_trend(&self, frame: &mut Frame, area: Rect) {
        let trend = &self.data.trend;
        if trend.rows.is_empty() {
            frame.render_widget(Paragraph::new(" No data for this selection."), area);
            return;
        }
        let [chart_area, table_area] =
            Layout::vertical([Constraint::Percentage(40), Constraint::Fill(1)]).areas(area);

        let totals = trend.month_totals();
        let groups: Vec<BarGroup> = totals
            .iter()
            .map(|(month, sales, profit)| {
                let bars = vec![
                    Bar::default()
                        .value(sales.max(0.0).round() as u64)
                        .text_value(number(*sales))
                        .style(HEADER_STYLE),
                    Bar::default()
                        .value(profit.max(0.0).round() as u64)
                        .text_value(number(*profit))
                        .style(if *profit < 0.0 { AMOUNT_NEG_STYLE } else { AMOUNT_POS_STYLE }),
                ];
                BarGroup::default()
                    .label(Line::from(month.as_str()))
                    .bars(&bars)
            })
            .collect();
        let mut chart = BarChart::default()
            .block(
                Block::default()
                    .title("Monthly Sales (yellow) & Profit (green)")
                    .title_style(HEADER_STYLE),
            )
            .bar_width(12)
            .bar_gap(1)
            .group_gap(3);
        for group in groups {
            chart = chart.data(group);
        }
        frame.render_widget(chart, chart_area);

        let mut header = vec![Cell::from("Category / Subcategory")];
        header.extend(
            trend
                .months
                .iter()
                .map(|m| Cell::from(Line::from(m.as_str()).right_aligned())),
        );
        let rows: Vec<Row> = trend
            .profit_pivot()
            .into_iter()
            .map(|(name, values)| {
                let mut cells = vec![Cell::from(truncate(&name, LABEL_WIDTH))];
                cells.extend(values.into_iter().map(|v| match v {
                    Some(v) => Cell::from(Line::from(value_span(v)).right_aligned()),
                    None => Cell::from(Line::from("\u{2014}").right_aligned()).style(FOOTER_STYLE),
                }));
                Row::new(cells)
            })
            .collect();
        let mut widths = vec![Constraint::Length(LABEL_WIDTH as u16)];
        widths.extend(trend.months.iter().map(|_| Constraint::Length(14)));
        let table = Table::new(rows, widths)
            .header(
                Row::new(header)
                    .style(Style::new().add_modifier(Modifier::BOLD))
                    .bottom_margin(1),
            )
            .column_spacing(2)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .title("Profit Trend by Month & Category")
                    .title_style(HEADER_STYLE),
            );
        frame.render_widget(table, table_area);
    }
}

impl ReportView for DashboardView {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(
                " Sales & Profit Dashboard \u{2014} {} rows",
                self.data.metrics.rows
            ))
            .style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(32), Constraint::Fill(1)]).areas(body_area);
        self.draw_sidebar(frame, sidebar_area);

        let [metrics_area, tabs_area, chart_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Fill(1),
        ])
        .areas(main_area);
        self.draw_metrics(frame, metrics_area);

        let tabs = Tabs::new(TABS.iter().enumerate().map(|(i, t)| format!("{} {t}", i + 1)))
            .select(self.tab)
            .highlight_style(SELECTED_STYLE)
            .style(FOOTER_STYLE);
        frame.render_widget(tabs, tabs_area);

        match self.tab {
            0 => self.draw_ranking(frame, chart_area, &self.data.top_sales),
            1 => self.draw_ranking(frame, chart_area, &self.data.top_profit),
            2 => self.draw_ranking(frame, chart_area, &self.data.bottom_margin),
            3 => self.draw_ranking(frame, chart_area, &self.data.top_margin),
            _ => self.draw_trend(frame, chart_area),
        }

        frame.render_widget(
            Paragraph::new(
                " Tab/\u{2191}/\u{2193}=filter  \u{2190}/\u{2192}=change  1-5/[ ]=chart  r=reset  q/Esc=quit",
            )
            .style(FOOTER_STYLE),
            footer_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ReportViewAction::Close,
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => self.focus = self.focus.prev(),
            KeyCode::Left | KeyCode::Char('h') => self.change_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.change_selection(1),
            KeyCode::Char('[') => self.tab = (self.tab + TABS.len() - 1) % TABS.len(),
            KeyCode::Char(']') => self.tab = (self.tab + 1) % TABS.len(),
            KeyCode::Char(c @ '1'..='5') => self.tab = (c as usize) - ('1' as usize),
            KeyCode::Char('r') => self.reset(),
            _ => {}
        }
        ReportViewAction::Continue
    }
}

/// Load every month once, then serve the dashboard from memory.
pub fn run(global: &GlobalArgs) -> Result<()> {
    let settings = global.settings()?;
    let table = load_table(&settings)?;
    let mut view = DashboardView::new(table, settings.top_n);
    run_report_view(&mut view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::composite_identity;
    use crate::models::{Measure, Measures, SalesRecord};
    use ratatui::{backend::TestBackend, Terminal};

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

    fn view() -> DashboardView {
        let table = SalesTable::from_records(vec![
            record("JUN", "Beverages", "Soda", 100.0, 20.0),
            record("JUN", "Snacks", "Chips", 50.0, -5.0),
            record("JUL", "Beverages", "Tea", 80.0, 40.0),
        ]);
        DashboardView::new(table, 10)
    }

    fn render(view: &mut DashboardView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| view.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_selector_wraps_through_all() {
        let mut s = Selector::new(vec!["JUN".into(), "JUL".into()]);
        assert_eq!(s.label(), "All");
        s.step(1);
        assert_eq!(s.selected(), Some("JUN"));
        s.step(1);
        s.step(1);
        assert_eq!(s.selected(), None);
        s.step(-1);
        assert_eq!(s.selected(), Some("JUL"));
    }

    #[test]
    fn test_month_selection_refilters() {
        let mut v = view();
        assert_eq!(v.data.metrics.rows, 3);
        v.handle_key(KeyCode::Right);
        assert_eq!(v.filter().month.as_deref(), Some("JUN"));
        assert_eq!(v.data.metrics.rows, 2);
        assert_eq!(v.data.metrics.total_sales, 150.0);
    }

    #[test]
    fn test_category_change_resets_subcategory() {
        let mut v = view();
        v.handle_key(KeyCode::Tab);
        v.handle_key(KeyCode::Tab);
        v.handle_key(KeyCode::Right);
        assert_eq!(v.subcategory.selected(), Some("Chips"));

        v.handle_key(KeyCode::BackTab);
        v.handle_key(KeyCode::Right);
        assert_eq!(v.category.selected(), Some("Beverages"));
        assert_eq!(v.subcategory.selected(), None);
        assert_eq!(v.subcategory.values, vec!["Soda", "Tea"]);
        assert_eq!(v.data.metrics.rows, 2);
    }

    #[test]
    fn test_reset_clears_filters() {
        let mut v = view();
        v.handle_key(KeyCode::Right);
        v.handle_key(KeyCode::Char('r'));
        assert_eq!(v.filter(), Filter::default());
        assert_eq!(v.data.metrics.rows, 3);
    }

    #[test]
    fn test_tab_keys() {
        let mut v = view();
        v.handle_key(KeyCode::Char('5'));
        assert_eq!(v.tab, 4);
        v.handle_key(KeyCode::Char(']'));
        assert_eq!(v.tab, 0);
        v.handle_key(KeyCode::Char('['));
        assert_eq!(v.tab, 4);
        assert!(matches!(v.handle_key(KeyCode::Char('q')), ReportViewAction::Close));
    }

    #[test]
    fn test_draw_every_tab() {
        let mut v = view();
        let screen = render(&mut v);
        assert!(screen.contains("Total Sales"));
        assert!(screen.contains("Beverages / Soda"));
        for key in ['2', '3', '4', '5'] {
            v.handle_key(KeyCode::Char(key));
            let screen = render(&mut v);
            assert!(screen.contains("Filters"));
        }
        assert!(render(&mut v).contains("Profit Trend by Month"));
    }
}
