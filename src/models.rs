use std::path::PathBuf;

/// One of the seven numeric columns of a category sales export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    TotalSales,
    TotalProfit,
    CostExcise,
    Discount,
    GrossSales,
    Vat,
    NetSalesIncVat,
}

impl Measure {
    pub const ALL: [Measure; 7] = [
        Measure::TotalSales,
        Measure::TotalProfit,
        Measure::CostExcise,
        Measure::Discount,
        Measure::GrossSales,
        Measure::Vat,
        Measure::NetSalesIncVat,
    ];

    /// Column header as it appears in the source spreadsheet.
    pub fn header(&self) -> &'static str {
        match self {
            Self::TotalSales => "Total Sales",
            Self::TotalProfit => "Total Profit",
            Self::CostExcise => "Total Cost Excise",
            Self::Discount => "Discount",
            Self::GrossSales => "Gross Sales",
            Self::Vat => "VAT",
            Self::NetSalesIncVat => "Net Sales (incl. VAT)",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::TotalSales => 0,
            Self::TotalProfit => 1,
            Self::CostExcise => 2,
            Self::Discount => 3,
            Self::GrossSales => 4,
            Self::Vat => 5,
            Self::NetSalesIncVat => 6,
        }
    }
}

/// Values for all seven measures of a row. Absent columns hold 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measures([f64; 7]);

impl Measures {
    pub fn get(&self, measure: Measure) -> f64 {
        self.0[measure.index()]
    }

    pub fn set(&mut self, measure: Measure, value: f64) {
        self.0[measure.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Measure, f64)> + '_ {
        Measure::ALL.iter().map(move |m| (*m, self.get(*m)))
    }
}

/// A cleaned category row tagged with the month of the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub month: String,
    pub category: String,
    pub subcategory: String,
    /// `"<category> / <subcategory>"`, the grouping key for rankings.
    pub category_full: String,
    pub measures: Measures,
}

impl SalesRecord {
    pub fn sales(&self) -> f64 {
        self.measures.get(Measure::TotalSales)
    }

    pub fn profit(&self) -> f64 {
        self.measures.get(Measure::TotalProfit)
    }
}

/// A monthly export to ingest, with the month code its rows are tagged with.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthFile {
    pub month: String,
    pub path: PathBuf,
    /// Worksheet to read; the first sheet when unset.
    pub sheet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measures_default_to_zero() {
        let m = Measures::default();
        for (_, v) in m.iter() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_measures_set_and_get() {
        let mut m = Measures::default();
        m.set(Measure::Vat, 12.5);
        m.set(Measure::TotalSales, 100.0);
        assert_eq!(m.get(Measure::Vat), 12.5);
        assert_eq!(m.get(Measure::TotalSales), 100.0);
        assert_eq!(m.get(Measure::Discount), 0.0);
    }

    #[test]
    fn test_headers_are_distinct() {
        let mut headers: Vec<&str> = Measure::ALL.iter().map(|m| m.header()).collect();
        headers.sort();
        headers.dedup();
        assert_eq!(headers.len(), 7);
    }
}
