use std::path::Path;

use calamine::{Data, Reader};
use tracing::{debug, info};

use crate::error::{Result, SalesError};
use crate::models::{Measure, Measures, MonthFile, SalesRecord};
use crate::table::SalesTable;

const CATEGORY_HEADER: &str = "Category";

/// Label used for an empty category cell.
pub const MISSING_LABEL: &str = "nan";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a measure cell's text, dropping thousands separators and stray spaces.
/// Returns `None` if what remains is not a finite number.
pub fn clean_measure(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != ' ').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Subtotal and grand-total rows carry "total" somewhere in the category label.
pub fn is_total_row(category: &str) -> bool {
    category.to_uppercase().contains("TOTAL")
}

pub fn composite_identity(category: &str, subcategory: &str) -> String {
    format!("{category} / {subcategory}")
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

// ---------------------------------------------------------------------------
// Raw sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    /// Booleans, dates and error cells: usable as labels, never as measures.
    Other(String),
}

impl CellValue {
    fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            Self::Empty
        } else {
            Self::Text(raw.to_string())
        }
    }

    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(s) => Self::from_text(s),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Other(if *b { "True" } else { "False" }.to_string()),
            Data::DateTime(dt) => Self::Other(match dt.as_datetime() {
                Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => dt.as_f64().to_string(),
            }),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Other(s.clone()),
            Data::Error(e) => Self::Other(format!("{e:?}")),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Text form of the cell with surrounding whitespace removed.
    fn to_label(&self) -> String {
        match self {
            Self::Empty => MISSING_LABEL.to_string(),
            Self::Number(f) => f.to_string(),
            Self::Text(s) | Self::Other(s) => s.trim().to_string(),
        }
    }

    /// Errors carry only the reason; the caller knows the file, row and column.
    fn to_measure(&self) -> std::result::Result<f64, String> {
        match self {
            Self::Empty => Ok(0.0),
            Self::Number(f) if f.is_finite() => Ok(*f),
            Self::Number(f) => Err(format!("non-finite value {f}")),
            Self::Text(s) => {
                clean_measure(s).ok_or_else(|| format!("cannot parse {s:?} as a number"))
            }
            Self::Other(s) => Err(format!("expected a number, found {s:?}")),
        }
    }
}

struct RawRow {
    /// 1-based row number in the source sheet.
    line: u64,
    cells: Vec<CellValue>,
}

struct RawSheet {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawSheet {
    fn new(mut headers: Vec<String>) -> Self {
        if let Some(first) = headers.first_mut() {
            *first = first.trim_start_matches('\u{feff}').to_string();
        }
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Pads short rows to the header width and skips rows with no content.
    fn push(&mut self, line: u64, mut cells: Vec<CellValue>) {
        if cells.iter().all(CellValue::is_empty) {
            return;
        }
        if cells.len() < self.headers.len() {
            cells.resize(self.headers.len(), CellValue::Empty);
        }
        self.rows.push(RawRow { line, cells });
    }
}

fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<RawSheet> {
    let file = std::fs::File::open(path).map_err(|e| SalesError::file_access(path, e))?;
    if is_csv(path) {
        read_csv_sheet(path, file)
    } else {
        // calamine reopens by path; the probe above keeps a missing file from
        // being reported as a parse failure.
        drop(file);
        read_workbook_sheet(path, sheet)
    }
}

fn read_csv_sheet(path: &Path, file: std::fs::File) -> Result<RawSheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut records = rdr.records();

    let header = records
        .next()
        .ok_or_else(|| SalesError::malformed(path, "file is empty"))?
        .map_err(|e| SalesError::malformed(path, e.to_string()))?;
    let mut sheet = RawSheet::new(header.iter().map(str::to_string).collect());

    for result in records {
        let record = result.map_err(|e| SalesError::malformed(path, e.to_string()))?;
        let line = record.position().map_or(0, |p| p.line());
        sheet.push(line, record.iter().map(CellValue::from_text).collect());
    }
    Ok(sheet)
}

fn read_workbook_sheet(path: &Path, sheet_name: Option<&str>) -> Result<RawSheet> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| SalesError::malformed(path, format!("not a readable workbook: {e}")))?;

    let range = match sheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| SalesError::malformed(path, format!("sheet '{name}': {e}")))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| SalesError::malformed(path, "workbook has no worksheets"))?
            .map_err(|e| SalesError::malformed(path, e.to_string()))?,
    };

    // The used range may not start at A1; keep column positions sheet-relative.
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let lead = first_col as usize;
    let widen = |row: &[Data]| -> Vec<CellValue> {
        std::iter::repeat(CellValue::Empty)
            .take(lead)
            .chain(row.iter().map(CellValue::from_data))
            .collect()
    };

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| SalesError::malformed(path, "sheet is empty"))?;
    let headers = widen(header)
        .iter()
        .map(|c| if c.is_empty() { String::new() } else { c.to_label() })
        .collect();
    let mut sheet = RawSheet::new(headers);

    for (i, row) in rows.enumerate() {
        let line = first_row as u64 + i as u64 + 2;
        sheet.push(line, widen(row));
    }
    Ok(sheet)
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Where each field lives in a sheet, resolved once from the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub category: usize,
    /// The subcategory column is positional: always the second column.
    pub subcategory: usize,
    pub measures: Vec<(Measure, Option<usize>)>,
}

impl ColumnMap {
    /// Errors carry only the reason; the caller attaches the file path.
    pub fn resolve(headers: &[String]) -> std::result::Result<Self, String> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let category = find(CATEGORY_HEADER)
            .ok_or_else(|| format!("missing required column \"{CATEGORY_HEADER}\""))?;
        if headers.len() < 2 {
            return Err("missing subcategory column (expected in the second column)".to_string());
        }
        let measures = Measure::ALL.iter().map(|m| (*m, find(m.header()))).collect();
        Ok(Self {
            category,
            subcategory: 1,
            measures,
        })
    }

    pub fn missing(&self) -> impl Iterator<Item = Measure> + '_ {
        self.measures
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(m, _)| *m)
    }
}

// ---------------------------------------------------------------------------
// Load & clean
// ---------------------------------------------------------------------------

/// Load one monthly export from the first worksheet and tag every row with `month`.
pub fn load_and_clean(path: &Path, month: &str) -> Result<Vec<SalesRecord>> {
    load_sheet(path, None, month)
}

/// Load one configured source, honouring its sheet name if it has one.
pub fn load_month(file: &MonthFile) -> Result<Vec<SalesRecord>> {
    match &file.sheet {
        None => load_and_clean(&file.path, &file.month),
        Some(sheet) => load_sheet(&file.path, Some(sheet), &file.month),
    }
}

fn load_sheet(path: &Path, sheet: Option<&str>, month: &str) -> Result<Vec<SalesRecord>> {
    let raw = read_sheet(path, sheet)?;
    let columns =
        ColumnMap::resolve(&raw.headers).map_err(|reason| SalesError::malformed(path, reason))?;
    for measure in columns.missing() {
        debug!(file = %path.display(), column = measure.header(), "column absent, defaulting to 0");
    }

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut skipped_totals = 0usize;
    for row in &raw.rows {
        let category = row.cells[columns.category].to_label();
        if is_total_row(&category) {
            skipped_totals += 1;
            continue;
        }
        let subcategory = row.cells[columns.subcategory].to_label();

        let mut measures = Measures::default();
        for (measure, idx) in &columns.measures {
            let Some(idx) = idx else { continue };
            let value = row.cells[*idx].to_measure().map_err(|reason| {
                SalesError::malformed(
                    path,
                    format!("row {}, column \"{}\": {reason}", row.line, measure.header()),
                )
            })?;
            measures.set(*measure, value);
        }

        records.push(SalesRecord {
            month: month.to_string(),
            category_full: composite_identity(&category, &subcategory),
            category,
            subcategory,
            measures,
        });
    }

    debug!(file = %path.display(), skipped_totals, "dropped total rows");
    info!(file = %path.display(), month, rows = records.len(), "loaded monthly export");
    Ok(records)
}

/// Load every configured month in order and concatenate them into one table.
/// The first file that fails aborts the whole load.
pub fn load_all(files: &[MonthFile]) -> Result<SalesTable> {
    let tables = files
        .iter()
        .map(|f| load_month(f).map(SalesTable::from_records))
        .collect::<Result<Vec<_>>>()?;
    let table = SalesTable::concat(tables);
    info!(files = files.len(), rows = table.len(), "built unified table");
    Ok(table)
}
