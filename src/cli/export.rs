use std::io::Write;
use std::path::PathBuf;

use crate::cli::{load_table, FilterArgs, GlobalArgs};
use crate::error::Result;
use crate::models::Measure;
use crate::settings::Settings;
use crate::table::SalesTable;

fn default_path(settings: &Settings) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    settings
        .data_path()
        .join("exports")
        .join(format!("sales-{date}.csv"))
}

/// Write the table as CSV: month, both category labels, the composite identity,
/// then the seven measures.
pub(crate) fn write_csv<W: Write>(table: &SalesTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["Month", "Category", "Subcategory", "Category Full"];
    header.extend(Measure::ALL.iter().map(|m| m.header()));
    wtr.write_record(&header)?;

    for r in table.records() {
        let mut row = vec![
            r.month.clone(),
            r.category.clone(),
            r.subcategory.clone(),
            r.category_full.clone(),
        ];
        row.extend(r.measures.iter().map(|(_, v)| v.to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(global: &GlobalArgs, output: Option<&str>, filter: &FilterArgs) -> Result<()> {
    let settings = global.settings()?;
    let table = load_table(&settings)?.filtered(&filter.to_filter());

    if output == Some("-") {
        return write_csv(&table, std::io::stdout().lock());
    }

    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&settings));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&path)?;
    write_csv(&table, file)?;
    println!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
