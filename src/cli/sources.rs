use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::GlobalArgs;
use crate::error::Result;

pub fn run(global: &GlobalArgs) -> Result<()> {
    let settings = global.settings()?;
    let files = settings.month_files();

    println!("Settings:   {}", global.settings_path().display());
    println!("Data dir:   {}", settings.data_path().display());

    if files.is_empty() {
        println!("\nNo sources configured. Run `catsales init` to write the defaults.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Month", "File", "Sheet", "Status"]);
    for file in &files {
        let status = if file.path.is_file() {
            "found".green().to_string()
        } else {
            "missing".red().to_string()
        };
        table.add_row(vec![
            Cell::new(&file.month),
            Cell::new(file.path.display()),
            Cell::new(file.sheet.as_deref().unwrap_or("(first)")),
            Cell::new(status),
        ]);
    }
    println!("\n{table}");
    Ok(())
}
