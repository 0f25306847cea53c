pub mod dashboard;
pub mod export;
pub mod init;
pub mod report;
pub mod sources;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::Result;
use crate::loader;
use crate::reports::RankBy;
use crate::settings::{default_settings_path, load_settings, Settings};
use crate::table::{Filter, SalesTable};

#[derive(Parser)]
#[command(
    name = "catsales",
    version,
    about = "Sales & profit dashboard for monthly category sales exports."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Settings file (default: ~/.config/catsales/settings.json)
    #[arg(long, env = "CATSALES_CONFIG", global = true)]
    pub config: Option<PathBuf>,
    /// Directory the monthly exports are read from (overrides settings)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,
    /// Log filter: error, warn, info, debug, trace
    #[arg(long = "log-level", env = "CATSALES_LOG", default_value = "warn", global = true)]
    pub log_level: String,
}

impl GlobalArgs {
    pub fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_settings_path)
    }

    /// Settings from disk with command-line overrides applied.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = load_settings(&self.settings_path())?;
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        Ok(settings)
    }
}

/// Load and merge every configured monthly export.
pub(crate) fn load_table(settings: &Settings) -> Result<SalesTable> {
    loader::load_all(&settings.month_files())
}

#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Month code, e.g. JUN
    #[arg(long)]
    pub month: Option<String>,
    /// Main category
    #[arg(long)]
    pub category: Option<String>,
    /// Subcategory
    #[arg(long)]
    pub subcategory: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Filter {
        Filter {
            month: self.month.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a settings file listing the monthly exports to load.
    Init,
    /// List the configured monthly exports and whether each file exists.
    Sources,
    /// Key metrics, rankings and monthly trend as text.
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
        /// Entries per ranking (default: top_n from settings)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Rank categories by sales, profit or margin.
    Rank {
        #[arg(value_enum)]
        by: RankBy,
        /// Show the lowest values instead of the highest
        #[arg(long)]
        bottom: bool,
        /// Number of entries (default: top_n from settings)
        #[arg(long)]
        top: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Profit per category for each month.
    Trend {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List the months, categories and subcategories available for filtering.
    Categories {
        /// Only list subcategories of this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Export the merged table to CSV.
    Export {
        /// Output path, or '-' for stdout (default: <data_dir>/exports/sales-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Interactive dashboard with filters and charts.
    Dashboard,
    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
