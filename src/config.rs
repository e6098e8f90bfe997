use std::path::PathBuf;

use clap::Parser;

/// Environment variable naming the data file when no argument is given.
pub const DATA_PATH_ENV: &str = "SALES_DASHBOARD_DATA";
/// Data file looked up relative to the working directory by default.
pub const DEFAULT_DATA_FILE: &str = "data.xlsx";

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "sales-dashboard", version, about = "Interactive sales performance dashboard")]
pub struct Config {
    /// Sales data file (.xlsx, .xlsm, .xlsb, .xls, .ods, .csv, .json or .parquet).
    #[arg(env = DATA_PATH_ENV, default_value = DEFAULT_DATA_FILE)]
    pub data_path: PathBuf,
}
