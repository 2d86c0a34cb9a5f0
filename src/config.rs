use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::budget::DEFAULT_RECENT_WINDOW;
use crate::models::MAX_AMOUNT;

const CONFIG_FILE: &str = "config.json";
const DB_ENV: &str = "BUDGETPIE_DB";
const LOG_ENV: &str = "BUDGETPIE_LOG";

/// Settings resolved once at startup from the data directory, an optional
/// `config.json` in it, and environment overrides.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) db_path: PathBuf,
    pub(crate) log_path: PathBuf,
    pub(crate) log_level: String,
    pub(crate) monthly_income: Decimal,
    pub(crate) recent_window: usize,
}

/// On-disk shape of `config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    log_level: Option<String>,
    monthly_income: Option<Decimal>,
    recent_window: Option<usize>,
}

impl Config {
    pub(crate) fn load() -> Result<Self> {
        let data_dir = data_dir()?;
        let file = read_config_file(&data_dir.join(CONFIG_FILE))?;
        Self::resolve(&data_dir, file, |key| std::env::var(key).ok())
    }

    fn resolve(
        data_dir: &Path,
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let recent_window = file.recent_window.unwrap_or(DEFAULT_RECENT_WINDOW);
        if recent_window == 0 {
            anyhow::bail!("recent_window must be at least 1");
        }
        let monthly_income = file.monthly_income.unwrap_or(Decimal::new(4000_00, 2));
        if monthly_income.is_sign_negative() || monthly_income > MAX_AMOUNT {
            anyhow::bail!("monthly_income must be between 0 and {MAX_AMOUNT}");
        }

        let db_path = env(DB_ENV)
            .map(PathBuf::from)
            .or(file.db_path)
            .unwrap_or_else(|| data_dir.join("budgetpie.db"));
        let log_path = env(LOG_ENV)
            .map(PathBuf::from)
            .or(file.log_path)
            .unwrap_or_else(|| data_dir.join("budgetpie.log"));

        Ok(Self {
            db_path,
            log_path,
            log_level: file.log_level.unwrap_or_else(|| "info".into()),
            monthly_income,
            recent_window,
        })
    }
}

fn data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "budgetpie", "BudgetPie")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.to_path_buf())
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
}
