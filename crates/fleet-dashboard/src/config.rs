use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "fleet-dashboard";
const DEFAULT_SHEETS_RANGE: &str = "Sheet1";
const DEFAULT_FRESHNESS_SECS: u64 = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Public CSV export of the sheet.
    Csv,
    /// Spreadsheet values API with a bearer token.
    Api,
    /// Local CSV file; the source id is the path.
    File,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Auto,
    Desktop,
    Compact,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            LayoutMode::Auto => "auto",
            LayoutMode::Desktop => "desktop",
            LayoutMode::Compact => "compact",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LayoutMode::Auto => LayoutMode::Desktop,
            LayoutMode::Desktop => LayoutMode::Compact,
            LayoutMode::Compact => LayoutMode::Auto,
        }
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fleet-dashboard", about = "Terminal status board for the agent fleet sheet")]
pub struct Args {
    /// Spreadsheet id (or file path with --transport file).
    #[arg(long, env = "FLEET_SOURCE_ID")]
    pub source_id: Option<String>,
    #[arg(long, env = "FLEET_TRANSPORT", value_enum)]
    pub transport: Option<TransportKind>,
    #[arg(long, env = "FLEET_SHEETS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,
    #[arg(long, env = "FLEET_SHEETS_RANGE")]
    pub sheets_range: Option<String>,
    /// Seconds a fetched grid is served from cache.
    #[arg(long, env = "FLEET_FRESHNESS_SECS")]
    pub freshness_secs: Option<u64>,
    #[arg(long, env = "FLEET_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
    #[arg(long, env = "FLEET_SECRETS_FILE")]
    pub secrets_file: Option<PathBuf>,
    #[arg(long, env = "FLEET_LOG_FILE")]
    pub log_file: Option<PathBuf>,
    #[arg(long, env = "FLEET_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub layout: Option<LayoutMode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub source_id: Option<String>,
    pub transport: Option<TransportKind>,
    pub sheets_range: Option<String>,
    pub freshness_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub secrets_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub layout: Option<LayoutMode>,
}

#[derive(Debug, Clone)]
pub struct AppDirs {
    pub config_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl AppDirs {
    pub fn discover() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self {
            config_dir,
            state_dir,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source_id: String,
    pub transport: TransportKind,
    pub sheets_token: Option<String>,
    pub sheets_range: String,
    pub freshness: Duration,
    pub request_timeout: Duration,
    pub secrets_file: PathBuf,
    pub log_file: PathBuf,
    pub layout: LayoutMode,
}

pub fn load(args: Args) -> Result<DashboardConfig> {
    let dirs = AppDirs::discover();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| dirs.config_dir.join("config.toml"));
    let file = load_file_config(&config_path)?;
    resolve(args, file, &dirs)
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

/// Flags and env vars win over the config file, which wins over defaults.
pub fn resolve(args: Args, file: FileConfig, dirs: &AppDirs) -> Result<DashboardConfig> {
    let source_id = args
        .source_id
        .or(file.source_id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let Some(source_id) = source_id else {
        bail!("no fleet sheet configured: pass --source-id or set FLEET_SOURCE_ID");
    };

    let sheets_token = args
        .sheets_token
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(DashboardConfig {
        source_id,
        transport: args.transport.or(file.transport).unwrap_or(TransportKind::Csv),
        sheets_token,
        sheets_range: args
            .sheets_range
            .or(file.sheets_range)
            .unwrap_or_else(|| DEFAULT_SHEETS_RANGE.to_string()),
        freshness: Duration::from_secs(
            args.freshness_secs
                .or(file.freshness_secs)
                .unwrap_or(DEFAULT_FRESHNESS_SECS),
        ),
        request_timeout: Duration::from_secs(
            args.timeout_secs
                .or(file.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(1),
        ),
        secrets_file: args
            .secrets_file
            .or(file.secrets_file)
            .unwrap_or_else(|| dirs.config_dir.join("secrets.toml")),
        log_file: args
            .log_file
            .or(file.log_file)
            .unwrap_or_else(|| dirs.state_dir.join("dashboard.log")),
        layout: args.layout.or(file.layout).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dirs() -> AppDirs {
        AppDirs {
            config_dir: PathBuf::from("/cfg"),
            state_dir: PathBuf::from("/state"),
        }
    }

    #[test]
    fn defaults_fill_everything_but_the_source() {
        let args = Args {
            source_id: Some("sheet-1".to_string()),
            ..Args::default()
        };
        let config = resolve(args, FileConfig::default(), &test_dirs()).expect("resolve");
        assert_eq!(config.source_id, "sheet-1");
        assert_eq!(config.transport, TransportKind::Csv);
        assert_eq!(config.sheets_range, "Sheet1");
        assert_eq!(config.freshness, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.secrets_file, PathBuf::from("/cfg/secrets.toml"));
        assert_eq!(config.log_file, PathBuf::from("/state/dashboard.log"));
        assert_eq!(config.layout, LayoutMode::Auto);
    }

    #[test]
    fn missing_source_is_an_error() {
        let args = Args {
            source_id: Some("   ".to_string()),
            ..Args::default()
        };
        let err = resolve(args, FileConfig::default(), &test_dirs()).expect_err("no source");
        assert!(err.to_string().contains("FLEET_SOURCE_ID"));
    }

    #[test]
    fn flags_beat_file_values() {
        let file: FileConfig = toml::from_str(
            r#"
source_id = "from-file"
transport = "api"
freshness_secs = 120
layout = "compact"
"#,
        )
        .expect("parse file config");
        let args = Args {
            transport: Some(TransportKind::File),
            ..Args::default()
        };
        let config = resolve(args, file, &test_dirs()).expect("resolve");
        assert_eq!(config.source_id, "from-file");
        assert_eq!(config.transport, TransportKind::File);
        assert_eq!(config.freshness, Duration::from_secs(120));
        assert_eq!(config.layout, LayoutMode::Compact);
    }

    #[test]
    fn absent_config_file_reads_as_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_file_config(&dir.path().join("missing.toml")).expect("load");
        assert!(config.source_id.is_none());
    }

    #[test]
    fn malformed_config_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "freshness_secs = \"soon\"").expect("write config");
        let err = load_file_config(&path).expect_err("bad config");
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn layout_mode_cycles() {
        assert_eq!(LayoutMode::Auto.next(), LayoutMode::Desktop);
        assert_eq!(LayoutMode::Desktop.next(), LayoutMode::Compact);
        assert_eq!(LayoutMode::Compact.next(), LayoutMode::Auto);
    }
}
