use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_WORKBOOK: &str = "data/example.xlsx";
const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub workbook_path: PathBuf,
    /// Persist every cell update immediately
    pub autosave: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workbook_path: PathBuf::from(DEFAULT_WORKBOOK),
            autosave: true,
        }
    }
}

impl EngineConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let file_config = if let Some(path) = args.config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            workbook: file_workbook,
            autosave: file_autosave,
        } = file_config;

        let defaults = Self::default();
        let workbook_path = args
            .workbook
            .clone()
            .or(file_workbook)
            .unwrap_or(defaults.workbook_path);
        let cli_autosave = if args.no_autosave {
            Some(false)
        } else {
            args.autosave
        };
        let autosave = cli_autosave.or(file_autosave).unwrap_or(defaults.autosave);

        Ok(Self {
            workbook_path,
            autosave,
        })
    }

    /// Fail-fast checks run before any command touches the workbook. The
    /// file itself may not exist yet (`init-example` creates it).
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.workbook_path.as_os_str().is_empty(),
            "workbook path must not be empty"
        );
        let allowed = self
            .workbook_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
        anyhow::ensure!(
            allowed,
            "workbook {:?} does not match allowed extensions {:?}",
            self.workbook_path,
            SUPPORTED_EXTENSIONS
        );
        if self.workbook_path.exists() {
            anyhow::ensure!(
                self.workbook_path.is_file(),
                "workbook {:?} is not a file",
                self.workbook_path
            );
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sheetlink",
    about = "Read, edit and reference cells in an xlsx workbook",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "SHEETLINK_WORKBOOK",
        value_name = "FILE",
        help = "Workbook file backing every command",
        global = true
    )]
    pub workbook: Option<PathBuf>,

    #[arg(
        long,
        env = "SHEETLINK_AUTOSAVE",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set,
        help = "Save after every cell update",
        global = true
    )]
    pub autosave: Option<bool>,

    #[arg(
        long = "no-autosave",
        help = "Keep updates in memory until an explicit save; overrides --autosave",
        global = true
    )]
    pub no_autosave: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List sheet names in workbook order
    Sheets,
    /// Read a range as a row-major grid
    Read { sheet: String, range: String },
    /// Every stored cell of a sheet plus its extent
    Snapshot { sheet: String },
    /// Write a literal; VALUE is read as JSON when it parses, else as text
    Write {
        sheet: String,
        cell: String,
        value: String,
    },
    /// Formula stored in a cell, without the leading '='
    Formula { sheet: String, cell: String },
    /// Save the workbook, optionally to another file
    Save {
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
    },
    /// Parse one mention such as @Sheet1!A1:B3
    Mention { text: String },
    /// List every mention found in a message
    Mentions { text: String },
    /// Read the cells a mention such as @Sheet1!A1:B3 points at
    Resolve { text: String },
    /// Canonical mention text for a sheet and cell range
    FormatMention {
        sheet: String,
        start_cell: String,
        end_cell: Option<String>,
    },
    /// Write the demo workbook to the configured path
    InitExample,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    #[serde(alias = "workbook_path")]
    workbook: Option<PathBuf>,
    autosave: Option<bool>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
