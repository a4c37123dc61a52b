// ⚙️ Configuration
//
// Precedence: defaults < environment < command-line flags.

use crate::calculator::{Calculations, ProcessCalculator, DEFAULT_TIMEOUT};
use crate::registry::ContestantRegistry;
use crate::store::JsonFileStore;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const ENV_DATA_FILE: &str = "WEIGH_IN_DATA_FILE";
pub const ENV_CALCULATOR: &str = "WEIGH_IN_CALCULATOR";
pub const ENV_CALCULATOR_TIMEOUT_MS: &str = "WEIGH_IN_CALCULATOR_TIMEOUT_MS";

pub const DEFAULT_DATA_FILE: &str = "contestants.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Snapshot location
    pub data_file: PathBuf,
    /// External calculator program, tried before the local formulas
    pub calculator: Option<PathBuf>,
    pub calculator_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            calculator: None,
            calculator_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Values supplied on the command line; `None` keeps the lower layer
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_file: Option<PathBuf>,
    pub calculator: Option<PathBuf>,
    pub calculator_timeout_ms: Option<u64>,
}

impl Config {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = lookup(ENV_DATA_FILE).filter(|v| !v.is_empty()) {
            config.data_file = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_CALCULATOR).filter(|v| !v.is_empty()) {
            config.calculator = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_CALCULATOR_TIMEOUT_MS).filter(|v| !v.is_empty()) {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be milliseconds, got {:?}", ENV_CALCULATOR_TIMEOUT_MS, raw))?;
            config.calculator_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(path) = overrides.data_file {
            self.data_file = path;
        }
        if let Some(path) = overrides.calculator {
            self.calculator = Some(path);
        }
        if let Some(ms) = overrides.calculator_timeout_ms {
            self.calculator_timeout = Duration::from_millis(ms);
        }
        self
    }

    /// Calculator chain for this configuration; a missing program means local only
    pub fn calculations(&self) -> Calculations {
        let Some(program) = &self.calculator else {
            return Calculations::local();
        };

        match ProcessCalculator::locate(program, self.calculator_timeout) {
            Some(process) => {
                info!(program = %program.display(), "using external calculator");
                Calculations::with_preferred(process)
            }
            None => {
                warn!(program = %program.display(), "calculator not found, using local formulas");
                Calculations::local()
            }
        }
    }

    pub fn open_registry(&self) -> ContestantRegistry<JsonFileStore> {
        ContestantRegistry::new(JsonFileStore::new(&self.data_file))
            .with_calculations(self.calculations())
    }
}
