//! Deployment configuration: database location and scheduler tick times,
//! loaded from a JSON file with environment overrides for debug runs.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerResult;
use crate::scheduler::ScheduleConfig;

const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Environment flag that forces every-minute scheduler ticks.
pub const DEBUG_TICKS_ENV: &str = "BANK_CORE_DEBUG_TICKS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub savings_tick: NaiveTime,
    pub fd_tick: NaiveTime,
    #[serde(default)]
    pub debug_fast_ticks: bool,
}

impl Default for Config {
    fn default() -> Self {
        let schedule = ScheduleConfig::default();
        Self {
            db_path: base_dir().join("bank.db"),
            savings_tick: schedule.savings_tick,
            fd_tick: schedule.fd_tick,
            debug_fast_ticks: false,
        }
    }
}

impl Config {
    /// Applies environment overrides; currently only the debug-tick flag.
    pub fn apply_env(&mut self) {
        if std::env::var(DEBUG_TICKS_ENV).as_deref() == Ok("1") {
            self.debug_fast_ticks = true;
        }
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            savings_tick: self.savings_tick,
            fd_tick: self.fd_tick,
            debug_fast: self.debug_fast_ticks,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> LedgerResult<Self> {
        Self::from_base(base_dir())
    }

    pub fn from_base(base: PathBuf) -> LedgerResult<Self> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
        })
    }

    /// Loads the config, falling back to defaults when no file exists.
    pub fn load(&self) -> LedgerResult<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> LedgerResult<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bank_core")
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> LedgerResult<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
