// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pipedesk_app::ViewKind;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

const CONFIG_VERSION: i64 = 1;
pub const CONFIG_PATH_ENV: &str = "PIPEDESK_CONFIG_PATH";
const DEFAULT_DEMO_ROWS: usize = 12;
const MAX_DEMO_ROWS: usize = 10_000;
const DEFAULT_DEMO_SEED: u64 = 42;
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            view: View::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct View {
    pub default: Option<String>,
    pub demo_rows: Option<usize>,
    pub demo_seed: Option<u64>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            default: Some(ViewKind::Contacts.label().to_owned()),
            demo_rows: Some(DEFAULT_DEMO_ROWS),
            demo_seed: Some(DEFAULT_DEMO_SEED),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(pipedesk_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and keep values under [storage], [view], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(db_path) = &self.storage.db_path {
            pipedesk_db::validate_db_path(db_path)?;
        }

        if let Some(name) = &self.view.default
            && ViewKind::parse(name).is_none()
        {
            bail!(
                "view.default in {} is {name:?}; use \"contacts\" or \"deals\"",
                path.display()
            );
        }

        if let Some(rows) = self.view.demo_rows
            && rows > MAX_DEMO_ROWS
        {
            bail!(
                "view.demo_rows in {} must be at most {MAX_DEMO_ROWS}, got {rows}",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && LevelFilter::from_str(level).is_err()
        {
            bail!(
                "log.level in {} is {level:?}; use one of off, error, warn, info, debug, trace",
                path.display()
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => pipedesk_db::default_db_path(),
        }
    }

    pub fn default_view(&self) -> ViewKind {
        self.view
            .default
            .as_deref()
            .and_then(ViewKind::parse)
            .unwrap_or(ViewKind::Contacts)
    }

    pub fn demo_rows(&self) -> usize {
        self.view.demo_rows.unwrap_or(DEFAULT_DEMO_ROWS)
    }

    pub fn demo_seed(&self) -> u64 {
        self.view.demo_seed.unwrap_or(DEFAULT_DEMO_SEED)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# pipedesk config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/pipedesk/pipedesk.db)\n# db_path = \"/absolute/path/to/pipedesk.db\"\n\n[view]\ndefault = \"contacts\"\ndemo_rows = {DEFAULT_DEMO_ROWS}\ndemo_seed = {DEFAULT_DEMO_SEED}\n\n[log]\n# RUST_LOG overrides this when set.\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n",
            path.display(),
        )
    }
}
