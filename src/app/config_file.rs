//! Config file loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use harvester_core::PageSelection;

/// Values read from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FileConfig {
    pub(crate) base_url: Option<String>,
    pub(crate) start_page: Option<u32>,
    pub(crate) pages: Option<PageSelection>,
    /// Same range as the CLI flag.
    pub(crate) concurrency: Option<u8>,
    pub(crate) batch_size: Option<u16>,
    pub(crate) batch_pause_ms: Option<u64>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) detail: Option<bool>,
    pub(crate) default_page_count: Option<u32>,
    pub(crate) connect_timeout_secs: Option<u64>,
    pub(crate) read_timeout_secs: Option<u64>,
    pub(crate) json_fallback: Option<bool>,
    pub(crate) warm_up: Option<bool>,
    pub(crate) verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=100");
        }
        if let Some(batch_size) = self.batch_size
            && !(1..=1000).contains(&batch_size)
        {
            bail!("Invalid config value for `batch_size`: {batch_size}. Expected range: 1..=1000");
        }
        if let Some(pause) = self.batch_pause_ms
            && pause > 60_000
        {
            bail!("Invalid config value for `batch_pause_ms`: {pause}. Expected range: 0..=60000");
        }
        validate_positive("start_page", self.start_page)?;
        validate_positive("default_page_count", self.default_page_count)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_positive(field: &str, value: Option<u32>) -> Result<()> {
    if value == Some(0) {
        bail!("Invalid config value for `{field}`: 0. Expected a value of at least 1");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub(crate) path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub(crate) config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/harvester/config.toml`
/// 2. `$HOME/.config/harvester/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("harvester")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("harvester")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub(crate) fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_number}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "base_url" => cfg.base_url = Some(parse_string_literal(value).with_context(invalid)?),
            "start_page" => cfg.start_page = Some(parse_integer(value).with_context(invalid)?),
            "pages" => cfg.pages = Some(parse_pages(value).with_context(invalid)?),
            "concurrency" => cfg.concurrency = Some(parse_integer(value).with_context(invalid)?),
            "batch_size" => cfg.batch_size = Some(parse_integer(value).with_context(invalid)?),
            "batch_pause_ms" => {
                cfg.batch_pause_ms = Some(parse_integer(value).with_context(invalid)?);
            }
            "output" => {
                cfg.output = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "detail" => cfg.detail = Some(parse_boolean(value).with_context(invalid)?),
            "default_page_count" => {
                cfg.default_page_count = Some(parse_integer(value).with_context(invalid)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer(value).with_context(invalid)?);
            }
            "json_fallback" => {
                cfg.json_fallback = Some(parse_boolean(value).with_context(invalid)?);
            }
            "warm_up" => cfg.warm_up = Some(parse_boolean(value).with_context(invalid)?),
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer<T>(raw_value: &str) -> Result<T>
where
    T: TryFrom<u64>,
{
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value)
        .ok()
        .and_then(|value| T::try_from(value).ok())
        .ok_or_else(|| anyhow::anyhow!("Integer value out of range"))
}

/// `pages = "all"` or `pages = 12`.
fn parse_pages(raw_value: &str) -> Result<PageSelection> {
    let token = if raw_value.starts_with('"') {
        parse_string_literal(raw_value)?
    } else {
        raw_value.to_string()
    };
    token.parse::<PageSelection>().map_err(anyhow::Error::msg)
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
