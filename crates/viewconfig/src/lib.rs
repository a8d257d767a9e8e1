//! Layered configuration for the shader previewer.
//!
//! Settings come from TOML files and the command line. Files are merged in
//! discovery order with later files winning; the command-line layer is applied
//! last by the binary through [`FileConfig::layer`]. Keys that a layer leaves
//! unset never override lower layers.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories_next::{BaseDirs, ProjectDirs};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::debug;
use viewer::{UniformNames, ViewerConfig};

/// Overrides the per-user configuration directory.
pub const ENV_CONFIG_DIR: &str = "SHADEVIEW_CONFIG_DIR";

const APPLICATION: &str = "shadeview";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to parse config file {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One configuration layer. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, deserialize_with = "deserialize_paths_opt")]
    pub image: Option<Vec<PathBuf>>,
    pub shader: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub geometry: Option<String>,
    pub position: Option<String>,
    pub tps: Option<u32>,
    pub map_flag: Option<String>,
    pub map_ticks: Option<String>,
    pub map_time: Option<String>,
    pub map_mouse: Option<String>,
    pub map_slider: Option<String>,
    pub debug: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub poll_interval: Option<Duration>,
}

impl FileConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FileConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: FileConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;
        raw.validate()?;
        Ok(raw)
    }

    /// Checks values that can be judged without the rest of the layers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(interval) = self.poll_interval {
            if interval.is_zero() {
                return Err(ConfigError::Invalid(
                    "poll-interval must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }

    /// Returns `self` with every key set in `upper` replaced by its value.
    pub fn layer(self, upper: FileConfig) -> FileConfig {
        FileConfig {
            image: upper.image.or(self.image),
            shader: upper.shader.or(self.shader),
            background: upper.background.or(self.background),
            geometry: upper.geometry.or(self.geometry),
            position: upper.position.or(self.position),
            tps: upper.tps.or(self.tps),
            map_flag: upper.map_flag.or(self.map_flag),
            map_ticks: upper.map_ticks.or(self.map_ticks),
            map_time: upper.map_time.or(self.map_time),
            map_mouse: upper.map_mouse.or(self.map_mouse),
            map_slider: upper.map_slider.or(self.map_slider),
            debug: upper.debug.or(self.debug),
            poll_interval: upper.poll_interval.or(self.poll_interval),
        }
    }

    /// Fills unset keys with their defaults.
    pub fn into_viewer_config(self) -> ViewerConfig {
        let defaults = ViewerConfig::default();
        let names = UniformNames::default();
        ViewerConfig {
            images: self.image.unwrap_or_default(),
            shader: self.shader.unwrap_or_default(),
            background: self.background.filter(|path| !path.as_os_str().is_empty()),
            geometry: self.geometry.unwrap_or(defaults.geometry),
            position: self.position.unwrap_or(defaults.position),
            ticks_per_second: self.tps.unwrap_or(defaults.ticks_per_second),
            uniforms: UniformNames {
                flag: self.map_flag.unwrap_or(names.flag),
                ticks: self.map_ticks.unwrap_or(names.ticks),
                time: self.map_time.unwrap_or(names.time),
                mouse: self.map_mouse.unwrap_or(names.mouse),
                slider: self.map_slider.unwrap_or(names.slider),
            },
            debug: self.debug.unwrap_or(defaults.debug),
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
        }
    }
}

/// Files consulted when no explicit config is given, lowest priority first.
pub fn candidate_files(explicit: Option<&Path>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut files = vec![
        PathBuf::from(format!("/etc/{APPLICATION}.conf")),
        PathBuf::from(format!("/usr/local/etc/{APPLICATION}.conf")),
    ];
    if let Some(dir) = user_config_dir() {
        files.push(dir.join("config"));
    }
    if let Some(base) = BaseDirs::new() {
        files.push(base.home_dir().join(format!(".{APPLICATION}")));
    }
    files.push(PathBuf::from(format!("{APPLICATION}.conf")));
    files
}

fn user_config_dir() -> Option<PathBuf> {
    if let Some(value) = env::var_os(ENV_CONFIG_DIR) {
        if !value.is_empty() {
            return Some(PathBuf::from(value));
        }
    }
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Merges every config file that applies.
///
/// An explicit file must exist. Discovered files that are missing or are not
/// regular files are skipped.
pub fn load_layered(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config file");
        return FileConfig::load(path);
    }

    let mut merged = FileConfig::default();
    for path in candidate_files(None) {
        if !path.is_file() {
            continue;
        }
        debug!(path = %path.display(), "loading config file");
        merged = merged.layer(FileConfig::load(&path)?);
    }
    Ok(merged)
}

fn deserialize_paths_opt<'de, D>(deserializer: D) -> Result<Option<Vec<PathBuf>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    Ok(helper.map(|helper| match helper {
        Helper::One(path) => vec![path],
        Helper::Many(paths) => paths,
    }))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Parses a `--poll-interval` style value with the same rules as the file key.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    if let Ok(seconds) = raw.parse::<f64>() {
        if !seconds.is_finite() || seconds.is_sign_negative() {
            return Err("duration must be a non-negative number of seconds".into());
        }
        return Ok(Duration::from_secs_f64(seconds));
    }
    humantime::parse_duration(raw).map_err(|err| format!("invalid duration '{raw}': {err}"))
}
