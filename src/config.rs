//! Configuration loading and defaults.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Command-line flags** (`--fixes`, `--gazetteer`), applied by `main`
//! 2. **Environment variables**: `GPSINFO_GAZETTEER`, `GPSINFO_FIXES`
//! 3. **Config file**: path via `--config <path>`, or `gpsinfo.toml` in CWD
//! 4. **Compiled defaults**: see each field's default value below
//!
//! The TOML file mirrors the struct hierarchy:
//!
//! ```toml
//! [gazetteer]
//! path = "cities.json"         # omit to run without closest-city lookup
//! wait = true                  # hold fixes until the gazetteer is loaded
//!
//! [source]
//! path = "track.jsonl"         # omit to read events from stdin
//! replay_interval_ms = 0       # > 0 paces delivery, e.g. 1000 for 1 Hz
//!
//! [processor]
//! debounce_distance_m = 1000.0
//! search_radius_m = 100000.0
//! markers = true
//!
//! [output]
//! format = "text"              # or "json"
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::processor::{ProcessorSettings, DEFAULT_DEBOUNCE_DISTANCE_M, DEFAULT_SEARCH_RADIUS_M};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "gpsinfo.toml";

/// Fix source argument that selects stdin.
pub const STDIN_SOURCE: &str = "-";

/// Map a fix source argument to a file path; `-` means stdin.
#[must_use]
pub fn fixes_path(arg: PathBuf) -> Option<PathBuf> {
    (arg.as_os_str() != STDIN_SOURCE).then_some(arg)
}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gazetteer: GazetteerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the city list comes from.
#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerConfig {
    /// JSON gazetteer file. Override with `GPSINFO_GAZETTEER`.
    pub path: Option<PathBuf>,
    /// Wait for the gazetteer before processing fixes (default true).
    #[serde(default = "default_wait")]
    pub wait: bool,
}

/// Fix source settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// Newline-delimited JSON events. `None` reads stdin. Override with
    /// `GPSINFO_FIXES`.
    pub path: Option<PathBuf>,
    /// Delay between delivered events in milliseconds (default 0, no pacing).
    #[serde(default)]
    pub replay_interval_ms: u64,
}

/// Location processor tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Movement needed before the closest city is recomputed (default 1000 m).
    #[serde(default = "default_debounce_distance")]
    pub debounce_distance_m: f64,
    /// Closest-city search radius (default 100 km).
    #[serde(default = "default_search_radius")]
    pub search_radius_m: f64,
    /// Enable the reference marker (default true).
    #[serde(default = "default_markers")]
    pub markers: bool,
}

/// How readouts are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Two-column table per readout.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG` env var.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_wait() -> bool {
    true
}
fn default_debounce_distance() -> f64 {
    DEFAULT_DEBOUNCE_DISTANCE_M
}
fn default_search_radius() -> f64 {
    DEFAULT_SEARCH_RADIUS_M
}
fn default_markers() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            path: None,
            wait: default_wait(),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            debounce_distance_m: default_debounce_distance(),
            search_radius_m: default_search_radius(),
            markers: default_markers(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ProcessorConfig {
    #[must_use]
    pub fn settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            debounce_distance_m: self.debounce_distance_m,
            search_radius_m: self.search_radius_m,
            markers: self.markers,
        }
    }
}

impl SourceConfig {
    #[must_use]
    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }
}

impl Config {
    /// Load configuration with the precedence chain: env vars > file > defaults.
    ///
    /// If `path` is `Some`, that file must exist. Otherwise `gpsinfo.toml`
    /// in the current directory is used when present, falling back to
    /// compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let mut config = if let Some(p) = path {
            Self::from_file(p)?
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        } else {
            Config::default()
        };

        // Env var overrides
        if let Ok(gazetteer) = std::env::var("GPSINFO_GAZETTEER") {
            config.gazetteer.path = Some(PathBuf::from(gazetteer));
        }
        if let Ok(fixes) = std::env::var("GPSINFO_FIXES") {
            config.source.path = fixes_path(PathBuf::from(fixes));
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        Self::from_toml(&content)
            .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Reject values the processor cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let p = &self.processor;
        if !(p.debounce_distance_m.is_finite() && p.debounce_distance_m >= 0.0) {
            return Err(format!(
                "processor.debounce_distance_m must be >= 0, got {}",
                p.debounce_distance_m
            ));
        }
        if !(p.search_radius_m.is_finite() && p.search_radius_m > 0.0) {
            return Err(format!(
                "processor.search_radius_m must be > 0, got {}",
                p.search_radius_m
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let c = Config::from_toml("").unwrap();
        assert!(c.gazetteer.path.is_none());
        assert!(c.gazetteer.wait);
        assert!(c.source.path.is_none());
        assert_eq!(c.source.replay_interval(), Duration::ZERO);
        assert_eq!(c.processor.settings(), ProcessorSettings::default());
        assert_eq!(c.output.format, OutputFormat::Text);
        assert_eq!(c.logging.level, "info");
    }

    #[test]
    fn test_full_file() {
        let c = Config::from_toml(
            r#"
            [gazetteer]
            path = "/data/cities.json"
            wait = false

            [source]
            path = "track.jsonl"
            replay_interval_ms = 1000

            [processor]
            debounce_distance_m = 250.0
            search_radius_m = 50000.0
            markers = false

            [output]
            format = "json"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(
            c.gazetteer.path.as_deref(),
            Some(Path::new("/data/cities.json"))
        );
        assert!(!c.gazetteer.wait);
        assert_eq!(c.source.replay_interval(), Duration::from_secs(1));
        let s = c.processor.settings();
        assert!((s.debounce_distance_m - 250.0).abs() < f64::EPSILON);
        assert!((s.search_radius_m - 50_000.0).abs() < f64::EPSILON);
        assert!(!s.markers);
        assert_eq!(c.output.format, OutputFormat::Json);
        assert_eq!(c.logging.level, "debug");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let c = Config::from_toml("[processor]\nmarkers = false\n").unwrap();
        assert!(!c.processor.markers);
        let p = &c.processor;
        assert!((p.debounce_distance_m - 1000.0).abs() < f64::EPSILON);
        assert!((p.search_radius_m - 100_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_output_format_rejected() {
        assert!(Config::from_toml("[output]\nformat = \"xml\"\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_radius() {
        let c = Config::from_toml("[processor]\nsearch_radius_m = 0.0\n").unwrap();
        assert!(c.validate().unwrap_err().contains("search_radius_m"));

        let c = Config::from_toml("[processor]\ndebounce_distance_m = -1.0\n").unwrap();
        assert!(c.validate().unwrap_err().contains("debounce_distance_m"));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/gpsinfo.toml"))).unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_fixes_path_dash_is_stdin() {
        assert_eq!(fixes_path(PathBuf::from("-")), None);
        assert_eq!(
            fixes_path(PathBuf::from("track.jsonl")),
            Some(PathBuf::from("track.jsonl"))
        );
    }

    // The only test that sets GPSINFO_* variables.
    #[test]
    fn test_env_overrides_file() {
        let dir = std::env::temp_dir().join(format!("gpsinfo-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gpsinfo.toml");
        std::fs::write(
            &path,
            r#"
            [gazetteer]
            path = "file/cities.json"

            [source]
            path = "file/track.jsonl"
            "#,
        )
        .unwrap();

        let c = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(c.gazetteer.path, Some(PathBuf::from("file/cities.json")));
        assert_eq!(c.source.path, Some(PathBuf::from("file/track.jsonl")));

        std::env::set_var("GPSINFO_GAZETTEER", "/env/cities.json");
        std::env::set_var("GPSINFO_FIXES", "/env/track.jsonl");
        let c = Config::load(Some(path.as_path()));
        std::env::set_var("GPSINFO_FIXES", "-");
        let stdin = Config::load(Some(path.as_path()));
        std::env::remove_var("GPSINFO_GAZETTEER");
        std::env::remove_var("GPSINFO_FIXES");
        std::fs::remove_dir_all(&dir).ok();

        let c = c.unwrap();
        assert_eq!(c.gazetteer.path, Some(PathBuf::from("/env/cities.json")));
        assert_eq!(c.source.path, Some(PathBuf::from("/env/track.jsonl")));

        assert_eq!(stdin.unwrap().source.path, None);
    }
}
