use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory under the user's config dir holding `config.toml`.
const CONFIG_DIR_NAME: &str = "webp-batch";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Main configuration structure loaded from config files
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub general: Option<GeneralConfig>,
    pub output: Option<OutputConfig>,
    pub profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Configuration profile for predefined settings
#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    pub description: Option<String>,
    pub short_edge_size: Option<i32>,
}

/// General configuration options
#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub input_dir: Option<String>,
    pub short_edge_size: Option<i32>,
}

/// Output and reporting configuration
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub verbose: Option<bool>,
    pub quiet: Option<bool>,
    pub generate_report: Option<bool>,
    pub report_path: Option<String>,
}

impl Config {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// `<config_dir>/webp-batch/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config at the default location, or an empty config if there is none
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Look up a named profile
    pub fn profile(&self, name: &str) -> Result<&ProfileConfig> {
        self.profiles
            .as_ref()
            .and_then(|profiles| profiles.get(name))
            .with_context(|| format!("Unknown profile: {name}"))
    }
}

/// Conversion options that can be passed to the core library
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub input_dir: PathBuf,
    /// Target length of the shorter image side; zero or less keeps the original size
    pub short_edge_size: i32,
    pub verbose: bool,
    pub quiet: bool,
    pub generate_report: bool,
    pub report_path: PathBuf,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            short_edge_size: 0,
            verbose: false,
            quiet: false,
            generate_report: false,
            report_path: PathBuf::from("webp_batch_report.json"),
        }
    }
}

impl ConversionOptions {
    /// Create new conversion options with sensible defaults
    pub fn new(input_dir: PathBuf) -> Self {
        Self {
            input_dir,
            ..Default::default()
        }
    }

    /// Builder pattern for setting the short edge target
    pub fn with_short_edge_size(mut self, short_edge_size: i32) -> Self {
        self.short_edge_size = short_edge_size;
        self
    }

    /// Builder pattern for setting verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder pattern for setting quiet output
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Builder pattern for enabling the JSON report
    pub fn with_report(mut self, generate_report: bool) -> Self {
        self.generate_report = generate_report;
        self
    }

    /// Builder pattern for setting the report location
    pub fn with_report_path(mut self, report_path: PathBuf) -> Self {
        self.report_path = report_path;
        self
    }

    /// Overlay values present in a config file
    pub fn apply_config(mut self, config: &Config) -> Self {
        if let Some(general) = &config.general {
            if let Some(input_dir) = &general.input_dir {
                self.input_dir = PathBuf::from(input_dir);
            }
            if let Some(size) = general.short_edge_size {
                self.short_edge_size = size;
            }
        }

        if let Some(output) = &config.output {
            if let Some(verbose) = output.verbose {
                self.verbose = verbose;
            }
            if let Some(quiet) = output.quiet {
                self.quiet = quiet;
            }
            if let Some(generate_report) = output.generate_report {
                self.generate_report = generate_report;
            }
            if let Some(report_path) = &output.report_path {
                self.report_path = PathBuf::from(report_path);
            }
        }

        self
    }

    /// Overlay values from a profile
    pub fn apply_profile(mut self, profile: &ProfileConfig) -> Self {
        if let Some(size) = profile.short_edge_size {
            self.short_edge_size = size;
        }
        self
    }

    pub fn resizes(&self) -> bool {
        self.short_edge_size > 0
    }
}
