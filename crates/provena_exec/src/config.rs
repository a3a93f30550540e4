//! Configuration for dispatch backends.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from provena.toml)
//! - User overrides (~/.config/provena/provena.toml, then ./provena.toml)
//! - Automatic merging with user values taking precedence

use config::{Config, File, FileFormat};
use provena_error::{ConfigError, ProvenaError, ProvenaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../provena.toml");

/// What waiting on a failed batch job yields.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatchFailurePolicy {
    /// Log the failure and yield no value
    #[default]
    Discard,
    /// Re-raise the failure, as the threaded backend does
    Propagate,
}

/// Remote batch scheduler settings.
///
/// # Example
///
/// ```toml
/// [batch]
/// submit_command = ["bash", "-c", "cd '{cwd}' && {command}"]
/// on_failure = "propagate"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct BatchConfig {
    /// Submission argument vector; `{cwd}` and `{command}` are substituted
    submit_command: Vec<String>,
    /// Failure policy for batch jobs
    on_failure: BatchFailurePolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            submit_command: [
                "bsub", "-cwd", "{cwd}", "-o", "/dev/null", "-e", "/dev/null", "-K", "-r",
                "{command}",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            on_failure: BatchFailurePolicy::default(),
        }
    }
}

impl BatchConfig {
    /// Replace the submission command.
    pub fn with_submit_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.submit_command = command.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the failure policy.
    pub fn with_on_failure(mut self, policy: BatchFailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}

/// Execution and dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct ExecConfig {
    /// Milliseconds between checks for batch output files
    poll_interval_ms: u64,
    /// Upper bound on waiting for batch output files; unset waits indefinitely
    poll_timeout_secs: Option<u64>,
    /// Batch scheduler settings
    batch: BatchConfig,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            poll_timeout_secs: None,
            batch: BatchConfig::default(),
        }
    }
}

impl ExecConfig {
    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use provena_exec::ExecConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ExecConfig::load()?;
    /// println!("polling every {:?}", config.poll_interval());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> ProvenaResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/provena/provena.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("provena").required(false));

        Self::build(builder)
    }

    /// Load configuration from a single TOML file layered over the bundled defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ProvenaResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml));

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ProvenaResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| {
                ProvenaError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ProvenaError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Check the values make sense together.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the poll interval is zero or the submission
    /// command is empty or has no `{command}` placeholder.
    pub fn validate(&self) -> ProvenaResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::new("poll_interval_ms must be greater than zero").into());
        }
        if self.batch.submit_command.is_empty() {
            return Err(ConfigError::new("batch.submit_command must not be empty").into());
        }
        if !self
            .batch
            .submit_command
            .iter()
            .any(|arg| arg.contains("{command}"))
        {
            return Err(
                ConfigError::new("batch.submit_command must contain a {command} placeholder")
                    .into(),
            );
        }
        Ok(())
    }

    /// Replace the poll interval.
    pub fn with_poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    /// Replace the poll timeout.
    pub fn with_poll_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    /// Replace the batch settings.
    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Sleep between checks for batch output files.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Bound on waiting for batch output files, if any.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }
}
