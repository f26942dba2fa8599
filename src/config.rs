use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

/// Location of the model artifact when `AI_MODEL_PATH` is not set.
pub const DEFAULT_MODEL_PATH: &str = "/app/model/model.ts";

/// Configuration of the processing adapter.
///
/// Values are read from the process environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
	#[serde(rename = "ai_partner_name")]
	pub partner_name: String,
	#[serde(rename = "ai_svc_name")]
	pub service_name: String,
	#[serde(rename = "ai_svc_version")]
	pub service_version: String,
	/// Reference to the inference application in the form `module.path.ClassName`.
	#[serde(rename = "monai_app_classpath")]
	pub app_reference: String,
	#[serde(rename = "ai_model_path")]
	pub model_path: PathBuf,
	// Verbosity handed to the inference application. RUST_LOG still controls our own logs.
	#[serde(rename = "ai_log_level")]
	pub log_level: String,
}

impl AdapterConfig {
	/// Loads the configuration from the process environment.
	///
	/// # Errors
	/// Fails if a required variable is missing.
	pub fn new() -> Result<Self, ConfigurationError> {
		Self::load(None)
	}

	/// Loads the configuration from an explicit set of variables instead of the process
	/// environment. Keys use the same names as the environment variables.
	///
	/// # Errors
	/// Fails if a required variable is missing.
	pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigurationError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let vars = vars
			.into_iter()
			.map(|(key, value)| (key.into(), value.into()))
			.collect();
		Self::load(Some(vars))
	}

	fn load(vars: Option<config::Map<String, String>>) -> Result<Self, ConfigurationError> {
		use config::Config;

		let config = Config::builder()
			.set_default("monai_app_classpath", "")?
			.set_default("ai_model_path", DEFAULT_MODEL_PATH)?
			.set_default("ai_log_level", "info")?
			.add_source(config::Environment::default().source(vars))
			.build()?;

		Ok(config.try_deserialize()?)
	}

	/// Parses the configured log level.
	///
	/// # Errors
	/// Returns [`ConfigurationError::InvalidLogLevel`] for anything `tracing` does not know.
	pub fn log_level(&self) -> Result<Level, ConfigurationError> {
		Level::from_str(&self.log_level).map_err(|_| ConfigurationError::InvalidLogLevel {
			level: self.log_level.clone(),
		})
	}
}

/// Errors that prevent the adapter from being initialized.
#[derive(Debug, Error)]
pub enum ConfigurationError {
	#[error("Failed to load configuration: {0}")]
	Load(#[from] config::ConfigError),

	#[error("Could not find model file in path `{path}`")]
	ModelNotFound { path: PathBuf },

	#[error("The inference application to run has not been specified in `MONAI_APP_CLASSPATH`")]
	MissingAppReference,

	#[error("Invalid application reference `{reference}`: expected `module.ClassName`")]
	InvalidAppReference { reference: String },

	#[error("The application `{reference}` was not found")]
	UnresolvedApp { reference: String },

	#[error("Unknown log level `{level}`")]
	InvalidLogLevel { level: String },
}
