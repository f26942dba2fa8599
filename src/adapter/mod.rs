//! Adapter between the host job framework and an externally provided inference application.
//!
//! The adapter is configured from the environment, resolves the configured application in an
//! [`AppRegistry`] and forwards one `run` call per job. It does not look into what the
//! application does; failures are handed back to the host unchanged.

mod job;
mod registry;

pub use job::{AiJob, JobHost, ResultStatus, ResultUploader};
pub use registry::{AppReference, AppRegistry};

use crate::config::{AdapterConfig, ConfigurationError};
use crate::study::Series;
use dicom::object::InMemDicomObject;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, Level};

/// Arguments of a single inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest<'a> {
	pub input: &'a Path,
	pub output: &'a Path,
	pub model: &'a Path,
	pub workdir: &'a Path,
	pub log_level: Level,
}

/// An inference application provided by the embedding application.
pub trait InferenceApp: Send {
	/// Human-readable description of the application, logged before each run.
	fn package_info(&self) -> String {
		std::any::type_name::<Self>().to_owned()
	}

	/// Runs the application on the input folder and writes results to the output folder.
	/// Reports and presentation states meant for the host go through `uploader`.
	///
	/// # Errors
	/// Any error is passed through to the host job framework.
	fn run(
		&mut self,
		request: &RunRequest<'_>,
		uploader: &mut dyn ResultUploader,
	) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum AdapterError {
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	#[error(transparent)]
	App(anyhow::Error),
}

/// What the host job framework calls for each job.
pub trait JobProcessor {
	/// Decides whether an incoming image is part of the job input.
	fn filter_image(&self, _image: &InMemDicomObject) -> bool {
		true
	}

	/// Picks the series the job is run on.
	fn select_series(&self, series: Vec<Series>) -> Vec<Series> {
		series
	}

	/// Processes the job and reports its terminal status to the host.
	///
	/// # Errors
	/// Fails if the application cannot be created or its run fails.
	fn process_study(&mut self, job: &AiJob, host: &mut dyn JobHost) -> Result<(), AdapterError>;
}

pub struct ProcessingAdapter {
	config: AdapterConfig,
	registry: Arc<AppRegistry>,
	reference: AppReference,
	log_level: Level,
	input_path: Option<PathBuf>,
	output_path: Option<PathBuf>,
	/// Created on the first job and reused afterwards.
	app: Option<Box<dyn InferenceApp>>,
}

impl ProcessingAdapter {
	/// Validates the configuration against the file system and the registry.
	///
	/// # Errors
	/// Returns [`ConfigurationError`] if the model file does not exist, the application reference
	/// is empty, malformed or unknown, or the log level is invalid.
	pub fn initialize(
		config: AdapterConfig,
		registry: Arc<AppRegistry>,
	) -> Result<Self, ConfigurationError> {
		if !config.model_path.exists() {
			return Err(ConfigurationError::ModelNotFound {
				path: config.model_path,
			});
		}
		info!(model.path = %config.model_path.display(), "Model path");

		let reference = registry.resolve(&config.app_reference)?;
		let log_level = config.log_level()?;

		info!(
			partner = %config.partner_name,
			service.name = %config.service_name,
			service.version = %config.service_version,
			app = %reference,
			"Initialized processing adapter"
		);

		Ok(Self {
			config,
			registry,
			reference,
			log_level,
			input_path: None,
			output_path: None,
			app: None,
		})
	}

	pub const fn config(&self) -> &AdapterConfig {
		&self.config
	}

	pub const fn reference(&self) -> &AppReference {
		&self.reference
	}

	/// Overrides the input folder. Jobs then no longer supply it.
	pub fn set_input_path(&mut self, path: impl Into<PathBuf>) {
		self.input_path = Some(path.into());
	}

	/// Overrides the output folder. Jobs then no longer supply it.
	pub fn set_output_path(&mut self, path: impl Into<PathBuf>) {
		self.output_path = Some(path.into());
	}
}

impl JobProcessor for ProcessingAdapter {
	fn process_study(&mut self, job: &AiJob, host: &mut dyn JobHost) -> Result<(), AdapterError> {
		info!("Starting processing");
		info!(count = job.prior_studies.len(), "Prior studies in job");

		let input = resolve_path(&mut self.input_path, &job.image_folder, "Input path");
		let output = resolve_path(&mut self.output_path, &job.output_folder, "Output path");

		info!(app = %self.reference, "Running inference application");
		let app = match self.app.take() {
			Some(app) => app,
			None => self.registry.instantiate(&self.reference)?,
		};
		let app = self.app.insert(app);

		info!(app.info = %app.package_info(), "Inference application info");
		info!(workdir = %job.folder.display(), "Working directory");

		let request = RunRequest {
			input: &input,
			output: &output,
			model: &self.config.model_path,
			workdir: &job.folder,
			log_level: self.log_level,
		};
		let reference = &self.reference;
		app.run(&request, &mut HostUploads(&mut *host)).map_err(|error| {
			AdapterError::App(error.context(format!("Inference application `{reference}` failed")))
		})?;

		info!("Inference application complete");
		host.set_transaction_status(ResultStatus::AnalysisComplete);
		Ok(())
	}
}

/// Forwards uploads of the running application to the host.
struct HostUploads<'a, H: ?Sized>(&'a mut H);

impl<H: JobHost + ?Sized> ResultUploader for HostUploads<'_, H> {
	fn upload_document(&mut self, document: &Path) -> anyhow::Result<()> {
		info!(document = %document.display(), "Uploading result document");
		self.0.upload_document(document)
	}

	fn upload_gsps(&mut self, gsps: &InMemDicomObject) -> anyhow::Result<()> {
		info!("Uploading GSPS object");
		self.0.upload_gsps(gsps)
	}
}

fn resolve_path(slot: &mut Option<PathBuf>, fallback: &Path, label: &str) -> PathBuf {
	slot.get_or_insert_with(|| {
		info!(path = %fallback.display(), "{label}");
		fallback.to_path_buf()
	})
	.clone()
}
