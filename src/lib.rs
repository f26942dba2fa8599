//! A DICOM study model and an adapter that runs an inference application once per job of a host
//! job framework.

pub mod adapter;
pub mod config;
pub mod study;
pub mod telemetry;
pub mod types;

pub use adapter::{
	AdapterError, AiJob, AppReference, AppRegistry, InferenceApp, JobHost, JobProcessor,
	ProcessingAdapter, ResultStatus, ResultUploader, RunRequest,
};
pub use config::{AdapterConfig, ConfigurationError};
pub use study::{DicomSeries, Series, Study, StudyError};
