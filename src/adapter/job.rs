use crate::types::UI;
use dicom::object::InMemDicomObject;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// A job handed to the adapter by the host job framework.
#[derive(Debug, Clone, Deserialize)]
pub struct AiJob {
	/// Folder containing the input images of the job.
	pub image_folder: PathBuf,
	/// Folder the inference application writes its results to.
	pub output_folder: PathBuf,
	/// Working directory of the job.
	pub folder: PathBuf,
	/// Study Instance UIDs of prior studies supplied with the job.
	#[serde(default)]
	pub prior_studies: Vec<UI>,
}

/// Terminal status reported back to the host job framework.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultStatus {
	AnalysisComplete,
}

impl Display for ResultStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::AnalysisComplete => write!(f, "ANALYSIS_COMPLETE"),
		}
	}
}

/// Channels through which an inference application hands its results to the host.
pub trait ResultUploader {
	/// Uploads a result document, e.g. a PDF report or an encapsulated DICOM document.
	///
	/// # Errors
	/// Fails if the host rejects the document.
	fn upload_document(&mut self, document: &Path) -> anyhow::Result<()>;

	/// Uploads a Grayscale Softcopy Presentation State referencing the job input.
	///
	/// # Errors
	/// Fails if the host rejects the object.
	fn upload_gsps(&mut self, gsps: &InMemDicomObject) -> anyhow::Result<()>;
}

/// The side of the host job framework the adapter talks to while processing a job.
pub trait JobHost: ResultUploader {
	fn set_transaction_status(&mut self, status: ResultStatus);
}
