use super::{read_string, StudyError};
use crate::types::{CS, IS, LO, UI};
use dicom::dictionary_std::tags;
use dicom::object::InMemDicomObject;
use serde::Serialize;

/// Anything that can be stored in a [`Study`](super::Study).
///
/// The study only needs the identifier to key its series collection; everything else about a
/// series belongs to the caller.
pub trait DicomSeries {
	fn series_instance_uid(&self) -> &str;
}

/// Minimal series representation with the attributes commonly needed to select series for
/// processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
	series_instance_uid: UI,
	pub modality: Option<CS>,
	pub series_number: Option<IS>,
	pub series_description: Option<LO>,
}

impl Series {
	pub fn new(series_instance_uid: impl Into<UI>) -> Self {
		Self {
			series_instance_uid: series_instance_uid.into(),
			modality: None,
			series_number: None,
			series_description: None,
		}
	}

	/// Reads the series-level attributes of an already parsed data set.
	///
	/// # Errors
	/// Returns [`StudyError::InvalidArgument`] if the data set has no Series Instance UID.
	pub fn from_dicom(object: &InMemDicomObject) -> Result<Self, StudyError> {
		let uid = read_string(object, tags::SERIES_INSTANCE_UID)
			.filter(|uid| !uid.is_empty())
			.ok_or_else(|| StudyError::InvalidArgument {
				reason: String::from("data set has no Series Instance UID"),
			})?;

		Ok(Self {
			series_instance_uid: uid,
			modality: read_string(object, tags::MODALITY),
			series_number: read_string(object, tags::SERIES_NUMBER)
				.and_then(|number| number.parse().ok()),
			series_description: read_string(object, tags::SERIES_DESCRIPTION),
		})
	}
}

impl DicomSeries for Series {
	fn series_instance_uid(&self) -> &str {
		&self.series_instance_uid
	}
}
