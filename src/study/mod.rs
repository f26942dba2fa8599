//! In-memory model of a single DICOM study.
//!
//! A [`Study`] is created from its Study Instance UID and then filled incrementally, usually by
//! whatever reads the instances of a job. Series are keyed by their own Series Instance UID.

mod series;

pub use series::{DicomSeries, Series};

use crate::types::{trim_padding, DA, LO, SH, TM, UI};
use dicom::core::Tag;
use dicom::dictionary_std::tags;
use dicom::object::InMemDicomObject;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::trace;

const SEPARATOR: &str = "---------------";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StudyError {
	#[error("Invalid argument: {reason}")]
	InvalidArgument { reason: String },

	#[error("Field `{field}` has not been set")]
	UninitializedField { field: &'static str },
}

#[derive(Debug, Clone, Serialize)]
pub struct Study<S = Series> {
	study_instance_uid: UI,
	study_id: Option<SH>,
	study_date: Option<DA>,
	study_time: Option<TM>,
	study_description: Option<LO>,
	accession_number: Option<SH>,
	/// Series in first-insertion order.
	series: Vec<S>,
	/// Maps a Series Instance UID to its position in `series`.
	#[serde(skip)]
	positions: HashMap<UI, usize>,
	metadata: BTreeMap<String, String>,
}

impl<S: DicomSeries> Study<S> {
	/// Creates an empty study.
	///
	/// # Errors
	/// Returns [`StudyError::InvalidArgument`] if the UID is empty or consists of padding only.
	pub fn new(study_instance_uid: impl Into<UI>) -> Result<Self, StudyError> {
		let study_instance_uid = study_instance_uid.into();
		if trim_padding(&study_instance_uid).is_empty() {
			return Err(StudyError::InvalidArgument {
				reason: String::from("Study Instance UID must not be empty"),
			});
		}

		Ok(Self {
			study_instance_uid,
			study_id: None,
			study_date: None,
			study_time: None,
			study_description: None,
			accession_number: None,
			series: Vec::new(),
			positions: HashMap::new(),
			metadata: BTreeMap::new(),
		})
	}

	/// Creates a study from the study-level attributes of an already parsed data set.
	/// Attributes missing from the data set stay unset.
	///
	/// # Errors
	/// Returns [`StudyError::InvalidArgument`] if the data set has no Study Instance UID.
	pub fn from_dicom(object: &InMemDicomObject) -> Result<Self, StudyError> {
		let uid = read_string(object, tags::STUDY_INSTANCE_UID).ok_or_else(|| {
			StudyError::InvalidArgument {
				reason: String::from("data set has no Study Instance UID"),
			}
		})?;

		let mut study = Self::new(uid)?;
		study.study_id = read_string(object, tags::STUDY_ID);
		study.study_date = read_string(object, tags::STUDY_DATE);
		study.study_time = read_string(object, tags::STUDY_TIME);
		study.study_description = read_string(object, tags::STUDY_DESCRIPTION);
		study.accession_number = read_string(object, tags::ACCESSION_NUMBER);
		Ok(study)
	}

	pub fn study_instance_uid(&self) -> &str {
		&self.study_instance_uid
	}

	/// Inserts a series under its own Series Instance UID.
	/// A series with a UID that is already present replaces the stored one and keeps its position.
	///
	/// # Errors
	/// Returns [`StudyError::InvalidArgument`] if the series reports an empty UID. The study is
	/// left unchanged in that case.
	pub fn add_series(&mut self, series: S) -> Result<(), StudyError> {
		let uid = series.series_instance_uid();
		if trim_padding(uid).is_empty() {
			return Err(StudyError::InvalidArgument {
				reason: String::from("Series Instance UID must not be empty"),
			});
		}

		if let Some(&position) = self.positions.get(uid) {
			trace!(series.uid = %uid, "Replacing series");
			self.series[position] = series;
		} else {
			self.positions.insert(uid.to_owned(), self.series.len());
			self.series.push(series);
		}
		Ok(())
	}

	/// Returns a snapshot of all series in insertion order.
	pub fn all_series(&self) -> Vec<S>
	where
		S: Clone,
	{
		self.series.clone()
	}

	pub fn series(&self) -> impl Iterator<Item = &S> {
		self.series.iter()
	}

	pub fn series_by_uid(&self, series_instance_uid: &str) -> Option<&S> {
		self.positions
			.get(series_instance_uid)
			.map(|&position| &self.series[position])
	}

	pub fn series_count(&self) -> usize {
		self.series.len()
	}

	pub fn study_id(&self) -> Option<&str> {
		self.study_id.as_deref()
	}

	pub fn set_study_id(&mut self, study_id: impl Into<SH>) {
		self.study_id = Some(study_id.into());
	}

	pub fn study_date(&self) -> Option<&str> {
		self.study_date.as_deref()
	}

	pub fn set_study_date(&mut self, study_date: impl Into<DA>) {
		self.study_date = Some(study_date.into());
	}

	pub fn study_time(&self) -> Option<&str> {
		self.study_time.as_deref()
	}

	pub fn set_study_time(&mut self, study_time: impl Into<TM>) {
		self.study_time = Some(study_time.into());
	}

	pub fn study_description(&self) -> Option<&str> {
		self.study_description.as_deref()
	}

	pub fn set_study_description(&mut self, study_description: impl Into<LO>) {
		self.study_description = Some(study_description.into());
	}

	pub fn accession_number(&self) -> Option<&str> {
		self.accession_number.as_deref()
	}

	pub fn set_accession_number(&mut self, accession_number: impl Into<SH>) {
		self.accession_number = Some(accession_number.into());
	}

	/// Free-form annotations attached by whoever processes the study.
	pub const fn metadata(&self) -> &BTreeMap<String, String> {
		&self.metadata
	}

	pub fn metadata_mut(&mut self) -> &mut BTreeMap<String, String> {
		&mut self.metadata
	}

	/// Checks that every scalar field has been set.
	///
	/// # Errors
	/// Returns [`StudyError::UninitializedField`] naming the first unset field.
	pub fn validate(&self) -> Result<(), StudyError> {
		self.labelled_fields().map(|_| ())
	}

	/// Renders the UID and all scalar fields, one per line, between separator lines.
	///
	/// # Errors
	/// Returns [`StudyError::UninitializedField`] if any scalar field has not been set.
	pub fn render(&self) -> Result<String, StudyError> {
		let fields = self.labelled_fields()?;

		let mut rendered = String::new();
		rendered.push_str(SEPARATOR);
		rendered.push('\n');
		for (label, value) in fields {
			rendered.push_str(label);
			rendered.push_str(": ");
			rendered.push_str(value);
			rendered.push('\n');
		}
		rendered.push_str(SEPARATOR);
		rendered.push('\n');
		Ok(rendered)
	}

	fn labelled_fields(&self) -> Result<[(&'static str, &str); 6], StudyError> {
		Ok([
			("Study Instance UID", self.study_instance_uid.as_str()),
			("Study ID", required("study_id", self.study_id.as_deref())?),
			("Study Date", required("study_date", self.study_date.as_deref())?),
			("Study Time", required("study_time", self.study_time.as_deref())?),
			(
				"Study Description",
				required("study_description", self.study_description.as_deref())?,
			),
			(
				"Accession Number",
				required("accession_number", self.accession_number.as_deref())?,
			),
		])
	}
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, StudyError> {
	value.ok_or(StudyError::UninitializedField { field })
}

/// Reads a string attribute without its padding. Present but empty attributes yield `Some("")`.
fn read_string(object: &InMemDicomObject, tag: Tag) -> Option<String> {
	let element = object.element(tag).ok()?;
	let value = element.to_str().ok()?;
	Some(trim_padding(&value).to_owned())
}

#[cfg(test)]
mod tests {
	use dicom::core::VR;

	use super::*;

	fn series(uid: &str, description: &str) -> Series {
		let mut series = Series::new(uid);
		series.series_description = Some(description.to_owned());
		series
	}

	fn populated_study() -> Study {
		let mut study = Study::new("1.2.840.113619.2.55").unwrap();
		study.set_study_id("4711");
		study.set_study_date("20240131");
		study.set_study_time("101500");
		study.set_study_description("CT CHEST W/O CONTRAST");
		study.set_accession_number("ACC0001");
		study
	}

	#[test]
	fn keeps_study_instance_uid() {
		for uid in ["1.2.3", "2.25.94508551356620097453554517680708411706", "1"] {
			let study: Study = Study::new(uid).unwrap();
			assert_eq!(study.study_instance_uid(), uid);
			assert_eq!(study.series_count(), 0);
			assert_eq!(study.study_id(), None);
		}
	}

	#[test]
	fn empty_uid_is_rejected() {
		assert!(matches!(
			Study::<Series>::new(""),
			Err(StudyError::InvalidArgument { .. })
		));
		assert!(matches!(
			Study::<Series>::new(" \0"),
			Err(StudyError::InvalidArgument { .. })
		));
	}

	#[test]
	fn series_keep_insertion_order() {
		let mut study = Study::new("1.2.3").unwrap();
		study.add_series(Series::new("S1")).unwrap();
		study.add_series(Series::new("S2")).unwrap();

		let uids: Vec<String> = study
			.all_series()
			.iter()
			.map(|series| series.series_instance_uid().to_owned())
			.collect();
		assert_eq!(uids, ["S1", "S2"]);
	}

	#[test]
	fn same_uid_replaces_series_in_place() {
		let mut study = Study::new("1.2.3").unwrap();
		study.add_series(series("S1", "first")).unwrap();
		study.add_series(series("S2", "second")).unwrap();
		study.add_series(series("S1", "replaced")).unwrap();

		let all = study.all_series();
		assert_eq!(all.len(), 2);
		assert_eq!(all[0].series_instance_uid(), "S1");
		assert_eq!(all[0].series_description.as_deref(), Some("replaced"));
		assert_eq!(all[1].series_description.as_deref(), Some("second"));
	}

	#[test]
	fn length_matches_distinct_uids() {
		let mut study = Study::new("1.2.3").unwrap();
		let inserts = ["A", "B", "A", "C", "B", "B", "D"];
		for (index, uid) in inserts.iter().enumerate() {
			study.add_series(series(uid, &index.to_string())).unwrap();
		}

		let all = study.all_series();
		assert_eq!(all.len(), 4);
		for uid in ["A", "B", "C", "D"] {
			let last = inserts.iter().rposition(|candidate| candidate == &uid).unwrap();
			let stored = study.series_by_uid(uid).unwrap();
			assert_eq!(stored.series_description, Some(last.to_string()));
		}
	}

	#[test]
	fn snapshot_is_independent_of_later_inserts() {
		let mut study = Study::new("1.2.3").unwrap();
		study.add_series(Series::new("S1")).unwrap();
		let snapshot = study.all_series();

		study.add_series(Series::new("S2")).unwrap();
		assert_eq!(snapshot.len(), 1);
		assert_eq!(study.series_count(), 2);
	}

	#[test]
	fn empty_series_uid_is_rejected() {
		let mut study = Study::new("1.2.3").unwrap();
		study.add_series(Series::new("S1")).unwrap();

		assert!(matches!(
			study.add_series(Series::new("")),
			Err(StudyError::InvalidArgument { .. })
		));
		assert_eq!(study.series_count(), 1);
	}

	#[test]
	fn render_requires_all_fields() {
		let mut study: Study = Study::new("1.2.3").unwrap();
		assert_eq!(
			study.render(),
			Err(StudyError::UninitializedField { field: "study_id" })
		);

		study.set_study_id("1");
		study.set_study_date("20240131");
		study.set_study_time("101500");
		study.set_study_description("HEAD");
		assert_eq!(
			study.validate(),
			Err(StudyError::UninitializedField {
				field: "accession_number"
			})
		);
	}

	#[test]
	fn render_lists_every_field_on_its_own_line() {
		let rendered = populated_study().render().unwrap();
		let lines: Vec<&str> = rendered.lines().collect();

		assert_eq!(
			lines,
			[
				"---------------",
				"Study Instance UID: 1.2.840.113619.2.55",
				"Study ID: 4711",
				"Study Date: 20240131",
				"Study Time: 101500",
				"Study Description: CT CHEST W/O CONTRAST",
				"Accession Number: ACC0001",
				"---------------",
			]
		);
		assert!(rendered.ends_with('\n'));
	}

	#[test]
	fn metadata_is_free_form() {
		let mut study = populated_study();
		study
			.metadata_mut()
			.insert(String::from("source"), String::from("job-42"));
		assert_eq!(
			study.metadata().get("source").map(String::as_str),
			Some("job-42")
		);
	}

	#[test]
	fn reads_study_attributes() {
		let mut object = InMemDicomObject::new_empty();
		object.put_str(tags::STUDY_INSTANCE_UID, VR::UI, "1.2.3\0");
		object.put_str(tags::STUDY_ID, VR::SH, "4711");
		object.put_str(tags::STUDY_DATE, VR::DA, "20240131");
		object.put_str(tags::STUDY_TIME, VR::TM, "101500");
		object.put_str(tags::STUDY_DESCRIPTION, VR::LO, "HEAD ");
		object.put_str(tags::ACCESSION_NUMBER, VR::SH, "");

		let study: Study = Study::from_dicom(&object).unwrap();
		assert_eq!(study.study_instance_uid(), "1.2.3");
		assert_eq!(study.study_description(), Some("HEAD"));
		assert_eq!(study.accession_number(), Some(""));
		assert!(study.render().unwrap().contains("Study Date: 20240131\n"));
	}

	#[test]
	fn data_set_without_study_uid_is_rejected() {
		let mut object = InMemDicomObject::new_empty();
		object.put_str(tags::STUDY_ID, VR::SH, "4711");

		assert!(matches!(
			Study::<Series>::from_dicom(&object),
			Err(StudyError::InvalidArgument { .. })
		));
	}
}
