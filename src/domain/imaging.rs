//! Imaging studies and the AI models that analyse them.

use super::{matches_eq, matches_opt, matches_text, patch, ListFilter, Resource, SortValue};
use crate::api::validation::{FromQuery, QueryFields, Range, Rules};
use crate::api::ApiError;
use crate::types::{AnalysisStatus, Modality, StudyStatus, Vocabulary};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a DICOM UI value.
const MAX_UID_LENGTH: usize = 64;

/// Checks the DICOM UID syntax: dot separated numeric components without leading zeros.
fn is_dicom_uid(value: &str) -> bool {
	value.len() <= MAX_UID_LENGTH
		&& value.split('.').all(|component| {
			!component.is_empty()
				&& component.bytes().all(|b| b.is_ascii_digit())
				&& (component == "0" || !component.starts_with('0'))
		})
}

/// An imaging study, linked to the DICOM archive through its Study Instance UID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
	pub study_instance_uid: String,
	pub accession_number: Option<String>,
	pub patient_id: Uuid,
	pub encounter_id: Option<Uuid>,
	pub modality: Modality,
	pub study_date: NaiveDate,
	pub description: Option<String>,
	pub status: StudyStatus,
	pub technician_id: Option<Uuid>,
	pub radiologist_id: Option<Uuid>,
	pub report: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateStudy {
	pub study_instance_uid: String,
	#[serde(default)]
	pub accession_number: Option<String>,
	pub patient_id: Uuid,
	#[serde(default)]
	pub encounter_id: Option<Uuid>,
	pub modality: Modality,
	pub study_date: NaiveDate,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub technician_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateStudy {
	pub accession_number: Option<String>,
	pub description: Option<String>,
	pub status: Option<StudyStatus>,
	pub technician_id: Option<Uuid>,
	pub radiologist_id: Option<Uuid>,
	pub report: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct StudyFilter {
	/// Matches the Study Instance UID, the accession number or the description.
	pub search: Option<String>,
	pub patient_id: Option<Uuid>,
	pub modality: Option<Modality>,
	pub status: Option<StudyStatus>,
	pub radiologist_id: Option<Uuid>,
	pub study_date: Range<NaiveDate>,
}

impl FromQuery for StudyFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			search: fields.text("search"),
			patient_id: fields.uuid("patientId"),
			modality: fields.enumeration("modality"),
			status: fields.enumeration("status"),
			radiologist_id: fields.uuid("radiologistId"),
			study_date: fields.date_range("studyDate"),
		}
	}
}

impl ListFilter<Study> for StudyFilter {
	fn matches(&self, study: &Study) -> bool {
		matches_text(
			self.search.as_deref(),
			[
				study.study_instance_uid.as_str(),
				study.accession_number.as_deref().unwrap_or_default(),
				study.description.as_deref().unwrap_or_default(),
			],
		) && matches_eq(self.patient_id.as_ref(), &study.patient_id)
			&& matches_eq(self.modality.as_ref(), &study.modality)
			&& matches_eq(self.status.as_ref(), &study.status)
			&& matches_opt(self.radiologist_id.as_ref(), study.radiologist_id.as_ref())
			&& self.study_date.contains(&study.study_date)
	}
}

impl Resource for Study {
	const NAME: &'static str = "study";
	const SORT_FIELDS: &'static [&'static str] = &["studyDate", "modality", "status"];

	type Create = CreateStudy;
	type Update = UpdateStudy;
	type Filter = StudyFilter;

	fn create(input: CreateStudy) -> Self {
		Self {
			study_instance_uid: input.study_instance_uid.trim().to_owned(),
			accession_number: input.accession_number,
			patient_id: input.patient_id,
			encounter_id: input.encounter_id,
			modality: input.modality,
			study_date: input.study_date,
			description: input.description,
			status: StudyStatus::Scheduled,
			technician_id: input.technician_id,
			radiologist_id: None,
			report: None,
		}
	}

	fn apply(&mut self, update: UpdateStudy) {
		patch!(
			self,
			update,
			[status],
			optional [accession_number, description, technician_id, radiologist_id, report]
		);
	}

	fn validate(&self) -> Result<(), ApiError> {
		let reported = matches!(self.status, StudyStatus::Reported | StudyStatus::Verified);
		Rules::default()
			.check(
				is_dicom_uid(&self.study_instance_uid),
				"studyInstanceUid",
				"must be a DICOM UID",
			)
			.check(
				!reported || self.radiologist_id.is_some(),
				"radiologistId",
				"must be set once the study is reported",
			)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"studyDate" => self.study_date.into(),
			"modality" => SortValue::text(self.modality.as_str()),
			"status" => SortValue::text(self.status.as_str()),
			_ => SortValue::None,
		}
	}

	fn unique_key(&self) -> Option<String> {
		Some(format!("studyInstanceUid {}", self.study_instance_uid))
	}
}

/// A deployable AI model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModel {
	pub name: String,
	pub version: String,
	pub modality: Modality,
	pub description: Option<String>,
	pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAiModel {
	pub name: String,
	pub version: String,
	pub modality: Modality,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default = "enabled")]
	pub is_active: bool,
}

const fn enabled() -> bool {
	true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateAiModel {
	pub description: Option<String>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Default, PartialEq)]
pub struct AiModelFilter {
	pub search: Option<String>,
	pub modality: Option<Modality>,
	pub is_active: Option<bool>,
}

impl FromQuery for AiModelFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			search: fields.text("search"),
			modality: fields.enumeration("modality"),
			is_active: fields.boolean("isActive"),
		}
	}
}

impl ListFilter<AiModel> for AiModelFilter {
	fn matches(&self, model: &AiModel) -> bool {
		matches_text(self.search.as_deref(), [model.name.as_str()])
			&& matches_eq(self.modality.as_ref(), &model.modality)
			&& matches_eq(self.is_active.as_ref(), &model.is_active)
	}
}

impl Resource for AiModel {
	const NAME: &'static str = "AI model";
	const SORT_FIELDS: &'static [&'static str] = &["name", "modality"];

	type Create = CreateAiModel;
	type Update = UpdateAiModel;
	type Filter = AiModelFilter;

	fn create(input: CreateAiModel) -> Self {
		Self {
			name: input.name,
			version: input.version,
			modality: input.modality,
			description: input.description,
			is_active: input.is_active,
		}
	}

	fn apply(&mut self, update: UpdateAiModel) {
		patch!(self, update, [is_active], optional [description]);
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.non_empty("name", &self.name)
			.non_empty("version", &self.version)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"name" => SortValue::text(&self.name),
			"modality" => SortValue::text(self.modality.as_str()),
			_ => SortValue::None,
		}
	}

	fn unique_key(&self) -> Option<String> {
		Some(format!("AI model {} {}", self.name, self.version))
	}
}

/// The result of running an AI model over a study.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
	pub study_id: Uuid,
	pub model_id: Uuid,
	pub status: AnalysisStatus,
	pub requested_by: Option<Uuid>,
	pub requested_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	/// Confidence of the findings in the range `0.0..=1.0`.
	pub confidence: Option<f64>,
	pub findings: Option<String>,
	pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAiAnalysis {
	pub study_id: Uuid,
	pub model_id: Uuid,
	#[serde(default)]
	pub requested_by: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateAiAnalysis {
	pub status: Option<AnalysisStatus>,
	pub confidence: Option<f64>,
	pub findings: Option<String>,
	pub error_message: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct AiAnalysisFilter {
	pub study_id: Option<Uuid>,
	pub model_id: Option<Uuid>,
	pub status: Option<AnalysisStatus>,
	pub requested: Range<DateTime<Utc>>,
}

impl FromQuery for AiAnalysisFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			study_id: fields.uuid("studyId"),
			model_id: fields.uuid("modelId"),
			status: fields.enumeration("status"),
			requested: fields.datetime_range("requested"),
		}
	}
}

impl ListFilter<AiAnalysis> for AiAnalysisFilter {
	fn matches(&self, analysis: &AiAnalysis) -> bool {
		matches_eq(self.study_id.as_ref(), &analysis.study_id)
			&& matches_eq(self.model_id.as_ref(), &analysis.model_id)
			&& matches_eq(self.status.as_ref(), &analysis.status)
			&& self.requested.contains(&analysis.requested_at)
	}
}

impl Resource for AiAnalysis {
	const NAME: &'static str = "AI analysis";
	const SORT_FIELDS: &'static [&'static str] = &["requestedAt", "status"];

	type Create = CreateAiAnalysis;
	type Update = UpdateAiAnalysis;
	type Filter = AiAnalysisFilter;

	fn create(input: CreateAiAnalysis) -> Self {
		Self {
			study_id: input.study_id,
			model_id: input.model_id,
			status: AnalysisStatus::Pending,
			requested_by: input.requested_by,
			requested_at: Utc::now(),
			completed_at: None,
			confidence: None,
			findings: None,
			error_message: None,
		}
	}

	fn apply(&mut self, update: UpdateAiAnalysis) {
		let status = update.status;
		patch!(self, update, [status], optional [confidence, findings, error_message]);

		if matches!(
			status,
			Some(AnalysisStatus::Completed | AnalysisStatus::Failed)
		) && self.completed_at.is_none()
		{
			self.completed_at = Some(Utc::now());
		}
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.check(
				self.confidence.is_none_or(|c| (0.0..=1.0).contains(&c)),
				"confidence",
				"must be between 0 and 1",
			)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"requestedAt" => self.requested_at.into(),
			"status" => SortValue::text(self.status.as_str()),
			_ => SortValue::None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn study(uid: &str) -> Study {
		Study::create(CreateStudy {
			study_instance_uid: uid.to_owned(),
			accession_number: Some(String::from("ACC-2024-0042")),
			patient_id: Uuid::new_v4(),
			encounter_id: None,
			modality: Modality::Ct,
			study_date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
			description: Some(String::from("CT Thorax")),
			technician_id: None,
		})
	}

	#[test]
	fn dicom_uid_syntax() {
		assert!(is_dicom_uid("1.2.840.10008.1.2"));
		assert!(is_dicom_uid("2.25.0"));
		assert!(!is_dicom_uid("1.2.03"));
		assert!(!is_dicom_uid("1..2"));
		assert!(!is_dicom_uid("1.2.abc"));
		assert!(!is_dicom_uid(&"1.".repeat(40)));
	}

	#[test]
	fn reported_study_needs_radiologist() {
		let mut study = study("1.2.3.4");
		assert!(study.validate().is_ok());

		study.apply(UpdateStudy {
			status: Some(StudyStatus::Reported),
			..UpdateStudy::default()
		});
		assert!(study.validate().is_err());

		study.apply(UpdateStudy {
			radiologist_id: Some(Uuid::new_v4()),
			..UpdateStudy::default()
		});
		assert!(study.validate().is_ok());
	}

	#[test]
	fn search_covers_accession_and_description() {
		let study = study("1.2.3.4");
		let by_accession = StudyFilter {
			search: Some(String::from("acc-2024")),
			..StudyFilter::default()
		};
		let by_description = StudyFilter {
			search: Some(String::from("thorax")),
			..StudyFilter::default()
		};
		let other_modality = StudyFilter {
			modality: Some(Modality::Mr),
			..StudyFilter::default()
		};

		assert!(by_accession.matches(&study));
		assert!(by_description.matches(&study));
		assert!(!other_modality.matches(&study));
	}

	#[test]
	fn analysis_completion() {
		let mut analysis = AiAnalysis::create(CreateAiAnalysis {
			study_id: Uuid::new_v4(),
			model_id: Uuid::new_v4(),
			requested_by: None,
		});
		assert_eq!(analysis.status, AnalysisStatus::Pending);

		analysis.apply(UpdateAiAnalysis {
			status: Some(AnalysisStatus::Completed),
			confidence: Some(0.93),
			findings: Some(String::from("No acute findings")),
			error_message: None,
		});
		assert!(analysis.completed_at.is_some());
		assert!(analysis.validate().is_ok());

		analysis.confidence = Some(1.5);
		assert!(analysis.validate().is_err());
	}

	#[test]
	fn model_defaults_to_active() {
		let input: CreateAiModel =
			serde_json::from_str(r#"{"name":"lung-nodule","version":"1.0","modality":"ct"}"#)
				.unwrap();

		assert!(AiModel::create(input).is_active);
	}
}
