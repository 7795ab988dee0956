use super::{matches_eq, matches_opt, matches_text, patch, ListFilter, Resource, SortValue};
use crate::api::validation::{FromQuery, QueryFields, Range, Rules};
use crate::api::ApiError;
use crate::types::{EncounterType, Gender};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
	/// Hospital internal patient number.
	pub patient_code: String,
	pub full_name: String,
	pub date_of_birth: NaiveDate,
	pub gender: Gender,
	pub phone: Option<String>,
	pub address: Option<String>,
	pub insurance_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePatient {
	pub patient_code: String,
	pub full_name: String,
	pub date_of_birth: NaiveDate,
	pub gender: Gender,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub insurance_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdatePatient {
	pub full_name: Option<String>,
	pub date_of_birth: Option<NaiveDate>,
	pub gender: Option<Gender>,
	pub phone: Option<String>,
	pub address: Option<String>,
	pub insurance_number: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct PatientFilter {
	/// Matches the patient code or the name.
	pub search: Option<String>,
	pub gender: Option<Gender>,
	pub born: Range<NaiveDate>,
}

impl FromQuery for PatientFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			search: fields.text("search"),
			gender: fields.enumeration("gender"),
			born: fields.date_range("born"),
		}
	}
}

impl ListFilter<Patient> for PatientFilter {
	fn matches(&self, patient: &Patient) -> bool {
		matches_text(
			self.search.as_deref(),
			[patient.patient_code.as_str(), patient.full_name.as_str()],
		) && matches_eq(self.gender.as_ref(), &patient.gender)
			&& self.born.contains(&patient.date_of_birth)
	}
}

impl Resource for Patient {
	const NAME: &'static str = "patient";
	const SORT_FIELDS: &'static [&'static str] = &["patientCode", "fullName", "dateOfBirth"];

	type Create = CreatePatient;
	type Update = UpdatePatient;
	type Filter = PatientFilter;

	fn create(input: CreatePatient) -> Self {
		Self {
			patient_code: input.patient_code.trim().to_owned(),
			full_name: input.full_name,
			date_of_birth: input.date_of_birth,
			gender: input.gender,
			phone: input.phone,
			address: input.address,
			insurance_number: input.insurance_number,
		}
	}

	fn apply(&mut self, update: UpdatePatient) {
		patch!(self, update, [full_name, date_of_birth, gender], optional [phone, address, insurance_number]);
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.non_empty("patientCode", &self.patient_code)
			.max_len("patientCode", &self.patient_code, 32)
			.non_empty("fullName", &self.full_name)
			.max_len("fullName", &self.full_name, 200)
			.check(
				self.date_of_birth <= Utc::now().date_naive(),
				"dateOfBirth",
				"must not be in the future",
			)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"patientCode" => SortValue::text(&self.patient_code),
			"fullName" => SortValue::text(&self.full_name),
			"dateOfBirth" => self.date_of_birth.into(),
			_ => SortValue::None,
		}
	}

	fn unique_key(&self) -> Option<String> {
		Some(format!("patientCode {}", self.patient_code))
	}
}

/// A visit of a patient, the unit orders and studies are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
	pub patient_id: Uuid,
	pub physician_id: Option<Uuid>,
	pub encounter_type: EncounterType,
	pub encounter_date: DateTime<Utc>,
	pub chief_complaint: Option<String>,
	pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateEncounter {
	pub patient_id: Uuid,
	#[serde(default)]
	pub physician_id: Option<Uuid>,
	pub encounter_type: EncounterType,
	#[serde(default)]
	pub encounter_date: Option<DateTime<Utc>>,
	#[serde(default)]
	pub chief_complaint: Option<String>,
	#[serde(default)]
	pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateEncounter {
	pub physician_id: Option<Uuid>,
	pub encounter_type: Option<EncounterType>,
	pub encounter_date: Option<DateTime<Utc>>,
	pub chief_complaint: Option<String>,
	pub notes: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct EncounterFilter {
	pub patient_id: Option<Uuid>,
	pub physician_id: Option<Uuid>,
	pub encounter_type: Option<EncounterType>,
	pub encounter: Range<DateTime<Utc>>,
}

impl FromQuery for EncounterFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			patient_id: fields.uuid("patientId"),
			physician_id: fields.uuid("physicianId"),
			encounter_type: fields.enumeration("encounterType"),
			encounter: fields.datetime_range("encounter"),
		}
	}
}

impl ListFilter<Encounter> for EncounterFilter {
	fn matches(&self, encounter: &Encounter) -> bool {
		matches_eq(self.patient_id.as_ref(), &encounter.patient_id)
			&& matches_opt(self.physician_id.as_ref(), encounter.physician_id.as_ref())
			&& matches_eq(self.encounter_type.as_ref(), &encounter.encounter_type)
			&& self.encounter.contains(&encounter.encounter_date)
	}
}

impl Resource for Encounter {
	const NAME: &'static str = "encounter";
	const SORT_FIELDS: &'static [&'static str] = &["encounterDate"];

	type Create = CreateEncounter;
	type Update = UpdateEncounter;
	type Filter = EncounterFilter;

	fn create(input: CreateEncounter) -> Self {
		Self {
			patient_id: input.patient_id,
			physician_id: input.physician_id,
			encounter_type: input.encounter_type,
			encounter_date: input.encounter_date.unwrap_or_else(Utc::now),
			chief_complaint: input.chief_complaint,
			notes: input.notes,
		}
	}

	fn apply(&mut self, update: UpdateEncounter) {
		patch!(self, update, [encounter_type, encounter_date], optional [physician_id, chief_complaint, notes]);
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"encounterDate" => self.encounter_date.into(),
			_ => SortValue::None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::validation::RawQuery;

	fn patient() -> Patient {
		Patient::create(CreatePatient {
			patient_code: String::from(" P-0001 "),
			full_name: String::from("Jane Doe"),
			date_of_birth: NaiveDate::from_ymd_opt(1980, 4, 12).unwrap(),
			gender: Gender::Female,
			phone: None,
			address: None,
			insurance_number: Some(String::from("INS-77")),
		})
	}

	fn filter(pairs: &[(&str, &str)]) -> Result<PatientFilter, ApiError> {
		let raw: RawQuery = pairs
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect();
		let mut fields = QueryFields::new(&raw);
		let filter = PatientFilter::from_query(&mut fields);
		fields.finish().map(|()| filter)
	}

	#[test]
	fn create_trims_code() {
		assert_eq!(patient().patient_code, "P-0001");
		assert!(patient().validate().is_ok());
	}

	#[test]
	fn partial_update_only_touches_supplied_fields() {
		let mut patient = patient();
		patient.apply(UpdatePatient {
			phone: Some(String::from("+49 201 723")),
			..UpdatePatient::default()
		});

		assert_eq!(patient.full_name, "Jane Doe");
		assert_eq!(patient.phone.as_deref(), Some("+49 201 723"));
		assert_eq!(patient.insurance_number.as_deref(), Some("INS-77"));
	}

	#[test]
	fn reject_blank_name() {
		let mut patient = patient();
		patient.full_name = String::from(" ");

		let Err(ApiError::Validation(errors)) = patient.validate() else {
			panic!("expected validation failure");
		};
		assert_eq!(errors[0].field, "fullName");
	}

	#[test]
	fn reject_unknown_gender_in_body() {
		let err = serde_json::from_str::<CreatePatient>(
			r#"{"patientCode":"P-1","fullName":"A","dateOfBirth":"1990-01-01","gender":"unknown"}"#,
		)
		.unwrap_err();

		assert!(err.to_string().contains("must be one of: male, female, other"));
	}

	#[test]
	fn filter_by_search_and_birth_date() {
		let patient = patient();

		assert!(filter(&[]).unwrap().matches(&patient));
		assert!(filter(&[("search", "DOE")]).unwrap().matches(&patient));
		assert!(filter(&[("search", "p-0001")]).unwrap().matches(&patient));
		assert!(!filter(&[("search", "roe")]).unwrap().matches(&patient));
		assert!(filter(&[("bornFrom", "1980-04-12"), ("bornTo", "1980-04-12")])
			.unwrap()
			.matches(&patient));
		assert!(!filter(&[("gender", "male")]).unwrap().matches(&patient));
	}

	#[test]
	fn encounter_filter_requires_physician_when_requested() {
		let encounter = Encounter::create(CreateEncounter {
			patient_id: Uuid::new_v4(),
			physician_id: None,
			encounter_type: EncounterType::Outpatient,
			encounter_date: None,
			chief_complaint: None,
			notes: None,
		});
		let filter = EncounterFilter {
			physician_id: Some(Uuid::new_v4()),
			..EncounterFilter::default()
		};

		assert!(EncounterFilter::default().matches(&encounter));
		assert!(!filter.matches(&encounter));
	}
}
