//! Rooms and the medical services offered in them.

use super::{matches_eq, matches_opt, matches_text, patch, ListFilter, Resource, SortValue};
use crate::api::validation::{FromQuery, QueryFields, Rules};
use crate::api::ApiError;
use crate::types::{Modality, RoomType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const fn enabled() -> bool {
	true
}

fn normalize_code(code: &str) -> String {
	code.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
	pub code: String,
	pub name: String,
	pub room_type: RoomType,
	pub floor: Option<i32>,
	pub description: Option<String>,
	pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRoom {
	pub code: String,
	pub name: String,
	pub room_type: RoomType,
	#[serde(default)]
	pub floor: Option<i32>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default = "enabled")]
	pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateRoom {
	pub name: Option<String>,
	pub room_type: Option<RoomType>,
	pub floor: Option<i32>,
	pub description: Option<String>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Default, PartialEq)]
pub struct RoomFilter {
	/// Matches the code or the name.
	pub search: Option<String>,
	pub room_type: Option<RoomType>,
	pub is_active: Option<bool>,
}

impl FromQuery for RoomFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			search: fields.text("search"),
			room_type: fields.enumeration("roomType"),
			is_active: fields.boolean("isActive"),
		}
	}
}

impl ListFilter<Room> for RoomFilter {
	fn matches(&self, room: &Room) -> bool {
		matches_text(self.search.as_deref(), [room.code.as_str(), room.name.as_str()])
			&& matches_eq(self.room_type.as_ref(), &room.room_type)
			&& matches_eq(self.is_active.as_ref(), &room.is_active)
	}
}

impl Resource for Room {
	const NAME: &'static str = "room";
	const SORT_FIELDS: &'static [&'static str] = &["code", "name", "floor"];

	type Create = CreateRoom;
	type Update = UpdateRoom;
	type Filter = RoomFilter;

	fn create(input: CreateRoom) -> Self {
		Self {
			code: normalize_code(&input.code),
			name: input.name,
			room_type: input.room_type,
			floor: input.floor,
			description: input.description,
			is_active: input.is_active,
		}
	}

	fn apply(&mut self, update: UpdateRoom) {
		patch!(self, update, [name, room_type, is_active], optional [floor, description]);
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.non_empty("code", &self.code)
			.max_len("code", &self.code, 20)
			.non_empty("name", &self.name)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"code" => SortValue::text(&self.code),
			"name" => SortValue::text(&self.name),
			"floor" => self.floor.map(i64::from).map(SortValue::Number).into(),
			_ => SortValue::None,
		}
	}

	fn unique_key(&self) -> Option<String> {
		Some(format!("room code {}", self.code))
	}
}

/// A billable examination or procedure, e.g. "CT Thorax with contrast".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalService {
	pub code: String,
	pub name: String,
	pub modality: Option<Modality>,
	pub room_id: Option<Uuid>,
	pub duration_minutes: Option<u32>,
	pub description: Option<String>,
	pub is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMedicalService {
	pub code: String,
	pub name: String,
	#[serde(default)]
	pub modality: Option<Modality>,
	#[serde(default)]
	pub room_id: Option<Uuid>,
	#[serde(default)]
	pub duration_minutes: Option<u32>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default = "enabled")]
	pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateMedicalService {
	pub name: Option<String>,
	pub modality: Option<Modality>,
	pub room_id: Option<Uuid>,
	pub duration_minutes: Option<u32>,
	pub description: Option<String>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Default, PartialEq)]
pub struct MedicalServiceFilter {
	pub search: Option<String>,
	pub room_id: Option<Uuid>,
	pub modality: Option<Modality>,
	pub is_active: Option<bool>,
}

impl FromQuery for MedicalServiceFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			search: fields.text("search"),
			room_id: fields.uuid("roomId"),
			modality: fields.enumeration("modality"),
			is_active: fields.boolean("isActive"),
		}
	}
}

impl ListFilter<MedicalService> for MedicalServiceFilter {
	fn matches(&self, service: &MedicalService) -> bool {
		matches_text(
			self.search.as_deref(),
			[service.code.as_str(), service.name.as_str()],
		) && matches_opt(self.room_id.as_ref(), service.room_id.as_ref())
			&& matches_opt(self.modality.as_ref(), service.modality.as_ref())
			&& matches_eq(self.is_active.as_ref(), &service.is_active)
	}
}

impl Resource for MedicalService {
	const NAME: &'static str = "service";
	const SORT_FIELDS: &'static [&'static str] = &["code", "name", "durationMinutes"];

	type Create = CreateMedicalService;
	type Update = UpdateMedicalService;
	type Filter = MedicalServiceFilter;

	fn create(input: CreateMedicalService) -> Self {
		Self {
			code: normalize_code(&input.code),
			name: input.name,
			modality: input.modality,
			room_id: input.room_id,
			duration_minutes: input.duration_minutes,
			description: input.description,
			is_active: input.is_active,
		}
	}

	fn apply(&mut self, update: UpdateMedicalService) {
		patch!(
			self,
			update,
			[name, is_active],
			optional [modality, room_id, duration_minutes, description]
		);
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.non_empty("code", &self.code)
			.max_len("code", &self.code, 20)
			.non_empty("name", &self.name)
			.check(
				self.duration_minutes != Some(0),
				"durationMinutes",
				"must be a positive integer",
			)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"code" => SortValue::text(&self.code),
			"name" => SortValue::text(&self.name),
			"durationMinutes" => self
				.duration_minutes
				.map(|minutes| SortValue::Number(i64::from(minutes)))
				.into(),
			_ => SortValue::None,
		}
	}

	fn unique_key(&self) -> Option<String> {
		Some(format!("service code {}", self.code))
	}
}
