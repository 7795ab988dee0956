use super::{matches_eq, matches_opt, patch, ListFilter, Resource, SortValue};
use crate::api::validation::{FromQuery, QueryFields, Range, Rules};
use crate::api::ApiError;
use crate::types::{ScheduleStatus, Vocabulary};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shift of a staff member, optionally bound to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
	pub user_id: Uuid,
	pub room_id: Option<Uuid>,
	pub work_date: NaiveDate,
	pub start_time: NaiveTime,
	pub end_time: NaiveTime,
	pub status: ScheduleStatus,
	pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSchedule {
	pub user_id: Uuid,
	#[serde(default)]
	pub room_id: Option<Uuid>,
	pub work_date: NaiveDate,
	pub start_time: NaiveTime,
	pub end_time: NaiveTime,
	#[serde(default)]
	pub status: Option<ScheduleStatus>,
	#[serde(default)]
	pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateSchedule {
	pub room_id: Option<Uuid>,
	pub work_date: Option<NaiveDate>,
	pub start_time: Option<NaiveTime>,
	pub end_time: Option<NaiveTime>,
	pub status: Option<ScheduleStatus>,
	pub notes: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ScheduleFilter {
	pub user_id: Option<Uuid>,
	pub room_id: Option<Uuid>,
	pub status: Option<ScheduleStatus>,
	pub work_date: Range<NaiveDate>,
}

impl FromQuery for ScheduleFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			user_id: fields.uuid("userId"),
			room_id: fields.uuid("roomId"),
			status: fields.enumeration("status"),
			work_date: fields.date_range("workDate"),
		}
	}
}

impl ListFilter<Schedule> for ScheduleFilter {
	fn matches(&self, schedule: &Schedule) -> bool {
		matches_eq(self.user_id.as_ref(), &schedule.user_id)
			&& matches_opt(self.room_id.as_ref(), schedule.room_id.as_ref())
			&& matches_eq(self.status.as_ref(), &schedule.status)
			&& self.work_date.contains(&schedule.work_date)
	}
}

impl Resource for Schedule {
	const NAME: &'static str = "schedule";
	const SORT_FIELDS: &'static [&'static str] = &["workDate", "startTime", "status"];

	type Create = CreateSchedule;
	type Update = UpdateSchedule;
	type Filter = ScheduleFilter;

	fn create(input: CreateSchedule) -> Self {
		Self {
			user_id: input.user_id,
			room_id: input.room_id,
			work_date: input.work_date,
			start_time: input.start_time,
			end_time: input.end_time,
			status: input.status.unwrap_or(ScheduleStatus::Scheduled),
			notes: input.notes,
		}
	}

	fn apply(&mut self, update: UpdateSchedule) {
		patch!(self, update, [work_date, start_time, end_time, status], optional [room_id, notes]);
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.check(
				self.start_time < self.end_time,
				"endTime",
				"must be after startTime",
			)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"workDate" => self.work_date.into(),
			"startTime" => SortValue::TimeOfDay(self.start_time),
			"status" => SortValue::text(self.status.as_str()),
			_ => SortValue::None,
		}
	}

	/// A staff member cannot start two shifts at the same time.
	fn unique_key(&self) -> Option<String> {
		Some(format!(
			"schedule of user {} on {} at {}",
			self.user_id, self.work_date, self.start_time
		))
	}
}
