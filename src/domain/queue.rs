use super::{matches_eq, matches_opt, patch, ListFilter, Resource, SortValue};
use crate::api::validation::{FromQuery, QueryFields, Range, Rules};
use crate::api::ApiError;
use crate::types::{PriorityLevel, QueueStatus, Vocabulary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a patient in the waiting queue of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueAssignment {
	pub patient_id: Uuid,
	pub encounter_id: Option<Uuid>,
	pub room_id: Uuid,
	pub service_id: Option<Uuid>,
	pub queue_number: u32,
	pub status: QueueStatus,
	pub priority: PriorityLevel,
	pub assigned_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateQueueAssignment {
	pub patient_id: Uuid,
	#[serde(default)]
	pub encounter_id: Option<Uuid>,
	pub room_id: Uuid,
	#[serde(default)]
	pub service_id: Option<Uuid>,
	pub queue_number: u32,
	#[serde(default)]
	pub priority: Option<PriorityLevel>,
	#[serde(default)]
	pub assigned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateQueueAssignment {
	pub room_id: Option<Uuid>,
	pub service_id: Option<Uuid>,
	pub queue_number: Option<u32>,
	pub status: Option<QueueStatus>,
	pub priority: Option<PriorityLevel>,
}

#[derive(Debug, Default, PartialEq)]
pub struct QueueAssignmentFilter {
	pub status: Option<QueueStatus>,
	pub priority: Option<PriorityLevel>,
	pub room_id: Option<Uuid>,
	pub patient_id: Option<Uuid>,
	pub encounter_id: Option<Uuid>,
	pub assigned: Range<DateTime<Utc>>,
}

impl FromQuery for QueueAssignmentFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			status: fields.enumeration("status"),
			priority: fields.enumeration("priority"),
			room_id: fields.uuid("roomId"),
			patient_id: fields.uuid("patientId"),
			encounter_id: fields.uuid("encounterId"),
			assigned: fields.datetime_range("assigned"),
		}
	}
}

impl ListFilter<QueueAssignment> for QueueAssignmentFilter {
	fn matches(&self, assignment: &QueueAssignment) -> bool {
		matches_eq(self.status.as_ref(), &assignment.status)
			&& matches_eq(self.priority.as_ref(), &assignment.priority)
			&& matches_eq(self.room_id.as_ref(), &assignment.room_id)
			&& matches_eq(self.patient_id.as_ref(), &assignment.patient_id)
			&& matches_opt(self.encounter_id.as_ref(), assignment.encounter_id.as_ref())
			&& self.assigned.contains(&assignment.assigned_at)
	}
}

impl Resource for QueueAssignment {
	const NAME: &'static str = "queue assignment";
	const SORT_FIELDS: &'static [&'static str] =
		&["queueNumber", "priority", "status", "assignedAt"];

	type Create = CreateQueueAssignment;
	type Update = UpdateQueueAssignment;
	type Filter = QueueAssignmentFilter;

	fn create(input: CreateQueueAssignment) -> Self {
		Self {
			patient_id: input.patient_id,
			encounter_id: input.encounter_id,
			room_id: input.room_id,
			service_id: input.service_id,
			queue_number: input.queue_number,
			status: QueueStatus::Waiting,
			priority: input.priority.unwrap_or(PriorityLevel::Routine),
			assigned_at: input.assigned_at.unwrap_or_else(Utc::now),
			completed_at: None,
		}
	}

	fn apply(&mut self, update: UpdateQueueAssignment) {
		let status = update.status;
		patch!(self, update, [room_id, queue_number, status, priority], optional [service_id]);

		// The completion time follows the status.
		match status {
			Some(QueueStatus::Completed) if self.completed_at.is_none() => {
				self.completed_at = Some(Utc::now());
			}
			Some(QueueStatus::Waiting | QueueStatus::InProgress) => self.completed_at = None,
			_ => {}
		}
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.check(self.queue_number > 0, "queueNumber", "must be a positive integer")
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"queueNumber" => SortValue::Number(i64::from(self.queue_number)),
			"priority" => SortValue::Number(self.priority as i64),
			"status" => SortValue::text(self.status.as_str()),
			"assignedAt" => self.assigned_at.into(),
			_ => SortValue::None,
		}
	}

	/// A queue number is handed out once per room and day.
	fn unique_key(&self) -> Option<String> {
		Some(format!(
			"queueNumber {} in room {} on {}",
			self.queue_number,
			self.room_id,
			self.assigned_at.date_naive()
		))
	}
}
