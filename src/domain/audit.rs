use super::{matches_eq, matches_opt, matches_text, ListFilter, Resource, SortValue};
use crate::api::validation::{FromQuery, QueryFields, Range, Rules};
use crate::api::ApiError;
use crate::types::{AuditAction, LogLevel, Vocabulary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An entry of the audit trail. Entries are append-only; only their soft-delete flag changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
	pub user_id: Option<Uuid>,
	pub action: AuditAction,
	pub level: LogLevel,
	pub resource_type: String,
	pub resource_id: Option<Uuid>,
	pub description: Option<String>,
	pub ip_address: Option<String>,
	pub trace_id: Option<String>,
	pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAuditLog {
	#[serde(default)]
	pub user_id: Option<Uuid>,
	pub action: AuditAction,
	#[serde(default)]
	pub level: Option<LogLevel>,
	pub resource_type: String,
	#[serde(default)]
	pub resource_id: Option<Uuid>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub ip_address: Option<String>,
	#[serde(default)]
	pub trace_id: Option<String>,
}

/// Audit entries accept no changes.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAuditLog {}

#[derive(Debug, Default, PartialEq)]
pub struct AuditLogFilter {
	pub user_id: Option<Uuid>,
	pub action: Option<AuditAction>,
	pub level: Option<LogLevel>,
	pub resource_type: Option<String>,
	/// Bounds on the time the entry was written.
	pub created: Range<DateTime<Utc>>,
}

impl FromQuery for AuditLogFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			user_id: fields.uuid("userId"),
			action: fields.enumeration("action"),
			level: fields.enumeration("level"),
			resource_type: fields.text("resourceType"),
			created: fields.datetime_range("created"),
		}
	}
}

impl ListFilter<AuditLog> for AuditLogFilter {
	fn matches(&self, log: &AuditLog) -> bool {
		matches_opt(self.user_id.as_ref(), log.user_id.as_ref())
			&& matches_eq(self.action.as_ref(), &log.action)
			&& matches_eq(self.level.as_ref(), &log.level)
			&& matches_text(self.resource_type.as_deref(), [log.resource_type.as_str()])
			&& self.created.contains(&log.occurred_at)
	}
}

impl Resource for AuditLog {
	const NAME: &'static str = "audit log";
	const SORT_FIELDS: &'static [&'static str] = &["occurredAt", "action", "level"];

	type Create = CreateAuditLog;
	type Update = UpdateAuditLog;
	type Filter = AuditLogFilter;

	fn create(input: CreateAuditLog) -> Self {
		Self {
			user_id: input.user_id,
			action: input.action,
			level: input.level.unwrap_or(LogLevel::Info),
			resource_type: input.resource_type,
			resource_id: input.resource_id,
			description: input.description,
			ip_address: input.ip_address,
			trace_id: input.trace_id,
			occurred_at: Utc::now(),
		}
	}

	fn apply(&mut self, _update: UpdateAuditLog) {}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.non_empty("resourceType", &self.resource_type)
			.max_len("resourceType", &self.resource_type, 100)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"occurredAt" => self.occurred_at.into(),
			"action" => SortValue::text(self.action.as_str()),
			"level" => SortValue::Number(self.level as i64),
			_ => SortValue::None,
		}
	}
}
