use super::{matches_eq, matches_text, patch, ListFilter, Resource, SortValue};
use crate::api::validation::{FromQuery, QueryFields, Rules};
use crate::api::ApiError;
use crate::types::{NotificationType, PriorityLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	pub recipient_id: Uuid,
	pub notification_type: NotificationType,
	pub priority: PriorityLevel,
	pub title: String,
	pub message: String,
	/// Route the client opens when the notification is clicked.
	pub link: Option<String>,
	pub is_read: bool,
	pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateNotification {
	pub recipient_id: Uuid,
	pub notification_type: NotificationType,
	#[serde(default)]
	pub priority: Option<PriorityLevel>,
	pub title: String,
	pub message: String,
	#[serde(default)]
	pub link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UpdateNotification {
	pub is_read: Option<bool>,
}

#[derive(Debug, Default, PartialEq)]
pub struct NotificationFilter {
	pub recipient_id: Option<Uuid>,
	pub notification_type: Option<NotificationType>,
	pub priority: Option<PriorityLevel>,
	pub is_read: Option<bool>,
	/// Matches the title or the message.
	pub search: Option<String>,
}

impl FromQuery for NotificationFilter {
	fn from_query(fields: &mut QueryFields<'_>) -> Self {
		Self {
			recipient_id: fields.uuid("recipientId"),
			notification_type: fields.enumeration("notificationType"),
			priority: fields.enumeration("priority"),
			is_read: fields.boolean("isRead"),
			search: fields.text("search"),
		}
	}
}

impl ListFilter<Notification> for NotificationFilter {
	fn matches(&self, notification: &Notification) -> bool {
		matches_eq(self.recipient_id.as_ref(), &notification.recipient_id)
			&& matches_eq(
				self.notification_type.as_ref(),
				&notification.notification_type,
			) && matches_eq(self.priority.as_ref(), &notification.priority)
			&& matches_eq(self.is_read.as_ref(), &notification.is_read)
			&& matches_text(
				self.search.as_deref(),
				[notification.title.as_str(), notification.message.as_str()],
			)
	}
}

impl Resource for Notification {
	const NAME: &'static str = "notification";
	const SORT_FIELDS: &'static [&'static str] = &["priority", "isRead"];

	type Create = CreateNotification;
	type Update = UpdateNotification;
	type Filter = NotificationFilter;

	fn create(input: CreateNotification) -> Self {
		Self {
			recipient_id: input.recipient_id,
			notification_type: input.notification_type,
			priority: input.priority.unwrap_or(PriorityLevel::Medium),
			title: input.title,
			message: input.message,
			link: input.link,
			is_read: false,
			read_at: None,
		}
	}

	fn apply(&mut self, update: UpdateNotification) {
		let was_read = self.is_read;
		patch!(self, update, [is_read]);

		if self.is_read && !was_read {
			self.read_at = Some(Utc::now());
		} else if !self.is_read {
			self.read_at = None;
		}
	}

	fn validate(&self) -> Result<(), ApiError> {
		Rules::default()
			.non_empty("title", &self.title)
			.max_len("title", &self.title, 200)
			.non_empty("message", &self.message)
			.finish()
	}

	fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"priority" => SortValue::Number(self.priority as i64),
			"isRead" => SortValue::Flag(self.is_read),
			_ => SortValue::None,
		}
	}
}
