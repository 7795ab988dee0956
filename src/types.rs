//! Closed value sets shared by validation, storage and presentation.
//!
//! Every vocabulary serializes to a lowercase wire string and only parses from its declared set.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// A value outside of the declared set of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("must be one of: {}", .allowed.join(", "))]
pub struct VocabularyError {
	pub value: String,
	pub allowed: &'static [&'static str],
}

/// Common behaviour of all enumerated vocabularies.
pub trait Vocabulary: Copy + FromStr<Err = VocabularyError> + Display + 'static {
	/// All members, in declaration order.
	const ALL: &'static [Self];
	/// The wire representation of all members, in declaration order.
	const VALUES: &'static [&'static str];

	fn as_str(&self) -> &'static str;
}

macro_rules! vocabulary {
	(
		$(#[$meta:meta])*
		pub enum $name:ident {
			$($(#[$variant_meta:meta])* $variant:ident => $value:literal,)+
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub enum $name {
			$($(#[$variant_meta])* $variant,)+
		}

		impl Vocabulary for $name {
			const ALL: &'static [Self] = &[$(Self::$variant,)+];
			const VALUES: &'static [&'static str] = &[$($value,)+];

			fn as_str(&self) -> &'static str {
				match self {
					$(Self::$variant => $value,)+
				}
			}
		}

		impl FromStr for $name {
			type Err = VocabularyError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($value => Ok(Self::$variant),)+
					_ => Err(VocabularyError {
						value: s.to_owned(),
						allowed: <Self as Vocabulary>::VALUES,
					}),
				}
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl Serialize for $name {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_str(self.as_str())
			}
		}

		impl<'de> Deserialize<'de> for $name {
			fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				let value = String::deserialize(deserializer)?;
				value.parse().map_err(serde::de::Error::custom)
			}
		}
	};
}

vocabulary! {
	/// State of a patient in a room queue.
	pub enum QueueStatus {
		Waiting => "waiting",
		InProgress => "in_progress",
		Completed => "completed",
		Expired => "expired",
	}
}

vocabulary! {
	/// Urgency of a queue assignment or notification. Ordered from lowest to highest.
	pub enum PriorityLevel {
		Routine => "routine",
		Medium => "medium",
		High => "high",
		Urgent => "urgent",
		Stat => "stat",
	}
}

vocabulary! {
	pub enum UserRole {
		Reception => "reception",
		Physician => "physician",
		ImagingTechnician => "imaging_technician",
		Radiologist => "radiologist",
		Admin => "admin",
	}
}

vocabulary! {
	/// Status of an employee work schedule.
	pub enum ScheduleStatus {
		Scheduled => "scheduled",
		Confirmed => "confirmed",
		Completed => "completed",
		Cancelled => "cancelled",
		NoShow => "no_show",
	}
}

vocabulary! {
	pub enum NotificationType {
		Info => "info",
		Warning => "warning",
		Alert => "alert",
		StudyReady => "study_ready",
		ReportReady => "report_ready",
		QueueUpdate => "queue_update",
		System => "system",
	}
}

vocabulary! {
	/// Lifecycle of an imaging study, from order to verified report.
	pub enum StudyStatus {
		Scheduled => "scheduled",
		InProgress => "in_progress",
		Completed => "completed",
		Reported => "reported",
		Verified => "verified",
		Cancelled => "cancelled",
	}
}

vocabulary! {
	/// Acquisition modality, using the lowercased DICOM defined terms.
	pub enum Modality {
		Cr => "cr",
		Ct => "ct",
		Dx => "dx",
		Mg => "mg",
		Mr => "mr",
		Nm => "nm",
		Pt => "pt",
		Us => "us",
		Xa => "xa",
		Ot => "ot",
	}
}

vocabulary! {
	pub enum AnalysisStatus {
		Pending => "pending",
		Processing => "processing",
		Completed => "completed",
		Failed => "failed",
	}
}

vocabulary! {
	pub enum EncounterType {
		Outpatient => "outpatient",
		Inpatient => "inpatient",
		Emergency => "emergency",
		FollowUp => "follow_up",
	}
}

vocabulary! {
	pub enum Gender {
		Male => "male",
		Female => "female",
		Other => "other",
	}
}

vocabulary! {
	pub enum RoomType {
		Reception => "reception",
		Consultation => "consultation",
		Imaging => "imaging",
		Reporting => "reporting",
		Ward => "ward",
	}
}

vocabulary! {
	pub enum AuditAction {
		Create => "create",
		Update => "update",
		Delete => "delete",
		Login => "login",
		Logout => "logout",
		View => "view",
		Export => "export",
	}
}

vocabulary! {
	pub enum LogLevel {
		Debug => "debug",
		Info => "info",
		Warn => "warn",
		Error => "error",
	}
}

vocabulary! {
	pub enum SortOrder {
		Asc => "asc",
		Desc => "desc",
	}
}

impl Default for SortOrder {
	fn default() -> Self {
		Self::Desc
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_known_values() {
		assert_eq!("waiting".parse::<QueueStatus>(), Ok(QueueStatus::Waiting));
		assert_eq!("stat".parse::<PriorityLevel>(), Ok(PriorityLevel::Stat));
		assert_eq!(
			"imaging_technician".parse::<UserRole>(),
			Ok(UserRole::ImagingTechnician)
		);
		assert_eq!("no_show".parse::<ScheduleStatus>(), Ok(ScheduleStatus::NoShow));
	}

	#[test]
	fn reject_unknown_value_with_allowed_set() {
		let err = "bogus".parse::<QueueStatus>().unwrap_err();

		assert_eq!(err.value, "bogus");
		assert_eq!(
			err.to_string(),
			"must be one of: waiting, in_progress, completed, expired"
		);
	}

	#[test]
	fn parsing_is_case_sensitive() {
		assert!("WAITING".parse::<QueueStatus>().is_err());
	}

	#[test]
	fn values_match_members() {
		for member in PriorityLevel::ALL {
			assert_eq!(member.as_str().parse::<PriorityLevel>(), Ok(*member));
		}
		assert_eq!(PriorityLevel::ALL.len(), PriorityLevel::VALUES.len());
	}

	#[test]
	fn priority_is_ordered_by_urgency() {
		assert!(PriorityLevel::Routine < PriorityLevel::Medium);
		assert!(PriorityLevel::Urgent < PriorityLevel::Stat);
	}

	#[test]
	fn serde_uses_wire_strings() {
		let json = serde_json::to_string(&StudyStatus::InProgress).unwrap();
		assert_eq!(json, r#""in_progress""#);

		let status: StudyStatus = serde_json::from_str(r#""verified""#).unwrap();
		assert_eq!(status, StudyStatus::Verified);

		let err = serde_json::from_str::<Modality>(r#""xray""#).unwrap_err();
		assert!(err.to_string().contains("must be one of: cr, ct"));
	}
}
