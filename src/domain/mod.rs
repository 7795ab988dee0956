//! Persisted records of the radiology workflow and their request shapes.

use crate::api::validation::FromQuery;
use crate::api::ApiError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

pub mod audit;
pub mod facility;
pub mod imaging;
pub mod notification;
pub mod patient;
pub mod queue;
pub mod schedule;

/// Copies every supplied field of a partial update onto the target.
///
/// Fields listed under `optional` are `Option`s on the target and become `Some` when supplied.
macro_rules! patch {
	($target:expr, $update:expr, [$($field:ident),* $(,)?]) => {
		$(
			if let Some(value) = $update.$field {
				$target.$field = value;
			}
		)*
	};
	($target:expr, $update:expr, [$($field:ident),* $(,)?], optional [$($opt:ident),* $(,)?]) => {
		$(
			if let Some(value) = $update.$field {
				$target.$field = value;
			}
		)*
		$(
			if let Some(value) = $update.$opt {
				$target.$opt = Some(value);
			}
		)*
	};
}
pub(crate) use patch;

/// A persisted entity together with its identity, audit timestamps and soft-delete flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<R> {
	pub id: Uuid,
	#[serde(flatten)]
	pub resource: R,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub is_deleted: bool,
}

impl<R: Resource> Record<R> {
	pub fn new(resource: R) -> Self {
		let now = Utc::now();
		Self {
			id: Uuid::new_v4(),
			resource,
			created_at: now,
			updated_at: now,
			is_deleted: false,
		}
	}

	pub fn sort_value(&self, field: &str) -> SortValue {
		match field {
			"createdAt" => SortValue::Time(self.created_at),
			"updatedAt" => SortValue::Time(self.updated_at),
			field => self.resource.sort_value(field),
		}
	}

	pub fn touch(&mut self) {
		self.updated_at = Utc::now();
	}
}

/// A value a list can be ordered by. Absent values sort first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
	None,
	Flag(bool),
	Number(i64),
	Text(String),
	Date(NaiveDate),
	TimeOfDay(NaiveTime),
	Time(DateTime<Utc>),
}

impl SortValue {
	pub fn text(value: &str) -> Self {
		Self::Text(value.to_lowercase())
	}
}

impl<T: Into<Self>> From<Option<T>> for SortValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::None, Into::into)
	}
}

impl From<DateTime<Utc>> for SortValue {
	fn from(value: DateTime<Utc>) -> Self {
		Self::Time(value)
	}
}

impl From<NaiveDate> for SortValue {
	fn from(value: NaiveDate) -> Self {
		Self::Date(value)
	}
}

/// An entity that is exposed as a list/create/read/update/delete resource.
pub trait Resource: Clone + Serialize + Send + Sync + 'static {
	/// Human readable name used in messages and logs.
	const NAME: &'static str;
	/// Fields besides `createdAt` and `updatedAt` a list can be sorted by.
	const SORT_FIELDS: &'static [&'static str];

	type Create: DeserializeOwned + Send + 'static;
	type Update: DeserializeOwned + Send + 'static;
	type Filter: ListFilter<Self>;

	fn create(input: Self::Create) -> Self;

	/// Applies a partial update. Fields that are not supplied stay untouched.
	fn apply(&mut self, update: Self::Update);

	/// Checks invariants spanning several fields after a create or update.
	fn validate(&self) -> Result<(), ApiError> {
		Ok(())
	}

	fn sort_value(&self, field: &str) -> SortValue;

	/// Key that must be unique among all records that are not deleted.
	fn unique_key(&self) -> Option<String> {
		None
	}
}

/// Predicates of a list request. Absent fields never narrow the result.
pub trait ListFilter<R>: FromQuery + Send + Sync + 'static {
	fn matches(&self, resource: &R) -> bool;
}

/// Matches when no value was requested or the requested value equals the actual one.
pub fn matches_eq<T: PartialEq>(expected: Option<&T>, actual: &T) -> bool {
	expected.is_none_or(|expected| expected == actual)
}

/// Like [`matches_eq`] for attributes that may be absent on the record.
pub fn matches_opt<T: PartialEq>(expected: Option<&T>, actual: Option<&T>) -> bool {
	expected.is_none_or(|expected| actual == Some(expected))
}

/// Case-insensitive substring match. `needle` is expected in lowercase.
pub fn matches_text<'a>(needle: Option<&str>, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
	needle.is_none_or(|needle| {
		haystacks
			.into_iter()
			.any(|haystack| haystack.to_lowercase().contains(needle))
	})
}
