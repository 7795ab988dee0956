//! Validation of raw request input before it reaches the storage layer.
//!
//! [`QueryFields`] reads typed values out of the raw query string map. Every reader records a
//! [`FieldError`] instead of failing early, so a single response can name all offending fields.

use crate::api::pagination::{Pagination, DEFAULT_SORT_FIELD};
use crate::api::{ApiError, FieldError};
use crate::backend::DeletedScope;
use crate::config::PaginationConfig;
use crate::types::{SortOrder, Vocabulary};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Query parameters as received, before any validation.
pub type RawQuery = HashMap<String, String>;

/// Builds a typed filter from the raw query parameters of a list request.
pub trait FromQuery: Sized {
	fn from_query(fields: &mut QueryFields<'_>) -> Self;
}

/// An inclusive range over an ordered value. Missing bounds do not constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range<T> {
	pub from: Option<T>,
	pub to: Option<T>,
}

impl<T> Default for Range<T> {
	fn default() -> Self {
		Self {
			from: None,
			to: None,
		}
	}
}

impl<T: PartialOrd> Range<T> {
	pub fn contains(&self, value: &T) -> bool {
		self.from.as_ref().is_none_or(|from| value >= from)
			&& self.to.as_ref().is_none_or(|to| value <= to)
	}

	/// Like [`Range::contains`], but an absent value only matches an unbounded range.
	pub fn contains_opt(&self, value: Option<&T>) -> bool {
		value.map_or_else(|| self.is_unbounded(), |value| self.contains(value))
	}

	pub const fn is_unbounded(&self) -> bool {
		self.from.is_none() && self.to.is_none()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
	Start,
	End,
}

pub struct QueryFields<'a> {
	raw: &'a RawQuery,
	errors: Vec<FieldError>,
}

impl<'a> QueryFields<'a> {
	pub const fn new(raw: &'a RawQuery) -> Self {
		Self {
			raw,
			errors: Vec::new(),
		}
	}

	/// Empty values count as absent.
	fn value(&self, name: &str) -> Option<&'a str> {
		self.raw
			.get(name)
			.map(|value| value.trim())
			.filter(|value| !value.is_empty())
	}

	pub fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.errors.push(FieldError::new(field, message));
	}

	/// Free text, matched by the filter as a case-insensitive substring.
	pub fn text(&mut self, name: &str) -> Option<String> {
		self.value(name).map(str::to_lowercase)
	}

	pub fn enumeration<V: Vocabulary>(&mut self, name: &str) -> Option<V> {
		let value = self.value(name)?;
		match value.parse::<V>() {
			Ok(value) => Some(value),
			Err(err) => {
				self.error(name, err.to_string());
				None
			}
		}
	}

	pub fn uuid(&mut self, name: &str) -> Option<Uuid> {
		let value = self.value(name)?;
		match Uuid::parse_str(value) {
			Ok(uuid) => Some(uuid),
			Err(_) => {
				self.error(name, "must be a UUID");
				None
			}
		}
	}

	pub fn boolean(&mut self, name: &str) -> Option<bool> {
		match self.value(name)? {
			"true" => Some(true),
			"false" => Some(false),
			_ => {
				self.error(name, "must be one of: true, false");
				None
			}
		}
	}

	/// A positive integer no larger than `max`.
	pub fn positive_int(&mut self, name: &str, max: u32) -> Option<u32> {
		let value = self.value(name)?;
		match value.parse::<u32>() {
			Ok(number) if number == 0 => {
				self.error(name, "must be a positive integer");
				None
			}
			Ok(number) if number > max => {
				self.error(name, format!("must not be greater than {max}"));
				None
			}
			Ok(number) => Some(number),
			Err(_) => {
				self.error(name, "must be a positive integer");
				None
			}
		}
	}

	/// A value out of a fixed list of names that are not a vocabulary, e.g. sortable fields.
	pub fn one_of(&mut self, name: &str, allowed: &[&'static str]) -> Option<&'static str> {
		let value = self.value(name)?;
		if let Some(found) = allowed.iter().copied().find(|candidate| *candidate == value) {
			Some(found)
		} else {
			self.error(name, format!("must be one of: {}", allowed.join(", ")));
			None
		}
	}

	/// An ISO-8601 calendar date. Full timestamps are accepted and truncated to their UTC date.
	pub fn date(&mut self, name: &str) -> Option<NaiveDate> {
		let value = self.value(name)?;
		if let Some(date) = parse_date(value) {
			Some(date)
		} else {
			self.error(name, "must be an ISO-8601 date");
			None
		}
	}

	fn datetime(&mut self, name: &str, bound: Bound) -> Option<DateTime<Utc>> {
		let value = self.value(name)?;
		if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
			return Some(datetime.to_utc());
		}
		// A plain date covers the whole day.
		if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
			let time = match bound {
				Bound::Start => NaiveTime::MIN,
				Bound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
					.unwrap_or(NaiveTime::MIN),
			};
			return Some(date.and_time(time).and_utc());
		}
		self.error(name, "must be an ISO-8601 date or date-time");
		None
	}

	/// Reads `{prefix}From` and `{prefix}To` as an inclusive timestamp range.
	pub fn datetime_range(&mut self, prefix: &str) -> Range<DateTime<Utc>> {
		let from_field = format!("{prefix}From");
		let to_field = format!("{prefix}To");
		let range = Range {
			from: self.datetime(&from_field, Bound::Start),
			to: self.datetime(&to_field, Bound::End),
		};
		self.check_order(&range, &from_field, &to_field)
	}

	/// Reads `{prefix}From` and `{prefix}To` as an inclusive calendar date range.
	pub fn date_range(&mut self, prefix: &str) -> Range<NaiveDate> {
		let from_field = format!("{prefix}From");
		let to_field = format!("{prefix}To");
		let range = Range {
			from: self.date(&from_field),
			to: self.date(&to_field),
		};
		self.check_order(&range, &from_field, &to_field)
	}

	fn check_order<T: PartialOrd + Copy>(
		&mut self,
		range: &Range<T>,
		from_field: &str,
		to_field: &str,
	) -> Range<T> {
		if let (Some(from), Some(to)) = (range.from, range.to) {
			if from > to {
				self.error(to_field, format!("must not be before {from_field}"));
				return Range::default();
			}
		}
		*range
	}

	pub fn finish(self) -> Result<(), ApiError> {
		if self.errors.is_empty() {
			Ok(())
		} else {
			Err(ApiError::Validation(self.errors))
		}
	}
}

fn parse_date(value: &str) -> Option<NaiveDate> {
	NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
		DateTime::parse_from_rfc3339(value)
			.ok()
			.map(|datetime| datetime.to_utc().date_naive())
	})
}

/// A validated list request: page selection, entity specific predicates and the soft-delete scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
	pub pagination: Pagination,
	pub filter: F,
	pub deleted: DeletedScope,
}

impl<F: FromQuery> ListQuery<F> {
	/// Validates all list parameters at once.
	///
	/// `sort_fields` are the resource specific sortable fields. `createdAt` and `updatedAt` are
	/// always sortable.
	pub fn parse(
		raw: &RawQuery,
		config: PaginationConfig,
		sort_fields: &[&'static str],
	) -> Result<Self, ApiError> {
		let mut fields = QueryFields::new(raw);

		let mut sortable = vec![DEFAULT_SORT_FIELD, "updatedAt"];
		sortable.extend_from_slice(sort_fields);

		let pagination = Pagination {
			page: fields.positive_int("page", u32::MAX).unwrap_or(1),
			limit: fields
				.positive_int("limit", config.max_limit)
				.unwrap_or(config.default_limit),
			sort_field: fields
				.one_of("sortField", &sortable)
				.unwrap_or(DEFAULT_SORT_FIELD)
				.to_owned(),
			sort_order: fields
				.enumeration::<SortOrder>("sortOrder")
				.unwrap_or_default(),
		};
		let deleted = if fields.boolean("includeDeleted").unwrap_or(false) {
			DeletedScope::Include
		} else {
			DeletedScope::Exclude
		};
		let filter = F::from_query(&mut fields);

		fields.finish()?;
		Ok(Self {
			pagination,
			filter,
			deleted,
		})
	}
}

/// Collects field errors of a request body beyond what deserialization already checks.
#[derive(Debug, Default)]
pub struct Rules {
	errors: Vec<FieldError>,
}

impl Rules {
	pub fn non_empty(&mut self, field: &str, value: &str) -> &mut Self {
		self.check(!value.trim().is_empty(), field, "must not be empty")
	}

	pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
		self.check(
			value.chars().count() <= max,
			field,
			&format!("must not be longer than {max} characters"),
		)
	}

	pub fn check(&mut self, condition: bool, field: &str, message: &str) -> &mut Self {
		if !condition {
			self.errors.push(FieldError::new(field, message));
		}
		self
	}

	pub fn finish(&mut self) -> Result<(), ApiError> {
		if self.errors.is_empty() {
			Ok(())
		} else {
			Err(ApiError::Validation(std::mem::take(&mut self.errors)))
		}
	}
}
