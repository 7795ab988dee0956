use crate::api::ApiError;
use crate::types::SortOrder;
use serde::Serialize;
use thiserror::Error;

/// Field every resource can be sorted by when the request does not name one.
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Page selection and ordering shared by every list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
	/// 1-based page number.
	pub page: u32,
	pub limit: u32,
	pub sort_field: String,
	pub sort_order: SortOrder,
}

impl Pagination {
	pub fn first_page(limit: u32) -> Self {
		Self {
			page: 1,
			limit,
			sort_field: String::from(DEFAULT_SORT_FIELD),
			sort_order: SortOrder::default(),
		}
	}

	/// Number of matching rows that precede the requested page.
	pub fn offset(&self) -> usize {
		(self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
	#[error("limit must be greater than zero")]
	ZeroLimit,
	#[error("page must be greater than zero")]
	ZeroPage,
}

impl From<PaginationError> for ApiError {
	fn from(err: PaginationError) -> Self {
		Self::Internal(err.into())
	}
}

/// A single page of results together with the totals of the filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
	pub data: Vec<T>,
	pub total: u64,
	pub page: u32,
	pub limit: u32,
	pub total_pages: u64,
	pub has_next_page: bool,
	pub has_previous_page: bool,
}

impl<T> Paginated<T> {
	/// Derives the page metadata from the already sliced `rows` and the size of the filtered set.
	///
	/// A page past the end keeps the true totals and carries no rows.
	pub fn new(rows: Vec<T>, total: u64, page: u32, limit: u32) -> Result<Self, PaginationError> {
		if limit == 0 {
			return Err(PaginationError::ZeroLimit);
		}
		if page == 0 {
			return Err(PaginationError::ZeroPage);
		}

		let total_pages = total.div_ceil(u64::from(limit));
		let mut data = rows;
		data.truncate(limit as usize);

		Ok(Self {
			data,
			total,
			page,
			limit,
			total_pages,
			has_next_page: u64::from(page) < total_pages,
			has_previous_page: page > 1,
		})
	}

	pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
		Paginated {
			data: self.data.into_iter().map(f).collect(),
			total: self.total,
			page: self.page,
			limit: self.limit,
			total_pages: self.total_pages,
			has_next_page: self.has_next_page,
			has_previous_page: self.has_previous_page,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_result() {
		let page = Paginated::<u32>::new(Vec::new(), 0, 1, 10).unwrap();

		assert_eq!(
			page,
			Paginated {
				data: Vec::new(),
				total: 0,
				page: 1,
				limit: 10,
				total_pages: 0,
				has_next_page: false,
				has_previous_page: false,
			}
		);
	}

	#[test]
	fn empty_result_on_later_page() {
		let page = Paginated::<u32>::new(Vec::new(), 0, 3, 10).unwrap();

		assert_eq!(page.total_pages, 0);
		assert!(!page.has_next_page);
		assert!(page.has_previous_page);
	}

	#[test]
	fn middle_page() {
		let page = Paginated::new((10..20).collect(), 25, 2, 10).unwrap();

		assert_eq!(page.total_pages, 3);
		assert!(page.has_next_page);
		assert!(page.has_previous_page);
		assert_eq!(page.data.len(), 10);
	}

	#[test]
	fn last_page() {
		let page = Paginated::new((20..25).collect(), 25, 3, 10).unwrap();

		assert_eq!(page.total_pages, 3);
		assert!(!page.has_next_page);
		assert!(page.has_previous_page);
	}

	#[test]
	fn page_past_the_end_keeps_totals() {
		let page = Paginated::<u32>::new(Vec::new(), 25, 7, 10).unwrap();

		assert!(page.data.is_empty());
		assert_eq!(page.total, 25);
		assert_eq!(page.total_pages, 3);
		assert!(!page.has_next_page);
		assert!(page.has_previous_page);
	}

	#[test]
	fn zero_limit_is_rejected() {
		assert_eq!(
			Paginated::<u32>::new(Vec::new(), 5, 1, 0),
			Err(PaginationError::ZeroLimit)
		);
	}

	#[test]
	fn metadata_formulas_hold() {
		for total in 0..=45_u64 {
			for limit in 1..=12_u32 {
				for page in 1..=6_u32 {
					let result = Paginated::<()>::new(Vec::new(), total, page, limit).unwrap();
					let expected_pages = (total + u64::from(limit) - 1) / u64::from(limit);

					assert_eq!(result.total_pages, expected_pages);
					assert_eq!(result.has_next_page, u64::from(page) < expected_pages);
					assert_eq!(result.has_previous_page, page > 1);
				}
			}
		}
	}

	#[test]
	fn serializes_in_camel_case() {
		let page = Paginated::new(vec!["a"], 1, 1, 10).unwrap();
		let json = serde_json::to_value(&page).unwrap();

		assert_eq!(json["totalPages"], 1);
		assert_eq!(json["hasNextPage"], false);
		assert_eq!(json["hasPreviousPage"], false);
	}

	#[test]
	fn offset_of_pages() {
		let mut pagination = Pagination::first_page(20);
		assert_eq!(pagination.offset(), 0);

		pagination.page = 3;
		assert_eq!(pagination.offset(), 40);
	}
}
