//! A process-local store that keeps every record in memory.

use super::{Change, DeletedScope, Page, Repository, StoreError};
use crate::api::validation::ListQuery;
use crate::domain::{ListFilter, Record, Resource};
use crate::types::SortOrder;
use async_trait::async_trait;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

pub struct InMemoryRepository<R> {
	records: RwLock<Vec<Record<R>>>,
}

impl<R> Default for InMemoryRepository<R> {
	fn default() -> Self {
		Self {
			records: RwLock::new(Vec::new()),
		}
	}
}

impl<R: Resource> InMemoryRepository<R> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Rejects `candidate` if another live record already holds its unique key.
	///
	/// Deleted candidates never conflict so that a record can always be soft-deleted.
	fn check_unique(records: &[Record<R>], candidate: &Record<R>) -> Result<(), StoreError> {
		if candidate.is_deleted {
			return Ok(());
		}
		let Some(key) = candidate.resource.unique_key() else {
			return Ok(());
		};

		let taken = records.iter().any(|other| {
			other.id != candidate.id
				&& !other.is_deleted
				&& other.resource.unique_key().as_ref() == Some(&key)
		});
		if taken {
			return Err(StoreError::Conflict { key });
		}
		Ok(())
	}
}

fn compare<R: Resource>(a: &Record<R>, b: &Record<R>, field: &str, order: SortOrder) -> Ordering {
	let ordering = a.sort_value(field).cmp(&b.sort_value(field));
	match order {
		SortOrder::Asc => ordering,
		SortOrder::Desc => ordering.reverse(),
	}
}

#[async_trait]
impl<R: Resource> Repository<R> for InMemoryRepository<R> {
	async fn insert(&self, record: Record<R>) -> Result<Record<R>, StoreError> {
		let mut records = self.records.write().await;
		Self::check_unique(&records, &record)?;

		records.push(record.clone());
		debug!(resource = R::NAME, id = %record.id, "Inserted record");
		Ok(record)
	}

	async fn find(&self, id: Uuid, scope: DeletedScope) -> Result<Option<Record<R>>, StoreError> {
		let records = self.records.read().await;
		Ok(records
			.iter()
			.find(|record| record.id == id && scope.admits(*record))
			.cloned())
	}

	async fn modify(
		&self,
		id: Uuid,
		scope: DeletedScope,
		change: Change<R>,
	) -> Result<Record<R>, StoreError> {
		let mut records = self.records.write().await;
		let index = records
			.iter()
			.position(|record| record.id == id && scope.admits(record))
			.ok_or(StoreError::Missing {
				resource: R::NAME,
				id,
			})?;

		let mut record = records[index].clone();
		change(&mut record).map_err(StoreError::Rejected)?;
		Self::check_unique(&records, &record)?;

		records[index] = record.clone();
		debug!(resource = R::NAME, %id, "Modified record");
		Ok(record)
	}

	async fn list(&self, query: &ListQuery<R::Filter>) -> Result<Page<R>, StoreError> {
		let records = self.records.read().await;
		let mut matching: Vec<&Record<R>> = records
			.iter()
			.filter(|record| query.deleted.admits(*record) && query.filter.matches(&record.resource))
			.collect();

		let pagination = &query.pagination;
		// Stable, so records with equal keys keep their insertion order.
		matching.sort_by(|a, b| compare(a, b, &pagination.sort_field, pagination.sort_order));

		let total = matching.len() as u64;
		let records: Vec<Record<R>> = matching
			.into_iter()
			.skip(pagination.offset())
			.take(pagination.limit as usize)
			.cloned()
			.collect();
		trace!(resource = R::NAME, total, returned = records.len(), "Listed records");

		Ok(Page { records, total })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::pagination::Pagination;
	use crate::api::ApiError;
	use crate::domain::facility::{CreateRoom, Room, RoomFilter};
	use crate::types::RoomType;

	fn set_deleted(is_deleted: bool) -> Change<Room> {
		Box::new(move |record: &mut Record<Room>| {
			record.is_deleted = is_deleted;
			Ok(())
		})
	}

	fn room(code: &str, floor: Option<i32>) -> Record<Room> {
		Record::new(Room::create(CreateRoom {
			code: code.to_owned(),
			name: format!("Room {code}"),
			room_type: RoomType::Imaging,
			floor,
			description: None,
			is_active: true,
		}))
	}

	fn query(page: u32, limit: u32, sort_field: &str, sort_order: SortOrder) -> ListQuery<RoomFilter> {
		ListQuery {
			pagination: Pagination {
				page,
				limit,
				sort_field: sort_field.to_owned(),
				sort_order,
			},
			filter: RoomFilter::default(),
			deleted: DeletedScope::Exclude,
		}
	}

	#[tokio::test]
	async fn unique_keys_conflict_among_live_records() {
		let repo = InMemoryRepository::<Room>::new();
		let first = repo.insert(room("CT1", None)).await.unwrap();

		let err = repo.insert(room("ct1", None)).await.unwrap_err();
		assert!(matches!(err, StoreError::Conflict { .. }));
		assert_eq!(err.to_string(), "room code CT1 already exists");

		// Once the holder is deleted the key is free again.
		repo.modify(first.id, DeletedScope::Exclude, set_deleted(true))
			.await
			.unwrap();
		repo.insert(room("CT1", None)).await.unwrap();

		// Restoring the old holder now collides with the new one.
		assert!(matches!(
			repo.modify(first.id, DeletedScope::Include, set_deleted(false))
				.await,
			Err(StoreError::Conflict { .. })
		));
		let stored = repo.find(first.id, DeletedScope::Include).await.unwrap();
		assert!(stored.unwrap().is_deleted);
	}

	#[tokio::test]
	async fn find_hides_deleted_records_unless_included() {
		let repo = InMemoryRepository::<Room>::new();
		let record = repo.insert(room("MR1", None)).await.unwrap();
		repo.modify(record.id, DeletedScope::Exclude, set_deleted(true))
			.await
			.unwrap();

		assert!(repo
			.find(record.id, DeletedScope::Exclude)
			.await
			.unwrap()
			.is_none());
		assert!(repo
			.find(record.id, DeletedScope::Include)
			.await
			.unwrap()
			.is_some());
	}

	#[tokio::test]
	async fn modify_of_unknown_record_fails() {
		let repo = InMemoryRepository::<Room>::new();

		assert!(matches!(
			repo.modify(Uuid::new_v4(), DeletedScope::Include, set_deleted(true))
				.await,
			Err(StoreError::Missing { .. })
		));
	}

	#[tokio::test]
	async fn modify_skips_records_outside_scope() {
		let repo = InMemoryRepository::<Room>::new();
		let record = repo.insert(room("US1", None)).await.unwrap();
		repo.modify(record.id, DeletedScope::Exclude, set_deleted(true))
			.await
			.unwrap();

		// A deleted record cannot be edited back to life through the live scope.
		assert!(matches!(
			repo.modify(record.id, DeletedScope::Exclude, set_deleted(false))
				.await,
			Err(StoreError::Missing { .. })
		));
	}

	#[tokio::test]
	async fn rejected_change_stores_nothing() {
		let repo = InMemoryRepository::<Room>::new();
		let record = repo.insert(room("XR1", Some(1))).await.unwrap();

		let change: Change<Room> = Box::new(|record: &mut Record<Room>| {
			record.resource.floor = Some(9);
			Err(ApiError::validation("floor", "is out of range"))
		});
		let err = repo
			.modify(record.id, DeletedScope::Exclude, change)
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::Rejected(ApiError::Validation(_))));

		let stored = repo.find(record.id, DeletedScope::Exclude).await.unwrap();
		assert_eq!(stored.unwrap().resource.floor, Some(1));
	}

	#[tokio::test]
	async fn list_sorts_and_slices() {
		let repo = InMemoryRepository::<Room>::new();
		for (code, floor) in [("A", Some(2)), ("B", None), ("C", Some(1)), ("D", Some(3))] {
			repo.insert(room(code, floor)).await.unwrap();
		}

		let page = repo
			.list(&query(1, 2, "floor", SortOrder::Asc))
			.await
			.unwrap();
		let codes: Vec<_> = page.records.iter().map(|r| r.resource.code.as_str()).collect();
		assert_eq!(page.total, 4);
		assert_eq!(codes, ["B", "C"]);

		let page = repo
			.list(&query(2, 3, "code", SortOrder::Desc))
			.await
			.unwrap();
		let codes: Vec<_> = page.records.iter().map(|r| r.resource.code.as_str()).collect();
		assert_eq!(page.total, 4);
		assert_eq!(codes, ["A"]);
	}

	#[tokio::test]
	async fn list_applies_filter_and_deleted_scope() {
		let repo = InMemoryRepository::<Room>::new();
		repo.insert(room("CT1", None)).await.unwrap();
		let gone = repo.insert(room("CT2", None)).await.unwrap();
		repo.modify(gone.id, DeletedScope::Exclude, set_deleted(true))
			.await
			.unwrap();
		let mut inactive = room("MR1", None);
		inactive.resource.is_active = false;
		repo.insert(inactive).await.unwrap();

		let mut active = query(1, 10, "code", SortOrder::Asc);
		active.filter.is_active = Some(true);
		assert_eq!(repo.list(&active).await.unwrap().total, 1);

		let mut everything = query(1, 10, "code", SortOrder::Asc);
		everything.deleted = DeletedScope::Include;
		assert_eq!(repo.list(&everything).await.unwrap().total, 3);

		// Past the end: empty page, total unchanged.
		let page = repo
			.list(&query(5, 10, "code", SortOrder::Asc))
			.await
			.unwrap();
		assert!(page.records.is_empty());
		assert_eq!(page.total, 2);
	}
}
