use crate::api::pagination::Paginated;
use crate::api::validation::{ListQuery, RawQuery};
use crate::api::ApiError;
use crate::backend::{Change, DeletedScope, Repository};
use crate::config::PaginationConfig;
use crate::domain::{Record, Resource};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// List, create, read, update, soft delete and restore of a single resource.
pub struct ResourceService<R: Resource> {
	repository: Arc<dyn Repository<R>>,
	pagination: PaginationConfig,
}

impl<R: Resource> Clone for ResourceService<R> {
	fn clone(&self) -> Self {
		Self {
			repository: Arc::clone(&self.repository),
			pagination: self.pagination,
		}
	}
}

impl<R: Resource> ResourceService<R> {
	pub fn new(repository: Arc<dyn Repository<R>>, pagination: PaginationConfig) -> Self {
		Self {
			repository,
			pagination,
		}
	}

	/// Validates the raw query parameters and returns the requested page.
	/// Nothing is read from the repository if validation fails.
	pub async fn list(&self, raw: &RawQuery) -> Result<Paginated<Record<R>>, ApiError> {
		let query = ListQuery::<R::Filter>::parse(raw, self.pagination, R::SORT_FIELDS)?;
		let page = self.repository.list(&query).await?;

		Ok(Paginated::new(
			page.records,
			page.total,
			query.pagination.page,
			query.pagination.limit,
		)?)
	}

	pub async fn create(&self, input: R::Create) -> Result<Record<R>, ApiError> {
		let resource = R::create(input);
		resource.validate()?;

		let record = self.repository.insert(Record::new(resource)).await?;
		info!(resource = R::NAME, id = %record.id, "Created record");
		Ok(record)
	}

	pub async fn get(&self, id: &str) -> Result<Record<R>, ApiError> {
		let id = parse_id(id)?;
		self.repository
			.find(id, DeletedScope::Exclude)
			.await?
			.ok_or_else(|| not_found::<R>(id))
	}

	pub async fn update(&self, id: &str, update: R::Update) -> Result<Record<R>, ApiError> {
		let id = parse_id(id)?;
		let change: Change<R> = Box::new(move |record: &mut Record<R>| {
			record.resource.apply(update);
			record.resource.validate()?;
			record.touch();
			Ok(())
		});

		Ok(self.repository.modify(id, DeletedScope::Exclude, change).await?)
	}

	/// Marks the record as deleted. Deleted records are hidden from reads and lists.
	pub async fn delete(&self, id: &str) -> Result<Record<R>, ApiError> {
		let id = parse_id(id)?;
		let change: Change<R> = Box::new(|record: &mut Record<R>| {
			record.is_deleted = true;
			record.touch();
			Ok(())
		});

		let record = self.repository.modify(id, DeletedScope::Exclude, change).await?;
		info!(resource = R::NAME, %id, "Deleted record");
		Ok(record)
	}

	/// Reverts a soft delete. Restoring a record that is not deleted changes nothing.
	pub async fn restore(&self, id: &str) -> Result<Record<R>, ApiError> {
		let id = parse_id(id)?;
		let change: Change<R> = Box::new(|record: &mut Record<R>| {
			if record.is_deleted {
				record.is_deleted = false;
				record.touch();
			}
			Ok(())
		});

		let record = self.repository.modify(id, DeletedScope::Include, change).await?;
		info!(resource = R::NAME, %id, "Restored record");
		Ok(record)
	}
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
	Uuid::parse_str(id).map_err(|_| ApiError::validation("id", "must be a valid UUID"))
}

fn not_found<R: Resource>(id: Uuid) -> ApiError {
	ApiError::NotFound {
		resource: R::NAME,
		id: id.to_string(),
	}
}
