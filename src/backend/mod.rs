use crate::api::validation::ListQuery;
use crate::api::ApiError;
use crate::domain::{Record, Resource};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod clients;
pub mod memory;

/// Whether soft-deleted records take part in a lookup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DeletedScope {
	#[default]
	Exclude,
	Include,
}

impl DeletedScope {
	pub fn admits<R>(self, record: &Record<R>) -> bool {
		matches!(self, Self::Include) || !record.is_deleted
	}
}

/// Records matching a list request, already sorted and sliced to the requested page.
#[derive(Debug)]
pub struct Page<R> {
	pub records: Vec<Record<R>>,
	/// Number of records matching the request before slicing.
	pub total: u64,
}

/// An in-place edit of a stored record.
pub type Change<R> = Box<dyn FnOnce(&mut Record<R>) -> Result<(), ApiError> + Send>;

/// Persistence of a single resource.
#[async_trait]
pub trait Repository<R: Resource>: Send + Sync {
	async fn insert(&self, record: Record<R>) -> Result<Record<R>, StoreError>;

	async fn find(&self, id: Uuid, scope: DeletedScope) -> Result<Option<Record<R>>, StoreError>;

	/// Applies `change` to the record with the given id and stores the result.
	///
	/// No other write to the store is interleaved between reading the record and storing it.
	/// Nothing is stored if `change` fails.
	async fn modify(
		&self,
		id: Uuid,
		scope: DeletedScope,
		change: Change<R>,
	) -> Result<Record<R>, StoreError>;

	async fn list(&self, query: &ListQuery<R::Filter>) -> Result<Page<R>, StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("{key} already exists")]
	Conflict { key: String },
	#[error("{resource} {id} not found")]
	Missing { resource: &'static str, id: Uuid },
	#[error(transparent)]
	Rejected(ApiError),
	#[error(transparent)]
	Backend(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
			StoreError::Missing { resource, id } => Self::NotFound {
				resource,
				id: id.to_string(),
			},
			StoreError::Rejected(err) => err,
			StoreError::Backend(source) => Self::Internal(source),
		}
	}
}
