use crate::backend::clients::ServiceClients;
use crate::backend::memory::InMemoryRepository;
use crate::config::PaginationConfig;
use crate::domain::audit::AuditLog;
use crate::domain::facility::{MedicalService, Room};
use crate::domain::imaging::{AiAnalysis, AiModel, Study};
use crate::domain::notification::Notification;
use crate::domain::patient::{Encounter, Patient};
use crate::domain::queue::QueueAssignment;
use crate::domain::schedule::Schedule;
use crate::domain::Resource;
use crate::AppState;
use axum::Router;
use resource::ResourceService;
use std::sync::Arc;

pub mod clients;
pub mod envelope;
pub mod pagination;
pub mod resource;
pub mod validation;
pub mod workspace;

pub use envelope::{ApiError, FieldError, RequestContext};

/// Services of every resource, each backed by its own repository.
#[derive(Clone)]
pub struct Resources {
	pub patients: ResourceService<Patient>,
	pub encounters: ResourceService<Encounter>,
	pub queue_assignments: ResourceService<QueueAssignment>,
	pub schedules: ResourceService<Schedule>,
	pub studies: ResourceService<Study>,
	pub ai_models: ResourceService<AiModel>,
	pub ai_analyses: ResourceService<AiAnalysis>,
	pub notifications: ResourceService<Notification>,
	pub audit_logs: ResourceService<AuditLog>,
	pub rooms: ResourceService<Room>,
	pub services: ResourceService<MedicalService>,
}

impl Resources {
	/// Backs every resource with a process-local store.
	pub fn in_memory(pagination: PaginationConfig) -> Self {
		fn service<R: Resource>(pagination: PaginationConfig) -> ResourceService<R> {
			ResourceService::new(Arc::new(InMemoryRepository::<R>::new()), pagination)
		}

		Self {
			patients: service(pagination),
			encounters: service(pagination),
			queue_assignments: service(pagination),
			schedules: service(pagination),
			studies: service(pagination),
			ai_models: service(pagination),
			ai_analyses: service(pagination),
			notifications: service(pagination),
			audit_logs: service(pagination),
			rooms: service(pagination),
			services: service(pagination),
		}
	}
}

#[rustfmt::skip]
fn resource_routes(resources: Resources) -> Router<AppState> {
    Router::new()
        .nest("/patients", resource::routes(resources.patients))
        .nest("/encounters", resource::routes(resources.encounters))
        .nest("/queue-assignments", resource::routes(resources.queue_assignments))
        .nest("/schedules", resource::routes(resources.schedules))
        .nest("/studies", resource::routes(resources.studies))
        .nest("/ai-models", resource::routes(resources.ai_models))
        .nest("/ai-analyses", resource::routes(resources.ai_analyses))
        .nest("/notifications", resource::routes(resources.notifications))
        .nest("/audit-logs", resource::routes(resources.audit_logs))
        .nest("/rooms", resource::routes(resources.rooms))
        .nest("/services", resource::routes(resources.services))
}

pub fn routes(state: &AppState) -> Router<AppState> {
	let router = Router::new()
		.merge(resource_routes(state.resources.clone()))
		.merge(workspace::routes(Arc::clone(&state.role_resolver)))
		.merge(clients::routes(state.clients.clone()));

	// axum no longer supports nesting at the root
	let router = match state.config.server.http.base_path.as_str() {
		"/" | "" => router,
		base_path => Router::new().nest(base_path, router),
	};

	router
		.fallback(envelope::route_not_found)
		.method_not_allowed_fallback(envelope::method_not_allowed)
}
