//! Composition of the role specific workspace: one shell with a sidebar and a content region.

mod resolver;
mod routes;

pub use resolver::*;
pub use routes::routes;

use crate::api::ApiError;
use crate::types::UserRole;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
	ViewPatients,
	ViewImagingQueue,
	ViewReports,
	ManageStaff,
	ViewStudies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavEntry {
	pub label: &'static str,
	pub route: &'static str,
	pub capability: Capability,
}

impl NavEntry {
	/// Whether `route` is this entry or one of its sub pages.
	fn covers(&self, route: &str) -> bool {
		route
			.strip_prefix(self.route)
			.is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
	}
}

const fn entry(label: &'static str, route: &'static str, capability: Capability) -> NavEntry {
	NavEntry {
		label,
		route,
		capability,
	}
}

#[rustfmt::skip]
pub const NAVIGATION: &[NavEntry] = &[
    entry("Patients", "/patients", Capability::ViewPatients),
    entry("Encounters", "/encounters", Capability::ViewPatients),
    entry("Imaging queue", "/queue", Capability::ViewImagingQueue),
    entry("Studies", "/studies", Capability::ViewStudies),
    entry("AI analyses", "/ai-analyses", Capability::ViewStudies),
    entry("Reports", "/reports", Capability::ViewReports),
    entry("Staff", "/staff", Capability::ManageStaff),
    entry("Schedules", "/schedules", Capability::ManageStaff),
    entry("Rooms", "/rooms", Capability::ManageStaff),
];

impl UserRole {
	pub const fn capabilities(self) -> &'static [Capability] {
		match self {
			Self::Reception => &[Capability::ViewPatients, Capability::ViewImagingQueue],
			Self::Physician => &[
				Capability::ViewPatients,
				Capability::ViewStudies,
				Capability::ViewReports,
			],
			Self::ImagingTechnician => &[Capability::ViewImagingQueue, Capability::ViewStudies],
			Self::Radiologist => &[
				Capability::ViewImagingQueue,
				Capability::ViewStudies,
				Capability::ViewReports,
			],
			Self::Admin => &[
				Capability::ViewPatients,
				Capability::ViewImagingQueue,
				Capability::ViewReports,
				Capability::ManageStaff,
				Capability::ViewStudies,
			],
		}
	}

	pub fn can(self, capability: Capability) -> bool {
		self.capabilities().contains(&capability)
	}

	/// Content shown when no route is requested.
	pub const fn landing_route(self) -> &'static str {
		match self {
			Self::Reception | Self::Physician => "/patients",
			Self::ImagingTechnician => "/queue",
			Self::Radiologist => "/studies",
			Self::Admin => "/staff",
		}
	}

	pub fn navigation(self) -> Vec<NavEntry> {
		NAVIGATION
			.iter()
			.filter(|entry| self.can(entry.capability))
			.copied()
			.collect()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
	pub role: UserRole,
	pub capabilities: &'static [Capability],
	pub sidebar: Vec<NavEntry>,
	pub content: ContentRegion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRegion {
	pub route: String,
	/// The navigation entry the route belongs to.
	pub section: NavEntry,
}

impl Workspace {
	/// Composes the workspace of `role` showing `route`, or the role's landing content.
	///
	/// Fails before anything is composed if the role may not see the route.
	pub fn compose(role: UserRole, route: Option<&str>) -> Result<Self, ApiError> {
		let route = route.unwrap_or_else(|| role.landing_route());
		let section = NAVIGATION
			.iter()
			.find(|entry| entry.covers(route))
			.copied()
			.ok_or_else(|| ApiError::NotFound {
				resource: "route",
				id: route.to_owned(),
			})?;

		if !role.can(section.capability) {
			return Err(ApiError::Forbidden {
				role: role.to_string(),
				route: route.to_owned(),
			});
		}

		Ok(Self {
			role,
			capabilities: role.capabilities(),
			sidebar: role.navigation(),
			content: ContentRegion {
				route: route.to_owned(),
				section,
			},
		})
	}
}
