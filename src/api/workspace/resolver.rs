use crate::api::ApiError;
use crate::types::UserRole;
use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};

/// Header the upstream gateway sets after authenticating the caller.
pub const ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");

/// Determines the role of an authenticated caller.
#[async_trait]
pub trait RoleResolver: Send + Sync {
	async fn resolve(&self, headers: &HeaderMap) -> Result<UserRole, ApiError>;
}

/// Trusts the role forwarded by the gateway in [`ROLE_HEADER`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderRoleResolver;

#[async_trait]
impl RoleResolver for HeaderRoleResolver {
	async fn resolve(&self, headers: &HeaderMap) -> Result<UserRole, ApiError> {
		let value = headers.get(&ROLE_HEADER).ok_or(ApiError::Unauthorized)?;
		let value = value
			.to_str()
			.map_err(|_| ApiError::validation(ROLE_HEADER.as_str(), "must be visible ASCII"))?
			.trim();
		if value.is_empty() {
			return Err(ApiError::Unauthorized);
		}

		value
			.parse()
			.map_err(|err: crate::types::VocabularyError| {
				ApiError::validation(ROLE_HEADER.as_str(), err.to_string())
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn headers(role: Option<&'static str>) -> HeaderMap {
		let mut headers = HeaderMap::new();
		if let Some(role) = role {
			headers.insert(ROLE_HEADER, HeaderValue::from_static(role));
		}
		headers
	}

	#[tokio::test]
	async fn resolves_known_role() {
		let role = HeaderRoleResolver.resolve(&headers(Some("radiologist"))).await;

		assert_eq!(role.unwrap(), UserRole::Radiologist);
	}

	#[tokio::test]
	async fn missing_role_is_unauthorized() {
		assert!(matches!(
			HeaderRoleResolver.resolve(&headers(None)).await,
			Err(ApiError::Unauthorized)
		));
		assert!(matches!(
			HeaderRoleResolver.resolve(&headers(Some(" "))).await,
			Err(ApiError::Unauthorized)
		));
	}

	#[tokio::test]
	async fn unknown_role_lists_allowed_roles() {
		let Err(ApiError::Validation(errors)) =
			HeaderRoleResolver.resolve(&headers(Some("janitor"))).await
		else {
			panic!("expected validation failure");
		};

		assert_eq!(errors[0].field, "x-user-role");
		assert_eq!(
			errors[0].message,
			"must be one of: reception, physician, imaging_technician, radiologist, admin"
		);
	}
}
