//! Authenticated user identity.
//!
//! Identity is an external collaborator: the upstream proxy authenticates the
//! session and injects the user id as the `x-user-id` header. Mutating routes
//! extract `CurrentUser` and reject requests without a usable identity.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let id = Uuid::parse_str(raw).map_err(|_| AppError::Unauthorized)?;
        Ok(Self { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CurrentUser, AppError> {
        let (mut parts, _) = request.into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn accepts_a_valid_user_id() {
        let id = Uuid::new_v4();
        let request = Request::builder().header(USER_ID_HEADER, id.to_string()).body(()).unwrap();
        assert_eq!(extract(request).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed_identity() {
        let missing = Request::builder().body(()).unwrap();
        assert!(matches!(extract(missing).await, Err(AppError::Unauthorized)));

        let malformed = Request::builder().header(USER_ID_HEADER, "not-a-uuid").body(()).unwrap();
        assert!(matches!(extract(malformed).await, Err(AppError::Unauthorized)));
    }
}
