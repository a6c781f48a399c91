//! Caller identity extractor
//!
//! Authentication is terminated by the gateway in front of this service,
//! which forwards the user in `X-User-Id` and the role in `X-User-Role`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ApiResponse;
use crate::application::{Caller, CallerRole};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Missing or unreadable identity headers.
#[derive(Debug)]
pub struct CallerRejection(&'static str);

impl IntoResponse for CallerRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(self.0)),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = CallerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(CallerRejection("Missing X-User-Id header"))?
            .to_str()
            .map_err(|_| CallerRejection("X-User-Id header is not valid ASCII"))?
            .trim();

        if user_id.is_empty() {
            return Err(CallerRejection("X-User-Id header is empty"));
        }

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(CallerRole::parse)
            .unwrap_or(CallerRole::Driver);

        Ok(Caller {
            user_id: user_id.to_string(),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn whoami(caller: Caller) -> String {
        format!("{}:{}", caller.user_id, caller.role.as_str())
    }

    async fn call(req: Request<Body>) -> (StatusCode, String) {
        let resp = Router::new()
            .route("/me", get(whoami))
            .oneshot(req)
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn reads_user_and_role() {
        let req = Request::get("/me")
            .header("X-User-Id", "alice")
            .header("X-User-Role", "operator")
            .body(Body::empty())
            .unwrap();
        assert_eq!(call(req).await, (StatusCode::OK, "alice:operator".into()));

        let req = Request::get("/me")
            .header("X-User-Id", "bob")
            .body(Body::empty())
            .unwrap();
        assert_eq!(call(req).await, (StatusCode::OK, "bob:driver".into()));
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let req = Request::get("/me").body(Body::empty()).unwrap();
        let (status, body) = call(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("X-User-Id"));

        let req = Request::get("/me")
            .header("X-User-Id", "   ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(call(req).await.0, StatusCode::UNAUTHORIZED);
    }
}
