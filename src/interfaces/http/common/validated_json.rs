//! JSON body extractor that also runs `validator` rules.
//!
//! Malformed JSON is a 400, a body that parses but breaks a field rule is a
//! 422 naming each offending field. Both use the [`ApiError`] envelope.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiError;

/// `Json<T>` whose value has passed `T::validate()`.
pub struct ValidatedJson<T>(pub T);

/// `field: message` for every failed rule, fields in name order.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let described: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();

    if described.is_empty() {
        "Validation failed".to_string()
    } else {
        described.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::bad_request(format!("Invalid JSON: {}", rejection.body_text()))
            })?;

        value
            .validate()
            .map_err(|errors| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::http::common::ApiResponse;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct StationBody {
        #[validate(length(min = 1, max = 20))]
        name: String,
        #[validate(range(min = -90.0, max = 90.0))]
        latitude: f64,
    }

    async fn handler(ValidatedJson(body): ValidatedJson<StationBody>) -> String {
        body.name
    }

    async fn send(body: Body) -> axum::http::Response<Body> {
        let req = Request::builder()
            .method("POST")
            .uri("/stations")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        Router::new()
            .route("/stations", post(handler))
            .oneshot(req)
            .await
            .unwrap()
    }

    fn json(value: serde_json::Value) -> Body {
        Body::from(serde_json::to_vec(&value).unwrap())
    }

    #[tokio::test]
    async fn valid_body_reaches_handler() {
        let resp = send(json(serde_json::json!({"name": "Depot", "latitude": 12.5}))).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let resp = send(Body::from("{name:")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: ApiResponse<()> = serde_json::from_slice(&bytes).unwrap();
        assert!(body.error.unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn failed_validation_is_422_with_field_names() {
        let resp = send(json(serde_json::json!({"name": "", "latitude": 123.0}))).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: ApiResponse<()> = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        let error = body.error.unwrap();
        let latitude = error.find("latitude").expect("latitude reported");
        let name = error.find("name").expect("name reported");
        assert!(latitude < name, "fields in name order: {error}");
    }
}
