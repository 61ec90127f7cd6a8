//! JSON body extractor that also runs `validator` rules
//!
//! A body that fails to parse is a client error (400); a body that parses
//! but breaks a `#[validate]` rule is 422. Both come back in the
//! [`ApiResponse`] envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

/// Like `axum::Json<T>`, but the value has passed `T::validate()`.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct QuoteRequest {
///     #[validate(length(min = 1, max = 50))]
///     amounts: Vec<Decimal>,
/// }
///
/// async fn quote(ValidatedJson(req): ValidatedJson<QuoteRequest>) {
///     // 1..=50 amounts here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

pub enum ValidatedJsonRejection {
    /// Body missing, not JSON, or the wrong shape.
    JsonError(JsonRejection),
    /// Parsed, but `validate()` failed.
    ValidationError(ValidationErrors),
}

impl ValidatedJsonRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::JsonError(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::JsonError(rejection) => format!("Invalid JSON: {}", rejection.body_text()),
            Self::ValidationError(errors) => describe(errors),
        }
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.message());
        (self.status(), Json(body)).into_response()
    }
}

/// `field: message` pairs joined with `; `, ordered by field name.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();

    if messages.is_empty() {
        "Validation failed".to_string()
    } else {
        messages.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;
        match value.validate() {
            Ok(()) => Ok(Self(value)),
            Err(errors) => Err(ValidatedJsonRejection::ValidationError(errors)),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
