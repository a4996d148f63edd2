//! `ValidatedJson<T>`: a JSON extractor that also runs `validator` rules.
//!
//! Malformed bodies are answered with 400, rule violations with 422. The
//! error message lists every failing rule, including those of nested
//! structs such as the flattened person fields.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use escola_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

fn describe(field: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None if field == "__all__" => "request is invalid".to_string(),
        None => format!("{field} is invalid"),
    }
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.extend(field_errors.iter().map(|e| describe(field, e)));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_messages(inner, out);
                }
            }
        }
    }
}

pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.sort();
    messages.dedup();
    messages.join(", ")
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let body = rejection.body_text();
    if let Some(field) = body
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return AppError::bad_request(anyhow!("{field} is required"));
    }
    if body.contains("Invalid email") || body.contains("Invalid phone number") {
        let detail = body.rsplit(": ").next().unwrap_or(&body);
        return AppError::bad_request(anyhow!("{}", detail.trim()));
    }
    if body.contains("unknown variant") || body.contains("invalid type") {
        return AppError::bad_request(anyhow!("Invalid field value in request"));
    }

    AppError::new(StatusCode::BAD_REQUEST, anyhow!("Invalid request body"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Inner {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Outer {
        #[serde(flatten)]
        #[validate(nested)]
        inner: Inner,
        #[validate(range(min = 1, max = 5))]
        rating: i32,
    }

    #[test]
    fn test_format_errors_includes_nested_and_defaults() {
        let value = Outer {
            inner: Inner {
                name: String::new(),
            },
            rating: 9,
        };
        let errors = value.validate().unwrap_err();
        assert_eq!(format_errors(&errors), "name is required, rating is invalid");
    }

    #[test]
    fn test_format_errors_empty_when_valid() {
        let value = Outer {
            inner: Inner { name: "ok".into() },
            rating: 3,
        };
        assert!(value.validate().is_ok());
    }
}
