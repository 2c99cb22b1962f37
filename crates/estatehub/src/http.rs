//! Response envelope shared by every JSON route.
//!
//! Successful payloads carry `"success": true` next to their fields; failures are always
//! `{ "success": false, "error": "<message>" }`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Errors that know which HTTP status they surface as.
pub trait HttpFailure: std::fmt::Display {
    fn status_code(&self) -> StatusCode;

    /// Message shown to the client. Server-side failures may hide details here.
    fn public_message(&self) -> String {
        self.to_string()
    }
}

pub fn success(body: Value) -> Response {
    success_with_status(StatusCode::OK, body)
}

pub fn success_with_status(status: StatusCode, body: Value) -> Response {
    let body = match body {
        Value::Object(mut fields) => {
            fields.insert("success".to_string(), Value::Bool(true));
            Value::Object(fields)
        }
        other => json!({ "success": true, "data": other }),
    };
    (status, Json(body)).into_response()
}

pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "success": false,
        "error": message.into(),
    });
    (status, Json(payload)).into_response()
}

/// Converts a domain error into the failure envelope, logging server-side faults.
pub fn failure_from<E: HttpFailure>(error: &E) -> Response {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(%status, error = %error, "request failed");
    } else {
        tracing::debug!(%status, error = %error, "request rejected");
    }
    failure(status, error.public_message())
}

/// Maps a malformed JSON body onto the failure envelope instead of axum's plain-text reply.
pub fn invalid_body(rejection: JsonRejection) -> Response {
    let message = rejection.body_text();
    tracing::debug!(error = %message, "malformed request body");
    failure(StatusCode::BAD_REQUEST, message)
}

pub(crate) mod de {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(serde_json::Number),
        Text(String),
    }

    /// Accepts `12`, `"12"`, `""` and `null`, the way HTML forms post numbers.
    pub(crate) fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        match Option::<Loose>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Loose::Number(number)) => number
                .to_string()
                .parse::<T>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("'{number}' is not a valid number"))),
            Some(Loose::Text(text)) => {
                let trimmed = text.trim().replace(',', "");
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<T>()
                    .map(Some)
                    .map_err(|_| de::Error::custom(format!("'{text}' is not a valid number")))
            }
        }
    }

    /// Accepts ids posted either as strings or as bare numbers.
    pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Loose>::deserialize(deserializer)? {
            None => None,
            Some(Loose::Number(number)) => Some(number.to_string()),
            Some(Loose::Text(text)) if text.trim().is_empty() => None,
            Some(Loose::Text(text)) => Some(text.trim().to_string()),
        })
    }

    /// Parses enum-like fields through `FromStr`, treating blank strings as absent.
    pub(crate) fn optional_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => text.trim().parse::<T>().map(Some).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn success_marks_object_payloads() {
        let response = success(json!({ "leadId": "abc" }));
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["leadId"], json!("abc"));
    }

    #[tokio::test]
    async fn failure_uses_error_envelope() {
        let response = failure(StatusCode::NOT_FOUND, "Builder not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "success": false, "error": "Builder not found" }));
    }

    #[derive(serde::Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "de::optional_number")]
        price: Option<u64>,
        #[serde(default, deserialize_with = "de::optional_id")]
        property_id: Option<String>,
    }

    #[test]
    fn loose_numbers_accept_form_strings() {
        let form: Form =
            serde_json::from_value(json!({ "price": "4,500,000", "property_id": 42 }))
                .expect("form parses");
        assert_eq!(form.price, Some(4_500_000));
        assert_eq!(form.property_id.as_deref(), Some("42"));

        let blank: Form = serde_json::from_value(json!({ "price": "" })).expect("form parses");
        assert_eq!(blank.price, None);
        assert!(serde_json::from_value::<Form>(json!({ "price": "cheap" })).is_err());
    }
}
