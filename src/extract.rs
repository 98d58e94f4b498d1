//! Request extraction shared by every endpoint.
//!
//! Bodies are taken as a JSON object first so that required-field checks can
//! name every missing key at once, then decoded into the typed request. Path
//! parameters go through [`Path`] so a malformed id gets the same JSON error
//! body as everything else.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::AppError;

pub struct JsonBody(pub Map<String, Value>);

/// `axum::extract::Path` with an [`AppError`] rejection. The offending
/// segment is not echoed back.
#[derive(Debug)]
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(PathRejection::FailedToDeserializePathParams(_)) => Err(AppError::validation(
                "Resource ids in the URL must be integers",
            )),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "path extraction failed: {}",
                e.body_text()
            ))),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(Value::Object(map))) => Ok(JsonBody(map)),
            Ok(_) => Err(AppError::validation("Request body must be a JSON object")),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(AppError::validation(
                "Your content-type must be application/json",
            )),
            Err(e) => Err(AppError::validation(e.body_text())),
        }
    }
}

impl JsonBody {
    /// Fail with every absent key listed, in the order given.
    pub fn require(&self, fields: &[&str]) -> Result<(), AppError> {
        let missing = missing_fields(&self.0, fields);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(format!(
                "{} must be in the request body",
                missing.join(",")
            )))
        }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, AppError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))
    }

    /// `require` then `decode`.
    pub fn parse<T: DeserializeOwned>(self, fields: &[&str]) -> Result<T, AppError> {
        self.require(fields)?;
        self.decode()
    }
}

pub fn missing_fields<'a>(body: &Map<String, Value>, fields: &[&'a str]) -> Vec<&'a str> {
    fields
        .iter()
        .copied()
        .filter(|f| !body.contains_key(*f))
        .collect()
}

/// For patch fields on nullable columns: absent stays `None`, explicit
/// `null` becomes `Some(None)`. Use with `#[serde(default)]`.
pub fn nullable<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}
