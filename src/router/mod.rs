pub mod orders;
pub mod products;
pub mod reviews;
pub mod status;
pub mod users;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use mongodb::bson::{Bson, Document};
use serde_json::Value;

use crate::ServerError;

/// JSON request body as an untyped document.
///
/// An empty body reads as an empty document, like a JSON body parser that
/// found nothing to parse. Anything else must be a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body(pub Document);

impl<S> FromRequest<S> for Body
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Body(Document::new()));
        }

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|err| ServerError::ParsingBody(Box::new(err)))?;

        match Bson::try_from(value) {
            Ok(Bson::Document(document)) => Ok(Body(document)),
            Ok(other) => Err(ServerError::ParsingBody(
                format!("expected a JSON object, found {:?}", other.element_type()).into(),
            )),
            Err(err) => Err(ServerError::ParsingBody(Box::new(err))),
        }
    }
}

impl Body {
    /// Value of a top-level field, `null` when absent.
    pub fn field(&self, key: &str) -> Bson {
        self.0.get(key).cloned().unwrap_or(Bson::Null)
    }
}

/// Answer unmatched paths.
pub async fn fallback() -> ServerError {
    ServerError::NotFound
}

#[cfg(test)]
pub(crate) fn state() -> crate::AppState {
    use std::sync::Arc;

    crate::AppState {
        db: crate::database::Database::with_store(Arc::new(
            crate::database::memory::MemoryStore::default(),
        )),
    }
}

#[cfg(test)]
pub(crate) async fn body_json(response: axum::http::Response<axum::body::Body>) -> Value {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
