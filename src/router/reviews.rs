//! Customer reviews.

use axum::Json;
use axum::extract::State;
use mongodb::bson::doc;
use serde_json::Value;

use crate::database::{Collection, Database};
use crate::error::Result;
use crate::model::{self, InsertOutcome};
use crate::router::Body;

pub async fn create(State(db): State<Database>, Body(review): Body) -> Result<Json<InsertOutcome>> {
    let result = db
        .run(|store| async move { store.insert_one(Collection::Reviews, review).await })
        .await?;

    Ok(Json(result))
}

pub async fn list(State(db): State<Database>) -> Result<Json<Vec<Value>>> {
    let reviews = db
        .run(|store| async move { store.find(Collection::Reviews, doc! {}).await })
        .await?;

    Ok(Json(reviews.into_iter().map(model::document_to_json).collect()))
}
