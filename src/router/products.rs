//! Products catalogue.

use axum::Json;
use axum::extract::{Path, State};
use mongodb::bson::doc;
use serde_json::Value;

use crate::database::{Collection, Database};
use crate::error::Result;
use crate::model::{self, DeleteOutcome, InsertOutcome};
use crate::router::Body;

pub async fn list(State(db): State<Database>) -> Result<Json<Vec<Value>>> {
    let products = db
        .run(|store| async move { store.find(Collection::Products, doc! {}).await })
        .await?;

    Ok(Json(products.into_iter().map(model::document_to_json).collect()))
}

/// Single product, `null` when the id matches nothing.
pub async fn get(State(db): State<Database>, Path(id): Path<String>) -> Result<Json<Option<Value>>> {
    let filter = doc! { "_id": model::object_id(&id)? };

    let product = db
        .run(|store| async move { store.find_one(Collection::Products, filter).await })
        .await?;

    Ok(Json(product.map(model::document_to_json)))
}

pub async fn create(State(db): State<Database>, Body(product): Body) -> Result<Json<InsertOutcome>> {
    tracing::debug!(?product, "adding product");

    let result = db
        .run(|store| async move { store.insert_one(Collection::Products, product).await })
        .await?;
    tracing::debug!(?result, "product added");

    Ok(Json(result))
}

pub async fn delete(State(db): State<Database>, Path(id): Path<String>) -> Result<Json<DeleteOutcome>> {
    let filter = doc! { "_id": model::object_id(&id)? };

    let result = db
        .run(|store| async move { store.delete_one(Collection::Products, filter).await })
        .await?;

    Ok(Json(result))
}
