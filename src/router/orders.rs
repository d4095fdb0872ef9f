//! Orders placed by customers and their shipping status.

use axum::Json;
use axum::extract::{Path, State};
use mongodb::bson::doc;
use serde_json::Value;

use crate::database::{Collection, Database};
use crate::error::Result;
use crate::model::{self, DeleteOutcome, InsertOutcome, UpdateOutcome};
use crate::router::Body;

pub const SHIPPED: &str = "Shipped";

pub async fn list(State(db): State<Database>) -> Result<Json<Vec<Value>>> {
    let orders = db
        .run(|store| async move { store.find(Collection::Orders, doc! {}).await })
        .await?;

    Ok(Json(orders.into_iter().map(model::document_to_json).collect()))
}

pub async fn create(State(db): State<Database>, Body(order): Body) -> Result<Json<InsertOutcome>> {
    let result = db
        .run(|store| async move { store.insert_one(Collection::Orders, order).await })
        .await?;

    Ok(Json(result))
}

/// Orders whose `author` equals the body's `author`.
pub async fn mine(State(db): State<Database>, body: Body) -> Result<Json<Vec<Value>>> {
    let filter = doc! { "author": body.field("author") };

    let orders = db
        .run(|store| async move { store.find(Collection::Orders, filter).await })
        .await?;

    Ok(Json(orders.into_iter().map(model::document_to_json).collect()))
}

pub async fn delete(State(db): State<Database>, Path(id): Path<String>) -> Result<Json<DeleteOutcome>> {
    let filter = doc! { "_id": model::object_id(&id)? };

    let result = db
        .run(|store| async move { store.delete_one(Collection::Orders, filter).await })
        .await?;

    Ok(Json(result))
}

/// Mark an order as shipped, creating it when the id is unknown.
pub async fn ship(State(db): State<Database>, Path(id): Path<String>) -> Result<Json<UpdateOutcome>> {
    let filter = doc! { "_id": model::object_id(&id)? };
    let update = doc! { "$set": { "status": SHIPPED } };

    let result = db
        .run(|store| async move { store.update_one(Collection::Orders, filter, update, true).await })
        .await?;

    Ok(Json(result))
}
