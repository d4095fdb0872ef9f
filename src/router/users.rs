//! Users-related HTTP API.

use axum::Json;
use axum::extract::{Path, State};
use mongodb::bson::doc;

use crate::database::{Collection, Database};
use crate::error::Result;
use crate::model::{AdminStatus, InsertOutcome, UpdateOutcome};
use crate::router::Body;

const EMAIL: &str = "email";
const ADMIN_ROLE: &str = "admin";

/// Save a newly registered user.
pub async fn create(State(db): State<Database>, Body(user): Body) -> Result<Json<InsertOutcome>> {
    let result = db
        .run(|store| async move { store.insert_one(Collection::Users, user).await })
        .await?;

    Ok(Json(result))
}

/// Save a user signing in through a third party, keyed by email.
pub async fn upsert(State(db): State<Database>, user: Body) -> Result<Json<UpdateOutcome>> {
    let filter = doc! { EMAIL: user.field(EMAIL) };
    let update = doc! { "$set": user.0 };

    let result = db
        .run(|store| async move { store.update_one(Collection::Users, filter, update, true).await })
        .await?;

    Ok(Json(result))
}

/// Grant the admin role to the user with the given email.
pub async fn make_admin(State(db): State<Database>, user: Body) -> Result<Json<UpdateOutcome>> {
    let filter = doc! { EMAIL: user.field(EMAIL) };
    let update = doc! { "$set": { "role": ADMIN_ROLE } };

    let result = db
        .run(|store| async move { store.update_one(Collection::Users, filter, update, false).await })
        .await?;
    tracing::debug!(?result, "admin role granted");

    Ok(Json(result))
}

/// Tell whether the user with this email is an admin.
pub async fn is_admin(State(db): State<Database>, Path(email): Path<String>) -> Result<Json<AdminStatus>> {
    let user = db
        .run(|store| async move { store.find_one(Collection::Users, doc! { EMAIL: email }).await })
        .await?;

    let admin = user.is_some_and(|user| matches!(user.get_str("role"), Ok(role) if role == ADMIN_ROLE));

    Ok(Json(AdminStatus { admin }))
}

/// `GET /users/admin` shares its path with the admin grant, so it is the
/// lookup for the user whose email is `admin`.
pub async fn is_admin_at_admin_path(db: State<Database>) -> Result<Json<AdminStatus>> {
    is_admin(db, Path(ADMIN_ROLE.to_owned())).await
}
