//! Document store shared by every route.
#[cfg(test)]
pub mod memory;
pub mod mongo;

use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::extract::FromRef;
use mongodb::bson::Document;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::model::{DeleteOutcome, InsertOutcome, UpdateOutcome};

/// Collections persisted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Products,
    Orders,
    Reviews,
}

impl Collection {
    /// Name of the collection inside the database.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Products => "products",
            Collection::Orders => "orders",
            Collection::Reviews => "review",
        }
    }
}

/// Port for single-call document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, the store assigns `_id` when missing.
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertOutcome>;

    /// Find the first document matching `filter`.
    async fn find_one(&self, collection: Collection, filter: Document) -> Result<Option<Document>>;

    /// Find every document matching `filter`.
    async fn find(&self, collection: Collection, filter: Document) -> Result<Vec<Document>>;

    /// Apply `update` to the first document matching `filter`.
    /// With `upsert`, a missing document is created from the filter and the update.
    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome>;

    /// Delete the first document matching `filter`.
    async fn delete_one(&self, collection: Collection, filter: Document) -> Result<DeleteOutcome>;
}

/// Custom db structure to pass to Axum.
///
/// The store is attached once the background connection succeeds; until then
/// every call fails with [`ServerError::StoreUnavailable`].
#[derive(Clone, Default)]
pub struct Database {
    store: Arc<OnceLock<Arc<dyn DocumentStore>>>,
}

impl Database {
    /// Database without store, waiting for [`Database::attach`].
    pub fn pending() -> Self {
        Self::default()
    }

    /// Database already backed by `store`.
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let database = Self::default();
        database.attach(store);
        database
    }

    /// Attach the connected store. Returns `false` if one was already attached.
    pub fn attach(&self, store: Arc<dyn DocumentStore>) -> bool {
        self.store.set(store).is_ok()
    }

    /// Whether a store is attached.
    pub fn is_connected(&self) -> bool {
        self.store.get().is_some()
    }

    /// Connect to MongoDB on a background task and attach the store on success.
    pub fn connect_in_background(&self, uri: String) -> tokio::task::JoinHandle<()> {
        let database = self.clone();

        tokio::spawn(async move {
            match mongo::MongoStore::connect(&uri).await {
                Ok(store) => {
                    database.attach(Arc::new(store));
                    tracing::info!(db = crate::config::DATABASE_NAME, "connected to database");
                },
                Err(err) => {
                    tracing::error!(error = %err, "cannot connect to database, store routes will answer 503");
                },
            }
        })
    }

    /// Run one store call.
    ///
    /// The call is spawned so it completes even when the client goes away
    /// before the response is written.
    pub async fn run<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn DocumentStore>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.get().cloned().ok_or(ServerError::StoreUnavailable)?;

        tokio::spawn(call(store)).await.map_err(|err| ServerError::Internal {
            details: "store call did not complete".into(),
            source: Some(Box::new(err)),
        })?
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app_state: &AppState) -> Database {
        app_state.db.clone()
    }
}
