//! MongoDB backed [`DocumentStore`].

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use super::{Collection, DocumentStore};
use crate::config::DATABASE_NAME;
use crate::error::Result;
use crate::model::{DeleteOutcome, InsertOutcome, UpdateOutcome};

/// Give up on an unreachable deployment before the HTTP request times out,
/// so the client gets the store error.
pub const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Store talking to one MongoDB database through a pooled client.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Open the client and check the deployment answers a `ping`.
    pub async fn connect(uri: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let client = Client::with_options(options)?;
        let db = client.database(DATABASE_NAME);

        db.run_command(doc! { "ping": 1 }).await?;

        Ok(Self { db })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(collection.name())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertOutcome> {
        let result = self.collection(collection).insert_one(document).await?;
        Ok(result.into())
    }

    async fn find_one(&self, collection: Collection, filter: Document) -> Result<Option<Document>> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    async fn find(&self, collection: Collection, filter: Document) -> Result<Vec<Document>> {
        let mut cursor = self.collection(collection).find(filter).await?;

        let mut documents = Vec::new();
        while cursor.advance().await? {
            documents.push(cursor.deserialize_current()?);
        }

        Ok(documents)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_one(filter, update)
            .upsert(upsert)
            .await?;

        Ok(result.into())
    }

    async fn delete_one(&self, collection: Collection, filter: Document) -> Result<DeleteOutcome> {
        let result = self.collection(collection).delete_one(filter).await?;
        Ok(result.into())
    }
}
