//! In-process [`DocumentStore`] following MongoDB semantics for the subset
//! of operations the routes issue: top-level equality filters and `$set`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};

use super::{Collection, DocumentStore};
use crate::error::{Result, ServerError};
use crate::model::{DeleteOutcome, InsertOutcome, UpdateOutcome};

const ID: &str = "_id";
const SET: &str = "$set";

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    fn with_collection<T>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut Vec<Document>) -> Result<T>,
    ) -> Result<T> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| ServerError::internal("memory store lock poisoned"))?;

        f(collections.entry(collection).or_default())
    }
}

/// `{field: null}` also matches documents where the field is missing.
fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(value) => value == expected,
        None => *expected == Bson::Null,
    })
}

fn set_fields(update: &Document) -> Result<Document> {
    if let Some(key) = update.keys().find(|key| key.as_str() != SET) {
        return Err(ServerError::internal(format!("unsupported update operator `{key}`")));
    }

    match update.get(SET) {
        Some(Bson::Document(fields)) if !fields.is_empty() => Ok(fields.clone()),
        _ => Err(ServerError::internal("'$set' is empty")),
    }
}

fn insert(documents: &mut Vec<Document>, mut document: Document) -> Result<Bson> {
    let id = match document.get(ID) {
        Some(id) => id.clone(),
        None => {
            let id = Bson::ObjectId(ObjectId::new());
            let mut with_id = Document::new();
            with_id.insert(ID, id.clone());
            with_id.extend(document);
            document = with_id;
            id
        },
    };

    if documents.iter().any(|existing| existing.get(ID) == Some(&id)) {
        return Err(ServerError::internal(format!("duplicate key {id}")));
    }

    documents.push(document);
    Ok(id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertOutcome> {
        self.with_collection(collection, |documents| {
            Ok(InsertOutcome::new(insert(documents, document)?))
        })
    }

    async fn find_one(&self, collection: Collection, filter: Document) -> Result<Option<Document>> {
        self.with_collection(collection, |documents| {
            Ok(documents.iter().find(|document| matches(document, &filter)).cloned())
        })
    }

    async fn find(&self, collection: Collection, filter: Document) -> Result<Vec<Document>> {
        self.with_collection(collection, |documents| {
            Ok(documents
                .iter()
                .filter(|document| matches(document, &filter))
                .cloned()
                .collect())
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome> {
        let fields = set_fields(&update)?;

        self.with_collection(collection, |documents| {
            if let Some(document) = documents.iter_mut().find(|document| matches(document, &filter)) {
                let changed = fields
                    .iter()
                    .any(|(key, value)| document.get(key) != Some(value));
                document.extend(fields);

                return Ok(UpdateOutcome::new(1, u64::from(changed), None));
            }

            if !upsert {
                return Ok(UpdateOutcome::new(0, 0, None));
            }

            let mut document = filter;
            document.extend(fields);
            let id = insert(documents, document)?;

            Ok(UpdateOutcome::new(0, 0, Some(id)))
        })
    }

    async fn delete_one(&self, collection: Collection, filter: Document) -> Result<DeleteOutcome> {
        self.with_collection(collection, |documents| {
            match documents.iter().position(|document| matches(document, &filter)) {
                Some(index) => {
                    documents.remove(index);
                    Ok(DeleteOutcome::new(1))
                },
                None => Ok(DeleteOutcome::new(0)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_id_first() {
        let store = MemoryStore::default();
        let outcome = store
            .insert_one(Collection::Products, doc! { "name": "canoe" })
            .await
            .unwrap();

        let product = store
            .find_one(Collection::Products, doc! {})
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.keys().next().map(String::as_str), Some(ID));
        assert_eq!(
            outcome.inserted_id,
            serde_json::json!(product.get_object_id(ID).unwrap().to_hex())
        );
    }

    #[tokio::test]
    async fn test_null_filter_matches_missing_field() {
        let store = MemoryStore::default();
        store
            .insert_one(Collection::Orders, doc! { "item": "paddle" })
            .await
            .unwrap();
        store
            .insert_one(Collection::Orders, doc! { "item": "oar", "author": "bob" })
            .await
            .unwrap();

        let orders = store
            .find(Collection::Orders, doc! { "author": Bson::Null })
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].get_str("item").unwrap(), "paddle");
    }

    #[tokio::test]
    async fn test_update_counts() {
        let store = MemoryStore::default();
        store
            .insert_one(Collection::Users, doc! { "email": "a@b.c" })
            .await
            .unwrap();

        let update = doc! { "$set": { "role": "admin" } };
        let first = store
            .update_one(Collection::Users, doc! { "email": "a@b.c" }, update.clone(), false)
            .await
            .unwrap();
        assert_eq!((first.matched_count, first.modified_count), (1, 1));

        let second = store
            .update_one(Collection::Users, doc! { "email": "a@b.c" }, update.clone(), false)
            .await
            .unwrap();
        assert_eq!((second.matched_count, second.modified_count), (1, 0));

        let missing = store
            .update_one(Collection::Users, doc! { "email": "x@y.z" }, update, false)
            .await
            .unwrap();
        assert_eq!((missing.matched_count, missing.upserted_count), (0, 0));
    }

    #[tokio::test]
    async fn test_upsert_keeps_filter_id() {
        let store = MemoryStore::default();
        let id = ObjectId::new();

        let outcome = store
            .update_one(
                Collection::Orders,
                doc! { "_id": id },
                doc! { "$set": { "status": "Shipped" } },
                true,
            )
            .await
            .unwrap();
        assert_eq!(outcome.upserted_id, Some(serde_json::json!(id.to_hex())));

        let order = store
            .find_one(Collection::Orders, doc! { "_id": id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.get_str("status").unwrap(), "Shipped");
    }

    #[tokio::test]
    async fn test_rejects_empty_set() {
        let store = MemoryStore::default();
        let result = store
            .update_one(Collection::Users, doc! {}, doc! { "$set": {} }, true)
            .await;
        assert!(result.is_err());
    }
}
