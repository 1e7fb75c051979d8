use dynaccess_core::expression::{AttributeMap, UpdateExpression};
use dynaccess_core::key::to_key;
use dynaccess_core::store::{Item, UpdateItemInput};
use dynaccess_core::Result;

use super::Access;

impl<E: Send + 'static> Access<E> {
    /// Sets the defined attributes of `updates` on the item and returns the updated attributes.
    ///
    /// Nothing is sent when no attribute is defined.
    pub async fn update_by_id(&self, id: &str, updates: AttributeMap) -> Result<Item> {
        self.update_by_id_with_delete(id, updates, Vec::new()).await
    }

    /// Like [`update_by_id`](Self::update_by_id), additionally removing the named attributes.
    pub async fn update_by_id_with_delete(
        &self,
        id: &str,
        updates: AttributeMap,
        remove: Vec<String>,
    ) -> Result<Item> {
        let key = to_key(id, &self.table)?;
        let update = UpdateExpression::new(updates, remove);
        if update.is_empty() {
            return Ok(Item::new());
        }

        tracing::trace!(
            table = %self.table.name,
            id,
            expression = %update.render().expression,
            "Updating item"
        );

        let updated = self
            .store
            .update_item(UpdateItemInput {
                table_name: self.table.name.clone(),
                key,
                update,
            })
            .await?;
        Ok(updated)
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use std::sync::Arc;

    use serde::Serialize;
    use serde_json::json;

    use dynaccess_core::table::{AccessConfig, KeyAttribute, TableConfig};
    use dynaccess_core::AccessError;

    use super::*;
    use crate::access::ReadOptions;
    use crate::database::Database;
    use crate::storage::inmemory::InMemoryStore;

    fn setup() -> (Arc<InMemoryStore>, Access<Item>) {
        let config = AccessConfig::new(
            3,
            vec![TableConfig::new("Products", "products", KeyAttribute::string("id"))
                .with_sort_key(KeyAttribute::number("timestamp"))],
        );
        let store = Arc::new(InMemoryStore::new(&config.tables));
        let database = Database::new(&config, store.clone()).unwrap();
        (store, database.access("Products").unwrap())
    }

    fn item(value: serde_json::Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    #[derive(Serialize)]
    struct ProductUpdate {
        name: Option<String>,
        price: Option<f64>,
    }

    #[tokio::test]
    async fn test_update_by_id_returns_updated_attributes() {
        let (_, access) = setup();
        access
            .create_raw(item(json!({ "id": "a12", "timestamp": 1, "name": "lamp" })))
            .await
            .unwrap();

        let updated = access
            .update_by_id("a12$1", AttributeMap::new().with("name", "desk lamp"))
            .await
            .unwrap();

        assert_eq!(updated, item(json!({ "name": "desk lamp" })));
        let stored = access
            .get_by_id_raw("a12$1", ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(stored["name"], json!("desk lamp"));
    }

    #[tokio::test]
    async fn test_update_from_partial_struct() {
        let (_, access) = setup();
        access
            .create_raw(item(json!({ "id": "a12", "timestamp": 1, "name": "lamp", "price": 10 })))
            .await
            .unwrap();
        let updates = AttributeMap::from_partial(&ProductUpdate {
            name: None,
            price: Some(12.5),
        })
        .unwrap();

        access.update_by_id("a12$1", updates).await.unwrap();

        let stored = access
            .get_by_id_raw("a12$1", ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(stored["name"], json!("lamp"));
        assert_eq!(stored["price"], json!(12.5));
    }

    #[tokio::test]
    async fn test_update_with_delete_removes_attributes() {
        let (_, access) = setup();
        access
            .create_raw(item(json!({ "id": "a12", "timestamp": 1, "color": "red", "size": "L" })))
            .await
            .unwrap();

        access
            .update_by_id_with_delete(
                "a12$1",
                AttributeMap::new().with("name", "lamp"),
                vec!["color".to_string(), "size".to_string()],
            )
            .await
            .unwrap();

        let stored = access
            .get_by_id_raw("a12$1", ReadOptions::default())
            .await
            .unwrap();
        assert_eq!(
            stored,
            item(json!({ "id": "a12", "timestamp": 1, "name": "lamp" }))
        );
    }

    #[tokio::test]
    async fn test_empty_update_makes_no_call() {
        let (store, access) = setup();

        let updated = access
            .update_by_id_with_delete("a12$1", AttributeMap::new().with_undefined("name"), vec![])
            .await
            .unwrap();

        assert!(updated.is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_malformed_id() {
        let (_, access) = setup();

        let err = access
            .update_by_id("a12", AttributeMap::new().with("name", "lamp"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::MalformedCompositeKey { .. }));
    }
}
