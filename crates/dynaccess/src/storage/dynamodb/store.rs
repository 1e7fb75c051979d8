use async_trait::async_trait;
use aws_sdk_dynamodb::types::{KeysAndAttributes, ReturnValue};
use aws_sdk_dynamodb::Client;
use tokio::sync::OnceCell;

use dynaccess_core::expression::Filter;
use dynaccess_core::key::Key;
use dynaccess_core::store::{
    GetItemInput, Item, Page, QueryInput, ScanInput, Store, UpdateItemInput, WriteRequest,
};
use dynaccess_core::{StoreError, StoreResult};

use super::client::{create_client, AwsConfig};
use super::conversions::{
    attributes_to_item, attributes_to_items, attributes_to_key, expression_names,
    expression_values, item_to_attributes, key_to_attributes, write_request_from_sdk,
    write_request_to_sdk, Attributes,
};
use super::error::{
    map_batch_get_error, map_batch_write_error, map_build_error, map_delete_item_error,
    map_get_item_error, map_put_item_error, map_query_error, map_scan_error,
    map_update_item_error,
};

/// DynamoDB-backed store.
///
/// Holds either a ready client or the configuration to build one on first use.
pub struct DynamoDbStore {
    client: OnceCell<Client>,
    config: AwsConfig,
}

impl DynamoDbStore {
    /// Creates a store over an existing client.
    pub fn new(client: Client) -> Self {
        Self {
            client: OnceCell::new_with(Some(client)),
            config: AwsConfig::default(),
        }
    }

    /// Creates a store whose client is built from `config` on the first request.
    pub fn lazy(config: AwsConfig) -> Self {
        Self {
            client: OnceCell::new(),
            config,
        }
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                tracing::debug!(endpoint = %self.config.target_display(), "Creating DynamoDB client");
                create_client(&self.config).await
            })
            .await
    }
}

impl std::fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbStore")
            .field("config", &self.config)
            .field("connected", &self.client.initialized())
            .finish()
    }
}

fn page_key(attributes: Option<Attributes>) -> StoreResult<Option<Key>> {
    match attributes {
        Some(attributes) if !attributes.is_empty() => Ok(Some(attributes_to_key(&attributes)?)),
        _ => Ok(None),
    }
}

#[async_trait]
impl Store for DynamoDbStore {
    async fn get_item(&self, input: GetItemInput) -> StoreResult<Option<Item>> {
        let result = self
            .client()
            .await
            .get_item()
            .table_name(&input.table_name)
            .set_key(Some(key_to_attributes(&input.key)))
            .consistent_read(input.consistent_read)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, &input.table_name))?;

        result.item.map(attributes_to_item).transpose()
    }

    async fn put_item(&self, table_name: &str, item: Item) -> StoreResult<()> {
        self.client()
            .await
            .put_item()
            .table_name(table_name)
            .set_item(Some(item_to_attributes(&item)?))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table_name))?;

        Ok(())
    }

    async fn delete_item(&self, table_name: &str, key: Key) -> StoreResult<()> {
        let Some(key_name) = key.keys().next().cloned() else {
            return Err(StoreError::InvalidData("Delete key is empty".to_string()));
        };

        self.client()
            .await
            .delete_item()
            .table_name(table_name)
            .set_key(Some(key_to_attributes(&key)))
            .condition_expression("attribute_exists(#key)")
            .expression_attribute_names("#key", key_name)
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, table_name))?;

        Ok(())
    }

    async fn update_item(&self, input: UpdateItemInput) -> StoreResult<Item> {
        let rendered = input.update.render();

        let result = self
            .client()
            .await
            .update_item()
            .table_name(&input.table_name)
            .set_key(Some(key_to_attributes(&input.key)))
            .update_expression(rendered.expression)
            .set_expression_attribute_names(expression_names(&rendered.names))
            .set_expression_attribute_values(expression_values(&rendered.values)?)
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, &input.table_name))?;

        match result.attributes {
            Some(attributes) => attributes_to_item(attributes),
            None => Ok(Item::new()),
        }
    }

    async fn query(&self, input: QueryInput) -> StoreResult<Page> {
        let rendered = input.condition.render();

        let result = self
            .client()
            .await
            .query()
            .table_name(&input.table_name)
            .key_condition_expression(rendered.expression)
            .set_expression_attribute_names(expression_names(&rendered.names))
            .set_expression_attribute_values(expression_values(&rendered.values)?)
            .set_exclusive_start_key(input.exclusive_start_key.as_ref().map(key_to_attributes))
            .send()
            .await
            .map_err(|e| map_query_error(e, &input.table_name))?;

        Ok(Page {
            items: attributes_to_items(result.items.unwrap_or_default())?,
            last_evaluated_key: page_key(result.last_evaluated_key)?,
        })
    }

    async fn scan(&self, input: ScanInput) -> StoreResult<Page> {
        let rendered = input.filter.as_ref().and_then(Filter::render);

        let mut request = self
            .client()
            .await
            .scan()
            .table_name(&input.table_name)
            .set_exclusive_start_key(input.exclusive_start_key.as_ref().map(key_to_attributes));
        if let Some(rendered) = rendered {
            request = request
                .filter_expression(rendered.expression)
                .set_expression_attribute_names(expression_names(&rendered.names))
                .set_expression_attribute_values(expression_values(&rendered.values)?);
        }

        let result = request
            .send()
            .await
            .map_err(|e| map_scan_error(e, &input.table_name))?;

        Ok(Page {
            items: attributes_to_items(result.items.unwrap_or_default())?,
            last_evaluated_key: page_key(result.last_evaluated_key)?,
        })
    }

    async fn batch_get_item(&self, table_name: &str, keys: Vec<Key>) -> StoreResult<Vec<Item>> {
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys.iter().map(key_to_attributes).collect()))
            .build()
            .map_err(map_build_error)?;

        let result = self
            .client()
            .await
            .batch_get_item()
            .request_items(table_name, keys_and_attributes)
            .send()
            .await
            .map_err(|e| map_batch_get_error(e, table_name))?;

        let unprocessed: usize = result
            .unprocessed_keys
            .iter()
            .flat_map(|tables| tables.values())
            .map(|pending| pending.keys.len())
            .sum();
        if unprocessed > 0 {
            tracing::warn!(table = table_name, unprocessed, "Batch get left keys unprocessed");
        }

        let items = result
            .responses
            .and_then(|mut responses| responses.remove(table_name))
            .unwrap_or_default();
        attributes_to_items(items)
    }

    async fn batch_write_item(
        &self,
        table_name: &str,
        requests: Vec<WriteRequest>,
    ) -> StoreResult<Vec<WriteRequest>> {
        let requests = requests
            .iter()
            .map(write_request_to_sdk)
            .collect::<StoreResult<Vec<_>>>()?;

        let result = self
            .client()
            .await
            .batch_write_item()
            .set_request_items(Some([(table_name.to_string(), requests)].into()))
            .send()
            .await
            .map_err(|e| map_batch_write_error(e, table_name))?;

        result
            .unprocessed_items
            .and_then(|mut tables| tables.remove(table_name))
            .unwrap_or_default()
            .into_iter()
            .map(write_request_from_sdk)
            .collect()
    }
}
