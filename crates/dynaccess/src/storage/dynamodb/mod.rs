//! DynamoDB storage backend.
//!
//! Implements [`Store`](dynaccess_core::store::Store) over `aws-sdk-dynamodb`. Items cross the
//! boundary through `serde_dynamo`; keys are mapped by hand since their scalar type is known.

mod client;
mod conversions;
mod error;
mod store;

pub use client::{create_client, AwsConfig};
pub use store::DynamoDbStore;
