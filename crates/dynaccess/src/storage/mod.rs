//! Storage backends implementing [`Store`](dynaccess_core::store::Store).
//!
//! Backends are selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb` and `serde_dynamo`
//! - `inmemory` (default): `BTreeMap` backend for tests and local development
//!
//! Both can be enabled at once; the backend is chosen when the [`Database`](crate::Database)
//! is created.

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;
