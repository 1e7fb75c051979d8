//! Pure building blocks for the dynaccess data-access layer.
//!
//! Nothing in this crate performs I/O. Backends implement [`store::Store`]; the `dynaccess`
//! crate drives them.

pub mod batch;
pub mod error;
pub mod expression;
pub mod key;
pub mod store;
pub mod table;

pub use error::{AccessError, Result, StoreError, StoreResult};
