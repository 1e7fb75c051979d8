//! Composite identifier codec.
//!
//! An identifier is the partition segment, optionally followed by the table's separator and the
//! sort segment: `a12$1570354849343`.

mod codec;
mod types;

pub use codec::{
    cast, combine_keys, decode, encode, id_of_item, key_of_item, parse_number, to_key,
};
pub use types::{Key, KeyValue, TypedKey};
