mod traits;
mod types;

pub use traits::Store;
pub use types::{
    GetItemInput, Item, Page, QueryInput, ScanInput, UpdateItemInput, WriteRequest,
};
