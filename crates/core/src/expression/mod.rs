//! Placeholder-based expressions: every attribute `a` is referenced as `#a` with its value bound
//! to `:a`.

mod attributes;
mod builder;
mod types;

pub use attributes::AttributeMap;
pub use builder::{
    attribute_names, attribute_values, filter_expression, remove_expression, update_expression,
};
pub use types::{ArrayContains, Filter, KeyCondition, Rendered, UpdateExpression};
