use std::collections::BTreeMap;

use serde_json::Value;

use super::AttributeMap;

/// `#a = :a, #b = :b` over the defined attributes.
pub fn update_expression(attributes: &AttributeMap) -> String {
    attributes
        .defined()
        .map(|(name, _)| format!("#{name} = :{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `#a, #b` over the given names. Blank names are skipped.
pub fn remove_expression(names: &[String]) -> String {
    names
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| format!("#{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `#a = :a and #b = :b` over the defined attributes.
pub fn filter_expression(attributes: &AttributeMap) -> String {
    attributes
        .defined()
        .map(|(name, _)| format!("#{name} = :{name}"))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// `{"#a": "a"}` over the defined attributes.
pub fn attribute_names(attributes: &AttributeMap) -> BTreeMap<String, String> {
    attributes
        .defined()
        .map(|(name, _)| (format!("#{name}"), name.to_string()))
        .collect()
}

/// `{":a": value}` over the defined attributes.
pub fn attribute_values(attributes: &AttributeMap) -> BTreeMap<String, Value> {
    attributes
        .defined()
        .map(|(name, value)| (format!(":{name}"), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes() -> AttributeMap {
        AttributeMap::new()
            .with("name", "lamp")
            .with_undefined("price")
            .with("stock", 3)
    }

    #[test]
    fn test_update_expression() {
        assert_eq!(
            update_expression(&attributes()),
            "#name = :name, #stock = :stock"
        );
    }

    #[test]
    fn test_filter_expression() {
        assert_eq!(
            filter_expression(&attributes()),
            "#name = :name and #stock = :stock"
        );
    }

    #[test]
    fn test_remove_expression() {
        let names = vec!["color".to_string(), String::new(), "size".to_string()];
        assert_eq!(remove_expression(&names), "#color, #size");
    }

    #[test]
    fn test_names_and_values_skip_undefined() {
        let names = attribute_names(&attributes());
        let values = attribute_values(&attributes());

        assert_eq!(names.len(), 2);
        assert_eq!(names.get("#name"), Some(&"name".to_string()));
        assert!(!names.contains_key("#price"));

        assert_eq!(values.len(), 2);
        assert_eq!(values.get(":stock"), Some(&json!(3)));
        assert!(!values.contains_key(":price"));
    }

    #[test]
    fn test_one_undefined_among_many() {
        let mut attributes = AttributeMap::new();
        for i in 0..5 {
            attributes.insert(format!("f{i}"), Some(json!(i)));
        }
        attributes.insert("skipped", None);

        assert_eq!(attribute_names(&attributes).len(), 5);
        assert_eq!(attribute_values(&attributes).len(), 5);
        assert_eq!(update_expression(&attributes).split(", ").count(), 5);
        assert_eq!(filter_expression(&attributes).split(" and ").count(), 5);
    }

    #[test]
    fn test_empty_input() {
        let empty = AttributeMap::new();
        assert_eq!(update_expression(&empty), "");
        assert_eq!(filter_expression(&empty), "");
        assert!(attribute_names(&empty).is_empty());
        assert_eq!(remove_expression(&[]), "");
    }
}
