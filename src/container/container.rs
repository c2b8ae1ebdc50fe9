use serde_json::{Map, Value};

/// Key under which non-container values are wrapped when stored.
pub const CONTENT_KEY: &str = "_content";

/// Returns true when the value can hold named or indexed children.
pub fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Coerce a value into container form.
///
/// `Null` becomes an empty object, objects and arrays pass through
/// unchanged, and any other value is wrapped as `{"_content": value}` so
/// primitive payloads can live in a store without the caller knowing.
pub fn ensure_container(value: Value) -> Value {
    match value {
        Value::Null => Value::Object(Map::new()),
        value if is_container(&value) => value,
        value => {
            let mut wrapped = Map::new();
            wrapped.insert(CONTENT_KEY.to_string(), value);
            Value::Object(wrapped)
        }
    }
}

/// Clone the wrapped content of a container, or the container itself when
/// no `_content` key is present.
pub fn content_of(value: &Value) -> Value {
    match value.get(CONTENT_KEY) {
        Some(content) => content.clone(),
        None => value.clone(),
    }
}

/// Read a nested value by dotted path.
///
/// The path is split on `.` and each segment descends one level; numeric
/// segments index into arrays. Returns `None` as soon as any segment is
/// missing. An empty path yields the container itself.
pub fn get_nested<'a>(container: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(container);
    }
    let mut current = container;
    for segment in path.split('.') {
        current = match current {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i))?,
            other => other.get(segment)?,
        };
    }
    Some(current)
}

/// Write a nested value by dotted path, creating empty-object intermediates
/// as needed.
///
/// A non-object intermediate on the path is replaced with an empty object
/// before descending through it.
pub fn set_nested(container: &mut Value, path: &str, value: Value) {
    let mut current = container;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let map = object_mut(current);
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    value.as_object_mut().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ensure_container_wraps_primitives() {
        assert_eq!(ensure_container(json!("hello")), json!({"_content": "hello"}));
        assert_eq!(ensure_container(json!(42)), json!({"_content": 42}));
        assert_eq!(ensure_container(json!(false)), json!({"_content": false}));
    }

    #[test]
    fn ensure_container_passes_containers_through() {
        assert_eq!(ensure_container(json!({"a": 1})), json!({"a": 1}));
        assert_eq!(ensure_container(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn ensure_container_turns_null_into_empty_object() {
        assert_eq!(ensure_container(Value::Null), json!({}));
    }

    #[test]
    fn content_of_unwraps_wrapped_values() {
        assert_eq!(content_of(&json!({"_content": "hello"})), json!("hello"));
        assert_eq!(content_of(&json!({"a": 1})), json!({"a": 1}));
        assert_eq!(content_of(&json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn get_nested_descends_objects_and_arrays() {
        let container = json!({
            "user": {
                "kids": ["tim", "kim"],
                "address": {"street": "Somestreet 1"}
            }
        });
        assert_eq!(
            get_nested(&container, "user.address.street"),
            Some(&json!("Somestreet 1"))
        );
        assert_eq!(get_nested(&container, "user.kids.1"), Some(&json!("kim")));
    }

    #[test]
    fn get_nested_returns_none_for_missing_segments() {
        let container = json!({"user": {"name": "jon"}});
        assert_eq!(get_nested(&container, "user.age"), None);
        assert_eq!(get_nested(&container, "account.id"), None);
        assert_eq!(get_nested(&container, "user.name.first"), None);
    }

    #[test]
    fn get_nested_with_empty_path_yields_container() {
        let container = json!({"a": 1});
        assert_eq!(get_nested(&container, ""), Some(&container));
    }

    #[test]
    fn set_nested_creates_intermediates_and_keeps_siblings() {
        let mut container = json!({"user": {"username": "jon"}});
        set_nested(&mut container, "user.address.street", json!("Main St"));
        assert_eq!(
            container,
            json!({"user": {"username": "jon", "address": {"street": "Main St"}}})
        );
    }

    #[test]
    fn set_nested_replaces_non_object_intermediates() {
        let mut container = json!({"user": "not-an-object"});
        set_nested(&mut container, "user.name", json!("jon"));
        assert_eq!(container, json!({"user": {"name": "jon"}}));
    }

    #[test]
    fn set_nested_overwrites_existing_leaf() {
        let mut container = json!({"user": {"address": {"street": "Somestreet 1"}}});
        set_nested(&mut container, "user.address.street", json!("Otherstreet 2"));
        assert_eq!(
            get_nested(&container, "user.address.street"),
            Some(&json!("Otherstreet 2"))
        );
    }
}
