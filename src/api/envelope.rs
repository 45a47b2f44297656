use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::error::PortalError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default, alias = "pages")]
    pub total_pages: u32,
    #[serde(default, alias = "totalItems")]
    pub total: u32,
}

/// A collection response unwrapped from whichever envelope the endpoint uses.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    pub items: Vec<Value>,
    pub pagination: Option<Pagination>,
}

/// Unwrap a collection from `{key: [...]}`, `{data: {key, pagination}}`,
/// `{success, data: [...]}` or a bare array.
///
/// A missing key yields an empty collection. `success: false` is an error.
pub fn extract_collection(body: &Value, keys: &[&str]) -> Result<Envelope, PortalError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("request was not successful");
        return Err(PortalError::Api(message.to_string()));
    }

    let data = body.get("data");
    let items = find_items(body, keys)
        .or_else(|| data.and_then(|d| find_items(d, keys)))
        .unwrap_or_else(|| {
            debug!("No collection under {:?}, treating as empty", keys);
            Vec::new()
        });

    let pagination = data
        .and_then(|d| d.get("pagination"))
        .or_else(|| body.get("pagination"))
        .and_then(|p| serde_json::from_value(p.clone()).ok());

    Ok(Envelope { items, pagination })
}

fn find_items(value: &Value, keys: &[&str]) -> Option<Vec<Value>> {
    if let Value::Array(items) = value {
        return Some(items.clone());
    }
    keys.iter()
        .find_map(|key| value.get(key).and_then(Value::as_array))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_key() {
        let body = json!({"recipes": [{"id": 1}, {"id": 2}]});
        assert_eq!(extract_collection(&body, &["recipes"]).unwrap().items.len(), 2);
    }

    #[test]
    fn test_nested_data_with_pagination() {
        let body = json!({
            "data": {
                "recipes": [{"id": 1}],
                "pagination": {"page": 2, "totalPages": 5, "total": 49}
            }
        });
        let envelope = extract_collection(&body, &["recipes"]).unwrap();
        assert_eq!(envelope.items.len(), 1);
        assert_eq!(
            envelope.pagination,
            Some(Pagination {
                page: 2,
                total_pages: 5,
                total: 49
            })
        );
    }

    #[test]
    fn test_success_data_array_and_bare_array() {
        let wrapped = json!({"success": true, "data": [{"id": 1}]});
        assert_eq!(extract_collection(&wrapped, &["recipes"]).unwrap().items.len(), 1);
        let bare = json!([{"id": 1}, {"id": 2}, {"id": 3}]);
        assert_eq!(extract_collection(&bare, &["recipes"]).unwrap().items.len(), 3);
    }

    #[test]
    fn test_missing_key_is_empty_not_error() {
        let body = json!({"message": "ok"});
        let envelope = extract_collection(&body, &["recipes"]).unwrap();
        assert!(envelope.items.is_empty());
        assert!(envelope.pagination.is_none());
    }

    #[test]
    fn test_unsuccessful_response_is_error() {
        let body = json!({"success": false, "error": "quota exceeded"});
        let err = extract_collection(&body, &["recipes"]).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_alternate_keys() {
        let body = json!({"meals": [{"id": 1}]});
        assert_eq!(
            extract_collection(&body, &["meals", "recipes"]).unwrap().items.len(),
            1
        );
    }
}
