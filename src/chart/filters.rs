// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom template filters for the chart package.

use minijinja::{Error, ErrorKind, Value};

/// `tojson` - serialize a value as compact JSON.
///
/// JSON is a subset of YAML, so the chart templates use this to splice
/// structured values (node selectors, tolerations, security contexts) into a
/// manifest as a single scalar line.
pub fn tojson(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(|err| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("could not serialize value to JSON: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tojson_maps_and_lists() {
        let value = Value::from_serialize(serde_json::json!({"a": [1, 2], "b": "x"}));
        let rendered = tojson(value).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, serde_json::json!({"a": [1, 2], "b": "x"}));
    }

    #[test]
    fn test_tojson_scalars() {
        assert_eq!(tojson(Value::from(true)).unwrap(), "true");
        assert_eq!(tojson(Value::from("s")).unwrap(), "\"s\"");
    }
}
