use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Per-creative options handed to a session explicitly (the page-level `MI.options` object).
#[derive(Debug, Clone, PartialEq)]
pub struct StudioOptions(Value);

impl Default for StudioOptions {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl StudioOptions {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(raw: &str) -> crate::Result<Self> {
        serde_json::from_str(raw)
            .map(Self)
            .map_err(crate::Error::InvalidOptions)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.get(dotted_path)?.as_f64()
    }

    /// Flattens the `fields` list (`[{name, value}]`) into `name -> value`. Non-string values are
    /// rendered as JSON text; entries without a name or with a null value are skipped.
    pub fn fields(&self) -> IndexMap<String, String> {
        let mut out = IndexMap::new();
        let Some(fields) = self.get("fields").and_then(Value::as_array) else {
            return out;
        };
        for field in fields {
            let Some(name) = field.get("name").and_then(Value::as_str) else {
                continue;
            };
            let value = match field.get("value") {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            out.insert(name.to_string(), value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fields_flatten_in_order() {
        let opts = StudioOptions::from_value(json!({
            "foo": "bar",
            "fields": [
                { "name": "headline", "value": "Hello" },
                { "name": "count", "value": 3 },
                { "name": "skipped", "value": null },
                { "value": "nameless" }
            ]
        }));
        let fields = opts.fields();
        assert_eq!(
            fields.into_iter().collect::<Vec<_>>(),
            vec![
                ("headline".to_string(), "Hello".to_string()),
                ("count".to_string(), "3".to_string()),
            ]
        );
        assert_eq!(opts.get_str("foo"), Some("bar"));
    }

    #[test]
    fn typed_getters_follow_dotted_paths() {
        let opts = StudioOptions::from_value(json!({
            "show_badge": true,
            "layout": { "scale": 1.5, "columns": 3, "label": "wide" }
        }));
        assert_eq!(opts.get_bool("show_badge"), Some(true));
        assert_eq!(opts.get_f64("layout.scale"), Some(1.5));
        assert_eq!(opts.get_f64("layout.columns"), Some(3.0));
        assert_eq!(opts.get_str("layout.label"), Some("wide"));
        assert_eq!(opts.get_bool("layout.label"), None);
        assert_eq!(opts.get_f64("layout.missing"), None);
        assert_eq!(opts.get_str("show_badge.deeper"), None);
    }

    #[test]
    fn missing_fields_is_empty() {
        assert!(StudioOptions::default().fields().is_empty());
        assert!(StudioOptions::from_value(json!(null)).fields().is_empty());
    }
}
