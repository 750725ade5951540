use crate::dom::NodeId;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag type discriminator. Unknown types are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TagKind {
    Image,
    Text,
    Other(String),
}

impl From<String> for TagKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => Self::Image,
            "text" => Self::Text,
            _ => Self::Other(value),
        }
    }
}

impl From<TagKind> for String {
    fn from(value: TagKind) -> Self {
        match value {
            TagKind::Image => "image".to_string(),
            TagKind::Text => "text".to_string(),
            TagKind::Other(s) => s,
        }
    }
}

/// A tag as serialized in the creative's attributes element: nested, with unknown fields kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSource {
    /// Empty when the source has no usable id; such a tag never binds to an element.
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub fallback_text: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size: Option<f64>,
    #[serde(
        default,
        deserialize_with = "de_opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_font_size: Option<f64>,
    #[serde(default, deserialize_with = "de_flag")]
    pub autoresize: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "de_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<TagKind>,
    #[serde(default, deserialize_with = "de_flag")]
    pub is_cropped: bool,
    #[serde(default, deserialize_with = "de_number")]
    pub top: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub left: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub width: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub height: f64,
    #[serde(default, deserialize_with = "de_subtags", skip_serializing_if = "Vec::is_empty")]
    pub subtags: Vec<TagSource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The unit of renderable content, as held by a [`crate::TagTree`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub text: Option<String>,
    pub fallback_text: Option<String>,
    pub font_size: Option<f64>,
    pub minimum_font_size: Option<f64>,
    pub autoresize: bool,
    pub background_image: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TagKind>,
    pub is_cropped: bool,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Element bound at parse time. Weak: it may have left the document since.
    #[serde(skip)]
    pub element: Option<NodeId>,
}

impl Tag {
    /// Splits a serialized tag from its children.
    pub fn from_source(source: TagSource) -> (Self, Vec<TagSource>) {
        let TagSource {
            id,
            text,
            fallback_text,
            font_size,
            minimum_font_size,
            autoresize,
            background_image,
            kind,
            is_cropped,
            top,
            left,
            width,
            height,
            subtags,
            extra,
        } = source;
        (
            Self {
                id,
                text,
                fallback_text,
                font_size,
                minimum_font_size,
                autoresize,
                background_image,
                kind,
                is_cropped,
                top,
                left,
                width,
                height,
                extra,
                element: None,
            },
            subtags,
        )
    }

    pub fn to_source(&self, subtags: Vec<TagSource>) -> TagSource {
        TagSource {
            id: self.id.clone(),
            text: self.text.clone(),
            fallback_text: self.fallback_text.clone(),
            font_size: self.font_size,
            minimum_font_size: self.minimum_font_size,
            autoresize: self.autoresize,
            background_image: self.background_image.clone(),
            kind: self.kind.clone(),
            is_cropped: self.is_cropped,
            top: self.top,
            left: self.left,
            width: self.width,
            height: self.height,
            subtags,
            extra: self.extra.clone(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == Some(TagKind::Image)
    }

    /// Authored bottom edge (`top + height`).
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Non-empty fallback text, if any.
    pub fn fallback(&self) -> Option<&str> {
        self.fallback_text.as_deref().filter(|s| !s.is_empty())
    }

    /// Background image URL, ignoring the CSS `none` keyword.
    pub fn background_image_url(&self) -> Option<&str> {
        self.background_image
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "none")
    }

    /// Looks up designer metadata that is not part of the typed model, e.g. `tool.name`.
    pub fn meta(&self, dotted_path: &str) -> Option<&Value> {
        let mut segments = dotted_path.split('.');
        let mut cur = self.extra.get(segments.next()?)?;
        for segment in segments {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn meta_str(&self, dotted_path: &str) -> Option<&str> {
        self.meta(dotted_path)?.as_str()
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn number_from_value<E: de::Error>(value: Value) -> Result<Option<f64>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => crate::geom::parse_css_number(&s)
            .map(Some)
            .ok_or_else(|| E::custom(format!("expected a number, got {s:?}"))),
        other => Err(E::custom(format!("expected a number, got {other}"))),
    }
}

fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    number_from_value(Value::deserialize(deserializer)?)
}

fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value::<D::Error>(Value::deserialize(deserializer)?)?.unwrap_or(0.0))
}

fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s == "true"),
        other => Err(de::Error::custom(format!("expected a boolean, got {other}"))),
    }
}

fn de_kind<'de, D>(deserializer: D) -> Result<Option<TagKind>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(TagKind::from))
}

fn de_subtags<'de, D>(deserializer: D) -> Result<Vec<TagSource>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TagSource>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_accepts_loose_authoring_values() {
        let src: TagSource = serde_json::from_value(json!({
            "id": 7,
            "text": "[hours]",
            "fontSize": "24",
            "minimumFontSize": null,
            "autoresize": true,
            "type": "image",
            "isCropped": null,
            "top": 131,
            "subtags": null,
            "tool": { "name": "hours" }
        }))
        .unwrap();

        assert_eq!(src.id, "7");
        assert_eq!(src.font_size, Some(24.0));
        assert_eq!(src.minimum_font_size, None);
        assert!(src.autoresize);
        assert_eq!(src.kind, Some(TagKind::Image));
        assert!(!src.is_cropped);
        assert_eq!(src.top, 131.0);
        assert_eq!(src.left, 0.0);
        assert!(src.subtags.is_empty());
        assert_eq!(src.extra.get("tool"), Some(&json!({ "name": "hours" })));
    }

    #[test]
    fn missing_or_odd_ids_and_fallbacks_are_tolerated() {
        let src: TagSource =
            serde_json::from_value(json!({ "text": "x", "fallbackText": 0 })).unwrap();
        assert_eq!(src.id, "");
        assert_eq!(src.fallback_text.as_deref(), Some("0"));

        let src: TagSource =
            serde_json::from_value(json!({ "id": null, "fallbackText": { "a": 1 } })).unwrap();
        assert_eq!(src.id, "");
        assert_eq!(src.fallback_text, None);
    }

    #[test]
    fn unknown_types_are_kept_verbatim() {
        let src: TagSource =
            serde_json::from_value(json!({ "id": "a", "type": "countdown" })).unwrap();
        assert_eq!(src.kind, Some(TagKind::Other("countdown".to_string())));
        let back = serde_json::to_value(&src).unwrap();
        assert_eq!(back["type"], json!("countdown"));
    }

    #[test]
    fn meta_reads_nested_designer_fields() {
        let src: TagSource =
            serde_json::from_value(json!({ "id": "a", "tool": { "name": "text" } })).unwrap();
        let (tag, _) = Tag::from_source(src);
        assert_eq!(tag.meta_str("tool.name"), Some("text"));
        assert_eq!(tag.meta_str("tool.missing"), None);
    }

    #[test]
    fn background_none_is_no_image() {
        let src: TagSource =
            serde_json::from_value(json!({ "id": "a", "backgroundImage": "none" })).unwrap();
        let (tag, _) = Tag::from_source(src);
        assert_eq!(tag.background_image_url(), None);
    }
}
