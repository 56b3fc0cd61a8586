use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A business contact found on a crawled page
///
/// Classifier replies are deserialized straight into this type, so every
/// field is optional on input and a few common camelCase spellings are
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lead {
    #[serde(deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub company: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient_f32")]
    pub rating: Option<f32>,
    #[serde(alias = "reviewCount", alias = "reviews", deserialize_with = "lenient_u32")]
    pub review_count: Option<u32>,
    #[serde(deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub website: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub hours: Option<String>,
    /// Page the lead was extracted from
    #[serde(alias = "sourceUrl", deserialize_with = "lenient_name")]
    pub source_url: String,
}

impl Lead {
    /// A lead carrying just a name and an email
    pub fn with_email(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: Some(email.into()),
            ..Default::default()
        }
    }
}

/// Accepts strings and numbers; null and other shapes become `None`
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer).map(Option::unwrap_or_default)
}

/// Accepts `4.5`, `"4.5"`, `"4.5 stars"` or null
fn lenient_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => leading_number(&s).and_then(|n| n.parse().ok()),
        _ => None,
    })
}

/// Accepts `120`, `"120"`, `"1,204 reviews"` or null
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => leading_number(&s.replace(',', "")).and_then(|n| n.parse().ok()),
        _ => None,
    })
}

fn leading_number(s: &str) -> Option<&str> {
    let s = s.trim();
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    Some(&s[..end]).filter(|n| !n.is_empty())
}
