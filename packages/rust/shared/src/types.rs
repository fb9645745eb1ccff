//! Extraction types exchanged between the semantic extractor and the pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The three buckets every page extraction is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Products,
    Services,
    Founders,
}

impl Category {
    /// All categories, in report order.
    pub const ALL: [Category; 3] = [Self::Products, Self::Services, Self::Founders];
}

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// A single extracted piece of text: either plain, or embedded in a labeled record
/// such as `{"name": "Jane Doe", "role": "CEO"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Text(String),
    Record(Map<String, Value>),
}

impl Fragment {
    /// Convert an arbitrary JSON value into a fragment.
    ///
    /// Only strings and objects are fragments; anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s)),
            Value::Object(map) => Some(Self::Record(map)),
            _ => None,
        }
    }
}

impl From<&str> for Fragment {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Fragment {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ---------------------------------------------------------------------------
// ExtractionResult
// ---------------------------------------------------------------------------

/// The semantic extractor's output for one page.
///
/// Missing keys deserialize as empty buckets. Bucket entries that are neither
/// strings nor objects are discarded, and a bucket given as a single string or
/// object is accepted as a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, deserialize_with = "lenient_fragments")]
    pub products: Vec<Fragment>,
    #[serde(default, deserialize_with = "lenient_fragments")]
    pub services: Vec<Fragment>,
    #[serde(default, deserialize_with = "lenient_fragments")]
    pub founders: Vec<Fragment>,
}

impl ExtractionResult {
    /// Fragments for one category.
    pub fn bucket(&self, category: Category) -> &[Fragment] {
        match category {
            Category::Products => &self.products,
            Category::Services => &self.services,
            Category::Founders => &self.founders,
        }
    }

    /// True when all three buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.services.is_empty() && self.founders.is_empty()
    }
}

fn lenient_fragments<'de, D>(deserializer: D) -> std::result::Result<Vec<Fragment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let fragments = match value {
        Value::Array(items) => items.into_iter().filter_map(Fragment::from_value).collect(),
        Value::Null => Vec::new(),
        other => Fragment::from_value(other).into_iter().collect(),
    };
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_accepts_both_shapes() {
        let json = r#"["Widget Pro", {"name": "Jane Doe", "age": 30}]"#;
        let parsed: Vec<Fragment> = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed[0], Fragment::Text("Widget Pro".into()));
        match &parsed[1] {
            Fragment::Record(map) => {
                assert_eq!(map.get("name"), Some(&Value::String("Jane Doe".into())));
            }
            other => panic!("expected Record, got {other:?}"),
        }
    }

    #[test]
    fn extraction_result_defaults_missing_keys() {
        let parsed: ExtractionResult =
            serde_json::from_str(r#"{"products": ["Widget"]}"#).expect("deserialize");
        assert_eq!(parsed.products.len(), 1);
        assert!(parsed.services.is_empty());
        assert!(parsed.founders.is_empty());
        assert!(!parsed.is_empty());
    }

    #[test]
    fn extraction_result_drops_non_fragment_entries() {
        let json = r#"{"products": ["Widget", 42, null, ["nested"]], "services": null}"#;
        let parsed: ExtractionResult = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.products, vec![Fragment::from("Widget")]);
        assert!(parsed.services.is_empty());
    }

    #[test]
    fn extraction_result_accepts_scalar_bucket() {
        let parsed: ExtractionResult =
            serde_json::from_str(r#"{"founders": "Jane Doe"}"#).expect("deserialize");
        assert_eq!(parsed.founders, vec![Fragment::from("Jane Doe")]);
    }

    #[test]
    fn category_keys() {
        assert_eq!(
            serde_json::to_value(Category::Products).expect("serialize"),
            "products"
        );
        assert_eq!(Category::ALL.len(), 3);
    }
}
