//! Reading JSON metadata documents back into an addressable element map.
//!
//! [`JsonDataSet`] holds the elements of one document in document order.
//! Both root dialects are accepted: a plain object keyed by tag, and an
//! array of single-element objects. Sequence elements are parsed
//! recursively, so nested items can be addressed with
//! [`sq_element`](JsonDataSet::sq_element).
//!
//! Lookups never fail loudly: a missing tag or an out of range position
//! yields the documented sentinel (`None`, NaN or 0). Malformed documents,
//! on the other hand, are rejected as a whole with a [`ParseError`].

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::warn;

pub use self::element::JsonElement;
mod element;

/// An error reading a JSON metadata document.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// could not read the document from a file
    #[snafu(display("could not read JSON document from {}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// the text is not valid JSON
    #[snafu(display("invalid JSON text"))]
    InvalidJson { source: serde_json::Error },
    /// the document root has an unexpected shape
    #[snafu(display("document root must be a JSON object or array"))]
    BadDocumentRoot,
    /// an entry of a root array is not an object
    #[snafu(display("root array entry #{} must be an object", index))]
    BadListEntry { index: usize },
    /// an element body is not an object
    #[snafu(display("element {} must be an object", tag))]
    BadElement { tag: String },
    /// an element body has no usable "vr" property
    #[snafu(display("element {} is missing a text \"vr\" property", tag))]
    MissingVr { tag: String },
    /// an element's Values property is not an array
    #[snafu(display("\"Values\" of element {} must be an array", tag))]
    BadValues { tag: String },
    /// a sequence item is not an object
    #[snafu(display("item #{} of sequence {} must be an object", index, tag))]
    BadItem { tag: String, index: usize },
}

/// An ordered map of tag keys to the elements read from a JSON metadata
/// document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonDataSet {
    elements: IndexMap<String, JsonElement>,
}

impl JsonDataSet {
    /// Parse a full JSON metadata document from its text.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let root: Value = serde_json::from_str(text).context(InvalidJsonSnafu)?;
        Self::from_json(&root)
    }

    /// Read and parse a full JSON metadata document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).context(ReadFileSnafu { path })?;
        Self::parse(&text)
    }

    fn from_json(root: &Value) -> Result<Self, ParseError> {
        match root {
            Value::Object(map) => Self::from_map(map),
            Value::Array(entries) => {
                let mut elements = IndexMap::with_capacity(entries.len());
                for (index, entry) in entries.iter().enumerate() {
                    let map = entry.as_object().context(BadListEntrySnafu { index })?;
                    for (tag, body) in map {
                        let element = JsonElement::from_json(tag, body)?;
                        if elements.insert(tag.clone(), element).is_some() {
                            warn!("duplicate element {} in document, keeping the last", tag);
                        }
                    }
                }
                Ok(JsonDataSet { elements })
            }
            _ => BadDocumentRootSnafu.fail(),
        }
    }

    pub(crate) fn from_map(map: &serde_json::Map<String, Value>) -> Result<Self, ParseError> {
        let mut elements = IndexMap::with_capacity(map.len());
        for (tag, body) in map {
            elements.insert(tag.clone(), JsonElement::from_json(tag, body)?);
        }
        Ok(JsonDataSet { elements })
    }

    /// Get the element with the given tag key, if present.
    pub fn element(&self, tag: &str) -> Option<&JsonElement> {
        self.elements.get(tag)
    }

    /// Get the textual form of one of an element's values.
    pub fn value(&self, tag: &str, index: usize) -> Option<String> {
        self.element(tag).and_then(|e| e.string(index))
    }

    /// Get the value representation code of an element.
    pub fn vr(&self, tag: &str) -> Option<&str> {
        self.element(tag).map(|e| e.vr())
    }

    /// Whether the element with the given tag key is a sequence.
    pub fn is_sq(&self, tag: &str) -> bool {
        self.vr(tag) == Some("SQ")
    }

    /// Get an element nested in one item of a sequence element.
    ///
    /// Returns `None` if the outer element is absent or not a sequence,
    /// the item position is out of range,
    /// or the item has no element with the inner tag key.
    pub fn sq_element(&self, tag: &str, item: usize, item_tag: &str) -> Option<&JsonElement> {
        let element = self.element(tag)?;
        if !element.is_sequence() {
            return None;
        }
        element.items().get(item)?.element(item_tag)
    }

    /// The number of elements in this data set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether this data set has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the elements in document order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, JsonElement> {
        self.elements.iter()
    }
}

impl<'a> IntoIterator for &'a JsonDataSet {
    type Item = (&'a String, &'a JsonElement);
    type IntoIter = indexmap::map::Iter<'a, String, JsonElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
