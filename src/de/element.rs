//! A single data element as read from a JSON metadata document.

use serde_json::Value;
use snafu::OptionExt;

use super::{BadElementSnafu, BadItemSnafu, BadValuesSnafu, JsonDataSet, MissingVrSnafu, ParseError};

/// One data element of a [`JsonDataSet`], holding the raw JSON values
/// and, for sequences, the recursively parsed items.
///
/// Accessors are cheap and never fail loudly: out of range positions
/// yield `None` or NaN rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonElement {
    tag: String,
    vr: String,
    values: Vec<Value>,
    items: Vec<JsonDataSet>,
}

impl JsonElement {
    pub(crate) fn from_json(tag: &str, body: &Value) -> Result<Self, ParseError> {
        let body = body.as_object().context(BadElementSnafu { tag })?;
        let vr = body
            .get("vr")
            .and_then(Value::as_str)
            .context(MissingVrSnafu { tag })?
            .to_owned();
        let values = match body.get("Values") {
            None => Vec::new(),
            Some(Value::Array(values)) => values.clone(),
            Some(_) => return BadValuesSnafu { tag }.fail(),
        };
        let items = if vr == "SQ" {
            values
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let map = item.as_object().context(BadItemSnafu { tag, index })?;
                    JsonDataSet::from_map(map)
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        Ok(JsonElement {
            tag: tag.to_owned(),
            vr,
            values,
            items,
        })
    }

    /// The tag key of this element.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The two letter value representation code.
    pub fn vr(&self) -> &str {
        &self.vr
    }

    /// Whether this element is a sequence.
    pub fn is_sequence(&self) -> bool {
        self.vr == "SQ"
    }

    /// The number of entries in the element's value list.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// The raw JSON value at the given position.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The textual form of the value at the given position.
    ///
    /// String values yield their text; any other value, such as a number
    /// or a person name object, renders as its JSON token.
    pub fn string(&self, index: usize) -> Option<String> {
        self.values.get(index).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// The value at the given position as a floating point number.
    ///
    /// Returns NaN when the position is out of range
    /// or the value has no numeric form.
    pub fn double(&self, index: usize) -> f64 {
        match self.values.get(index) {
            Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
            Some(Value::String(text)) => text.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    /// The parsed items of a sequence element.
    /// Empty unless the value representation is `SQ`.
    pub fn items(&self) -> &[JsonDataSet] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(text: &str) -> JsonElement {
        JsonElement::from_json("00080060", &serde_json::from_str(text).unwrap()).unwrap()
    }

    #[test]
    fn string_forms_of_values() {
        let e = element(r#"{"vr": "US", "Values": [512, "text", 1.5]}"#);
        assert_eq!(e.string(0).as_deref(), Some("512"));
        assert_eq!(e.string(1).as_deref(), Some("text"));
        assert_eq!(e.string(2).as_deref(), Some("1.5"));
        assert!(e.string(3).is_none());
    }

    #[test]
    fn person_name_renders_as_json_text() {
        let e = element(r#"{"vr": "PN", "Values": [{"Alphabetic": "Doe^John"}]}"#);
        assert_eq!(e.string(0).as_deref(), Some(r#"{"Alphabetic":"Doe^John"}"#));
    }

    #[test]
    fn doubles_from_numbers_and_text() {
        let e = element(r#"{"vr": "DS", "Values": ["1.25", " 2.5 ", 3, "x"]}"#);
        assert_eq!(e.double(0), 1.25);
        assert_eq!(e.double(1), 2.5);
        assert_eq!(e.double(2), 3.);
        assert!(e.double(3).is_nan());
        assert!(e.double(4).is_nan());
    }

    #[test]
    fn sequence_items_only_for_sq() {
        let e = element(r#"{"vr": "SQ", "Values": [{"00080060": {"vr": "CS", "Values": ["MR"]}}]}"#);
        assert!(e.is_sequence());
        assert_eq!(e.items().len(), 1);

        let e = element(r#"{"vr": "CS", "Values": ["MR"]}"#);
        assert!(!e.is_sequence());
        assert!(e.items().is_empty());
    }
}
