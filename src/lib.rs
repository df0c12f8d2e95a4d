//! This crate converts the metadata of DICOM data sets to and from a
//! legacy JSON schema, as produced by older archive tooling.
//! It is not the DICOMweb JSON model of DICOM PS3.18:
//! number strings stay quoted, person names become `Alphabetic` objects,
//! and elements above a size threshold keep their tag but lose their
//! values.
//!
//! Two halves make up the crate:
//!
//! - [`ser`] walks an in-memory DICOM object ([`dicom_object::InMemDicomObject`])
//!   and prints the JSON document, driven by the event stream of
//!   [`dataset::DataSetWalker`];
//! - [`de`] reads such a document back into a [`JsonDataSet`],
//!   an ordered map with sentinel-based accessors for tags, values and
//!   nested sequence items.
//!
//! # Example
//!
//! ```
//! use dicom_core::{dicom_value, PrimitiveValue, Tag, VR};
//! use dicom_object::{mem::InMemElement, InMemDicomObject};
//!
//! let obj = InMemDicomObject::from_element_iter([
//!     InMemElement::new(Tag(0x0010, 0x0010), VR::PN, PrimitiveValue::from("Doe^John")),
//!     InMemElement::new(Tag(0x0028, 0x0010), VR::US, dicom_value!(U16, [512])),
//! ]);
//!
//! let mut options = dcm2json::FormatOptions::new();
//! options.pretty(false);
//! let json = dcm2json::to_string(&obj, &options);
//! assert_eq!(
//!     json,
//!     r#"{"00100010":{"vr":"PN","Values":[{"Alphabetic":"Doe^John"}]},"00280010":{"vr":"US","Values":[512]}}"#,
//! );
//!
//! let data = dcm2json::JsonDataSet::parse(&json)?;
//! assert_eq!(data.value("00280010", 0).as_deref(), Some("512"));
//! # Ok::<(), dcm2json::ParseError>(())
//! ```

pub mod dataset;
pub mod de;
pub mod ser;

pub use crate::dataset::{DataSetEvent, DataSetWalker};
pub use crate::de::{JsonDataSet, JsonElement, ParseError};
pub use crate::ser::{
    convert_file, to_string, to_writer, ConvertError, FormatOptions, JsonWriter, RootLayout,
};

use dicom_core::Tag;

/// The textual form of a tag as used for JSON object keys:
/// exactly 8 uppercase hexadecimal digits,
/// the group number followed by the element number.
pub fn tag_key(tag: Tag) -> String {
    format!("{:04X}{:04X}", tag.group(), tag.element())
}
