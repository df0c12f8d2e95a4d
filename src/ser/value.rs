//! Encoding of individual element values into JSON tokens.

use dicom_core::VR;

/// Whether values of this VR are written as JSON strings.
///
/// This is the string classification of the legacy schema:
/// decimal strings and integer strings (DS, IS) are quoted like any other
/// text, in contrast with the DICOM PS3.18 JSON model.
pub fn is_string_class(vr: VR) -> bool {
    matches!(
        vr,
        VR::AE
            | VR::AS
            | VR::CS
            | VR::DA
            | VR::DS
            | VR::DT
            | VR::IS
            | VR::LO
            | VR::LT
            | VR::PN
            | VR::SH
            | VR::ST
            | VR::TM
            | VR::UC
            | VR::UI
            | VR::UR
            | VR::UT
    )
}

/// Strip the trailing NUL padding which gives
/// certain string values an even byte length.
pub fn trim_padding(value: &str) -> &str {
    value.trim_end_matches('\0')
}

/// Wrap a value in double quotes.
///
/// Embedded double quotes are replaced with the literal text `&quot;`
/// instead of a JSON escape sequence; existing consumers of the schema
/// expect this substitution.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "&quot;"))
}

/// Encode a list of raw textual values as the inner text of a JSON array.
///
/// String class values are trimmed and quoted. Any other value is passed
/// through as a raw token, keeping the textual form given by the source.
pub fn scalar_list(values: &[String], vr: VR, pretty: bool) -> String {
    let sep = if pretty { ", " } else { "," };
    let values: Vec<String> = values
        .iter()
        .map(|v| {
            let v = trim_padding(v);
            if is_string_class(vr) {
                quoted(v)
            } else {
                v.to_owned()
            }
        })
        .collect();
    values.join(sep)
}
