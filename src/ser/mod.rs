//! Writing DICOM data sets as text in the legacy JSON metadata schema.
//!
//! The central piece is [`JsonWriter`], a stateful device which consumes
//! the events of a data set walk and prints the document incrementally.
//! Comma placement at any nesting level depends only on that level's own
//! entry counter, held in an explicit stack of frames, and indentation is
//! recomputed from the current depth at every line break. The output is
//! deterministic: the same data set with the same options always yields
//! the same bytes.
//!
//! Most use cases are covered by the free functions [`to_string`],
//! [`to_writer`] and [`convert_file`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dicom_core::header::Header;
use dicom_core::{DicomValue, Tag, VR};
use dicom_object::InMemDicomObject;
use snafu::{ResultExt, Snafu};

use crate::dataset::{DataSetEvent, DataSetWalker};
use crate::tag_key;

use self::value::{quoted, scalar_list, trim_padding};
mod value;

/// An error converting a DICOM file into JSON text.
#[derive(Debug, Snafu)]
pub enum ConvertError {
    /// could not open the DICOM file
    #[snafu(display("could not open DICOM file {}", path.display()))]
    OpenFile {
        path: PathBuf,
        source: dicom_object::ReadError,
    },
}

/// The shape of the document root.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum RootLayout {
    /// A single JSON object mapping each tag to its element.
    #[default]
    Map,
    /// A JSON array with one single-element object per data element.
    ///
    /// The layout affects the document root only;
    /// sequence items are always plain tag maps.
    List,
}

/// Options and flags to configure the JSON output.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct FormatOptions {
    /// Whether to break the document into indented lines.
    pub pretty: bool,
    /// The shape of the document root.
    pub layout: RootLayout,
    /// Elements with a raw value length above this many bytes
    /// have their values elided from the output.
    pub max_value_bytes: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            pretty: true,
            layout: RootLayout::Map,
            max_value_bytes: 1024,
        }
    }
}

impl FormatOptions {
    /// Construct the default options:
    /// pretty printing, map root, 1024 byte value limit.
    pub fn new() -> Self {
        Default::default()
    }

    /// Set whether to break the document into indented lines.
    pub fn pretty(&mut self, pretty: bool) -> &mut Self {
        self.pretty = pretty;
        self
    }

    /// Set the shape of the document root.
    pub fn layout(&mut self, layout: RootLayout) -> &mut Self {
        self.layout = layout;
        self
    }

    /// Set the raw value length in bytes above which
    /// an element's values are elided.
    pub fn max_value_bytes(&mut self, max_value_bytes: usize) -> &mut Self {
        self.max_value_bytes = max_value_bytes;
        self
    }
}

#[derive(Debug)]
enum Frame {
    /// a tag-keyed object: the document root or a sequence item
    Dataset { elements: usize },
    /// the item list of a sequence element
    Sequence { items: usize, wrapped: bool },
    /// an encapsulated pixel data element, which emits nothing
    Fragments,
}

/// A stateful device for printing a DICOM data set as JSON text,
/// one data set event at a time.
#[derive(Debug)]
pub struct JsonWriter<W> {
    to: W,
    options: FormatOptions,
    frames: Vec<Frame>,
    depth: usize,
}

impl<W> JsonWriter<W> {
    pub fn new(to: W, options: FormatOptions) -> Self {
        JsonWriter {
            to,
            options,
            frames: Vec::new(),
            depth: 0,
        }
    }
}

impl<W> JsonWriter<W>
where
    W: Write,
{
    /// Feed a sequence of events which form a complete data set walk.
    pub fn write_sequence<'a, D: 'a, I>(&mut self, events: I) -> io::Result<()>
    where
        I: IntoIterator<Item = DataSetEvent<'a, D>>,
    {
        for event in events {
            self.write(event)?;
        }
        Ok(())
    }

    /// Feed a single data set event.
    ///
    /// Events must arrive in the order produced by a pre-order data set
    /// walk, starting with `BeginWalk` and ending with `EndWalk`.
    /// Feeding an ill formed event sequence may panic.
    pub fn write<D>(&mut self, event: DataSetEvent<'_, D>) -> io::Result<()> {
        match event {
            DataSetEvent::BeginWalk => self.begin_walk(),
            DataSetEvent::Element(elem) => self.element(elem),
            DataSetEvent::BeginSequence { tag, vr } => self.begin_sequence(tag, vr),
            DataSetEvent::BeginItem => self.begin_item(),
            DataSetEvent::EndItem => self.end_item(),
            DataSetEvent::EndSequence => self.end_sequence(),
            DataSetEvent::BeginFragments { .. } => {
                self.frames.push(Frame::Fragments);
                self.depth += 1;
                Ok(())
            }
            DataSetEvent::FragmentItem { .. } => Ok(()),
            DataSetEvent::EndFragments => {
                match self.frames.pop() {
                    Some(Frame::Fragments) => {}
                    _ => unreachable!("fragment end without a matching start"),
                }
                self.depth -= 1;
                Ok(())
            }
            DataSetEvent::EndWalk => self.end_walk(),
        }
    }

    fn begin_walk(&mut self) -> io::Result<()> {
        self.to.write_all(match self.options.layout {
            RootLayout::Map => b"{",
            RootLayout::List => b"[",
        })?;
        self.frames.push(Frame::Dataset { elements: 0 });
        self.depth = 1;
        Ok(())
    }

    fn end_walk(&mut self) -> io::Result<()> {
        let empty = match self.frames.pop() {
            Some(Frame::Dataset { elements }) => elements == 0,
            _ => unreachable!("walk end without a matching start"),
        };
        self.depth = 0;
        if !empty {
            self.nl_indent()?;
        }
        self.to.write_all(match self.options.layout {
            RootLayout::Map => b"}",
            RootLayout::List => b"]",
        })
    }

    fn element<D>(&mut self, elem: &dicom_object::mem::InMemElement<D>) -> io::Result<()> {
        let DicomValue::Primitive(value) = elem.value() else {
            unreachable!("element events must carry a primitive value")
        };
        let vr = elem.vr();
        let wrapped = self.open_entry(&tag_key(elem.tag()))?;
        let pad = self.pad();
        self.nl_indent()?;
        write!(self.to, "\"vr\":{}\"{}\",", pad, vr)?;
        self.nl_indent()?;
        write!(self.to, "\"Values\":{}", pad)?;
        if value.calculate_byte_len() > self.options.max_value_bytes {
            self.to.write_all(b"[]")?;
        } else if vr == VR::PN {
            let names = value.to_multi_str();
            self.person_names(&names)?;
        } else {
            let strings = value.to_multi_str();
            let list = scalar_list(&strings, vr, self.options.pretty);
            write!(self.to, "[{}]", list)?;
        }
        self.close_entry(wrapped)
    }

    fn begin_sequence(&mut self, tag: Tag, vr: VR) -> io::Result<()> {
        let wrapped = self.open_entry(&tag_key(tag))?;
        let pad = self.pad();
        self.nl_indent()?;
        write!(self.to, "\"vr\":{}\"{}\",", pad, vr)?;
        self.nl_indent()?;
        write!(self.to, "\"Values\":{}[", pad)?;
        self.frames.push(Frame::Sequence { items: 0, wrapped });
        self.depth += 1;
        Ok(())
    }

    fn begin_item(&mut self) -> io::Result<()> {
        match self.frames.last_mut() {
            Some(Frame::Sequence { items, .. }) => {
                if *items > 0 {
                    self.to.write_all(b",")?;
                }
                *items += 1;
            }
            _ => unreachable!("item start outside of a sequence"),
        }
        self.nl_indent()?;
        self.to.write_all(b"{")?;
        self.frames.push(Frame::Dataset { elements: 0 });
        self.depth += 1;
        Ok(())
    }

    fn end_item(&mut self) -> io::Result<()> {
        let empty = match self.frames.pop() {
            Some(Frame::Dataset { elements }) => elements == 0,
            _ => unreachable!("item end without a matching start"),
        };
        self.depth -= 1;
        if !empty {
            self.nl_indent()?;
        }
        self.to.write_all(b"}")
    }

    fn end_sequence(&mut self) -> io::Result<()> {
        let (items, wrapped) = match self.frames.pop() {
            Some(Frame::Sequence { items, wrapped }) => (items, wrapped),
            _ => unreachable!("sequence end without a matching start"),
        };
        self.depth -= 1;
        if items > 0 {
            self.nl_indent()?;
        }
        self.to.write_all(b"]")?;
        self.close_entry(wrapped)
    }

    /// Write the separator, wrapping and key which open a data element
    /// entry at the current data set level.
    /// Returns whether the entry was wrapped in its own object.
    fn open_entry(&mut self, key: &str) -> io::Result<bool> {
        match self.frames.last_mut() {
            Some(Frame::Dataset { elements }) => {
                if *elements > 0 {
                    self.to.write_all(b",")?;
                }
                *elements += 1;
            }
            _ => unreachable!("data element outside of a data set"),
        }
        self.nl_indent()?;
        let wrapped = self.options.layout == RootLayout::List && self.frames.len() == 1;
        if wrapped {
            self.to.write_all(b"{")?;
            self.depth += 1;
            self.nl_indent()?;
        }
        let pad = self.pad();
        write!(self.to, "\"{}\":{}{{", key, pad)?;
        self.depth += 1;
        Ok(wrapped)
    }

    fn close_entry(&mut self, wrapped: bool) -> io::Result<()> {
        self.depth -= 1;
        self.nl_indent()?;
        self.to.write_all(b"}")?;
        if wrapped {
            self.depth -= 1;
            self.nl_indent()?;
            self.to.write_all(b"}")?;
        }
        Ok(())
    }

    fn person_names(&mut self, names: &[String]) -> io::Result<()> {
        if names.is_empty() {
            return self.to.write_all(b"[]");
        }
        let pad = self.pad();
        self.to.write_all(b"[")?;
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.to.write_all(b",")?;
            }
            self.depth += 1;
            self.nl_indent()?;
            self.to.write_all(b"{")?;
            self.depth += 1;
            self.nl_indent()?;
            let name = quoted(trim_padding(name));
            write!(self.to, "\"Alphabetic\":{}{}", pad, name)?;
            self.depth -= 1;
            self.nl_indent()?;
            self.to.write_all(b"}")?;
            self.depth -= 1;
        }
        self.nl_indent()?;
        self.to.write_all(b"]")
    }

    fn nl_indent(&mut self) -> io::Result<()> {
        if !self.options.pretty {
            return Ok(());
        }
        self.to.write_all(b"\n")?;
        for _ in 0..self.depth {
            self.to.write_all(b"  ")?;
        }
        Ok(())
    }

    fn pad(&self) -> &'static str {
        if self.options.pretty {
            " "
        } else {
            ""
        }
    }
}

/// Serialize a DICOM data set as a string of JSON using the given options.
pub fn to_string<D>(obj: &InMemDicomObject<D>, options: &FormatOptions) -> String {
    let mut out = Vec::new();
    to_writer(&mut out, obj, options).expect("writing to an in-memory buffer cannot fail");
    String::from_utf8(out).expect("emitted JSON is valid UTF-8")
}

/// Serialize a DICOM data set as JSON text into the given writer.
pub fn to_writer<W, D>(to: W, obj: &InMemDicomObject<D>, options: &FormatOptions) -> io::Result<()>
where
    W: Write,
{
    let mut writer = JsonWriter::new(to, options.clone());
    writer.write_sequence(DataSetWalker::new(obj))
}

/// Open a DICOM file and serialize its main data set
/// as a string of JSON using the given options.
///
/// The file meta group is not part of the output.
pub fn convert_file(
    path: impl AsRef<Path>,
    options: &FormatOptions,
) -> Result<String, ConvertError> {
    let path = path.as_ref();
    let obj = dicom_object::open_file(path).context(OpenFileSnafu { path })?;
    Ok(to_string(&obj, options))
}
