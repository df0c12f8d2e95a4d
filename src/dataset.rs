//! Pre-order traversal of in-memory DICOM data sets as an event stream.
//!
//! [`DataSetWalker`] visits a data set in a strict, deterministic order,
//! yielding one [`DataSetEvent`] per step. Sequence items and encapsulated
//! pixel data fragments are delimited by dedicated begin/end events, so that
//! a consumer can track nesting without knowing anything about the
//! underlying object model.

use dicom_core::header::Header;
use dicom_core::value::InMemFragment;
use dicom_core::{DicomValue, Tag, VR};
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;

/// A single step of a pre-order data set walk.
#[derive(Debug)]
pub enum DataSetEvent<'a, D> {
    /// The walk has started. Emitted exactly once, before any other event.
    BeginWalk,
    /// A data element with a primitive value.
    Element(&'a InMemElement<D>),
    /// The start of a sequence element.
    /// Until the matching [`EndSequence`](DataSetEvent::EndSequence),
    /// all events pertain to the sequence's items.
    BeginSequence {
        /// the sequence element's tag
        tag: Tag,
        /// the sequence element's value representation
        vr: VR,
    },
    /// The start of an item of the enclosing sequence.
    BeginItem,
    /// The end of the current item.
    EndItem,
    /// The end of the current sequence.
    EndSequence,
    /// The start of an encapsulated pixel data element.
    BeginFragments {
        /// the pixel data element's tag
        tag: Tag,
        /// the pixel data element's value representation
        vr: VR,
    },
    /// One fragment of the enclosing pixel data element,
    /// reduced to its size in bytes.
    FragmentItem {
        /// the fragment's size in bytes
        size: usize,
    },
    /// The end of the current pixel data element.
    EndFragments,
    /// The walk has finished. Emitted exactly once, no events follow.
    EndWalk,
}

impl<D> Clone for DataSetEvent<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for DataSetEvent<'_, D> {}

#[derive(Debug)]
enum WalkFrame<'a, D> {
    Dataset {
        elements: Vec<&'a InMemElement<D>>,
        pos: usize,
    },
    Sequence {
        items: &'a [InMemDicomObject<D>],
        pos: usize,
    },
    Fragments {
        fragments: &'a [InMemFragment],
        pos: usize,
    },
}

enum Step<'a, D> {
    Visit(&'a InMemElement<D>),
    EnterItem(&'a InMemDicomObject<D>),
    Fragment(usize),
    Pop,
}

/// An iterator of data set events, walking an [`InMemDicomObject`] in
/// pre-order with an explicit stack of the sequences and items entered
/// so far.
///
/// Elements of each data set are visited in ascending tag order, the order
/// in which the object stores them. Walking an in-memory object cannot
/// fail, so the items are plain events rather than results.
#[derive(Debug)]
pub struct DataSetWalker<'a, D> {
    frames: Vec<WalkFrame<'a, D>>,
    started: bool,
    done: bool,
}

impl<'a, D> DataSetWalker<'a, D> {
    /// Create a walker over the given data set.
    pub fn new(obj: &'a InMemDicomObject<D>) -> Self {
        DataSetWalker {
            frames: vec![WalkFrame::Dataset {
                elements: obj.into_iter().collect(),
                pos: 0,
            }],
            started: false,
            done: false,
        }
    }
}

impl<'a, D> Iterator for DataSetWalker<'a, D> {
    type Item = DataSetEvent<'a, D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(DataSetEvent::BeginWalk);
        }

        let step = match self.frames.last_mut() {
            None => return None,
            Some(WalkFrame::Dataset { elements, pos }) => {
                if *pos < elements.len() {
                    let elem = elements[*pos];
                    *pos += 1;
                    Step::Visit(elem)
                } else {
                    Step::Pop
                }
            }
            Some(WalkFrame::Sequence { items, pos }) => {
                let items: &'a [InMemDicomObject<D>] = *items;
                if *pos < items.len() {
                    let item = &items[*pos];
                    *pos += 1;
                    Step::EnterItem(item)
                } else {
                    Step::Pop
                }
            }
            Some(WalkFrame::Fragments { fragments, pos }) => {
                let fragments: &'a [InMemFragment] = *fragments;
                if *pos < fragments.len() {
                    let size = fragments[*pos].len();
                    *pos += 1;
                    Step::Fragment(size)
                } else {
                    Step::Pop
                }
            }
        };

        let event = match step {
            Step::Visit(elem) => match elem.value() {
                DicomValue::Primitive(_) => DataSetEvent::Element(elem),
                DicomValue::Sequence(seq) => {
                    self.frames.push(WalkFrame::Sequence {
                        items: seq.items(),
                        pos: 0,
                    });
                    DataSetEvent::BeginSequence {
                        tag: elem.tag(),
                        vr: elem.vr(),
                    }
                }
                DicomValue::PixelSequence(seq) => {
                    // the offset table is not visited,
                    // only the fragments are part of the walk
                    self.frames.push(WalkFrame::Fragments {
                        fragments: seq.fragments(),
                        pos: 0,
                    });
                    DataSetEvent::BeginFragments {
                        tag: elem.tag(),
                        vr: elem.vr(),
                    }
                }
            },
            Step::EnterItem(item) => {
                self.frames.push(WalkFrame::Dataset {
                    elements: item.into_iter().collect(),
                    pos: 0,
                });
                DataSetEvent::BeginItem
            }
            Step::Fragment(size) => DataSetEvent::FragmentItem { size },
            Step::Pop => match self.frames.pop() {
                Some(WalkFrame::Dataset { .. }) => {
                    if self.frames.is_empty() {
                        self.done = true;
                        DataSetEvent::EndWalk
                    } else {
                        DataSetEvent::EndItem
                    }
                }
                Some(WalkFrame::Sequence { .. }) => DataSetEvent::EndSequence,
                Some(WalkFrame::Fragments { .. }) => DataSetEvent::EndFragments,
                None => return None,
            },
        };

        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::value::{DataSetSequence, PixelFragmentSequence};
    use dicom_core::{dicom_value, Length, PrimitiveValue};
    use dicom_dictionary_std::tags;
    use pretty_assertions::assert_eq;

    fn describe<D>(event: &DataSetEvent<'_, D>) -> String {
        match event {
            DataSetEvent::BeginWalk => "begin-walk".to_string(),
            DataSetEvent::Element(elem) => {
                format!("element {}", crate::tag_key(elem.tag()))
            }
            DataSetEvent::BeginSequence { tag, .. } => {
                format!("begin-sequence {}", crate::tag_key(*tag))
            }
            DataSetEvent::BeginItem => "begin-item".to_string(),
            DataSetEvent::EndItem => "end-item".to_string(),
            DataSetEvent::EndSequence => "end-sequence".to_string(),
            DataSetEvent::BeginFragments { tag, .. } => {
                format!("begin-fragments {}", crate::tag_key(*tag))
            }
            DataSetEvent::FragmentItem { size } => format!("fragment {}", size),
            DataSetEvent::EndFragments => "end-fragments".to_string(),
            DataSetEvent::EndWalk => "end-walk".to_string(),
        }
    }

    #[test]
    fn walk_flat_data_set_in_tag_order() {
        let obj = InMemDicomObject::from_element_iter([
            InMemElement::new(tags::ROWS, VR::US, dicom_value!(U16, [512])),
            InMemElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("MR")),
        ]);

        let events: Vec<_> = DataSetWalker::new(&obj).map(|e| describe(&e)).collect();

        assert_eq!(
            events,
            vec![
                "begin-walk",
                "element 00080060",
                "element 00280010",
                "end-walk",
            ],
        );
    }

    #[test]
    fn walk_sequences_in_pre_order() {
        let obj = InMemDicomObject::from_element_iter([
            InMemElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("MR")),
            InMemElement::new(
                tags::CONTENT_SEQUENCE,
                VR::SQ,
                DataSetSequence::new(
                    vec![
                        InMemDicomObject::from_element_iter([InMemElement::new(
                            tags::ACCESSION_NUMBER,
                            VR::SH,
                            PrimitiveValue::from("A123"),
                        )]),
                        InMemDicomObject::new_empty(),
                    ],
                    Length::UNDEFINED,
                ),
            ),
        ]);

        let events: Vec<_> = DataSetWalker::new(&obj).map(|e| describe(&e)).collect();

        assert_eq!(
            events,
            vec![
                "begin-walk",
                "element 00080060",
                "begin-sequence 0040A730",
                "begin-item",
                "element 00080050",
                "end-item",
                "begin-item",
                "end-item",
                "end-sequence",
                "end-walk",
            ],
        );
    }

    #[test]
    fn walk_pixel_data_as_fragments() {
        let obj = InMemDicomObject::from_element_iter([
            InMemElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("MR")),
            InMemElement::new(
                tags::PIXEL_DATA,
                VR::OB,
                PixelFragmentSequence::new(Vec::<u32>::new(), vec![vec![0; 4], vec![0; 2]]),
            ),
        ]);

        let events: Vec<_> = DataSetWalker::new(&obj).map(|e| describe(&e)).collect();

        assert_eq!(
            events,
            vec![
                "begin-walk",
                "element 00080060",
                "begin-fragments 7FE00010",
                "fragment 4",
                "fragment 2",
                "end-fragments",
                "end-walk",
            ],
        );
    }

    #[test]
    fn walk_empty_data_set() {
        let obj = InMemDicomObject::new_empty();

        let events: Vec<_> = DataSetWalker::new(&obj).map(|e| describe(&e)).collect();

        assert_eq!(events, vec!["begin-walk", "end-walk"]);
    }
}
