//! Reader for the DICOM medical image container, enough of it to pull out a rescaled
//! 16-bit greyscale slice.

pub mod element;
pub mod errors;
mod reader;
pub mod vr;

use anyhow::{bail, Result};
use log::{debug, warn};
use std::{collections::BTreeMap, fs, path::Path};

use crate::core::{array::ImgArray, shape::Shape};
use element::{Element, Tag, Value};
use errors::FormatError;
use reader::ByteReader;
use vr::Vr;

pub use reader::ByteOrder;

const PREAMBLE: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";
const UNDEFINED_LENGTH: u32 = 0xffff_ffff;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransferSyntax {
    #[default]
    ExplicitLittle,
    ExplicitBig,
    ImplicitLittle,
}

impl TransferSyntax {
    pub fn from_uid(uid: &str) -> Option<TransferSyntax> {
        match uid.trim_end_matches(['\0', ' ']) {
            "1.2.840.10008.1.2.1" => Some(TransferSyntax::ExplicitLittle),
            "1.2.840.10008.1.2.2" => Some(TransferSyntax::ExplicitBig),
            "1.2.840.10008.1.2" => Some(TransferSyntax::ImplicitLittle),
            _ => None,
        }
    }

    pub fn uid(&self) -> &'static str {
        match self {
            TransferSyntax::ExplicitLittle => "1.2.840.10008.1.2.1",
            TransferSyntax::ExplicitBig => "1.2.840.10008.1.2.2",
            TransferSyntax::ImplicitLittle => "1.2.840.10008.1.2",
        }
    }

    pub fn order(&self) -> ByteOrder {
        match self {
            TransferSyntax::ExplicitBig => ByteOrder::Big,
            _ => ByteOrder::Little,
        }
    }

    pub fn is_explicit(&self) -> bool {
        *self != TransferSyntax::ImplicitLittle
    }
}

/// Rescaled samples of one slice, ready for [`ImgArray::from_vec`].
#[derive(Clone, Debug, PartialEq)]
pub struct PixelData {
    pub height: usize,
    pub width: usize,
    pub channel: usize,
    pub array: Vec<f32>,
    pub unit: &'static str,
}

/// A parsed DICOM stream: the file meta group and the data set that follows it.
#[derive(Clone, Debug)]
pub struct Dicom {
    meta: BTreeMap<Tag, Element>,
    elements: BTreeMap<Tag, Element>,
    syntax: TransferSyntax,
}

impl Dicom {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dicom> {
        let bytes = fs::read(path.as_ref())?;
        debug!("read {} bytes from {}", bytes.len(), path.as_ref().display());

        Dicom::parse(&bytes)
    }

    pub fn parse(bytes: &[u8]) -> Result<Dicom> {
        if bytes.get(PREAMBLE..PREAMBLE + MAGIC.len()) != Some(MAGIC.as_slice()) {
            warn!("no DICM marker in a {}-byte stream", bytes.len());
            bail!(FormatError::MissingMagic);
        }

        let mut reader = ByteReader::new(bytes, PREAMBLE + MAGIC.len());
        let meta = read_meta(&mut reader)?;

        let syntax = match meta.get(&Tag::TRANSFER_SYNTAX) {
            Some(element) => {
                let uid = element.value.as_text().unwrap_or_default();
                TransferSyntax::from_uid(uid).ok_or_else(|| {
                    warn!("unsupported transfer syntax {uid}");
                    FormatError::UnsupportedTransferSyntax(uid.to_string())
                })?
            }
            None => TransferSyntax::default(),
        };
        debug!("transfer syntax {syntax:?} ({})", syntax.uid());

        let mut elements = BTreeMap::new();
        while !reader.is_empty() {
            let element = read_element(&mut reader, syntax.order(), syntax.is_explicit())?;
            elements.insert(element.tag, element);
        }
        debug!("parsed {} meta and {} data elements", meta.len(), elements.len());

        Ok(Dicom {
            meta,
            elements,
            syntax,
        })
    }

    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.syntax
    }

    pub fn meta(&self) -> &BTreeMap<Tag, Element> {
        &self.meta
    }

    pub fn elements(&self) -> &BTreeMap<Tag, Element> {
        &self.elements
    }

    /// Looks in the data set first, then the file meta group.
    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.elements.get(&tag).or_else(|| self.meta.get(&tag))
    }

    fn require(&self, tag: Tag) -> Result<&Element> {
        match self.get(tag) {
            Some(element) => Ok(element),
            None => {
                warn!("element {tag} is missing");
                bail!(FormatError::MissingElement(tag));
            }
        }
    }

    fn number_or(&self, tag: Tag, default: f64) -> Result<f64> {
        match self.get(tag) {
            None => Ok(default),
            Some(element) => match element.value.as_f64() {
                Some(value) => Ok(value),
                None => bail!(FormatError::InvalidValue { tag }),
            },
        }
    }

    fn dimension(&self, tag: Tag) -> Result<usize> {
        match self.require(tag)?.value.as_u32() {
            Some(value) => Ok(value as usize),
            None => bail!(FormatError::InvalidValue { tag }),
        }
    }

    /// Pixel samples as Hounsfield units: `raw * slope + intercept`.
    pub fn pixel_data(&self) -> Result<PixelData> {
        let height = self.dimension(Tag::ROWS)?;
        let width = self.dimension(Tag::COLUMNS)?;

        let bits = match self.get(Tag::BITS_ALLOCATED) {
            Some(element) => element
                .value
                .as_u32()
                .ok_or(FormatError::InvalidValue {
                    tag: Tag::BITS_ALLOCATED,
                })?,
            None => 16,
        };
        if bits != 16 {
            warn!("{bits}-bit pixel data");
            bail!(FormatError::UnsupportedPixelFormat { bits });
        }

        let signed = self
            .get(Tag::PIXEL_REPRESENTATION)
            .and_then(|element| element.value.as_u32())
            .map_or(true, |representation| representation != 0);
        let slope = self.number_or(Tag::RESCALE_SLOPE, 1.0)?;
        let intercept = self.number_or(Tag::RESCALE_INTERCEPT, 0.0)?;
        let order = self.syntax.order();

        let expected = height * width;
        let array: Vec<f32> = self
            .require(Tag::PIXEL_DATA)?
            .data
            .chunks_exact(2)
            .take(expected)
            .map(|pair| {
                let pair = [pair[0], pair[1]];
                let raw = if signed {
                    f64::from(order.i16(pair))
                } else {
                    f64::from(order.u16(pair))
                };
                (raw * slope + intercept) as f32
            })
            .collect();

        if array.len() != expected {
            warn!("{} samples for a {height}x{width} slice", array.len());
            bail!(FormatError::PixelCount {
                expected,
                found: array.len(),
            });
        }

        Ok(PixelData {
            height,
            width,
            channel: 1,
            array,
            unit: "HU",
        })
    }

    pub fn to_array(&self) -> Result<ImgArray<f32>> {
        let pixels = self.pixel_data()?;
        let shape = Shape::new(pixels.height, pixels.width, pixels.channel)?;

        ImgArray::from_vec(pixels.array, shape)
    }
}

// The meta group is always explicit little endian and opens with its own length.
fn read_meta(reader: &mut ByteReader) -> Result<BTreeMap<Tag, Element>> {
    let first = read_element(reader, ByteOrder::Little, true)?;
    if first.tag != Tag::GROUP_LENGTH {
        warn!("meta group opens with {}", first.tag);
        bail!(FormatError::BadMetaHeader { tag: first.tag });
    }

    let length = first.value.as_u32().ok_or(FormatError::InvalidValue {
        tag: Tag::GROUP_LENGTH,
    })?;
    let end = reader.offset() + length as usize;

    let mut meta = BTreeMap::from([(first.tag, first)]);
    while reader.offset() < end {
        let element = read_element(reader, ByteOrder::Little, true)?;
        meta.insert(element.tag, element);
    }

    Ok(meta)
}

fn read_element(reader: &mut ByteReader, order: ByteOrder, explicit: bool) -> Result<Element> {
    let tag = reader.tag(order)?;

    let (vr, length) = if tag.is_delimiter() {
        (Vr::UN, reader.u32(order)?)
    } else if explicit {
        let vr = Vr::from_code(reader.vr_code()?);
        if vr.has_long_length() {
            reader.skip(2)?;
            (vr, reader.u32(order)?)
        } else {
            (vr, u32::from(reader.u16(order)?))
        }
    } else {
        (Vr::implicit(tag), reader.u32(order)?)
    };

    if length == UNDEFINED_LENGTH && !tag.is_delimiter() {
        debug!("skipping undefined-length {tag} ({vr})");
        skip_sequence(reader, order, explicit)?;

        return Ok(Element {
            tag,
            vr,
            length,
            data: Vec::new(),
            value: Value::Bytes,
        });
    }

    let data = if length == UNDEFINED_LENGTH {
        Vec::new()
    } else {
        reader.take(length as usize)?.to_vec()
    };
    let value = vr.decode(tag, &data, order)?;

    Ok(Element {
        tag,
        vr,
        length,
        data,
        value,
    })
}

// Consumes items up to and including the sequence delimiter.
fn skip_sequence(reader: &mut ByteReader, order: ByteOrder, explicit: bool) -> Result<()> {
    loop {
        let offset = reader.offset();
        let tag = reader.tag(order)?;
        let length = reader.u32(order)?;

        match tag {
            Tag::SEQUENCE_DELIMITATION => return Ok(()),
            Tag::ITEM if length == UNDEFINED_LENGTH => skip_item(reader, order, explicit)?,
            Tag::ITEM => reader.skip(length as usize)?,
            _ => {
                warn!("{tag} inside a sequence at byte {offset}");
                bail!(FormatError::UnexpectedTag { tag, offset });
            }
        }
    }
}

fn skip_item(reader: &mut ByteReader, order: ByteOrder, explicit: bool) -> Result<()> {
    loop {
        if read_element(reader, order, explicit)?.tag == Tag::ITEM_DELIMITATION {
            return Ok(());
        }
    }
}
