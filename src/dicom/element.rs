use std::fmt::{Display, Formatter, Result};

use crate::dicom::vr::Vr;

/// `(group, element)` attribute code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub group: u16,
    pub element: u16,
}

impl Tag {
    pub const GROUP_LENGTH: Tag = Tag::new(0x0002, 0x0000);
    pub const TRANSFER_SYNTAX: Tag = Tag::new(0x0002, 0x0010);
    pub const ROWS: Tag = Tag::new(0x0028, 0x0010);
    pub const COLUMNS: Tag = Tag::new(0x0028, 0x0011);
    pub const BITS_ALLOCATED: Tag = Tag::new(0x0028, 0x0100);
    pub const PIXEL_REPRESENTATION: Tag = Tag::new(0x0028, 0x0103);
    pub const RESCALE_INTERCEPT: Tag = Tag::new(0x0028, 0x1052);
    pub const RESCALE_SLOPE: Tag = Tag::new(0x0028, 0x1053);
    pub const PIXEL_DATA: Tag = Tag::new(0x7fe0, 0x0010);
    pub const ITEM: Tag = Tag::new(0xfffe, 0xe000);
    pub const ITEM_DELIMITATION: Tag = Tag::new(0xfffe, 0xe00d);
    pub const SEQUENCE_DELIMITATION: Tag = Tag::new(0xfffe, 0xe0dd);

    pub const fn new(group: u16, element: u16) -> Tag {
        Tag { group, element }
    }

    /// Items and delimiters never carry a VR, even in explicit streams.
    pub fn is_delimiter(&self) -> bool {
        self.group == 0xfffe
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:04x},{:04x}", self.group, self.element)
    }
}

/// Decoded value of an element. Binary VRs keep their payload in [`Element::data`] only.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    F64(f64),
    Bytes,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer view; `IS` strings are parsed.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::U16(value) => Some(value.into()),
            Value::U32(value) => Some(value),
            Value::I16(value) => u32::try_from(value).ok(),
            Value::I32(value) => u32::try_from(value).ok(),
            Value::Text(ref text) => first_component(text).parse().ok(),
            _ => None,
        }
    }

    /// Numeric view; `DS`/`IS` strings are parsed, multi-valued strings yield their first value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::U16(value) => Some(value.into()),
            Value::I16(value) => Some(value.into()),
            Value::U32(value) => Some(value.into()),
            Value::I32(value) => Some(value.into()),
            Value::F32(value) => Some(value.into()),
            Value::F64(value) => Some(value),
            Value::Text(ref text) => first_component(text).parse().ok(),
            Value::Empty | Value::Bytes => None,
        }
    }
}

fn first_component(text: &str) -> &str {
    text.split('\\').next().unwrap_or_default().trim()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub vr: Vr,
    /// Length field as stored; `0xffffffff` marks an undefined length.
    pub length: u32,
    pub data: Vec<u8>,
    pub value: Value,
}

#[cfg(test)]
mod element_tests {
    use super::*;

    #[test]
    fn tag_display() {
        assert_eq!(Tag::PIXEL_DATA.to_string(), "7fe0,0010");
        assert!(Tag::ITEM.is_delimiter());
        assert!(Tag::ROWS < Tag::PIXEL_DATA);
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Text("-1024.5\\2".into()).as_f64(), Some(-1024.5));
        assert_eq!(Value::Text(" 12 ".into()).as_u32(), Some(12));
        assert_eq!(Value::I16(-3).as_u32(), None);
        assert_eq!(Value::U16(512).as_f64(), Some(512.0));
        assert_eq!(Value::Bytes.as_f64(), None);
    }
}
