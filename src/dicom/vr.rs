use anyhow::{bail, Result};
use std::fmt::{self, Display, Formatter};

use crate::dicom::{
    element::{Tag, Value},
    errors::FormatError,
    reader::ByteOrder,
};

/// Two-letter value representation.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vr {
    AE,
    AS,
    AT,
    CS,
    DA,
    DS,
    DT,
    FD,
    FL,
    IS,
    LO,
    LT,
    OB,
    OD,
    OF,
    OL,
    OW,
    PN,
    SH,
    SL,
    SQ,
    SS,
    ST,
    TM,
    UC,
    UI,
    UL,
    UN,
    UR,
    US,
    UT,
    Unknown([u8; 2]),
}

impl Vr {
    pub fn from_code(code: [u8; 2]) -> Vr {
        match &code {
            b"AE" => Vr::AE,
            b"AS" => Vr::AS,
            b"AT" => Vr::AT,
            b"CS" => Vr::CS,
            b"DA" => Vr::DA,
            b"DS" => Vr::DS,
            b"DT" => Vr::DT,
            b"FD" => Vr::FD,
            b"FL" => Vr::FL,
            b"IS" => Vr::IS,
            b"LO" => Vr::LO,
            b"LT" => Vr::LT,
            b"OB" => Vr::OB,
            b"OD" => Vr::OD,
            b"OF" => Vr::OF,
            b"OL" => Vr::OL,
            b"OW" => Vr::OW,
            b"PN" => Vr::PN,
            b"SH" => Vr::SH,
            b"SL" => Vr::SL,
            b"SQ" => Vr::SQ,
            b"SS" => Vr::SS,
            b"ST" => Vr::ST,
            b"TM" => Vr::TM,
            b"UC" => Vr::UC,
            b"UI" => Vr::UI,
            b"UL" => Vr::UL,
            b"UN" => Vr::UN,
            b"UR" => Vr::UR,
            b"US" => Vr::US,
            b"UT" => Vr::UT,
            _ => Vr::Unknown(code),
        }
    }

    /// Explicit encodings of these VRs skip 2 reserved bytes and use a 4-byte length.
    pub fn has_long_length(&self) -> bool {
        matches!(
            self,
            Vr::OB | Vr::OD | Vr::OF | Vr::OL | Vr::OW | Vr::SQ | Vr::UC | Vr::UN | Vr::UR | Vr::UT
        )
    }

    /// VR of `tag` in an implicit stream. Only the attributes needed to reach the pixels are
    /// known; everything else reads as `UI`.
    pub fn implicit(tag: Tag) -> Vr {
        match (tag.group, tag.element) {
            (0x0002, 0x0000) | (0x7fe0, 0x0000) => Vr::UL,
            (0x0002, 0x0010) => Vr::UI,
            (0x0002, 0x0013) | (0x0020, 0x0010) => Vr::SH,
            (0x0008, 0x0005) | (0x0008, 0x0008) | (0x0008, 0x0060) | (0x0028, 0x0004) => Vr::CS,
            (0x0008, 0x1032) | (0x0008, 0x1111) => Vr::SQ,
            (0x0040, 0x0008) | (0x0040, 0x0260) | (0x0040, 0x0275) => Vr::SQ,
            (0x0008, 0x0020) | (0x0010, 0x0030) => Vr::DA,
            (0x0008, 0x0070) | (0x0008, 0x0080) | (0x0010, 0x0020) | (0x0018, 0x1030) => Vr::LO,
            (0x0010, 0x0010) => Vr::PN,
            (0x0018, 0x0060) => Vr::DS,
            (0x0018, 0x1151) => Vr::IS,
            (0x0020, 0x0011..=0x0013) => Vr::IS,
            (0x0028, 0x0002) | (0x0028, 0x0010) | (0x0028, 0x0011) => Vr::US,
            (0x0028, 0x0100..=0x0103) => Vr::US,
            (0x0028, 0x1050..=0x1053) => Vr::DS,
            (0x7fe0, 0x0010) => Vr::OB,
            _ => Vr::UI,
        }
    }

    fn is_text(&self) -> bool {
        matches!(
            self,
            Vr::AE
                | Vr::AS
                | Vr::CS
                | Vr::DA
                | Vr::DS
                | Vr::DT
                | Vr::IS
                | Vr::LO
                | Vr::LT
                | Vr::PN
                | Vr::SH
                | Vr::ST
                | Vr::TM
                | Vr::UC
                | Vr::UI
                | Vr::UR
                | Vr::UT
        )
    }

    /// Interprets `data` as the value of `tag`. Numeric VRs read their first value only.
    pub fn decode(&self, tag: Tag, data: &[u8], order: ByteOrder) -> Result<Value> {
        if data.is_empty() {
            return Ok(Value::Empty);
        }
        if self.is_text() {
            let text = String::from_utf8_lossy(data);
            return Ok(Value::Text(
                text.trim_end_matches(['\0', ' ']).to_string(),
            ));
        }

        let width = match self {
            Vr::US | Vr::SS | Vr::AT => 2,
            Vr::UL | Vr::SL | Vr::FL => 4,
            Vr::FD => 8,
            _ => return Ok(Value::Bytes),
        };
        if data.len() < width {
            bail!(FormatError::ShortValue {
                tag,
                vr: *self,
                length: data.len(),
            });
        }

        let two = [data[0], data[1]];
        Ok(match self {
            Vr::US | Vr::AT => Value::U16(order.u16(two)),
            Vr::SS => Value::I16(order.i16(two)),
            Vr::UL => Value::U32(order.u32([data[0], data[1], data[2], data[3]])),
            Vr::SL => Value::I32(order.i32([data[0], data[1], data[2], data[3]])),
            Vr::FL => Value::F32(order.f32([data[0], data[1], data[2], data[3]])),
            _ => {
                let mut eight = [0u8; 8];
                eight.copy_from_slice(&data[..8]);
                Value::F64(order.f64(eight))
            }
        })
    }
}

impl Display for Vr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Vr::Unknown(code) => write!(f, "{}", String::from_utf8_lossy(code)),
            known => write!(f, "{known:?}"),
        }
    }
}

#[cfg(test)]
mod vr_tests {
    use super::*;

    #[test]
    fn codes_and_lengths() {
        assert_eq!(Vr::from_code(*b"OW"), Vr::OW);
        assert!(Vr::OW.has_long_length());
        assert!(!Vr::US.has_long_length());
        assert_eq!(Vr::from_code(*b"ZZ"), Vr::Unknown(*b"ZZ"));
        assert_eq!(Vr::Unknown(*b"ZZ").to_string(), "ZZ");
        assert_eq!(Vr::DS.to_string(), "DS");
    }

    #[test]
    fn implicit_table() {
        assert_eq!(Vr::implicit(Tag::ROWS), Vr::US);
        assert_eq!(Vr::implicit(Tag::RESCALE_SLOPE), Vr::DS);
        assert_eq!(Vr::implicit(Tag::PIXEL_DATA), Vr::OB);
        assert_eq!(Vr::implicit(Tag::new(0x0009, 0x0001)), Vr::UI);
    }

    #[test]
    fn decodes_values() {
        let tag = Tag::ROWS;

        let text = Vr::UI.decode(tag, b"1.2.840.10008.1.2\0", ByteOrder::Little).unwrap();
        assert_eq!(text, Value::Text("1.2.840.10008.1.2".into()));

        let big = Vr::US.decode(tag, &[0x02, 0x00], ByteOrder::Big).unwrap();
        assert_eq!(big, Value::U16(512));

        let signed = Vr::SS.decode(tag, &[0xfe, 0xff], ByteOrder::Little).unwrap();
        assert_eq!(signed, Value::I16(-2));

        assert_eq!(Vr::OB.decode(tag, &[1, 2], ByteOrder::Little).unwrap(), Value::Bytes);
        assert_eq!(Vr::US.decode(tag, &[], ByteOrder::Little).unwrap(), Value::Empty);
    }

    #[test]
    fn short_numeric_value() {
        let error = Vr::UL.decode(Tag::GROUP_LENGTH, &[1, 2], ByteOrder::Little).unwrap_err();

        assert_eq!(
            error.downcast_ref::<FormatError>(),
            Some(&FormatError::ShortValue {
                tag: Tag::GROUP_LENGTH,
                vr: Vr::UL,
                length: 2,
            })
        );
    }
}
