use imgnum::{
    dicom::{
        element::{Tag, Value},
        errors::FormatError,
        vr::Vr,
        ByteOrder, Dicom, TransferSyntax,
    },
    Shape,
};

const EXPLICIT_LE: &str = "1.2.840.10008.1.2.1";
const EXPLICIT_BE: &str = "1.2.840.10008.1.2.2";
const IMPLICIT_LE: &str = "1.2.840.10008.1.2";

#[derive(Clone, Copy)]
struct Encoding {
    big: bool,
    explicit: bool,
}

const LE: Encoding = Encoding {
    big: false,
    explicit: true,
};

impl Encoding {
    fn u16(&self, value: u16) -> [u8; 2] {
        if self.big {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    fn u32(&self, value: u32) -> [u8; 4] {
        if self.big {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        }
    }

    fn tag(&self, out: &mut Vec<u8>, tag: Tag) {
        out.extend(self.u16(tag.group));
        out.extend(self.u16(tag.element));
    }

    fn element(&self, out: &mut Vec<u8>, tag: Tag, vr: &[u8; 2], value: &[u8]) {
        self.tag(out, tag);
        if self.explicit {
            out.extend(vr);
            if matches!(vr, b"OB" | b"OW" | b"SQ" | b"UN" | b"UT" | b"OF") {
                out.extend([0, 0]);
                out.extend(self.u32(value.len() as u32));
            } else {
                out.extend(self.u16(value.len() as u16));
            }
        } else {
            out.extend(self.u32(value.len() as u32));
        }
        out.extend(value);
    }

    fn samples(&self, values: &[i16]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|&value| self.u16(value as u16))
            .collect()
    }
}

fn header(uid: &str) -> Vec<u8> {
    let mut uid = uid.as_bytes().to_vec();
    if uid.len() % 2 == 1 {
        uid.push(0);
    }

    let mut meta = Vec::new();
    LE.element(&mut meta, Tag::TRANSFER_SYNTAX, b"UI", &uid);

    let mut bytes = vec![0u8; 128];
    bytes.extend(b"DICM");
    LE.element(&mut bytes, Tag::GROUP_LENGTH, b"UL", &(meta.len() as u32).to_le_bytes());
    bytes.extend(meta);
    bytes
}

fn slice(encoding: Encoding, uid: &str) -> Vec<u8> {
    let mut bytes = header(uid);
    encoding.element(&mut bytes, Tag::ROWS, b"US", &encoding.u16(2));
    encoding.element(&mut bytes, Tag::COLUMNS, b"US", &encoding.u16(3));
    encoding.element(&mut bytes, Tag::RESCALE_INTERCEPT, b"DS", b"-1024 ");
    encoding.element(&mut bytes, Tag::RESCALE_SLOPE, b"DS", b"2 ");
    encoding.element(
        &mut bytes,
        Tag::PIXEL_DATA,
        b"OW",
        &encoding.samples(&[0, 1, 2, 512, -1, 1000]),
    );
    bytes
}

const EXPECTED_HU: [f32; 6] = [-1024.0, -1022.0, -1020.0, 0.0, -1026.0, 976.0];

fn format_error(error: &anyhow::Error) -> Option<&FormatError> {
    error.downcast_ref::<FormatError>()
}

#[test]
fn minimal_explicit_little_endian_header() {
    let dicom = Dicom::parse(&header(EXPLICIT_LE)).unwrap();

    let syntax = dicom.transfer_syntax();
    assert_eq!(syntax, TransferSyntax::ExplicitLittle);
    assert_eq!(syntax.order(), ByteOrder::Little);
    assert!(syntax.is_explicit());
    assert!(dicom.elements().is_empty());
    assert_eq!(dicom.meta().len(), 2);
}

#[test]
fn explicit_little_endian_slice() {
    let dicom = Dicom::parse(&slice(LE, EXPLICIT_LE)).unwrap();

    let rows = dicom.get(Tag::ROWS).unwrap();
    assert_eq!((rows.vr, rows.value.clone()), (Vr::US, Value::U16(2)));
    assert_eq!(
        dicom.get(Tag::TRANSFER_SYNTAX).unwrap().value,
        Value::Text(EXPLICIT_LE.to_string())
    );

    let pixels = dicom.pixel_data().unwrap();
    assert_eq!((pixels.height, pixels.width, pixels.channel), (2, 3, 1));
    assert_eq!(pixels.unit, "HU");
    assert_eq!(pixels.array, EXPECTED_HU);

    let array = dicom.to_array().unwrap();
    assert_eq!(array.shape(), Shape::new(2, 3, 1).unwrap());
    assert_eq!(array.get(1, 0, 0).unwrap(), 0.0);
}

#[test]
fn explicit_big_endian_slice() {
    let encoding = Encoding {
        big: true,
        explicit: true,
    };
    let dicom = Dicom::parse(&slice(encoding, EXPLICIT_BE)).unwrap();

    assert_eq!(dicom.transfer_syntax().order(), ByteOrder::Big);
    assert_eq!(dicom.get(Tag::COLUMNS).unwrap().value, Value::U16(3));
    assert_eq!(dicom.pixel_data().unwrap().array, EXPECTED_HU);
}

#[test]
fn implicit_little_endian_slice() {
    let encoding = Encoding {
        big: false,
        explicit: false,
    };
    let dicom = Dicom::parse(&slice(encoding, IMPLICIT_LE)).unwrap();

    assert_eq!(dicom.transfer_syntax(), TransferSyntax::ImplicitLittle);
    assert_eq!(dicom.get(Tag::RESCALE_SLOPE).unwrap().vr, Vr::DS);
    assert_eq!(dicom.get(Tag::PIXEL_DATA).unwrap().vr, Vr::OB);
    assert_eq!(dicom.pixel_data().unwrap().array, EXPECTED_HU);
}

#[test]
fn missing_rescale_defaults_to_identity() {
    let mut bytes = header(EXPLICIT_LE);
    LE.element(&mut bytes, Tag::ROWS, b"US", &LE.u16(1));
    LE.element(&mut bytes, Tag::COLUMNS, b"US", &LE.u16(2));
    LE.element(&mut bytes, Tag::PIXEL_DATA, b"OW", &LE.samples(&[-5, 7]));

    let pixels = Dicom::parse(&bytes).unwrap().pixel_data().unwrap();
    assert_eq!(pixels.array, vec![-5.0, 7.0]);
}

#[test]
fn unsigned_pixel_representation() {
    let mut bytes = header(EXPLICIT_LE);
    LE.element(&mut bytes, Tag::ROWS, b"US", &LE.u16(1));
    LE.element(&mut bytes, Tag::COLUMNS, b"US", &LE.u16(1));
    LE.element(&mut bytes, Tag::PIXEL_REPRESENTATION, b"US", &LE.u16(0));
    LE.element(&mut bytes, Tag::PIXEL_DATA, b"OW", &[0xff, 0xff]);

    let pixels = Dicom::parse(&bytes).unwrap().pixel_data().unwrap();
    assert_eq!(pixels.array, vec![65535.0]);
}

#[test]
fn undefined_length_sequence_is_skipped() {
    let mut bytes = header(EXPLICIT_LE);

    LE.tag(&mut bytes, Tag::new(0x0008, 0x1111));
    bytes.extend(b"SQ");
    bytes.extend([0, 0]);
    bytes.extend(LE.u32(u32::MAX));
    LE.tag(&mut bytes, Tag::ITEM);
    bytes.extend(LE.u32(u32::MAX));
    LE.element(&mut bytes, Tag::new(0x0008, 0x1150), b"UI", b"1.2\0");
    LE.tag(&mut bytes, Tag::ITEM_DELIMITATION);
    bytes.extend(LE.u32(0));
    LE.tag(&mut bytes, Tag::ITEM);
    bytes.extend(LE.u32(2));
    bytes.extend([7, 7]);
    LE.tag(&mut bytes, Tag::SEQUENCE_DELIMITATION);
    bytes.extend(LE.u32(0));

    LE.element(&mut bytes, Tag::ROWS, b"US", &LE.u16(1));
    LE.element(&mut bytes, Tag::COLUMNS, b"US", &LE.u16(1));
    LE.element(&mut bytes, Tag::PIXEL_DATA, b"OW", &LE.samples(&[3]));

    let dicom = Dicom::parse(&bytes).unwrap();
    let sequence = dicom.get(Tag::new(0x0008, 0x1111)).unwrap();
    assert_eq!((sequence.vr, sequence.length), (Vr::SQ, u32::MAX));
    assert!(dicom.get(Tag::new(0x0008, 0x1150)).is_none());
    assert_eq!(dicom.pixel_data().unwrap().array, vec![3.0]);
}

#[test]
fn missing_magic() {
    let error = Dicom::parse(&[0u8; 132]).unwrap_err();
    assert_eq!(format_error(&error), Some(&FormatError::MissingMagic));

    let error = Dicom::parse(b"DICM").unwrap_err();
    assert_eq!(format_error(&error), Some(&FormatError::MissingMagic));
}

#[test]
fn meta_group_must_open_with_its_length() {
    let mut bytes = vec![0u8; 128];
    bytes.extend(b"DICM");
    LE.element(&mut bytes, Tag::TRANSFER_SYNTAX, b"UI", b"1.2.840.10008.1.2\0");

    let error = Dicom::parse(&bytes).unwrap_err();
    assert_eq!(
        format_error(&error),
        Some(&FormatError::BadMetaHeader {
            tag: Tag::TRANSFER_SYNTAX
        })
    );
}

#[test]
fn unknown_transfer_syntax() {
    let error = Dicom::parse(&header("1.2.840.10008.1.2.4.50")).unwrap_err();

    assert_eq!(
        format_error(&error),
        Some(&FormatError::UnsupportedTransferSyntax(
            "1.2.840.10008.1.2.4.50".to_string()
        ))
    );
}

#[test]
fn truncated_value() {
    let mut bytes = slice(LE, EXPLICIT_LE);
    bytes.truncate(bytes.len() - 3);

    let error = Dicom::parse(&bytes).unwrap_err();
    assert!(matches!(
        format_error(&error),
        Some(FormatError::Truncated { .. })
    ));
}

#[test]
fn pixel_format_checks() {
    let mut eight_bit = header(EXPLICIT_LE);
    LE.element(&mut eight_bit, Tag::ROWS, b"US", &LE.u16(1));
    LE.element(&mut eight_bit, Tag::COLUMNS, b"US", &LE.u16(2));
    LE.element(&mut eight_bit, Tag::BITS_ALLOCATED, b"US", &LE.u16(8));
    LE.element(&mut eight_bit, Tag::PIXEL_DATA, b"OB", &[1, 2]);

    let error = Dicom::parse(&eight_bit).unwrap().pixel_data().unwrap_err();
    assert_eq!(
        format_error(&error),
        Some(&FormatError::UnsupportedPixelFormat { bits: 8 })
    );

    let mut short = header(EXPLICIT_LE);
    LE.element(&mut short, Tag::ROWS, b"US", &LE.u16(2));
    LE.element(&mut short, Tag::COLUMNS, b"US", &LE.u16(2));
    LE.element(&mut short, Tag::PIXEL_DATA, b"OW", &LE.samples(&[1, 2]));

    let error = Dicom::parse(&short).unwrap().to_array().unwrap_err();
    assert_eq!(
        format_error(&error),
        Some(&FormatError::PixelCount {
            expected: 4,
            found: 2
        })
    );

    let error = Dicom::parse(&header(EXPLICIT_LE))
        .unwrap()
        .pixel_data()
        .unwrap_err();
    assert_eq!(
        format_error(&error),
        Some(&FormatError::MissingElement(Tag::ROWS))
    );
}

#[test]
fn open_reads_from_disk() {
    let path = std::env::temp_dir().join(format!("imgnum-slice-{}.dcm", std::process::id()));
    std::fs::write(&path, slice(LE, EXPLICIT_LE)).unwrap();

    let dicom = Dicom::open(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(dicom.unwrap().pixel_data().unwrap().array, EXPECTED_HU);
    assert!(Dicom::open(&path).is_err());
}
