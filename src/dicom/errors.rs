use crate::dicom::{element::Tag, vr::Vr};
use thiserror::Error;

/// Structural problems that stop a DICOM stream from being decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Missing `DICM` marker after the 128-byte preamble.")]
    MissingMagic,

    #[error("Stream ends before byte {end} (length {length}).")]
    Truncated { end: usize, length: usize },

    #[error("File meta group must open with 0002,0000 group length, found {tag}.")]
    BadMetaHeader { tag: Tag },

    #[error("Transfer syntax `{0}` is not supported.")]
    UnsupportedTransferSyntax(String),

    #[error("Element {tag} is unexpected inside a sequence at byte {offset}.")]
    UnexpectedTag { tag: Tag, offset: usize },

    #[error("Required element {0} is missing.")]
    MissingElement(Tag),

    #[error("Element {tag} ({vr}) holds {length} bytes, too few for its value.")]
    ShortValue { tag: Tag, vr: Vr, length: usize },

    #[error("Element {tag} does not hold a usable number.")]
    InvalidValue { tag: Tag },

    #[error("Pixel data with {bits} bits allocated is not supported.")]
    UnsupportedPixelFormat { bits: u32 },

    #[error("Pixel data holds {found} samples, expected {expected}.")]
    PixelCount { expected: usize, found: usize },
}
