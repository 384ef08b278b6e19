//! A FIT codec assembled from the primitives in [`crate::sans`].
//!
//! The rewrite engine never touches bytes itself. It decodes and rebuilds
//! documents through the [`Codec`] and [`Builder`] capabilities, which
//! [`FitCodec`] implements with the decoder in [`slice`] and the encoder in
//! [`builder`].

pub mod builder;
#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

use alloc::vec::Vec;
use core::fmt::Display;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

use crate::sans::{
    data::Record,
    length::{FieldLength, Lenient},
};

use builder::FitBuilder;

/// Decode a document into its ordered records, and produce builders to
/// encode new ones.
pub trait Codec {
    /// An error decoding a document.
    type Error: Display;
    /// The builder encoding new documents.
    type Builder: Builder;

    /// Decode a document into its ordered records.
    fn decode(&self, r: &[u8]) -> Result<Vec<Record>, Self::Error>;

    /// Start a new document.
    fn builder(&self) -> Self::Builder;
}

/// Accumulate records and encode them as a document.
pub trait Builder {
    /// An error encoding a document.
    type Error;

    /// Append a record to the document.
    fn add(&mut self, record: Record);

    /// Encode the document, including its header and trailing CRC.
    fn build(self) -> Result<Vec<u8>, Self::Error>;
}

/// The FIT codec, parameterised by its field-length policy.
#[derive(Debug, Default, Clone)]
pub struct FitCodec<L = Lenient> {
    length: L,
}

impl FitCodec {
    /// A codec tolerating fields that are not a whole number of elements.
    pub fn new() -> Self {
        Self { length: Lenient }
    }
}

impl<L: FieldLength> FitCodec<L> {
    /// A codec applying a specific field-length policy.
    pub fn with_length(length: L) -> Self {
        Self { length }
    }
}

impl<L: FieldLength> Codec for FitCodec<L> {
    type Error = slice::Error;
    type Builder = FitBuilder;

    fn decode(&self, r: &[u8]) -> Result<Vec<Record>, Self::Error> {
        slice::decode(r, &self.length)
    }

    fn builder(&self) -> Self::Builder {
        FitBuilder::new()
    }
}
