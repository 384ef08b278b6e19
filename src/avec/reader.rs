//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{io::Read, vec::Vec};

use thiserror::Error;

use crate::sans::{data::Record, header::DocumentHeader, length::FieldLength};

use super::slice;

extern crate std;

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The document read was malformed.
    #[error(transparent)]
    Slice(#[from] slice::Error),
}

/// Read a single document from a reader and decode its records.
///
/// Only the bytes making up the document are consumed. This method is also
/// re-exported as `domestique::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read, length: &impl FieldLength) -> Result<Vec<Record>, Error> {
    let head: [u8; 12] = take(r)?;
    let header = DocumentHeader::decode(head).map_err(slice::Error::from)?;

    // Remainder of the header, the records, and the trailing CRC.
    let remaining = u64::from(header.header_size) - 12 + u64::from(header.data_size) + 2;

    let mut document = head.to_vec();
    r.take(remaining).read_to_end(&mut document)?;

    Ok(slice::decode(&document, length)?)
}

/// Take an exact number of bytes from a reader.
fn take<const N: usize>(r: &mut impl Read) -> Result<[u8; N], Error> {
    let mut buf = [0; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}
