//! Document and record headers.

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout,
    byteorder::little_endian::{U16, U32},
};

use super::check::compute_crc;

/// Protocol version written into rebuilt documents (2.0).
pub const PROTOCOL_VERSION: u8 = 0x20;

/// Profile version written into rebuilt documents (21.32).
pub const PROFILE_VERSION: u16 = 2132;

/// An error decoding a document header.
#[derive(Debug, Error)]
pub enum DocumentHeaderError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
struct FileHeader {
    header_size: u8,
    protocol_version: u8,
    profile_version: U16,
    data_size: U32,
    data_type: [u8; 4],
}

/// The leading header of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentHeader {
    /// Length of the header in bytes, 12 or 14.
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes between the header and the trailing CRC.
    pub data_size: u32,
}

impl DocumentHeader {
    /// Decode the first twelve bytes of a document.
    ///
    /// A 14-byte header is followed by a two-byte header CRC, which the caller
    /// reads separately.
    pub fn decode(r: [u8; 12]) -> Result<Self, DocumentHeaderError> {
        let FileHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(r);

        if &data_type != b".FIT" {
            Err(DocumentHeaderError::NotFitData)?;
        }

        if header_size != 12 && header_size != 14 {
            Err(DocumentHeaderError::UnknownHeaderLength(header_size))?;
        }

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: profile_version.get(),
            data_size: data_size.get(),
        })
    }

    /// Whether a header CRC follows the first twelve bytes.
    pub fn is_extended(&self) -> bool {
        self.header_size == 14
    }

    /// A 14-byte header for a rebuilt document of `data_size` record bytes.
    pub fn for_records(data_size: u32) -> Self {
        Self {
            header_size: 14,
            protocol_version: PROTOCOL_VERSION,
            profile_version: PROFILE_VERSION,
            data_size,
        }
    }

    /// Encode as a 14-byte header, including its CRC.
    pub fn encode(&self) -> [u8; 14] {
        let header = FileHeader {
            header_size: 14,
            protocol_version: self.protocol_version,
            profile_version: U16::new(self.profile_version),
            data_size: U32::new(self.data_size),
            data_type: *b".FIT",
        };

        let head: [u8; 12] = zerocopy::transmute!(header);
        let crc = compute_crc(0, &head);

        let mut r = [0; 14];
        r[..12].copy_from_slice(&head);
        r[12..].copy_from_slice(&crc.to_le_bytes());
        r
    }
}

/// A record header announcing a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionHeader {
    /// Whether developer field definitions follow the regular ones.
    pub developer: bool,
}

/// A record header announcing a data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    /// The five-bit time offset of a compressed timestamp header.
    pub time_offset: Option<u8>,
}

/// Decode a record header.
///
/// Returns the local message number, and whether a definition or data record
/// follows.
pub fn decode_record_header(r: [u8; 1]) -> (u8, Either<DefinitionHeader, DataHeader>) {
    let r = r[0];

    bitfield! {
        struct RecordHeader(u8) {
            [7] is_compressed,
        }
    }

    let header = RecordHeader(r);

    if header.is_compressed() {
        bitfield! {
            struct CompressedHeader(u8) {
                [0..5] time_offset: u8,
                [5..7] local_message: u8,
            }
        }

        let header = CompressedHeader(r);

        let successor = Right(DataHeader {
            time_offset: Some(header.time_offset()),
        });

        (header.local_message(), successor)
    } else {
        bitfield! {
            struct NormalHeader(u8) {
                [0..4] local_message: u8,
                [5] is_developer,
                [6] is_definition,
            }
        }

        let header = NormalHeader(r);

        let successor = if header.is_definition() {
            Left(DefinitionHeader {
                developer: header.is_developer(),
            })
        } else {
            Right(DataHeader { time_offset: None })
        };

        (header.local_message(), successor)
    }
}

/// Encode a normal definition record header.
pub fn encode_definition_header(local: u8, developer: bool) -> u8 {
    let developer = if developer { 0x20 } else { 0 };
    0x40 | developer | (local & 0x0F)
}

/// Encode a normal data record header.
pub fn encode_data_header(local: u8) -> u8 {
    local & 0x0F
}
