//! Slice-based decoder implementation.

use alloc::vec::Vec;

use either::Either::{Left, Right};
use thiserror::Error;

use crate::sans::{
    check::compute_crc,
    data::{DeveloperField, Field, Message, Record},
    definition::{
        Architecture, BaseType, Definition, DeveloperFieldDefinition, FieldDefinition,
        decode_definition,
    },
    header::{
        DataHeader, DefinitionHeader, DocumentHeader, DocumentHeaderError, decode_record_header,
    },
    length::{FieldLength, FieldSizeError, kept_size},
};

/// Field number of the `timestamp` field shared by most messages.
const TIMESTAMP: u8 = 253;

/// Errors occurring while decoding from a slice.
#[derive(Debug, Error)]
pub enum Error {
    /// Unexpectedly reached the end of the slice.
    #[error("Unexpectedly reached the end of the slice.")]
    EndOfSlice,
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    CyclicRedundancyCheck { found: u16, calculated: u16 },
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] DocumentHeaderError),
    /// A field definition declared an unknown base type.
    #[error("Unknown base type ({0:#04x}).")]
    UnknownBaseType(u8),
    /// A field size was rejected by the field-length policy.
    #[error("Malformed field: {0}")]
    FieldSize(#[from] FieldSizeError),
    /// A data record referenced a local message with no definition.
    #[error("Data record for undefined local message ({0}).")]
    UndefinedLocalMessage(u8),
}

/// Decode the records of a document held in a slice.
///
/// This method is also re-exported as `domestique::avec::decode_slice`.
pub fn decode(r: &[u8], length: &impl FieldLength) -> Result<Vec<Record>, Error> {
    let i = &mut 0; // Counter of bytes read, used to read bytes from the tip.

    let header = DocumentHeader::decode(take(r, i)?)?;

    if header.is_extended() {
        let found = u16::from_le_bytes(take(r, i)?);
        let calculated = compute_crc(0, &r[..12]);

        // A zero header CRC means none was computed.
        if found != 0 && found != calculated {
            log::debug!("Ignoring header CRC mismatch ({found} != {calculated})");
        }
    }

    let end = *i + header.data_size as usize; // Offset to the end of the record section.

    // Apply the cyclic redundancy check before continuing.
    let found = u16::from_le_bytes(take(r, &mut end.clone())?);
    let calculated = compute_crc(0, r.get(..end).ok_or(Error::EndOfSlice)?);

    if found != calculated {
        Err(Error::CyclicRedundancyCheck { found, calculated })?;
    }

    if r.len() > end + 2 {
        log::debug!(
            "Ignoring {} bytes following the first document",
            r.len() - end - 2
        );
    }

    // Records must not run into the trailing CRC.
    let r = &r[..end];

    // Store of previous definition records, used to decode data records.
    let mut definitions: [Option<(Architecture, Definition)>; 16] = Default::default();
    let mut timestamp = None;
    let mut records = Vec::new();

    while *i < end {
        let (local, successor) = decode_record_header(take(r, i)?);

        match successor {
            Left(state) => {
                let (architecture, definition) = read_definition(state, r, i)?;
                records.push(Record::Definition(definition.clone()));
                definitions[local as usize] = Some((architecture, definition));
            }
            Right(state) => {
                let (architecture, definition) = definitions[local as usize]
                    .as_ref()
                    .ok_or(Error::UndefinedLocalMessage(local))?;

                let message = read_data(
                    state,
                    *architecture,
                    definition,
                    r,
                    i,
                    length,
                    &mut timestamp,
                )?;

                log::trace!("Decoded message {} from local {local}", message.global);
                records.push(Record::Data(message));
            }
        }
    }

    Ok(records)
}

fn read_definition(
    state: DefinitionHeader,
    r: &[u8],
    i: &mut usize,
) -> Result<(Architecture, Definition), Error> {
    let (architecture, global, count) = decode_definition(take(r, i)?);

    let fields = (0..count)
        .map(|_| FieldDefinition::decode(take(r, i)?).map_err(Error::UnknownBaseType))
        .collect::<Result<Vec<_>, _>>()?;

    let developer_fields = if state.developer {
        let [count] = take(r, i)?;

        (0..count)
            .map(|_| Ok(DeveloperFieldDefinition::decode(take(r, i)?)))
            .collect::<Result<Vec<_>, Error>>()?
    } else {
        Vec::new()
    };

    let definition = Definition {
        global,
        fields,
        developer_fields,
    };

    Ok((architecture, definition))
}

fn read_data(
    state: DataHeader,
    architecture: Architecture,
    definition: &Definition,
    r: &[u8],
    i: &mut usize,
    length: &impl FieldLength,
    timestamp: &mut Option<u32>,
) -> Result<Message, Error> {
    let mut message = Message::new(definition.global);

    // The layout as it applies to this message, with truncated sizes.
    let mut layout = definition.clone();

    for (declared, effective) in definition.fields.iter().zip(layout.fields.iter_mut()) {
        let bytes = take_slice(r, i, declared.size as usize)?;

        let elements = length.length_from_size(declared.base_type, declared.size)?;
        let size = kept_size(declared.base_type, declared.size, elements);
        effective.size = size;

        let mut bytes = bytes[..size as usize].to_vec();

        if architecture == Architecture::BigEndian && !declared.base_type.is_variable() {
            swap_elements(&mut bytes, declared.base_type);
        }

        if message.field(declared.number).is_some() {
            log::debug!(
                "Ignoring repeated field {} in message {}",
                declared.number,
                definition.global
            );
        } else if declared.base_type.is_valid(&bytes) {
            message.fields.push(Field {
                number: declared.number,
                base_type: declared.base_type,
                bytes,
            });
        }
    }

    for declared in &definition.developer_fields {
        let bytes = take_slice(r, i, declared.size as usize)?;

        message.developer_fields.push(DeveloperField {
            number: declared.number,
            developer_index: declared.developer_index,
            bytes: bytes.to_vec(),
        });
    }

    message.definition = Some(layout);

    match (state.time_offset, *timestamp) {
        (Some(offset), Some(reference)) => {
            let value = expand_timestamp(reference, offset);
            *timestamp = Some(value);

            // The definition does not declare this field, so it is dropped.
            message.set(TIMESTAMP, BaseType::Uint32, value.to_le_bytes().to_vec());
        }
        (Some(_), None) => {
            log::debug!(
                "Compressed timestamp in message {} has no reference timestamp",
                message.global
            );
        }
        (None, _) => {
            if let Some(value) = message.get::<u32>(TIMESTAMP) {
                *timestamp = Some(value);
            }
        }
    }

    Ok(message)
}

/// Apply a compressed five-bit time offset to the last full timestamp.
fn expand_timestamp(reference: u32, offset: u8) -> u32 {
    let offset = u32::from(offset & 0x1F);
    let base = reference & !0x1F;

    // Timestamps wrap around at the end of the u32 range.
    if offset >= reference & 0x1F {
        base.wrapping_add(offset)
    } else {
        base.wrapping_add(offset).wrapping_add(0x20)
    }
}

/// Reverse the byte order of each element of a big-endian field.
fn swap_elements(bytes: &mut [u8], base_type: BaseType) {
    for element in bytes.chunks_exact_mut(base_type.size() as usize) {
        element.reverse();
    }
}

/// Take an exact number of bytes from an offset in a slice, advancing the offset.
fn take<const N: usize>(r: &[u8], i: &mut usize) -> Result<[u8; N], Error> {
    let s = take_slice(r, i, N)?;
    s.try_into().map_err(|_| Error::EndOfSlice)
}

/// Take a run of bytes from an offset in a slice, advancing the offset.
fn take_slice<'a>(r: &'a [u8], i: &mut usize, n: usize) -> Result<&'a [u8], Error> {
    let s = *i;
    *i += n;

    r.get(s..*i).ok_or(Error::EndOfSlice)
}
