//! Encoder rebuilding a document from records.
//!
//! Local message numbers are chosen by the builder. A definition record is
//! only written when no local message currently holds an equal definition,
//! and slots are recycled round-robin once all sixteen are in use. Every data
//! record is therefore preceded by the definition it was encoded with.

use alloc::vec::Vec;

use thiserror::Error;

use crate::sans::{
    check::compute_crc,
    data::{Message, Record},
    definition::{Definition, encode_definition},
    header::{DocumentHeader, encode_data_header, encode_definition_header},
};

/// Errors occurring while encoding a document.
#[derive(Debug, Error)]
pub enum Error {
    /// A message's definition does not describe the fields it holds.
    #[error("Definition of message {global} does not match its fields.")]
    DefinitionMismatch { global: u16 },
    /// A message holds more fields than a definition can declare.
    #[error("Message {global} holds more than 255 fields.")]
    TooManyFields { global: u16 },
    /// A field holds more bytes than a definition can declare.
    #[error("Field {field} of message {global} is larger than 255 bytes.")]
    FieldTooLarge { global: u16, field: u8 },
    /// The records are larger than a document can hold.
    #[error("Records do not fit in a single document.")]
    DocumentTooLarge,
}

/// Accumulates records for a new document.
#[derive(Debug, Default)]
pub struct FitBuilder {
    records: Vec<Record>,
}

impl FitBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl super::Builder for FitBuilder {
    type Error = Error;

    fn add(&mut self, record: Record) {
        self.records.push(record);
    }

    fn build(self) -> Result<Vec<u8>, Error> {
        let mut encoder = Encoder::default();

        for record in &self.records {
            match record {
                Record::Definition(definition) => {
                    encoder.define(definition)?;
                }
                Record::Data(message) => encoder.write(message)?,
            }
        }

        encoder.finish()
    }
}

#[derive(Default)]
struct Encoder {
    slots: [Option<Definition>; 16],
    next: usize,
    body: Vec<u8>,
}

impl Encoder {
    /// Make a definition current on some local message, writing a definition
    /// record if needed. Returns the local message number.
    fn define(&mut self, definition: &Definition) -> Result<u8, Error> {
        let held = self
            .slots
            .iter()
            .position(|d| d.as_ref() == Some(definition));

        if let Some(local) = held {
            return Ok(local as u8);
        }

        let count = u8::try_from(definition.fields.len()).map_err(|_| Error::TooManyFields {
            global: definition.global,
        })?;

        let local = self.next;
        self.next = (self.next + 1) % self.slots.len();

        let developer = definition.has_developer_fields();

        self.body
            .push(encode_definition_header(local as u8, developer));
        self.body
            .extend_from_slice(&encode_definition(definition.global, count));

        for field in &definition.fields {
            self.body.extend_from_slice(&field.encode());
        }

        if developer {
            let count =
                u8::try_from(definition.developer_fields.len()).map_err(|_| {
                    Error::TooManyFields {
                        global: definition.global,
                    }
                })?;

            self.body.push(count);

            for field in &definition.developer_fields {
                self.body.extend_from_slice(&field.encode());
            }
        }

        self.slots[local] = Some(definition.clone());

        Ok(local as u8)
    }

    /// Write a data record, preceded by its definition if needed.
    fn write(&mut self, message: &Message) -> Result<(), Error> {
        if let Some(field) = message.fields.iter().find(|f| f.bytes.len() > u8::MAX as usize) {
            Err(Error::FieldTooLarge {
                global: message.global,
                field: field.number,
            })?;
        }

        let derived;
        let definition = match &message.definition {
            Some(definition) => {
                if !definition.matches(message) {
                    Err(Error::DefinitionMismatch {
                        global: message.global,
                    })?;
                }
                definition
            }
            None => {
                derived = Definition::from_message(message);
                &derived
            }
        };

        let local = self.define(definition)?;
        self.body.push(encode_data_header(local));

        for declared in &definition.fields {
            if let Some(field) = message.field(declared.number) {
                self.body.extend_from_slice(&field.bytes);
            }
        }

        for declared in &definition.developer_fields {
            let field = message
                .developer_fields
                .iter()
                .find(|f| f.number == declared.number && f.developer_index == declared.developer_index);

            if let Some(field) = field {
                self.body.extend_from_slice(&field.bytes);
            }
        }

        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, Error> {
        let data_size = u32::try_from(self.body.len()).map_err(|_| Error::DocumentTooLarge)?;

        let mut document = Vec::with_capacity(14 + self.body.len() + 2);
        document.extend_from_slice(&DocumentHeader::for_records(data_size).encode());
        document.extend_from_slice(&self.body);

        let crc = compute_crc(0, &document);
        document.extend_from_slice(&crc.to_le_bytes());

        Ok(document)
    }
}
