//! Decoded records and the messages they carry.

use alloc::{string::String, vec::Vec};

use super::definition::{BaseType, Definition};

/// A single field of a data message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub number: u8,
    pub base_type: BaseType,
    /// Field bytes, each element little-endian.
    pub bytes: Vec<u8>,
}

/// A single developer field of a data message, kept as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperField {
    pub number: u8,
    pub developer_index: u8,
    pub bytes: Vec<u8>,
}

/// A data message.
///
/// `fields` only holds fields with at least one valid value. `definition` is
/// the layout the message was decoded with, if it is still known; a builder
/// derives a fresh one when it is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub global: u16,
    pub fields: Vec<Field>,
    pub developer_fields: Vec<DeveloperField>,
    pub definition: Option<Definition>,
}

/// One unit of a document's record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Definition(Definition),
    Data(Message),
}

impl Record {
    /// The global message number this record defines or carries.
    pub fn global(&self) -> u16 {
        match self {
            Self::Definition(d) => d.global,
            Self::Data(m) => m.global,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Data(m) => Some(m),
            Self::Definition(_) => None,
        }
    }
}

impl Message {
    /// An empty message without a definition.
    pub fn new(global: u16) -> Self {
        Self {
            global,
            fields: Vec::new(),
            developer_fields: Vec::new(),
            definition: None,
        }
    }

    /// Find a field.
    pub fn field(&self, number: u8) -> Option<&Field> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Read the first value of a field as a Rust primitive, if valid.
    pub fn get<T: FieldValue>(&self, number: u8) -> Option<T> {
        self.field(number).and_then(T::from_field)
    }

    /// Replace a field's bytes, appending the field if it is not present.
    ///
    /// The definition is dropped if it no longer describes the message.
    pub fn set(&mut self, number: u8, base_type: BaseType, bytes: Vec<u8>) {
        match self.fields.iter_mut().find(|f| f.number == number) {
            Some(field) => {
                field.base_type = base_type;
                field.bytes = bytes;
            }
            None => self.fields.push(Field {
                number,
                base_type,
                bytes,
            }),
        }

        self.revalidate();
    }

    /// Remove a field.
    ///
    /// The definition is dropped if it no longer describes the message.
    pub fn remove(&mut self, number: u8) -> Option<Field> {
        let i = self.fields.iter().position(|f| f.number == number)?;
        let field = self.fields.remove(i);

        self.revalidate();

        Some(field)
    }

    /// Write a typed value to a field, or remove the field for `None`.
    ///
    /// Nothing changes when the field already holds the value. An existing
    /// field keeps its declared base type when the element size agrees.
    pub fn set_value<T: FieldValue + PartialEq>(
        &mut self,
        number: u8,
        base_type: BaseType,
        value: Option<T>,
    ) {
        if self.get::<T>(number) == value {
            return;
        }

        let Some(value) = value else {
            self.remove(number);
            return;
        };

        let base_type = match self.field(number) {
            Some(f) if f.base_type.size() == base_type.size() => f.base_type,
            _ => base_type,
        };

        self.set(number, base_type, value.to_bytes());
    }

    fn revalidate(&mut self) {
        let stale = self
            .definition
            .as_ref()
            .is_some_and(|d| !d.matches(self));

        if stale {
            log::trace!(
                "Dropping stale definition of message {} after edit",
                self.global
            );
            self.definition = None;
        }
    }
}

/// A Rust primitive stored in a field.
pub trait FieldValue: Sized {
    /// Read the first element of a field, if it is valid.
    fn from_field(field: &Field) -> Option<Self>;
    /// Encode as little-endian field bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

macro_rules! field_value {
    ($($t:ident),*) => {
        $(
            impl FieldValue for $t {
                fn from_field(field: &Field) -> Option<Self> {
                    const N: usize = size_of::<$t>();

                    if field.base_type.size() as usize != N {
                        return None;
                    }

                    let element = field.bytes.get(..N)?;

                    if !field.base_type.is_valid(element) {
                        return None;
                    }

                    Some($t::from_le_bytes(element.try_into().ok()?))
                }

                fn to_bytes(&self) -> Vec<u8> {
                    self.to_le_bytes().to_vec()
                }
            }
        )*
    };
}

field_value!(u8, u16, u32, u64, i8, i16, i32, i64);

impl FieldValue for String {
    fn from_field(field: &Field) -> Option<Self> {
        if field.base_type != BaseType::String || !field.base_type.is_valid(&field.bytes) {
            return None;
        }

        let end = field
            .bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(field.bytes.len());

        core::str::from_utf8(&field.bytes[..end]).ok().map(String::from)
    }

    /// Encode as a null-terminated string. An empty string is a lone
    /// terminator.
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len() + 1);
        bytes.extend_from_slice(self.as_bytes());
        bytes.push(0);
        bytes
    }
}
