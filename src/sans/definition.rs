//! Base types and definition records.

use alloc::vec::Vec;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::data::Message;

/// The base type of a field, as declared by a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `enum`
    Enum,
    /// `sint8`
    Sint8,
    /// `uint8`
    Uint8,
    /// `sint16`
    Sint16,
    /// `uint16`
    Uint16,
    /// `sint32`
    Sint32,
    /// `uint32`
    Uint32,
    /// `string`, null-terminated UTF-8.
    String,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `uint8z`
    Uint8z,
    /// `uint16z`
    Uint16z,
    /// `uint32z`
    Uint32z,
    /// `byte`, an opaque array.
    Byte,
    /// `sint64`
    Sint64,
    /// `uint64`
    Uint64,
    /// `uint64z`
    Uint64z,
}

impl BaseType {
    /// Interpret a base type byte.
    ///
    /// Only the base type number in the low five bits is considered, since
    /// some encoders leave the endian-ability flag unset.
    pub fn from_byte(b: u8) -> Option<Self> {
        let base_type = match b & 0x1F {
            0x00 => Self::Enum,
            0x01 => Self::Sint8,
            0x02 => Self::Uint8,
            0x03 => Self::Sint16,
            0x04 => Self::Uint16,
            0x05 => Self::Sint32,
            0x06 => Self::Uint32,
            0x07 => Self::String,
            0x08 => Self::Float32,
            0x09 => Self::Float64,
            0x0A => Self::Uint8z,
            0x0B => Self::Uint16z,
            0x0C => Self::Uint32z,
            0x0D => Self::Byte,
            0x0E => Self::Sint64,
            0x0F => Self::Uint64,
            0x10 => Self::Uint64z,
            _ => return None,
        };

        Some(base_type)
    }

    /// The canonical base type byte.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Enum => 0x00,
            Self::Sint8 => 0x01,
            Self::Uint8 => 0x02,
            Self::Sint16 => 0x83,
            Self::Uint16 => 0x84,
            Self::Sint32 => 0x85,
            Self::Uint32 => 0x86,
            Self::String => 0x07,
            Self::Float32 => 0x88,
            Self::Float64 => 0x89,
            Self::Uint8z => 0x0A,
            Self::Uint16z => 0x8B,
            Self::Uint32z => 0x8C,
            Self::Byte => 0x0D,
            Self::Sint64 => 0x8E,
            Self::Uint64 => 0x8F,
            Self::Uint64z => 0x90,
        }
    }

    /// Size in bytes of a single element.
    pub fn size(self) -> u8 {
        match self {
            Self::Enum | Self::Sint8 | Self::Uint8 | Self::Uint8z => 1,
            Self::String | Self::Byte => 1,
            Self::Sint16 | Self::Uint16 | Self::Uint16z => 2,
            Self::Sint32 | Self::Uint32 | Self::Uint32z | Self::Float32 => 4,
            Self::Float64 | Self::Sint64 | Self::Uint64 | Self::Uint64z => 8,
        }
    }

    /// Whether fields of this type are a single opaque unit of any size.
    pub fn is_variable(self) -> bool {
        matches!(self, Self::String | Self::Byte)
    }

    /// The 'invalid' marker value of one element, as a little-endian integer.
    fn invalid(self) -> u64 {
        match self {
            Self::Enum | Self::Uint8 | Self::Byte => 0xFF,
            Self::Sint8 => 0x7F,
            Self::Sint16 => 0x7FFF,
            Self::Uint16 => 0xFFFF,
            Self::Sint32 => 0x7FFF_FFFF,
            Self::Uint32 | Self::Float32 => 0xFFFF_FFFF,
            Self::Sint64 => 0x7FFF_FFFF_FFFF_FFFF,
            Self::Uint64 | Self::Float64 => u64::MAX,
            Self::String | Self::Uint8z | Self::Uint16z | Self::Uint32z | Self::Uint64z => 0,
        }
    }

    /// Whether little-endian field bytes hold at least one element that is
    /// not the 'invalid' marker value.
    pub fn is_valid(self, bytes: &[u8]) -> bool {
        let invalid = self.invalid();

        bytes.chunks_exact(self.size() as usize).any(|element| {
            let mut buf = [0; 8];
            buf[..element.len()].copy_from_slice(element);
            u64::from_le_bytes(buf) != invalid
        })
    }
}

/// Byte order of the data records following a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    LittleEndian,
    BigEndian,
}

/// Declaration of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    pub number: u8,
    /// Size of the field in bytes.
    pub size: u8,
    pub base_type: BaseType,
}

/// Declaration of a single developer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    /// Size of the field in bytes.
    pub size: u8,
    /// Index of the developer data ID message describing this field.
    pub developer_index: u8,
}

/// The layout of a data message: its global message number, and the fields
/// it holds, in the order they are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub global: u16,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    fields_remaining: u8,
}

#[repr(C, packed)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
struct FieldHeader {
    field: u8,
    size: u8,
    base_type: u8,
}

impl Definition {
    /// Derive a minimal definition declaring exactly the fields a message
    /// holds, in the order it holds them.
    pub fn from_message(message: &Message) -> Self {
        let size = |len: usize| u8::try_from(len).unwrap_or(u8::MAX);

        Self {
            global: message.global,
            fields: message
                .fields
                .iter()
                .map(|f| FieldDefinition {
                    number: f.number,
                    size: size(f.bytes.len()),
                    base_type: f.base_type,
                })
                .collect(),
            developer_fields: message
                .developer_fields
                .iter()
                .map(|f| DeveloperFieldDefinition {
                    number: f.number,
                    size: size(f.bytes.len()),
                    developer_index: f.developer_index,
                })
                .collect(),
        }
    }

    /// Find the declaration of a field.
    pub fn field(&self, number: u8) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Whether this definition declares exactly the fields a message holds,
    /// with matching sizes and base types.
    pub fn matches(&self, message: &Message) -> bool {
        self.global == message.global
            && self.fields.len() == message.fields.len()
            && self.developer_fields.len() == message.developer_fields.len()
            && self.fields.iter().all(|d| {
                message.field(d.number).is_some_and(|f| {
                    f.base_type == d.base_type && f.bytes.len() == d.size as usize
                })
            })
            && self.developer_fields.iter().all(|d| {
                message.developer_fields.iter().any(|f| {
                    f.number == d.number
                        && f.developer_index == d.developer_index
                        && f.bytes.len() == d.size as usize
                })
            })
    }

    /// Whether any field number is declared more than once.
    pub fn has_duplicate_fields(&self) -> bool {
        self.fields
            .iter()
            .enumerate()
            .any(|(i, d)| self.fields[..i].iter().any(|e| e.number == d.number))
    }

    /// Whether a definition record for this layout needs the developer flag.
    pub fn has_developer_fields(&self) -> bool {
        !self.developer_fields.is_empty()
    }
}

/// Decode the fixed part of a definition record.
///
/// Returns the architecture, global message number, and number of field
/// definitions that follow.
pub fn decode_definition(r: [u8; 5]) -> (Architecture, u16, u8) {
    let DefinitionMessage {
        architecture,
        global_message,
        fields_remaining,
        ..
    } = zerocopy::transmute!(r);

    if architecture == 0 {
        (
            Architecture::LittleEndian,
            u16::from_le_bytes(global_message),
            fields_remaining,
        )
    } else {
        (
            Architecture::BigEndian,
            u16::from_be_bytes(global_message),
            fields_remaining,
        )
    }
}

/// Encode the fixed part of a little-endian definition record.
pub fn encode_definition(global: u16, fields: u8) -> [u8; 5] {
    zerocopy::transmute!(DefinitionMessage {
        _reserved: 0,
        architecture: 0,
        global_message: global.to_le_bytes(),
        fields_remaining: fields,
    })
}

impl FieldDefinition {
    /// Decode a field definition.
    ///
    /// Returns the unrecognised base type byte on failure.
    pub fn decode(r: [u8; 3]) -> Result<Self, u8> {
        let FieldHeader {
            field,
            size,
            base_type,
        } = zerocopy::transmute!(r);

        Ok(Self {
            number: field,
            size,
            base_type: BaseType::from_byte(base_type).ok_or(base_type)?,
        })
    }

    pub fn encode(&self) -> [u8; 3] {
        [self.number, self.size, self.base_type.to_byte()]
    }
}

impl DeveloperFieldDefinition {
    pub fn decode(r: [u8; 3]) -> Self {
        let [number, size, developer_index] = r;

        Self {
            number,
            size,
            developer_index,
        }
    }

    pub fn encode(&self) -> [u8; 3] {
        [self.number, self.size, self.developer_index]
    }
}
