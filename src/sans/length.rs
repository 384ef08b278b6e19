//! Mapping declared field sizes to element counts.
//!
//! A definition declares each field's size in bytes. The number of elements
//! the field holds is derived from that size and its base type. Conformant
//! encoders only declare whole multiples of the element size, but some
//! (notably COROS) do not. [`Strict`] rejects such fields, while [`Lenient`]
//! truncates them to the whole elements they contain.

use thiserror::Error;

use super::definition::BaseType;

/// A declared field size that is not a whole number of elements.
#[derive(Debug, Error)]
#[error("Field size ({size}) is not a multiple of its base type size ({element}).")]
pub struct FieldSizeError {
    pub size: u8,
    pub element: u8,
}

/// A policy deriving the number of elements in a field from its size.
pub trait FieldLength {
    /// Number of elements in a field of `size` bytes.
    ///
    /// Strings and byte arrays are a single opaque element whenever they are
    /// not empty.
    fn length_from_size(&self, base_type: BaseType, size: u8) -> Result<u8, FieldSizeError>;
}

/// Reject fields that are not a whole number of elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct Strict;

impl FieldLength for Strict {
    fn length_from_size(&self, base_type: BaseType, size: u8) -> Result<u8, FieldSizeError> {
        if base_type.is_variable() {
            return Ok(u8::from(size != 0));
        }

        let element = base_type.size();

        if size % element != 0 {
            Err(FieldSizeError { size, element })?;
        }

        Ok(size / element)
    }
}

/// Truncate fields to the whole elements they contain.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lenient;

impl FieldLength for Lenient {
    fn length_from_size(&self, base_type: BaseType, size: u8) -> Result<u8, FieldSizeError> {
        if base_type.is_variable() {
            return Ok(u8::from(size != 0));
        }

        let element = base_type.size();
        let length = size / element;

        if length * element != size {
            log::debug!(
                "Field size ({size}) not multiple of type size ({element}), truncating to length {length}"
            );
        }

        Ok(length)
    }
}

/// Number of bytes of a field worth keeping, given its element count.
pub fn kept_size(base_type: BaseType, size: u8, length: u8) -> u8 {
    match (base_type.is_variable(), length) {
        (true, 0) => 0,
        (true, _) => size,
        (false, _) => length * base_type.size(),
    }
}
