//! Sans-IO building blocks of the FIT container format.
//!
//! Nothing in this module touches a reader, a writer, or the file system. The
//! decoder and encoder in [`crate::avec`] are assembled from these pieces:
//!
//! - [`header`]: document and record headers.
//! - [`definition`]: base types and definition records, which declare the
//! layout of the data records that follow them.
//! - [`data`]: decoded records, messages and their fields.
//! - [`length`]: how a declared field size maps to a number of elements.
//! - [`check`]: the cyclic redundancy check guarding headers and documents.
//!
//! # Byte order
//!
//! Definitions may declare either architecture. Field bytes held by a
//! [`data::Message`] are always little-endian, and the encoder only ever
//! writes little-endian definitions.

pub mod check;
pub mod data;
pub mod definition;
pub mod header;
pub mod length;
