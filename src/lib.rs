#![no_std]

//! Rewrites the device identity recorded in Garmin's Flexible and
//! Interoperable Data Transfer (FIT) activity files.
//!
//! Files recorded by virtual cycling platforms and third-party head units are
//! rewritten so that a cloud fitness platform attributes them to a Garmin
//! Edge 830, while keeping the self-describing record stream intact.
//!
//! Most users should begin with [`edit::edit_file`] or [`rewrite::rewrite_bytes`].
//! The rule engine itself lives in [`rewrite`], and only relies on the
//! [`avec::Codec`] capability to decode and rebuild documents. The FIT
//! primitives it is built on are in [`sans`].
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader-based decoding and file operations (default).

extern crate alloc;

pub mod avec;
#[cfg(feature = "std")]
pub mod edit;
pub mod profile;
pub mod rewrite;
pub mod sans;
