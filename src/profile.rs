//! The slice of the FIT profile this crate reads and writes.
//!
//! Messages are decoded generically into [`Message`]s. The types here are
//! typed views over the few messages that identify the recording device,
//! read with [`Profile::from_message`] and written back with
//! [`Profile::apply`].

use alloc::string::String;

use crate::sans::{data::Message, definition::BaseType};

/// Global message numbers.
pub mod mesg_num {
    pub const FILE_ID: u16 = 0;
    pub const DEVICE_INFO: u16 = 23;
    pub const ACTIVITY: u16 = 34;
    pub const FILE_CREATOR: u16 = 49;
}

/// Manufacturer codes.
pub mod manufacturer {
    pub const GARMIN: u16 = 1;
    /// TrainingPeaks, including TrainingPeaks Virtual.
    pub const PEAKSWARE: u16 = 9;
    pub const WAHOO_FITNESS: u16 = 32;
    pub const DEVELOPMENT: u16 = 255;
    pub const ZWIFT: u16 = 260;
    pub const HAMMERHEAD: u16 = 289;
    pub const COROS: u16 = 294;
    /// MyWhoosh. Absent from the published profile.
    pub const MYWHOOSH: u16 = 331;

    /// A name for logging.
    pub fn name(code: u16) -> &'static str {
        match code {
            GARMIN => "GARMIN",
            PEAKSWARE => "PEAKSWARE",
            WAHOO_FITNESS => "WAHOO_FITNESS",
            DEVELOPMENT => "DEVELOPMENT",
            ZWIFT => "ZWIFT",
            HAMMERHEAD => "HAMMERHEAD",
            COROS => "COROS",
            MYWHOOSH => "MYWHOOSH",
            _ => "BLANK",
        }
    }
}

/// Garmin product codes.
pub mod garmin_product {
    pub const EDGE_830: u16 = 3122;
}

/// Seconds between the Unix epoch and the FIT epoch, 1989-12-31T00:00:00Z.
pub const FIT_EPOCH_OFFSET: u64 = 631_065_600;

/// A typed view over a message.
///
/// See the [`Profile`](macro@Profile) derive macro for an implementation.
pub trait Profile: Sized {
    /// The global message number.
    const GLOBAL: u16;

    /// Read the fields of a message. Absent or invalid fields read as `None`.
    fn from_message(message: &Message) -> Self;

    /// Write fields back to a message. Fields that are `None` are removed,
    /// and fields already holding their value are left untouched.
    fn apply(&self, message: &mut Message);

    /// A new message holding only these fields.
    fn to_message(&self) -> Message {
        let mut message = Message::new(Self::GLOBAL);
        self.apply(&mut message);
        message
    }
}

/// Derive [`Profile`] for a struct of `Option<T>` fields.
///
/// The struct takes a `profile(N)` attribute, where `N` is the global message
/// number, and must implement [`Default`]. Each field takes a
/// `field(N, BaseType)` attribute, where `N` is the field number and
/// `BaseType` names a [`BaseType`] variant used when the field is written.
///
/// ```
/// #[derive(Debug, Default, Profile)]
/// #[profile(49)]
/// struct FileCreator {
///     #[field(0, Uint16)]
///     software_version: Option<u16>,
/// }
/// ```
pub use domestique_derive::Profile;

/// `file_id`, identifying the file and the device that recorded it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Profile)]
#[profile(0)]
pub struct FileId {
    #[field(0, Enum)]
    pub type_: Option<u8>,
    #[field(1, Uint16)]
    pub manufacturer: Option<u16>,
    /// Also known as `garmin_product` for Garmin devices.
    #[field(2, Uint16)]
    pub product: Option<u16>,
    #[field(3, Uint32z)]
    pub serial_number: Option<u32>,
    /// Seconds since the FIT epoch.
    #[field(4, Uint32)]
    pub time_created: Option<u32>,
    #[field(8, String)]
    pub product_name: Option<String>,
}

impl FileId {
    /// Creation time in milliseconds since the Unix epoch.
    pub fn time_created_ms(&self) -> Option<u64> {
        self.time_created
            .map(|t| (u64::from(t) + FIT_EPOCH_OFFSET) * 1000)
    }

    /// Set the creation time from milliseconds since the Unix epoch.
    ///
    /// Times before the FIT epoch clamp to it.
    pub fn set_time_created_ms(&mut self, ms: u64) {
        let seconds = (ms / 1000).saturating_sub(FIT_EPOCH_OFFSET);
        self.time_created = Some(u32::try_from(seconds).unwrap_or(u32::MAX - 1));
    }
}

/// `device_info`, describing the recording device or a connected sensor.
#[derive(Debug, Default, Clone, PartialEq, Eq, Profile)]
#[profile(23)]
pub struct DeviceInfo {
    #[field(0, Uint8)]
    pub device_index: Option<u8>,
    #[field(1, Uint8)]
    pub device_type: Option<u8>,
    #[field(2, Uint16)]
    pub manufacturer: Option<u16>,
    #[field(3, Uint32z)]
    pub serial_number: Option<u32>,
    /// Also known as `garmin_product` for Garmin devices.
    #[field(4, Uint16)]
    pub product: Option<u16>,
    #[field(5, Uint16)]
    pub software_version: Option<u16>,
    #[field(6, Uint8)]
    pub hardware_version: Option<u8>,
    #[field(27, String)]
    pub product_name: Option<String>,
}

/// `file_creator`, versioning the software that wrote the file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Profile)]
#[profile(49)]
pub struct FileCreator {
    #[field(0, Uint16)]
    pub software_version: Option<u16>,
    #[field(1, Uint8)]
    pub hardware_version: Option<u8>,
}
