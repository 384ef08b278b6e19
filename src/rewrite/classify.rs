//! Sorting records into the kinds the rewrite rules act on.

use crate::{
    profile::mesg_num,
    sans::{
        data::{Message, Record},
        definition::Definition,
    },
};

/// A record, tagged with the rule that applies to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A `file_id` message.
    Identity(Message),
    /// A `device_info` message.
    DeviceInfo(Message),
    /// A `file_creator` message.
    FileCreator(Message),
    /// An `activity` message.
    Activity(Message),
    /// The definition of `file_id` messages, replaced by a derived one.
    IdentityDefinition(Definition),
    /// Anything else, including all other definitions.
    PassThrough(Record),
}

/// Tag a record by its global message number.
pub fn classify(record: Record) -> Classified {
    match record {
        Record::Definition(definition) if definition.global == mesg_num::FILE_ID => {
            Classified::IdentityDefinition(definition)
        }
        Record::Data(message) => match message.global {
            mesg_num::FILE_ID => Classified::Identity(message),
            mesg_num::DEVICE_INFO => Classified::DeviceInfo(message),
            mesg_num::FILE_CREATOR => Classified::FileCreator(message),
            mesg_num::ACTIVITY => Classified::Activity(message),
            _ => Classified::PassThrough(Record::Data(message)),
        },
        record => Classified::PassThrough(record),
    }
}
