//! The individual rewrite rules.

use alloc::string::String;

use crate::{
    profile::{DeviceInfo, FileCreator, FileId, Profile, manufacturer},
    sans::{
        data::{Message, Record},
        definition::Definition,
    },
};

use super::{Clock, DEVICE_FOREIGN, IDENTITY_FOREIGN, TARGET};

/// Whether a `file_id` manufacturer is impersonated as the target device.
pub fn is_identity_foreign(manufacturer: Option<u16>) -> bool {
    manufacturer.is_some_and(|m| IDENTITY_FOREIGN.contains(&m))
}

/// Whether a `device_info` manufacturer is impersonated as the target device.
pub fn is_device_foreign(manufacturer: Option<u16>) -> bool {
    manufacturer.is_some_and(|m| DEVICE_FOREIGN.contains(&m))
}

/// Detach definitions declaring fields a message no longer holds.
///
/// Such fields were either unknown to the encoder that wrote the file, held
/// only invalid values, or repeated a field number. Re-emitting the original
/// definition would declare them anyway, so a minimal one is derived when the
/// message is rebuilt.
pub fn strip_unknown_fields(records: &mut [Record]) {
    for record in records {
        let Record::Data(message) = record else {
            continue;
        };

        let Some(definition) = &message.definition else {
            continue;
        };

        let unknown = definition
            .fields
            .iter()
            .filter(|d| message.field(d.number).is_none())
            .count();

        if unknown != 0 {
            log::debug!(
                "Clearing definition for message {} to force regeneration (had {unknown} unknown field(s))",
                message.global
            );
            message.definition = None;
        } else if definition.has_duplicate_fields() {
            log::debug!(
                "Clearing definition for message {} to force regeneration (repeated field numbers)",
                message.global
            );
            message.definition = None;
        }
    }
}

/// Replace a `file_id` message with one identifying the target device,
/// followed by a `file_creator` message with the target versions.
///
/// Returns both messages, each preceded by a freshly derived definition. A
/// missing creation time is replaced by the current time.
pub fn rewrite_file_id(message: &Message, clock: &impl Clock) -> [Record; 4] {
    let original = FileId::from_message(message);
    log_message("FileIdMessage", original.manufacturer, original.product);

    let time_created = original.time_created_ms().unwrap_or_else(|| {
        log::debug!("No creation time found, using the current time");
        clock.now_ms()
    });
    log::info!("Activity timestamp is {time_created} ms since the Unix epoch");

    // The product name is never carried over.
    let mut file_id = FileId {
        type_: original.type_,
        serial_number: original.serial_number,
        ..FileId::default()
    };
    file_id.set_time_created_ms(time_created);

    if is_identity_foreign(original.manufacturer) {
        file_id.manufacturer = Some(TARGET.manufacturer);
        file_id.product = Some(TARGET.product);
        log::debug!("    Modifying values");
        log_message("    New FileIdMessage", file_id.manufacturer, file_id.product);
    }

    let creator = FileCreator {
        software_version: Some(TARGET.software_version),
        hardware_version: Some(TARGET.hardware_version),
    };

    let (file_id_definition, file_id) = with_definition(file_id.to_message());
    let (creator_definition, creator) = with_definition(creator.to_message());

    [
        Record::Definition(file_id_definition),
        Record::Data(file_id),
        Record::Definition(creator_definition),
        Record::Data(creator),
    ]
}

/// Rewrite a `device_info` message that survived the device type filter.
///
/// `offset` is subtracted from the device index. A foreign manufacturer is
/// replaced by the target device, and its product name is blanked.
pub fn rewrite_device_info(device: &mut DeviceInfo, offset: u8) {
    log_message("DeviceInfoMessage", device.manufacturer, device.product);

    if offset != 0 {
        if let Some(index) = device.device_index {
            let renumbered = index.saturating_sub(offset);
            log::debug!("    Renumbering device_index from {index} to {renumbered}");
            device.device_index = Some(renumbered);
        }
    }

    if is_device_foreign(device.manufacturer) {
        log::debug!("    Modifying values");

        if device.product.is_some() {
            device.product = Some(TARGET.product);
        }

        device.manufacturer = Some(TARGET.manufacturer);
        device.product_name = Some(String::new());

        log_message("    New DeviceInfoMessage", device.manufacturer, device.product);
    }
}

fn with_definition(mut message: Message) -> (Definition, Message) {
    let definition = Definition::from_message(&message);
    message.definition = Some(definition.clone());
    (definition, message)
}

fn log_message(prefix: &str, code: Option<u16>, product: Option<u16>) {
    log::debug!(
        "{prefix} (Manufacturer: {}, product: {product:?})",
        code.map_or("BLANK", manufacturer::name)
    );
}
