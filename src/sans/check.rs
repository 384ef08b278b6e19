//! Helper for computing cyclic redundancy checks.
//!
//! FIT documents carry a CRC-16 over their 14-byte header and another over the
//! whole document. Both use the nibble-wise table below, starting from zero.

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800, 0xB401,
    0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Accumulate a slice of bytes into a cyclic redundancy check value.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |acc, b| update(acc, *b))
}

/// Accumulate a single byte into a cyclic redundancy check value.
///
/// The low nibble of `b` is folded in first, then the high nibble.
pub fn update(mut crc: u16, b: u8) -> u16 {
    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[(b & 0xF) as usize];

    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[((b >> 4) & 0xF) as usize];

    crc
}
