#![allow(dead_code)]

use domestique::sans::check::compute_crc;

pub const ENUM: u8 = 0x00;
pub const UINT8: u8 = 0x02;
pub const SINT16: u8 = 0x83;
pub const UINT16: u8 = 0x84;
pub const UINT32: u8 = 0x86;
pub const STRING: u8 = 0x07;
pub const UINT32Z: u8 = 0x8C;

/// Assembles FIT documents byte by byte, independently of the crate's encoder.
#[derive(Debug, Default, Clone)]
pub struct Document {
    body: Vec<u8>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A little-endian definition record. Fields are `(number, size, base type)`.
    pub fn define(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition(local, 0, &global.to_le_bytes(), fields, &[])
    }

    /// A big-endian definition record.
    pub fn define_be(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition(local, 1, &global.to_be_bytes(), fields, &[])
    }

    /// A little-endian definition record with developer fields, given as
    /// `(number, size, developer index)`.
    pub fn define_developer(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        self.definition(local, 0, &global.to_le_bytes(), fields, developer)
    }

    fn definition(
        mut self,
        local: u8,
        architecture: u8,
        global: &[u8],
        fields: &[(u8, u8, u8)],
        developer: &[(u8, u8, u8)],
    ) -> Self {
        let flag = if developer.is_empty() { 0x40 } else { 0x60 };
        self.body.push(flag | local);
        self.body.extend_from_slice(&[0, architecture]);
        self.body.extend_from_slice(global);
        self.body.push(fields.len() as u8);

        for (number, size, base_type) in fields {
            self.body.extend_from_slice(&[*number, *size, *base_type]);
        }

        if !developer.is_empty() {
            self.body.push(developer.len() as u8);

            for (number, size, index) in developer {
                self.body.extend_from_slice(&[*number, *size, *index]);
            }
        }

        self
    }

    /// A data record with a normal header.
    pub fn data(mut self, local: u8, bytes: &[u8]) -> Self {
        self.body.push(local);
        self.body.extend_from_slice(bytes);
        self
    }

    /// A data record with a compressed timestamp header.
    pub fn compressed(mut self, local: u8, offset: u8, bytes: &[u8]) -> Self {
        self.body.push(0x80 | (local << 5) | (offset & 0x1F));
        self.body.extend_from_slice(bytes);
        self
    }

    /// A document with a 14-byte header.
    pub fn build(&self) -> Vec<u8> {
        let mut document = self.header(14);
        let crc = compute_crc(0, &document);
        document.extend_from_slice(&crc.to_le_bytes());
        self.finish(document)
    }

    /// A document with a legacy 12-byte header.
    pub fn build_short(&self) -> Vec<u8> {
        let document = self.header(12);
        self.finish(document)
    }

    fn header(&self, size: u8) -> Vec<u8> {
        let mut header = vec![size, 0x20];
        header.extend_from_slice(&2132u16.to_le_bytes());
        header.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        header.extend_from_slice(b".FIT");
        header
    }

    fn finish(&self, mut document: Vec<u8>) -> Vec<u8> {
        document.extend_from_slice(&self.body);
        let crc = compute_crc(0, &document);
        document.extend_from_slice(&crc.to_le_bytes());
        document
    }
}

pub const TIME_CREATED: u32 = 1_000_000_000;

/// Milliseconds since the Unix epoch of [`TIME_CREATED`].
pub const TIME_CREATED_MS: u64 = (1_000_000_000 + 631_065_600) * 1000;

/// A ride recorded by a virtual cycling platform.
///
/// Holds a `file_id` from `manufacturer`, an existing `file_creator`, a
/// device type 0 slot, two further devices, an `activity` and two `record`
/// messages.
pub fn ride(manufacturer: u16) -> Document {
    let [m0, m1] = manufacturer.to_le_bytes();
    let t = TIME_CREATED.to_le_bytes();

    let mut activity = t.to_vec();
    activity.extend_from_slice(&1u16.to_le_bytes());

    Document::new()
        .define(
            0,
            0,
            &[
                (0, 1, ENUM),
                (1, 2, UINT16),
                (2, 2, UINT16),
                (3, 4, UINT32Z),
                (4, 4, UINT32),
            ],
        )
        .data(0, &[4, m0, m1, 1, 0, 0x39, 0x30, 0, 0, t[0], t[1], t[2], t[3]])
        .define(1, 49, &[(0, 2, UINT16)])
        .data(1, &[100, 0])
        .define(
            2,
            23,
            &[(0, 1, UINT8), (1, 1, UINT8), (2, 2, UINT16), (4, 2, UINT16)],
        )
        .data(2, &[0, 0, m0, m1, 1, 0])
        .data(2, &[1, 120, m0, m1, 1, 0])
        .data(2, &[2, 11, 1, 0, 2, 0])
        .define(3, 34, &[(253, 4, UINT32), (1, 2, UINT16)])
        .data(3, &activity)
        .define(4, 20, &[(253, 4, UINT32), (3, 1, UINT8)])
        .data(4, &[t[0], t[1], t[2], t[3], 140])
        .data(4, &[t[0].wrapping_add(1), t[1], t[2], t[3], 141])
}

/// A fixed clock for rewrites of files without a creation time.
pub fn clock() -> u64 {
    1_700_000_000_000
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
