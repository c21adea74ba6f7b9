//! CRC-64 content hash used to derive per-connection log file names.
//!
//! The variant is CRC-64/Jones as used by Redis: reflected polynomial
//! `0xad93d23594c935a9`, no output xor. The seed is passed explicitly so
//! digests can be chained.

/// Reflected form of the Jones polynomial `0xad93d23594c935a9`
const POLY: u64 = 0x95ac_9329_ac4b_c9b5;

const TABLE: [u64; 256] = build_table();

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Computes the CRC-64 of `data` starting from `seed`.
#[must_use]
pub fn crc64(seed: u64, data: &[u8]) -> u64 {
    data.iter().fold(seed, |crc, &byte| {
        TABLE[((crc ^ u64::from(byte)) & 0xff) as usize] ^ (crc >> 8)
    })
}
