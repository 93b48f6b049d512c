//! Traditional PKWARE encryption ("ZipCrypto").
//!
//! Encrypted entry data starts with a 12-byte header. Once decrypted, its
//! last byte must match a check byte taken from the entry's metadata: the
//! high byte of the CRC-32, or, for entries written with a data descriptor,
//! the high byte of the DOS modification time. Only one byte is checked,
//! so a wrong password slips through about once in 256 tries; the CRC-32
//! check after decompression catches those.

use anyhow::{Result, bail};

use super::structures::ZipFileEntry;

pub const ENCRYPTION_HEADER_SIZE: usize = 12;

/// One byte of the raw CRC-32 register update, without the pre- and
/// post-inversion that `crc32fast` applies around it.
fn crc32_update(crc: u32, byte: u8) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(!crc);
    hasher.update(&[byte]);
    !hasher.finalize()
}

/// The three-key cipher state.
#[derive(Clone)]
pub struct ZipCryptoKeys {
    key0: u32,
    key1: u32,
    key2: u32,
}

impl ZipCryptoKeys {
    pub fn new(password: &[u8]) -> Self {
        let mut keys = Self {
            key0: 0x1234_5678,
            key1: 0x2345_6789,
            key2: 0x3456_7890,
        };
        for &byte in password {
            keys.update(byte);
        }
        keys
    }

    fn update(&mut self, plain: u8) {
        self.key0 = crc32_update(self.key0, plain);
        self.key1 = self
            .key1
            .wrapping_add(self.key0 & 0xFF)
            .wrapping_mul(134_775_813)
            .wrapping_add(1);
        self.key2 = crc32_update(self.key2, (self.key1 >> 24) as u8);
    }

    fn stream_byte(&self) -> u8 {
        let temp = (self.key2 | 2) as u16;
        (temp.wrapping_mul(temp ^ 1) >> 8) as u8
    }

    pub fn decrypt(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte ^= self.stream_byte();
            self.update(*byte);
        }
    }

    pub fn encrypt(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            let plain = *byte;
            *byte ^= self.stream_byte();
            self.update(plain);
        }
    }
}

/// Byte the decrypted header must end with for `entry`.
pub fn check_byte(entry: &ZipFileEntry) -> u8 {
    if entry.has_data_descriptor() {
        (entry.last_mod_time >> 8) as u8
    } else {
        (entry.crc32 >> 24) as u8
    }
}

/// Decrypt `data` (encryption header included) in place and return the
/// payload that follows the header.
pub fn decrypt_entry<'a>(data: &'a mut [u8], password: &[u8], check: u8) -> Result<&'a [u8]> {
    if data.len() < ENCRYPTION_HEADER_SIZE {
        bail!("Encrypted entry is shorter than its encryption header");
    }

    let mut keys = ZipCryptoKeys::new(password);
    let (header, payload) = data.split_at_mut(ENCRYPTION_HEADER_SIZE);
    keys.decrypt(header);
    if header[ENCRYPTION_HEADER_SIZE - 1] != check {
        bail!("Invalid password");
    }
    keys.decrypt(payload);
    Ok(payload)
}
