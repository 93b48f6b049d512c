//! Builds zip archives for the integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use nestzip::zip::crypto::{ENCRYPTION_HEADER_SIZE, ZipCryptoKeys};

/// 2024-03-15 13:45:30 in DOS format.
pub const DOS_TIME: u16 = (13 << 11) | (45 << 5) | 15;
pub const DOS_DATE: u16 = (44 << 9) | (3 << 5) | 15;

/// Deterministic, poorly compressible test content.
pub fn pseudo_random(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

pub struct FileSpec {
    pub name: String,
    pub content: Vec<u8>,
    pub deflate: bool,
    pub password: Option<Vec<u8>>,
    /// Set the data descriptor flag, which moves the password check byte to
    /// the modification time.
    pub data_descriptor: bool,
    /// Extra bytes in the local header only, so the local and central
    /// headers disagree in length.
    pub local_extra: usize,
}

impl FileSpec {
    pub fn new(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_vec(),
            deflate: false,
            password: None,
            data_descriptor: false,
            local_extra: 0,
        }
    }

    pub fn deflated(mut self) -> Self {
        self.deflate = true;
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.as_bytes().to_vec());
        self
    }

    pub fn data_descriptor(mut self) -> Self {
        self.data_descriptor = true;
        self
    }

    pub fn local_extra(mut self, len: usize) -> Self {
        self.local_extra = len;
        self
    }
}

/// Where a written entry ended up in the archive.
#[derive(Debug, Clone, Copy)]
pub struct Placed {
    pub header_offset: u64,
    pub header_size: u64,
    pub stored_size: u64,
}

impl Placed {
    pub fn data_range(&self) -> std::ops::Range<usize> {
        let start = (self.header_offset + self.header_size) as usize;
        start..start + self.stored_size as usize
    }
}

#[derive(Default)]
pub struct ZipBuilder {
    out: Vec<u8>,
    central: Vec<u8>,
    count: u64,
    zip64: bool,
    pub placed: Vec<Placed>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes before the first local header, as in self-extracting archives.
    pub fn with_prefix(prefix: &[u8]) -> Self {
        Self {
            out: prefix.to_vec(),
            ..Self::default()
        }
    }

    /// Write ZIP64 central directory records and end records.
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn stored(self, name: &str, content: &[u8]) -> Self {
        self.file(FileSpec::new(name, content))
    }

    pub fn deflated(self, name: &str, content: &[u8]) -> Self {
        self.file(FileSpec::new(name, content).deflated())
    }

    pub fn file(mut self, spec: FileSpec) -> Self {
        let crc = crc32fast::hash(&spec.content);
        let method: u16 = if spec.deflate { 8 } else { 0 };
        let mut flags = 0u16;

        let mut data = if spec.deflate {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&spec.content).unwrap();
            encoder.finish().unwrap()
        } else {
            spec.content.clone()
        };

        if spec.data_descriptor {
            flags |= 1 << 3;
        }
        if let Some(password) = &spec.password {
            flags |= 1;
            let check = if spec.data_descriptor {
                (DOS_TIME >> 8) as u8
            } else {
                (crc >> 24) as u8
            };
            let mut sealed = pseudo_random(ENCRYPTION_HEADER_SIZE, crc);
            sealed[ENCRYPTION_HEADER_SIZE - 1] = check;
            sealed.extend_from_slice(&data);
            ZipCryptoKeys::new(password).encrypt(&mut sealed);
            data = sealed;
        }

        let header_offset = self.out.len() as u64;
        let name = spec.name.as_bytes();
        let mut extra = Vec::new();
        if spec.local_extra > 0 {
            extra.write_u16::<LittleEndian>(0xCAFE).unwrap();
            extra.write_u16::<LittleEndian>(spec.local_extra as u16).unwrap();
            extra.extend(std::iter::repeat_n(0xEE, spec.local_extra));
        }

        // local file header
        let out = &mut self.out;
        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(flags).unwrap();
        out.write_u16::<LittleEndian>(method).unwrap();
        out.write_u16::<LittleEndian>(DOS_TIME).unwrap();
        out.write_u16::<LittleEndian>(DOS_DATE).unwrap();
        out.write_u32::<LittleEndian>(crc).unwrap();
        out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(spec.content.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
        out.extend_from_slice(name);
        out.extend_from_slice(&extra);
        let header_size = self.out.len() as u64 - header_offset;
        self.out.extend_from_slice(&data);

        // central directory header
        let cd = &mut self.central;
        let (csize, usize_, offset) = if self.zip64 {
            (u32::MAX, u32::MAX, u32::MAX)
        } else {
            (data.len() as u32, spec.content.len() as u32, header_offset as u32)
        };
        cd.extend_from_slice(b"PK\x01\x02");
        cd.write_u16::<LittleEndian>(20).unwrap();
        cd.write_u16::<LittleEndian>(if self.zip64 { 45 } else { 20 }).unwrap();
        cd.write_u16::<LittleEndian>(flags).unwrap();
        cd.write_u16::<LittleEndian>(method).unwrap();
        cd.write_u16::<LittleEndian>(DOS_TIME).unwrap();
        cd.write_u16::<LittleEndian>(DOS_DATE).unwrap();
        cd.write_u32::<LittleEndian>(crc).unwrap();
        cd.write_u32::<LittleEndian>(csize).unwrap();
        cd.write_u32::<LittleEndian>(usize_).unwrap();
        cd.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        cd.write_u16::<LittleEndian>(if self.zip64 { 28 } else { 0 }).unwrap();
        cd.write_u16::<LittleEndian>(0).unwrap(); // comment
        cd.write_u16::<LittleEndian>(0).unwrap(); // disk start
        cd.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
        cd.write_u32::<LittleEndian>(0).unwrap(); // external attrs
        cd.write_u32::<LittleEndian>(offset).unwrap();
        cd.extend_from_slice(name);
        if self.zip64 {
            cd.write_u16::<LittleEndian>(0x0001).unwrap();
            cd.write_u16::<LittleEndian>(24).unwrap();
            cd.write_u64::<LittleEndian>(spec.content.len() as u64).unwrap();
            cd.write_u64::<LittleEndian>(data.len() as u64).unwrap();
            cd.write_u64::<LittleEndian>(header_offset).unwrap();
        }

        self.count += 1;
        self.placed.push(Placed {
            header_offset,
            header_size,
            stored_size: data.len() as u64,
        });
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.finish_with_comment(b"")
    }

    pub fn finish_with_comment(mut self, comment: &[u8]) -> Vec<u8> {
        let cd_offset = self.out.len() as u64;
        let cd_size = self.central.len() as u64;
        self.out.extend_from_slice(&self.central);

        let out = &mut self.out;
        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            out.write_u64::<LittleEndian>(44).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(self.count).unwrap();
            out.write_u64::<LittleEndian>(self.count).unwrap();
            out.write_u64::<LittleEndian>(cd_size).unwrap();
            out.write_u64::<LittleEndian>(cd_offset).unwrap();

            out.extend_from_slice(b"PK\x06\x07");
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
            out.write_u32::<LittleEndian>(1).unwrap();
        }

        let (count, size, offset) = if self.zip64 {
            (u16::MAX, u32::MAX, u32::MAX)
        } else {
            (self.count as u16, cd_size as u32, cd_offset as u32)
        };
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u16::<LittleEndian>(count).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u32::<LittleEndian>(offset).unwrap();
        out.write_u16::<LittleEndian>(comment.len() as u16).unwrap();
        out.extend_from_slice(comment);

        self.out
    }
}
