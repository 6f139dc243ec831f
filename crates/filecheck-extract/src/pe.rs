use core::fmt;
use std::io::{self, Read};

use filecheck_domain::{ByteSource, Failure, ReasonCode, VersionOutcome};

use crate::Extractor;

/// `VS_FIXEDFILEINFO.dwSignature`.
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;
/// Size of `VS_FIXEDFILEINFO`; a match is only read when the whole struct fits.
const FIXED_FILE_INFO_LEN: usize = 52;
const MIN_CHUNK_BYTES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl FileVersion {
    fn from_words(ms: u32, ls: u32) -> Self {
        Self {
            major: (ms >> 16) as u16,
            minor: (ms & 0xFFFF) as u16,
            build: (ls >> 16) as u16,
            revision: (ls & 0xFFFF) as u16,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.major == 0 && self.minor == 0 && self.build == 0 && self.revision == 0
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Scans a byte stream for the first non-zero `VS_FIXEDFILEINFO` file version.
///
/// The stream is read `chunk_bytes` at a time. The last 51 bytes of each
/// window are carried into the next one, so a structure split across reads is
/// still found and no offset is examined twice.
pub fn scan_fixed_file_version<R: Read + ?Sized>(
    reader: &mut R,
    chunk_bytes: usize,
) -> io::Result<Option<FileVersion>> {
    let chunk_bytes = chunk_bytes.max(MIN_CHUNK_BYTES);
    let mut chunk = vec![0_u8; chunk_bytes];
    let mut window = Vec::<u8>::with_capacity(chunk_bytes + FIXED_FILE_INFO_LEN);

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => return Ok(None),
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        window.extend_from_slice(&chunk[..n]);
        if window.len() < FIXED_FILE_INFO_LEN {
            continue;
        }

        let last_start = window.len() - FIXED_FILE_INFO_LEN;
        for i in 0..=last_start {
            if window[i] != 0xBD || read_u32_le(&window, i) != FIXED_FILE_INFO_SIGNATURE {
                continue;
            }
            let version =
                FileVersion::from_words(read_u32_le(&window, i + 8), read_u32_le(&window, i + 12));
            if !version.is_zero() {
                return Ok(Some(version));
            }
        }
        window.drain(..=last_start);
    }
}

fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[derive(Debug, Clone, Copy)]
pub struct PeExtractor {
    chunk_bytes: usize,
}

impl PeExtractor {
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            chunk_bytes: chunk_bytes.max(MIN_CHUNK_BYTES),
        }
    }
}

impl Extractor for PeExtractor {
    fn id(&self) -> &'static str {
        "extract.pe.v1"
    }

    fn extract(&self, source: &mut dyn ByteSource) -> VersionOutcome {
        match scan_fixed_file_version(source, self.chunk_bytes) {
            Ok(Some(version)) => VersionOutcome::found(version.to_string()),
            Ok(None) => VersionOutcome::failed(Failure::new(
                ReasonCode::NoVersion,
                "no version info found",
            )),
            Err(err) => VersionOutcome::failed(Failure::new(
                ReasonCode::ReadError,
                format!("error reading file: {err}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_file_info(ms: u32, ls: u32) -> [u8; FIXED_FILE_INFO_LEN] {
        let mut block = [0_u8; FIXED_FILE_INFO_LEN];
        block[0..4].copy_from_slice(&FIXED_FILE_INFO_SIGNATURE.to_le_bytes());
        block[4..8].copy_from_slice(&0x0001_0000_u32.to_le_bytes());
        block[8..12].copy_from_slice(&ms.to_le_bytes());
        block[12..16].copy_from_slice(&ls.to_le_bytes());
        block
    }

    #[test]
    fn version_words_split_into_halves() {
        let v = FileVersion::from_words(0x0002_0001, 0x0004_0003);
        assert_eq!(v.to_string(), "2.1.4.3");
    }

    #[test]
    fn struct_at_exact_end_of_file_is_found() {
        let mut data = vec![0x90_u8; 100];
        data.extend_from_slice(&fixed_file_info(0x000A_0000, 0x0000_0001));
        let found = scan_fixed_file_version(&mut data.as_slice(), 64).expect("scan");
        assert_eq!(found.map(|v| v.to_string()).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn truncated_struct_is_ignored() {
        let block = fixed_file_info(0x0001_0000, 0);
        let data = &block[..FIXED_FILE_INFO_LEN - 1];
        let found = scan_fixed_file_version(&mut &data[..], 64).expect("scan");
        assert_eq!(found, None);
    }

    #[test]
    fn tiny_chunks_are_clamped() {
        let mut data = vec![0_u8; 10];
        data.extend_from_slice(&fixed_file_info(0x0001_0002, 0x0003_0004));
        let found = scan_fixed_file_version(&mut data.as_slice(), 1).expect("scan");
        assert_eq!(found.map(|v| v.to_string()).as_deref(), Some("1.2.3.4"));
    }
}
