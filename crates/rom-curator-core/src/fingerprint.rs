use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const READ_CHUNK: usize = 64 * 1024;

/// CRC-32 of a file's full byte content, the reference catalog's native
/// identity key. Rendered as fixed-width uppercase hex, e.g. "3337EC46".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u32);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid fingerprint (expected up to 8 hex digits)")]
pub struct ParseFingerprintError;

impl Fingerprint {
    pub fn from_raw(value: u32) -> Self {
        Fingerprint(value)
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(data);
        Fingerprint(hasher.finalize())
    }

    /// Checksum the full byte stream in 64 KiB chunks.
    /// Deterministic, order-sensitive, no truncation.
    pub fn from_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut hasher = crc32fast::Hasher::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Fingerprint(hasher.finalize()))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    /// Accepts any-case hex with an optional `0x` prefix; shorter values are
    /// treated as having leading zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        if digits.is_empty() || digits.len() > 8 {
            return Err(ParseFingerprintError);
        }
        u32::from_str_radix(digits, 16)
            .map(Fingerprint)
            .map_err(|_| ParseFingerprintError)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
