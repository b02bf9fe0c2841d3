use std::fmt;
use std::str::FromStr;

use pathio_base::{ErrorKind, PathioError};

/// Text encodings a [`FileHandle`](crate::FileHandle) can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    Ascii,
    Latin1,
    Latin9,
    Windows1252,
    Utf16Le,
    Utf16Be,
}

impl Charset {
    /// Looks up a charset by name or common alias, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, Box<PathioError>> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let charset = match normalized.as_str() {
            "utf-8" | "utf8" => Charset::Utf8,
            "us-ascii" | "ascii" => Charset::Ascii,
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => Charset::Latin1,
            "iso-8859-15" | "iso8859-15" | "latin9" | "latin-9" => Charset::Latin9,
            "windows-1252" | "cp1252" => Charset::Windows1252,
            "utf-16le" | "utf16le" => Charset::Utf16Le,
            "utf-16be" | "utf16be" => Charset::Utf16Be,
            _ => {
                return Err(Box::new(PathioError::new(ErrorKind::UnknownCharset {
                    name: name.to_string(),
                })));
            }
        };
        Ok(charset)
    }

    /// Canonical name of the charset.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Ascii => "us-ascii",
            Charset::Latin1 => "iso-8859-1",
            Charset::Latin9 => "iso-8859-15",
            Charset::Windows1252 => "windows-1252",
            Charset::Utf16Le => "utf-16le",
            Charset::Utf16Be => "utf-16be",
        }
    }

    /// Encoded form of `\n`; its length is the code unit width.
    pub(crate) fn newline(&self) -> &'static [u8] {
        match self {
            Charset::Utf16Le => &[0x0A, 0x00],
            Charset::Utf16Be => &[0x00, 0x0A],
            _ => b"\n",
        }
    }

    /// Decodes a complete line. Returns `None` for bytes that are not valid
    /// in this charset.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            Charset::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| b as char).collect()),
            Charset::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Charset::Latin9 => Some(bytes.iter().map(|&b| latin9_to_char(b)).collect()),
            Charset::Windows1252 => Some(bytes.iter().map(|&b| windows1252_to_char(b)).collect()),
            Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        }
    }
}

impl FromStr for Charset {
    type Err = Box<PathioError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Latin-9 differs from Latin-1 in eight code points.
fn latin9_to_char(byte: u8) -> char {
    match byte {
        0xA4 => '\u{20AC}',
        0xA6 => '\u{0160}',
        0xA8 => '\u{0161}',
        0xB4 => '\u{017D}',
        0xB8 => '\u{017E}',
        0xBC => '\u{0152}',
        0xBD => '\u{0153}',
        0xBE => '\u{0178}',
        _ => byte as char,
    }
}

/// Windows-1252 replaces the C1 control range; unassigned bytes map to the
/// C1 control of the same value.
fn windows1252_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}
