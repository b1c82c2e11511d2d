//! Minimal reader for the sfnt container (TrueType / OpenType).
//!
//! Only the offset table and table records are read; table contents are
//! handed to the web font packers as opaque byte slices.

use super::FontError;

/// `0x00010000`: TrueType outlines.
pub const FLAVOR_TRUETYPE: u32 = 0x0001_0000;
/// `OTTO`: CFF outlines.
pub const FLAVOR_CFF: u32 = u32::from_be_bytes(*b"OTTO");
/// `true`: legacy Apple TrueType.
pub const FLAVOR_APPLE: u32 = u32::from_be_bytes(*b"true");

const OFFSET_TABLE_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;

/// One table of a font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<'a> {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub data: &'a [u8],
}

impl Table<'_> {
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// A parsed font: its flavor and tables sorted by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sfnt<'a> {
    pub flavor: u32,
    pub tables: Vec<Table<'a>>,
}

impl Sfnt<'_> {
    /// Size of the uncompressed font: header, records and 4-byte padded tables.
    pub fn total_sfnt_size(&self) -> u32 {
        let tables: usize = self.tables.iter().map(|t| pad4(t.data.len())).sum();
        (OFFSET_TABLE_LEN + TABLE_RECORD_LEN * self.tables.len() + tables) as u32
    }
}

/// Round up to the next multiple of 4.
pub fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

pub(super) fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

pub(super) fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Parse the table directory of a TrueType/OpenType font.
pub fn parse(bytes: &[u8]) -> Result<Sfnt<'_>, FontError> {
    let truncated = || FontError::Malformed("truncated font header".into());
    let flavor = read_u32(bytes, 0).ok_or_else(truncated)?;
    match flavor {
        FLAVOR_TRUETYPE | FLAVOR_CFF | FLAVOR_APPLE => {}
        _ if &flavor.to_be_bytes() == b"ttcf" => {
            return Err(FontError::Unsupported("font collections (.ttc)".into()));
        }
        _ => {
            return Err(FontError::Malformed(format!(
                "unknown sfnt version 0x{flavor:08x}"
            )));
        }
    }
    let num_tables = read_u16(bytes, 4).ok_or_else(truncated)? as usize;
    if num_tables == 0 {
        return Err(FontError::Malformed("font has no tables".into()));
    }

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let record = OFFSET_TABLE_LEN + i * TABLE_RECORD_LEN;
        let fields = (
            bytes.get(record..record + 4),
            read_u32(bytes, record + 4),
            read_u32(bytes, record + 8),
            read_u32(bytes, record + 12),
        );
        let (Some(tag), Some(checksum), Some(offset), Some(length)) = fields else {
            return Err(FontError::Malformed("truncated table directory".into()));
        };
        let tag: [u8; 4] = [tag[0], tag[1], tag[2], tag[3]];
        let (start, end) = (offset as usize, offset as usize + length as usize);
        let data = bytes.get(start..end).ok_or_else(|| {
            FontError::Malformed(format!(
                "table '{}' extends past end of file",
                String::from_utf8_lossy(&tag)
            ))
        })?;
        tables.push(Table {
            tag,
            checksum,
            data,
        });
    }
    tables.sort_by_key(|t| t.tag);
    if let Some(pair) = tables.windows(2).find(|w| w[0].tag == w[1].tag) {
        return Err(FontError::Malformed(format!(
            "duplicate table '{}'",
            pair[0].tag_str()
        )));
    }
    Ok(Sfnt { flavor, tables })
}
