//! WOFF 2.0 packer.
//!
//! Tables are concatenated in directory order and compressed as a single
//! brotli stream. `glyf` and `loca` use the null transform (transform
//! version 3), every other table transform version 0, so no table carries
//! a `transformLength`.
//!
//! ```text
//! header (48) | directory (variable) | brotli stream | pad to 4
//! ```

use super::FontError;
use super::sfnt::{self, Table};
use std::io::Write;

pub const SIGNATURE: u32 = 0x774F_4632;
const HEADER_LEN: usize = 48;

/// Tags with a one-byte directory encoding; the index is the flag value.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// Flag value meaning "tag follows as four bytes".
const ARBITRARY_TAG: u8 = 63;
/// Transform version 3: null transform for `glyf`/`loca`.
const NULL_TRANSFORM_GLYF: u8 = 3 << 6;

/// Append `value` as a UIntBase128: big-endian 7-bit groups, high bit set
/// on all but the last byte, no leading zero groups.
pub(crate) fn write_base128(out: &mut Vec<u8>, mut value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    loop {
        groups[n] = (value & 0x7f) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        out.push(if i == 0 { groups[i] } else { groups[i] | 0x80 });
    }
}

fn directory_entry(out: &mut Vec<u8>, table: &Table) {
    let transform = match &table.tag {
        b"glyf" | b"loca" => NULL_TRANSFORM_GLYF,
        _ => 0,
    };
    match KNOWN_TAGS.iter().position(|known| **known == table.tag) {
        Some(index) => out.push(index as u8 | transform),
        None => {
            out.push(ARBITRARY_TAG | transform);
            out.extend_from_slice(&table.tag);
        }
    }
    write_base128(out, table.data.len() as u32);
}

fn compress(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 11, 22);
    writer.write_all(data)?;
    writer.flush()?;
    Ok(writer.into_inner())
}

/// Convert a TrueType/OpenType font to WOFF2.
pub fn encode(ttf: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = sfnt::parse(ttf)?;

    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for table in &font.tables {
        directory_entry(&mut directory, table);
        stream.extend_from_slice(table.data);
    }
    let compressed = compress(&stream)?;

    let unpadded = HEADER_LEN + directory.len() + compressed.len();
    let total = sfnt::pad4(unpadded);
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(font.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&font.total_sfnt_size().to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    // metadata and private blocks: offset, length (+ original length)
    out.extend_from_slice(&[0; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out.resize(total, 0);
    Ok(out)
}
