//! WOFF 1.0 packer: every table zlib-compressed on its own.
//!
//! ```text
//! header (44) | directory (20 × n, sorted by tag) | tables (4-byte aligned)
//! ```
//!
//! A table whose compressed form is not smaller is stored raw, signalled by
//! `compLength == origLength`.

use super::FontError;
use super::sfnt::{self, pad4};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

pub const SIGNATURE: u32 = 0x774F_4646;
const HEADER_LEN: usize = 44;
const DIRECTORY_ENTRY_LEN: usize = 20;

fn compress(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Convert a TrueType/OpenType font to WOFF.
pub fn encode(ttf: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = sfnt::parse(ttf)?;
    let num_tables = font.tables.len();

    let mut directory = Vec::with_capacity(DIRECTORY_ENTRY_LEN * num_tables);
    let mut body = Vec::new();
    let data_start = HEADER_LEN + DIRECTORY_ENTRY_LEN * num_tables;
    for table in &font.tables {
        let compressed = compress(table.data)?;
        let stored: &[u8] = if compressed.len() < table.data.len() {
            &compressed
        } else {
            table.data
        };
        directory.extend_from_slice(&table.tag);
        directory.extend_from_slice(&((data_start + body.len()) as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        directory.extend_from_slice(&table.checksum.to_be_bytes());
        body.extend_from_slice(stored);
        body.resize(pad4(body.len()), 0);
    }

    let total = data_start + body.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&SIGNATURE.to_be_bytes());
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(num_tables as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&font.total_sfnt_size().to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    // metadata and private blocks: offset, length (+ original length)
    out.extend_from_slice(&[0; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::sfnt::read_u32;
    use crate::fonts::sfnt::tests::sample_font;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    struct Entry {
        tag: [u8; 4],
        offset: usize,
        comp_len: usize,
        orig_len: usize,
    }

    fn entries(woff: &[u8]) -> Vec<Entry> {
        let n = u16::from_be_bytes([woff[12], woff[13]]) as usize;
        (0..n)
            .map(|i| {
                let at = HEADER_LEN + i * DIRECTORY_ENTRY_LEN;
                Entry {
                    tag: woff[at..at + 4].try_into().unwrap(),
                    offset: read_u32(woff, at + 4).unwrap() as usize,
                    comp_len: read_u32(woff, at + 8).unwrap() as usize,
                    orig_len: read_u32(woff, at + 12).unwrap() as usize,
                }
            })
            .collect()
    }

    fn table_data(woff: &[u8], entry: &Entry) -> Vec<u8> {
        let stored = &woff[entry.offset..entry.offset + entry.comp_len];
        if entry.comp_len == entry.orig_len {
            return stored.to_vec();
        }
        let mut out = Vec::new();
        ZlibDecoder::new(stored).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn header_describes_file() {
        let ttf = sample_font();
        let woff = encode(&ttf).unwrap();

        assert_eq!(read_u32(&woff, 0), Some(SIGNATURE));
        assert_eq!(read_u32(&woff, 4), Some(sfnt::FLAVOR_TRUETYPE));
        assert_eq!(read_u32(&woff, 8), Some(woff.len() as u32));
        assert_eq!(u16::from_be_bytes([woff[12], woff[13]]), 5);
        let sfnt_size = sfnt::parse(&ttf).unwrap().total_sfnt_size();
        assert_eq!(read_u32(&woff, 16), Some(sfnt_size));
        assert_eq!(woff.len() % 4, 0);
    }

    #[test]
    fn tables_round_trip_through_zlib() {
        let ttf = sample_font();
        let woff = encode(&ttf).unwrap();
        let font = sfnt::parse(&ttf).unwrap();

        let entries = entries(&woff);
        assert_eq!(entries.len(), font.tables.len());
        for (entry, table) in entries.iter().zip(&font.tables) {
            assert_eq!(entry.tag, table.tag);
            assert_eq!(entry.offset % 4, 0);
            assert_eq!(table_data(&woff, entry), table.data);
        }
    }

    #[test]
    fn compressible_tables_shrink_and_tiny_ones_stay_raw() {
        let woff = encode(&sample_font()).unwrap();
        let entries = entries(&woff);

        let glyf = entries.iter().find(|e| &e.tag == b"glyf").unwrap();
        assert!(glyf.comp_len < glyf.orig_len);
        let zzzz = entries.iter().find(|e| &e.tag == b"ZZZZ").unwrap();
        assert_eq!(zzzz.comp_len, zzzz.orig_len);
    }

    #[test]
    fn invalid_font_is_rejected() {
        assert!(encode(b"not a font at all").is_err());
    }
}
