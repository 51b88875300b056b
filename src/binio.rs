//! Little-endian fixed-width primitives shared by every on-disk format in
//! this crate.
//!
//! Every binary file format in the design (`lexicon.bin`, `doc_lengths.bin`,
//! `forward_index.bin`, `inverted_index.bin`, `barrel_<b>.bin`, `trie.bin`)
//! is built from `u32`/`u64` fields in little-endian byte order. Centralizing
//! the read/write calls here means a format bug shows up in one place
//! instead of N slightly different `from_le_bytes` call sites.

use std::io::{self, Read, Write};

#[inline]
pub fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

#[inline]
pub fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[inline]
pub fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

#[inline]
pub fn write_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

/// Reads a `[len:u32][bytes; len]` length-prefixed UTF-8 string.
///
/// A length that cannot possibly fit in the remaining file (more than
/// `max_len`) is treated as a corrupt record rather than an allocation of
/// attacker-controlled size.
pub fn read_string<R: Read>(r: &mut R, max_len: u32) -> io::Result<String> {
    let len = read_u32(r)?;
    if len > max_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("string length {len} exceeds max {max_len}"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("non-utf8 string: {e}")))
}

pub fn write_string<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write_u32(w, s.len() as u32)?;
    w.write_all(s.as_bytes())
}
