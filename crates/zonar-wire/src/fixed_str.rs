//! A fixed-width, NUL-padded byte field that reads/writes as a UTF-8 string.
//!
//! Used for the `path`-shaped fields on the wire (§4.4 of the protocol:
//! "path (fixed byte array, PATH_MAX, NUL-padded)"). The field always
//! occupies exactly `N` bytes on the wire regardless of the string's
//! actual length.

use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinWrite, Endian, prelude::*};

/// A fixed-size, NUL-padded string field of exactly `N` bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixedStr<const N: usize>(pub String);

impl<const N: usize> FixedStr<N> {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> From<&str> for FixedStr<N> {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<const N: usize> From<String> for FixedStr<N> {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<const N: usize> BinRead for FixedStr<N> {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let mut buf = vec![0u8; N];
        reader.read_exact(&mut buf)?;
        let nul = buf.iter().position(|&b| b == 0).unwrap_or(N);
        Ok(FixedStr(String::from_utf8_lossy(&buf[..nul]).into_owned()))
    }
}

impl<const N: usize> BinWrite for FixedStr<N> {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        let mut buf = vec![0u8; N];
        let bytes = self.0.as_bytes();
        // Reserve the trailing byte for the NUL terminator, same as the
        // `strncpy(dst, src, sizeof(dst) - 1)` convention the wire format
        // is modeled on.
        let n = bytes.len().min(N.saturating_sub(1));
        buf[..n].copy_from_slice(&bytes[..n]);
        writer.write_all(&buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_short_string() {
        let s = FixedStr::<16>::new("/mnt/data");
        let mut buf = Vec::new();
        s.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), 16);
        let back = FixedStr::<16>::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn truncates_to_fit() {
        let s = FixedStr::<4>::new("abcdef");
        let mut buf = Vec::new();
        s.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf, b"abc\0");
    }
}
