//! Little-endian field access over borrowed byte slices.
//!
//! Every ZIP record is a run of fixed-width little-endian integers at known
//! offsets. Readers here never panic on short input: an out-of-range field is
//! reported as [`ZipError::FormatInvalid`]. The [`Writer`] is the mirror image
//! used by the builder and reports [`ZipError::NoSpace`] instead.

use byteorder::{ByteOrder, LittleEndian};

use super::error::{Result, ZipError};

/// Borrow `len` bytes starting at `offset`, or fail if that range leaves `buf`.
pub(crate) fn slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let end = offset
        .checked_add(len)
        .ok_or(ZipError::FormatInvalid("field offset overflows"))?;
    buf.get(offset..end)
        .ok_or(ZipError::FormatInvalid("truncated field"))
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    slice(buf, offset, 2).map(LittleEndian::read_u16)
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    slice(buf, offset, 4).map(LittleEndian::read_u32)
}

/// Bounds-checked sequential writer over a caller-owned buffer.
///
/// Each `put_*` call checks the remaining capacity before touching the
/// buffer, so a failed call leaves the bytes after `position` untouched.
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Everything written so far.
    pub(crate) fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// Claim the next `len` bytes of the buffer.
    fn reserve(&mut self, len: usize) -> Result<&mut [u8]> {
        let available = self.buf.len() - self.pos;
        if len > available {
            return Err(ZipError::NoSpace {
                needed: self.pos + len,
                available: self.buf.len(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buf[start..start + len])
    }

    pub(crate) fn put_u16(&mut self, value: u16) -> Result<()> {
        LittleEndian::write_u16(self.reserve(2)?, value);
        Ok(())
    }

    pub(crate) fn put_u32(&mut self, value: u32) -> Result<()> {
        LittleEndian::write_u32(self.reserve(4)?, value);
        Ok(())
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let buf = [0x50, 0x4b, 0x05, 0x06, 0x34, 0x12];
        assert_eq!(read_u32(&buf, 0).unwrap(), 0x0605_4b50);
        assert_eq!(read_u16(&buf, 4).unwrap(), 0x1234);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let buf = [0u8; 5];
        assert!(matches!(read_u32(&buf, 2), Err(ZipError::FormatInvalid(_))));
        assert!(matches!(read_u16(&buf, 4), Err(ZipError::FormatInvalid(_))));
        assert!(matches!(
            read_u16(&buf, usize::MAX),
            Err(ZipError::FormatInvalid(_))
        ));
    }

    #[test]
    fn writer_stops_at_capacity() {
        let mut buf = [0u8; 6];
        let mut w = Writer::new(&mut buf);
        w.put_u32(0x0403_4b50).unwrap();
        assert_eq!(
            w.put_u32(1),
            Err(ZipError::NoSpace {
                needed: 8,
                available: 6
            })
        );
        w.put_u16(0xbeef).unwrap();
        assert_eq!(w.position(), 6);
        assert_eq!(buf, [0x50, 0x4b, 0x03, 0x04, 0xef, 0xbe]);
    }
}
