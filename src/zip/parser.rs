//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures
//! directly out of a borrowed byte slice.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. Walk the Central Directory records it points at
//! 3. For extraction, read each file's Local File Header to find its data
//!
//! Nothing here allocates: every parsed value either is a plain integer or
//! borrows the archive bytes.

use super::error::{Result, ZipError};
use super::field::{self, read_u32};
use super::structures::*;

/// Low-level ZIP parser over an in-memory archive.
///
/// Typically used through [`Archive`](super::Archive) rather than directly.
///
/// ## Example
///
/// ```
/// use memzip::zip::ZipParser;
///
/// let empty = b"PK\x05\x06\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";
/// let parser = ZipParser::new(empty);
/// let (eocd, offset) = parser.find_eocd().unwrap();
/// assert_eq!((eocd.total_entries, offset), (0, 0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Searches backwards from the last position a 22-byte record can start
    /// at, over at most [`EndOfCentralDirectory::MAX_SEARCH`] bytes, and
    /// picks the trailer among the signature matches:
    ///
    /// 1. The closest-to-end record whose comment ends exactly at the buffer
    ///    end and whose central directory ends exactly where it starts.
    /// 2. Otherwise the closest-to-end record whose comment ends exactly at
    ///    the buffer end. Its directory bounds must then hold; there is no
    ///    fallback to records further back, such as the trailer of a ZIP
    ///    stored inside this one.
    /// 3. Otherwise, with bytes trailing the comment, the closest-to-end
    ///    record whose comment fits and whose directory ends where it starts.
    ///
    /// Signature bytes inside a comment do not reach the buffer end, or do
    /// not sit right after a directory, and lose to the true trailer.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the buffer).
    ///
    /// # Errors
    ///
    /// [`ZipError::FormatInvalid`] if the buffer is too short, no record is
    /// found within the search window, or the trailer's directory lies at or
    /// past the buffer end or overlaps the trailer.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, usize)> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            return Err(ZipError::FormatInvalid(
                "buffer shorter than an end of central directory record",
            ));
        }

        let search_size = EndOfCentralDirectory::MAX_SEARCH.min(size);
        let search_start = size - search_size;
        let last = size - EndOfCentralDirectory::SIZE;

        let mut exact_fit = None;
        let mut with_trailing = None;

        for pos in (search_start..=last).rev() {
            if read_u32(self.data, pos)? != EndOfCentralDirectory::SIGNATURE {
                continue;
            }

            let eocd = EndOfCentralDirectory::from_bytes(&self.data[pos..])?;
            let comment_end = (pos + EndOfCentralDirectory::SIZE) as u64 + eocd.comment_len as u64;
            let adjacent = self.directory_ends_at(&eocd, pos);

            if comment_end == size as u64 {
                if adjacent {
                    log::trace!("end of central directory at offset {pos}");
                    return Ok((eocd, pos));
                }
                exact_fit.get_or_insert((eocd, pos));
            } else if comment_end < size as u64 && adjacent {
                with_trailing.get_or_insert((eocd, pos));
            } else {
                log::trace!("ignoring end of central directory signature at offset {pos}");
            }
        }

        if let Some((eocd, pos)) = exact_fit {
            if eocd.cd_offset as usize >= size {
                return Err(ZipError::FormatInvalid(
                    "central directory offset past archive end",
                ));
            }
            if eocd.cd_offset as u64 + eocd.cd_size as u64 > pos as u64 {
                return Err(ZipError::FormatInvalid(
                    "central directory overlaps its end record",
                ));
            }
            log::trace!("end of central directory at offset {pos}");
            return Ok((eocd, pos));
        }

        match with_trailing {
            Some((eocd, pos)) => {
                log::trace!(
                    "end of central directory at offset {pos}, {} trailing bytes",
                    size - pos - EndOfCentralDirectory::SIZE - eocd.comment_len as usize
                );
                Ok((eocd, pos))
            }
            None => Err(ZipError::FormatInvalid("end of central directory not found")),
        }
    }

    /// The directory declared by `eocd` ends exactly at `pos` and, when it
    /// holds entries, starts with a central directory signature.
    fn directory_ends_at(&self, eocd: &EndOfCentralDirectory, pos: usize) -> bool {
        if eocd.cd_offset as u64 + eocd.cd_size as u64 != pos as u64 {
            return false;
        }
        eocd.total_entries == 0
            || read_u32(self.data, eocd.cd_offset as usize).ok()
                == Some(CentralDirectoryHeader::SIGNATURE)
    }

    /// Parse the Central Directory File Header starting at `offset`.
    ///
    /// # Returns
    ///
    /// The decoded [`Entry`] and the full record length, i.e. how far to
    /// advance to reach the next record.
    ///
    /// # Errors
    ///
    /// [`ZipError::FormatInvalid`] on a bad signature or when the record,
    /// including its name, extra field and comment, runs past the archive end.
    pub fn parse_cdfh(&self, offset: usize) -> Result<(Entry<'a>, usize)> {
        let fixed = field::slice(self.data, offset, CentralDirectoryHeader::SIZE)?;
        let header = CentralDirectoryHeader::from_bytes(fixed)?;

        let record_len = header.record_len();
        let record = field::slice(self.data, offset, record_len).map_err(|_| {
            ZipError::FormatInvalid("central directory record runs past archive end")
        })?;

        let name_end = CentralDirectoryHeader::SIZE + header.file_name_length as usize;
        let name = &record[CentralDirectoryHeader::SIZE..name_end];

        Ok((Entry::from_header(&header, name), record_len))
    }

    /// Get the offset of an entry's first data byte.
    ///
    /// The Local File Header has variable-length fields (filename, extra
    /// field) that may differ from the Central Directory record, so the
    /// payload position can only be learned from the local header itself.
    ///
    /// # Errors
    ///
    /// [`ZipError::FormatInvalid`] if the local header signature is wrong or
    /// the header runs past the archive end.
    pub fn get_data_offset(&self, local_header_offset: u32) -> Result<usize> {
        let offset = local_header_offset as usize;
        let fixed = field::slice(self.data, offset, LocalFileHeader::SIZE)
            .map_err(|_| ZipError::FormatInvalid("local file header runs past archive end"))?;
        let header = LocalFileHeader::from_bytes(fixed)?;

        let data_offset = offset + header.header_len();
        if data_offset > self.data.len() {
            return Err(ZipError::FormatInvalid(
                "local file header runs past archive end",
            ));
        }

        Ok(data_offset)
    }

    /// Borrow an entry's stored (possibly compressed) bytes.
    pub fn entry_data(&self, entry: &Entry<'_>) -> Result<&'a [u8]> {
        let start = self.get_data_offset(entry.local_header_offset)?;
        field::slice(self.data, start, entry.compressed_size as usize)
            .map_err(|_| ZipError::FormatInvalid("entry data runs past archive end"))
    }
}
