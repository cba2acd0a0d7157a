//! Store-only archive writer.
//!
//! [`create`] lays an archive out in one pass over a caller-owned buffer:
//! every local header with its name and payload, then the central directory
//! mirroring those headers, then the end record. Nothing is compressed and
//! nothing is allocated.

use super::error::{Result, ZipError};
use super::field::Writer;
use super::structures::*;

/// One file to be written by [`create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEntry<'a> {
    pub name: &'a [u8],
    pub data: &'a [u8],
}

impl<'a> NewEntry<'a> {
    /// ```
    /// use memzip::zip::NewEntry;
    ///
    /// let entry = NewEntry::new("a.txt", b"hi");
    /// assert_eq!(entry.name, b"a.txt");
    /// ```
    pub fn new<N, D>(name: &'a N, data: &'a D) -> Self
    where
        N: AsRef<[u8]> + ?Sized,
        D: AsRef<[u8]> + ?Sized,
    {
        Self {
            name: name.as_ref(),
            data: data.as_ref(),
        }
    }
}

/// Exact number of bytes [`create`] will write for `entries`.
///
/// # Errors
///
/// The same limit errors [`create`] reports: [`ZipError::TooManyEntries`] and
/// [`ZipError::NameTooLong`].
pub fn encoded_len(entries: &[NewEntry<'_>]) -> Result<usize> {
    check_limits(entries)?;
    Ok(entries.iter().fold(EndOfCentralDirectory::SIZE, |total, entry| {
        total
            + LocalFileHeader::SIZE
            + CentralDirectoryHeader::SIZE
            + 2 * entry.name.len()
            + entry.data.len()
    }))
}

/// Serialize `entries` as a Store-only archive at the start of `dest`.
///
/// Entries are written in input order with correct CRC-32 values and zero
/// modification times. Use [`encoded_len`] to size `dest`.
///
/// # Returns
///
/// The number of bytes written. On any error the contents of `dest` are
/// unspecified and must not be used.
///
/// # Errors
///
/// - [`ZipError::TooManyEntries`] for more than 65535 entries.
/// - [`ZipError::NameTooLong`] for a name longer than 65535 bytes.
/// - [`ZipError::FormatInvalid`] if a size or offset would not fit the
///   32-bit fields (archives beyond 4 GiB need ZIP64).
/// - [`ZipError::NoSpace`] as soon as a record does not fit in `dest`.
pub fn create(entries: &[NewEntry<'_>], dest: &mut [u8]) -> Result<usize> {
    check_limits(entries)?;
    let mut w = Writer::new(dest);

    for entry in entries {
        let size = to_u32(entry.data.len())?;
        LocalFileHeader {
            version_needed: VERSION_20,
            flags: 0,
            compression_method: CompressionMethod::Stored.as_u16(),
            last_mod_time: 0,
            last_mod_date: 0,
            crc32: crc32fast::hash(entry.data),
            compressed_size: size,
            uncompressed_size: size,
            file_name_length: entry.name.len() as u16,
            extra_field_length: 0,
        }
        .write(&mut w)?;
        w.put_bytes(entry.name)?;
        w.put_bytes(entry.data)?;
    }

    let cd_offset = w.position();
    let mut local_offset = 0;
    for entry in entries {
        // Mirror the local header already in the buffer rather than hashing
        // the payload a second time.
        let local = LocalFileHeader::from_bytes(&w.written()[local_offset..])?;
        CentralDirectoryHeader {
            version_made_by: VERSION_20,
            version_needed: local.version_needed,
            flags: local.flags,
            compression_method: local.compression_method,
            last_mod_time: local.last_mod_time,
            last_mod_date: local.last_mod_date,
            crc32: local.crc32,
            compressed_size: local.compressed_size,
            uncompressed_size: local.uncompressed_size,
            file_name_length: local.file_name_length,
            extra_field_length: 0,
            file_comment_length: 0,
            disk_number_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            lfh_offset: to_u32(local_offset)?,
        }
        .write(&mut w)?;
        w.put_bytes(entry.name)?;
        local_offset += local.header_len() + entry.data.len();
    }

    let cd_size = w.position() - cd_offset;
    let count = entries.len() as u16;
    EndOfCentralDirectory {
        disk_number: 0,
        disk_with_cd: 0,
        disk_entries: count,
        total_entries: count,
        cd_size: to_u32(cd_size)?,
        cd_offset: to_u32(cd_offset)?,
        comment_len: 0,
    }
    .write(&mut w)?;

    log::debug!(
        "created archive: {} entries, {} bytes",
        entries.len(),
        w.position()
    );
    Ok(w.position())
}

fn check_limits(entries: &[NewEntry<'_>]) -> Result<()> {
    if entries.len() > MAX_U16_FIELD {
        return Err(ZipError::TooManyEntries(entries.len()));
    }
    match entries.iter().find(|e| e.name.len() > MAX_U16_FIELD) {
        Some(entry) => Err(ZipError::NameTooLong(entry.name.len())),
        None => Ok(()),
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| ZipError::FormatInvalid("archive exceeds 4 GiB"))
}
