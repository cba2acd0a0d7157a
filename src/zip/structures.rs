use super::error::{Result, ZipError};
use super::field::{Writer, read_u16, read_u32};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Version 2.0: the lowest version that knows Store and Deflate.
pub(crate) const VERSION_20: u16 = 20;

/// Largest value a 16-bit count or length field can hold.
pub const MAX_U16_FIELD: usize = u16::MAX as usize;

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: u32 = 0x0605_4b50;
    pub const SIZE: usize = 22;
    /// Fixed record plus the longest possible comment.
    pub const MAX_SEARCH: usize = Self::SIZE + MAX_U16_FIELD;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if read_u32(data, 0)? != Self::SIGNATURE {
            return Err(ZipError::FormatInvalid("bad end of central directory signature"));
        }

        Ok(Self {
            disk_number: read_u16(data, 4)?,
            disk_with_cd: read_u16(data, 6)?,
            disk_entries: read_u16(data, 8)?,
            total_entries: read_u16(data, 10)?,
            cd_size: read_u32(data, 12)?,
            cd_offset: read_u32(data, 16)?,
            comment_len: read_u16(data, 20)?,
        })
    }

    pub(crate) fn write(&self, w: &mut Writer<'_>) -> Result<()> {
        w.put_u32(Self::SIGNATURE)?;
        w.put_u16(self.disk_number)?;
        w.put_u16(self.disk_with_cd)?;
        w.put_u16(self.disk_entries)?;
        w.put_u16(self.total_entries)?;
        w.put_u32(self.cd_size)?;
        w.put_u32(self.cd_offset)?;
        w.put_u16(self.comment_len)
    }

    /// Split archives keep part of the directory on another disk.
    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0
            || self.disk_with_cd != 0
            || self.disk_entries != self.total_entries
    }
}

/// Central Directory File Header (CDFH) - 46 bytes plus name, extra field and comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub lfh_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: u32 = 0x0201_4b50;
    pub const SIZE: usize = 46;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if read_u32(data, 0)? != Self::SIGNATURE {
            return Err(ZipError::FormatInvalid("bad central directory signature"));
        }

        Ok(Self {
            version_made_by: read_u16(data, 4)?,
            version_needed: read_u16(data, 6)?,
            flags: read_u16(data, 8)?,
            compression_method: read_u16(data, 10)?,
            last_mod_time: read_u16(data, 12)?,
            last_mod_date: read_u16(data, 14)?,
            crc32: read_u32(data, 16)?,
            compressed_size: read_u32(data, 20)?,
            uncompressed_size: read_u32(data, 24)?,
            file_name_length: read_u16(data, 28)?,
            extra_field_length: read_u16(data, 30)?,
            file_comment_length: read_u16(data, 32)?,
            disk_number_start: read_u16(data, 34)?,
            internal_attrs: read_u16(data, 36)?,
            external_attrs: read_u32(data, 38)?,
            lfh_offset: read_u32(data, 42)?,
        })
    }

    /// Length of the whole record: fixed part, name, extra field and comment.
    pub fn record_len(&self) -> usize {
        Self::SIZE
            + self.file_name_length as usize
            + self.extra_field_length as usize
            + self.file_comment_length as usize
    }

    pub(crate) fn write(&self, w: &mut Writer<'_>) -> Result<()> {
        w.put_u32(Self::SIGNATURE)?;
        w.put_u16(self.version_made_by)?;
        w.put_u16(self.version_needed)?;
        w.put_u16(self.flags)?;
        w.put_u16(self.compression_method)?;
        w.put_u16(self.last_mod_time)?;
        w.put_u16(self.last_mod_date)?;
        w.put_u32(self.crc32)?;
        w.put_u32(self.compressed_size)?;
        w.put_u32(self.uncompressed_size)?;
        w.put_u16(self.file_name_length)?;
        w.put_u16(self.extra_field_length)?;
        w.put_u16(self.file_comment_length)?;
        w.put_u16(self.disk_number_start)?;
        w.put_u16(self.internal_attrs)?;
        w.put_u32(self.external_attrs)?;
        w.put_u32(self.lfh_offset)
    }
}

/// Local File Header (LFH) - 30 bytes plus name and extra field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x0403_4b50;
    pub const SIZE: usize = 30;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if read_u32(data, 0)? != Self::SIGNATURE {
            return Err(ZipError::FormatInvalid("bad local file header signature"));
        }

        Ok(Self {
            version_needed: read_u16(data, 4)?,
            flags: read_u16(data, 6)?,
            compression_method: read_u16(data, 8)?,
            last_mod_time: read_u16(data, 10)?,
            last_mod_date: read_u16(data, 12)?,
            crc32: read_u32(data, 14)?,
            compressed_size: read_u32(data, 18)?,
            uncompressed_size: read_u32(data, 22)?,
            file_name_length: read_u16(data, 26)?,
            extra_field_length: read_u16(data, 28)?,
        })
    }

    /// Bytes from the start of the header to the first payload byte.
    pub fn header_len(&self) -> usize {
        Self::SIZE + self.file_name_length as usize + self.extra_field_length as usize
    }

    pub(crate) fn write(&self, w: &mut Writer<'_>) -> Result<()> {
        w.put_u32(Self::SIGNATURE)?;
        w.put_u16(self.version_needed)?;
        w.put_u16(self.flags)?;
        w.put_u16(self.compression_method)?;
        w.put_u16(self.last_mod_time)?;
        w.put_u16(self.last_mod_date)?;
        w.put_u32(self.crc32)?;
        w.put_u32(self.compressed_size)?;
        w.put_u32(self.uncompressed_size)?;
        w.put_u16(self.file_name_length)?;
        w.put_u16(self.extra_field_length)
    }
}

/// One file's metadata, decoded from its central directory record.
///
/// The name borrows the archive bytes, so an `Entry` is only as long-lived
/// as the [`Archive`](super::Archive) it came from. Names are opaque bytes;
/// use [`Entry::name_str`] when UTF-8 is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub name: &'a [u8],
    pub compression_method: CompressionMethod,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub crc32: u32,
    pub local_header_offset: u32,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
}

impl<'a> Entry<'a> {
    pub(crate) fn from_header(header: &CentralDirectoryHeader, name: &'a [u8]) -> Self {
        Self {
            name,
            compression_method: CompressionMethod::from_u16(header.compression_method),
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            crc32: header.crc32,
            local_header_offset: header.lfh_offset,
            last_mod_time: header.last_mod_time,
            last_mod_date: header.last_mod_date,
        }
    }

    /// The name as UTF-8, or `None` if it is not valid UTF-8.
    pub fn name_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.name).ok()
    }

    /// Directory entries end with '/'
    pub fn is_directory(&self) -> bool {
        self.name.last() == Some(&b'/')
    }

    pub fn is_compressed(&self) -> bool {
        self.compression_method != CompressionMethod::Stored
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}
