use core::iter::FusedIterator;

use super::error::{Result, ZipError};
use super::parser::ZipParser;
use super::structures::{EndOfCentralDirectory, Entry};

/// An opened ZIP archive borrowed from a caller-owned buffer.
///
/// `open` locates the end record once; lookups then walk the central
/// directory on demand. The archive is a small `Copy` value and never owns
/// or mutates the bytes it views.
///
/// ## Example
///
/// ```
/// use memzip::zip::{create, Archive, NewEntry};
///
/// let mut buf = [0u8; 256];
/// let len = create(&[NewEntry::new("a.txt", b"hi")], &mut buf).unwrap();
///
/// let archive = Archive::open(&buf[..len]).unwrap();
/// let entry = archive.find("a.txt").unwrap();
///
/// let mut out = [0u8; 2];
/// assert_eq!(archive.extract(&entry, &mut out).unwrap(), 2);
/// assert_eq!(&out, b"hi");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Archive<'a> {
    pub(super) parser: ZipParser<'a>,
    cd_offset: u32,
    cd_size: u32,
    entry_count: u16,
    comment: &'a [u8],
}

impl<'a> Archive<'a> {
    /// Open the archive held in `data`.
    ///
    /// # Errors
    ///
    /// [`ZipError::FormatInvalid`] if no usable end of central directory
    /// record is found, or if the archive spans several disks.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let parser = ZipParser::new(data);
        let (eocd, eocd_offset) = parser.find_eocd()?;

        if eocd.is_multi_disk() {
            return Err(ZipError::FormatInvalid(
                "multi-disk archives are not supported",
            ));
        }

        let comment_start = eocd_offset + EndOfCentralDirectory::SIZE;
        let comment = &data[comment_start..comment_start + eocd.comment_len as usize];

        log::debug!(
            "opened archive: {} entries, central directory at {} ({} bytes)",
            eocd.total_entries,
            eocd.cd_offset,
            eocd.cd_size
        );

        Ok(Self {
            parser,
            cd_offset: eocd.cd_offset,
            cd_size: eocd.cd_size,
            entry_count: eocd.total_entries,
            comment,
        })
    }

    /// Number of entries declared by the end record.
    pub fn len(&self) -> usize {
        self.entry_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    pub fn central_directory_offset(&self) -> u32 {
        self.cd_offset
    }

    pub fn central_directory_size(&self) -> u32 {
        self.cd_size
    }

    /// The archive comment, possibly empty.
    pub fn comment(&self) -> &'a [u8] {
        self.comment
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.parser.data()
    }

    /// Iterate over the central directory in stored order.
    ///
    /// The iterator yields at most one error, for the first malformed
    /// record, and ends after it.
    pub fn entries(&self) -> Entries<'a> {
        Entries {
            parser: self.parser,
            offset: self.cd_offset as usize,
            remaining: self.entry_count,
        }
    }

    /// Find an entry by exact, case-sensitive name.
    ///
    /// No path normalization is applied. The scan is linear and returns the
    /// first match.
    ///
    /// # Errors
    ///
    /// [`ZipError::NotFound`] if no entry matches, including when a malformed
    /// record ends the scan before a match is reached.
    pub fn find(&self, name: impl AsRef<[u8]>) -> Result<Entry<'a>> {
        let name = name.as_ref();
        for entry in self.entries() {
            match entry {
                Ok(entry) if entry.name == name => return Ok(entry),
                Ok(_) => {}
                Err(err) => {
                    log::debug!("lookup stopped at malformed entry: {err}");
                    break;
                }
            }
        }
        Err(ZipError::NotFound)
    }

    /// Call `visitor(name, uncompressed_size)` for every entry in order.
    ///
    /// # Errors
    ///
    /// [`ZipError::FormatInvalid`] at the first malformed record. Entries
    /// before it have already been visited, so a failed listing may be
    /// incomplete.
    pub fn list<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&'a [u8], u32),
    {
        for entry in self.entries() {
            let entry = entry?;
            visitor(entry.name, entry.uncompressed_size);
        }
        Ok(())
    }
}

/// Iterator over an archive's central directory, see [`Archive::entries`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    parser: ZipParser<'a>,
    offset: usize,
    remaining: u16,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<Entry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.offset >= self.parser.data().len() {
            self.remaining = 0;
            return Some(Err(ZipError::FormatInvalid("central directory truncated")));
        }

        match self.parser.parse_cdfh(self.offset) {
            Ok((entry, record_len)) => {
                self.offset += record_len;
                self.remaining -= 1;
                Some(Ok(entry))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

impl FusedIterator for Entries<'_> {}
