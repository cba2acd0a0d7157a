use thiserror::Error;

use super::archive::Archive;
use super::error::{Result, ZipError};
use super::structures::{CompressionMethod, Entry};

/// Failure reported by an [`Inflate`] backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InflateError {
    /// No DEFLATE implementation is linked in.
    #[error("no DEFLATE backend available")]
    Unavailable,
    /// The backend rejected the stream.
    #[error("{0}")]
    Failed(&'static str),
    /// The stream decodes to more bytes than `output` holds.
    #[error("stream does not end within the declared size")]
    Overrun,
}

/// A raw DEFLATE (RFC 1951, no zlib wrapper) decoder.
///
/// `inflate` decodes all of `input` into `output` and returns the number of
/// bytes produced. `output` is exactly as long as the entry's declared
/// uncompressed size.
///
/// Closures with the same shape implement this trait, so a decoder can be
/// injected without defining a type:
///
/// ```
/// use memzip::zip::{Inflate, InflateError};
///
/// let mut never = |_: &[u8], _: &mut [u8]| -> Result<usize, InflateError> {
///     Err(InflateError::Failed("not today"))
/// };
/// assert!(never.inflate(b"", &mut []).is_err());
/// ```
pub trait Inflate {
    fn inflate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, InflateError>;
}

impl<F> Inflate for F
where
    F: FnMut(&[u8], &mut [u8]) -> Result<usize, InflateError>,
{
    fn inflate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, InflateError> {
        self(input, output)
    }
}

/// Backend used when no DEFLATE support is linked: every Deflate entry
/// fails with [`ZipError::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInflater;

impl Inflate for NoInflater {
    fn inflate(&mut self, _: &[u8], _: &mut [u8]) -> Result<usize, InflateError> {
        Err(InflateError::Unavailable)
    }
}

/// DEFLATE backend built on `flate2`.
///
/// The decompressor state is created on first use, so extracting only
/// stored entries never allocates.
#[cfg(feature = "deflate")]
#[derive(Default)]
pub struct Flate2Inflater {
    inner: Option<flate2::Decompress>,
}

#[cfg(feature = "deflate")]
impl Flate2Inflater {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "deflate")]
impl Inflate for Flate2Inflater {
    fn inflate(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, InflateError> {
        use flate2::{Decompress, FlushDecompress, Status};

        let inner = self.inner.get_or_insert_with(|| Decompress::new(false));
        inner.reset(false);
        let before = inner.total_out();

        // An empty file still has a final block to consume; decode it into
        // scratch space so an overlong stream shows up as extra output.
        let mut scratch = [0u8; 1];
        let output = if output.is_empty() {
            &mut scratch[..]
        } else {
            output
        };

        let status = inner
            .decompress(input, output, FlushDecompress::Finish)
            .map_err(|_| InflateError::Failed("corrupt deflate stream"))?;
        match status {
            Status::StreamEnd => Ok((inner.total_out() - before) as usize),
            Status::Ok | Status::BufError => Err(InflateError::Overrun),
        }
    }
}

/// The backend [`Archive::extract`] uses.
#[cfg(feature = "deflate")]
pub type DefaultInflater = Flate2Inflater;

/// The backend [`Archive::extract`] uses.
#[cfg(not(feature = "deflate"))]
pub type DefaultInflater = NoInflater;

impl<'a> Archive<'a> {
    /// Extract an entry into `dest` with the default DEFLATE backend.
    ///
    /// See [`Archive::extract_with`] for the error conditions.
    pub fn extract(&self, entry: &Entry<'_>, dest: &mut [u8]) -> Result<usize> {
        self.extract_with(entry, dest, &mut DefaultInflater::default())
    }

    /// Extract an entry into `dest`, decoding Deflate data with `decoder`.
    ///
    /// # Returns
    ///
    /// The number of bytes written, always the entry's uncompressed size.
    ///
    /// # Errors
    ///
    /// - [`ZipError::FormatInvalid`] if the local header or the stored data
    ///   lies outside the archive, if a stored entry's sizes disagree, if
    ///   the compression method is neither Store nor Deflate, or if the
    ///   decoded length differs from the uncompressed size.
    /// - [`ZipError::NoSpace`] if `dest` is shorter than the uncompressed
    ///   size. Nothing is written in that case.
    /// - [`ZipError::Unsupported`] if the decoder has no DEFLATE support.
    /// - [`ZipError::BackendFailure`] if the decoder rejects the stream.
    pub fn extract_with<D>(
        &self,
        entry: &Entry<'_>,
        dest: &mut [u8],
        decoder: &mut D,
    ) -> Result<usize>
    where
        D: Inflate + ?Sized,
    {
        let payload = self.parser.entry_data(entry)?;

        let size = entry.uncompressed_size as usize;
        if dest.len() < size {
            return Err(ZipError::NoSpace {
                needed: size,
                available: dest.len(),
            });
        }
        let out = &mut dest[..size];

        match entry.compression_method {
            CompressionMethod::Stored => {
                if entry.compressed_size != entry.uncompressed_size {
                    return Err(ZipError::FormatInvalid("stored entry sizes differ"));
                }
                out.copy_from_slice(payload);
            }
            CompressionMethod::Deflate => {
                let written = decoder.inflate(payload, out).map_err(|err| match err {
                    InflateError::Unavailable => {
                        ZipError::Unsupported(CompressionMethod::Deflate.as_u16())
                    }
                    InflateError::Failed(reason) => ZipError::BackendFailure(reason),
                    InflateError::Overrun => {
                        ZipError::FormatInvalid("inflated size differs from declared size")
                    }
                })?;
                if written != size {
                    return Err(ZipError::FormatInvalid(
                        "inflated size differs from declared size",
                    ));
                }
            }
            CompressionMethod::Unknown(method) => {
                log::debug!("compression method {method} is not supported");
                return Err(ZipError::FormatInvalid("unsupported compression method"));
            }
        }

        log::trace!(
            "extracted {} ({} -> {} bytes)",
            entry.name.escape_ascii(),
            entry.compressed_size,
            size
        );
        Ok(size)
    }

    /// Like [`Archive::extract`], then check the data against the entry's
    /// recorded CRC-32.
    ///
    /// # Errors
    ///
    /// Everything [`Archive::extract_with`] reports, plus
    /// [`ZipError::CrcMismatch`]. `dest` holds the extracted bytes either way.
    pub fn extract_verified(&self, entry: &Entry<'_>, dest: &mut [u8]) -> Result<usize> {
        let written = self.extract(entry, dest)?;
        let computed = crc32fast::hash(&dest[..written]);
        if computed != entry.crc32 {
            return Err(ZipError::CrcMismatch {
                expected: entry.crc32,
                computed,
            });
        }
        Ok(written)
    }
}
