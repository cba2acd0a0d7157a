use thiserror::Error;

/// Errors produced by the archive reader and builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ZipError {
    /// Malformed, truncated, signature-mismatched or out-of-range structure.
    #[error("invalid ZIP archive: {0}")]
    FormatInvalid(&'static str),

    /// No entry with the requested name.
    #[error("entry not found")]
    NotFound,

    /// The destination buffer is smaller than the operation requires.
    #[error("destination too small: need {needed} bytes, have {available}")]
    NoSpace { needed: usize, available: usize },

    /// A recognized compression method with no decoder available.
    #[error("no decoder available for compression method {0}")]
    Unsupported(u16),

    /// The injected decoder reported a failure.
    #[error("decompression backend failed: {0}")]
    BackendFailure(&'static str),

    /// An entry name does not fit the 16-bit length field.
    #[error("entry name is {0} bytes long, the limit is 65535")]
    NameTooLong(usize),

    /// More entries than the 16-bit entry count can describe.
    #[error("{0} entries requested, the limit is 65535")]
    TooManyEntries(usize),

    /// Extracted bytes do not match the recorded checksum.
    #[error("CRC-32 mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },
}

pub type Result<T, E = ZipError> = core::result::Result<T, E>;
