//! In-memory ZIP archive reading and writing.
//!
//! This module reads and writes ZIP archives held entirely in caller-owned
//! byte slices, without allocating.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`Archive`]: opening an archive, looking entries up and listing them
//! - [`extractor`]: copying or inflating one entry into a caller buffer
//! - [`builder`]: serializing a new Store-only archive
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Reading starts at the EOCD, then walks the Central Directory; local
//! headers are only touched when an entry is extracted.
//!
//! ## Supported Features
//!
//! - STORED (no compression) method, read and write
//! - DEFLATE method, read only, through a pluggable [`Inflate`] backend
//!   (`flate2` with the default `deflate` feature)
//! - CRC-32 written on create and optionally verified on extract
//!
//! ## Limitations
//!
//! - No ZIP64: at most 65535 entries and 4 GiB
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

mod archive;
pub mod builder;
mod error;
pub mod extractor;
mod field;
pub mod parser;
pub mod structures;

pub use archive::{Archive, Entries};
pub use builder::{NewEntry, create, encoded_len};
pub use error::{Result, ZipError};
pub use extractor::{DefaultInflater, Inflate, InflateError, NoInflater};
#[cfg(feature = "deflate")]
pub use extractor::Flate2Inflater;
pub use parser::ZipParser;
pub use structures::*;
