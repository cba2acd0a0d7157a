//! # memzip
//!
//! An allocation-free ZIP archive reader and writer for archives held in
//! memory.
//!
//! The [`zip`] module indexes an archive stored in a caller-owned byte slice,
//! finds and extracts entries into caller-owned buffers, and writes new
//! Store-only archives into a caller-owned destination. It never allocates,
//! which makes it usable in embedded, sandboxed or otherwise heap-averse
//! code. DEFLATE decoding is delegated to a pluggable backend (`flate2` by
//! default).
//!
//! The [`io`] and [`cli`] modules back the `memzip` command-line tool, which
//! loads an archive from disk or over HTTP(S) and lists, tests, extracts or
//! creates it.
//!
//! ## Features
//!
//! - Read archives from a byte slice: list, find, extract
//! - STORED and DEFLATE compression methods on read, STORED on write
//! - CRC-32 computed on write and verifiable on extract
//! - Bounded, decoy-resistant search for the end of central directory
//! - `deflate` cargo feature (default) links the `flate2` backend
//!
//! ## Example
//!
//! ```
//! use memzip::zip::{create, encoded_len, Archive, NewEntry, ZipError};
//!
//! let entries = [
//!     NewEntry::new("a.txt", b"hi"),
//!     NewEntry::new("b.bin", &[0u8, 1, 2, 3]),
//! ];
//! let mut buf = [0u8; 512];
//! assert!(encoded_len(&entries)? <= buf.len());
//! let len = create(&entries, &mut buf)?;
//!
//! let archive = Archive::open(&buf[..len])?;
//! assert_eq!(archive.len(), 2);
//!
//! let entry = archive.find("a.txt")?;
//! let mut out = [0u8; 16];
//! let n = archive.extract(&entry, &mut out)?;
//! assert_eq!(&out[..n], b"hi");
//!
//! assert_eq!(archive.find("missing"), Err(ZipError::NotFound));
//! # Ok::<(), ZipError>(())
//! ```

pub mod cli;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use io::{ArchiveSource, HttpSource, LocalSource};
pub use zip::{Archive, Entry, NewEntry, ZipError};
