//! Archives assembled byte by byte, the way other ZIP writers lay them out.

use std::io::Write;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use memzip::zip::{Archive, CompressionMethod, InflateError, NoInflater, ZipError};

struct Member<'a> {
    name: &'a str,
    method: u16,
    payload: Vec<u8>,
    uncompressed_size: u32,
    crc: u32,
}

impl<'a> Member<'a> {
    fn stored(name: &'a str, data: &[u8]) -> Self {
        Self {
            name,
            method: 0,
            payload: data.to_vec(),
            uncompressed_size: data.len() as u32,
            crc: crc32fast::hash(data),
        }
    }

    fn deflated(name: &'a str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data).unwrap();
        Self {
            name,
            method: 8,
            payload: encoder.finish().unwrap(),
            uncompressed_size: data.len() as u32,
            crc: crc32fast::hash(data),
        }
    }
}

fn assemble(members: &[Member<'_>], comment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offsets = Vec::new();

    for m in members {
        offsets.push(out.len() as u32);
        out.extend_from_slice(&0x04034b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&m.method.to_le_bytes());
        out.extend_from_slice(&0x6000u16.to_le_bytes()); // 12:00:00
        out.extend_from_slice(&0x5821u16.to_le_bytes()); // 2024-01-01
        out.extend_from_slice(&m.crc.to_le_bytes());
        out.extend_from_slice(&(m.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&m.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(m.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra
        out.extend_from_slice(m.name.as_bytes());
        out.extend_from_slice(&m.payload);
    }

    let cd_offset = out.len() as u32;
    for (m, offset) in members.iter().zip(offsets) {
        out.extend_from_slice(&0x02014b50u32.to_le_bytes());
        out.extend_from_slice(&0x031eu16.to_le_bytes()); // made by unix 3.0
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&m.method.to_le_bytes());
        out.extend_from_slice(&0x6000u16.to_le_bytes());
        out.extend_from_slice(&0x5821u16.to_le_bytes());
        out.extend_from_slice(&m.crc.to_le_bytes());
        out.extend_from_slice(&(m.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&m.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(m.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra
        out.extend_from_slice(&0u16.to_le_bytes()); // comment
        out.extend_from_slice(&0u16.to_le_bytes()); // disk
        out.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        out.extend_from_slice(&0o100644u32.wrapping_shl(16).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(m.name.as_bytes());
    }
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(&0x06054b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(members.len() as u16).to_le_bytes());
    out.extend_from_slice(&(members.len() as u16).to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    out.extend_from_slice(comment);
    out
}

fn sample_text() -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog\n".repeat(40)
}

#[test]
fn deflate_entry_with_injected_decoder() {
    let text = sample_text();
    let data = assemble(&[Member::deflated("fox.txt", &text)], b"");
    let archive = Archive::open(&data).unwrap();
    let entry = archive.find("fox.txt").unwrap();
    assert_eq!(entry.compression_method, CompressionMethod::Deflate);
    assert!(entry.compressed_size < entry.uncompressed_size);

    let mut decoder = |input: &[u8], output: &mut [u8]| -> Result<usize, InflateError> {
        let mut inflater = flate2::Decompress::new(false);
        inflater
            .decompress(input, output, flate2::FlushDecompress::Finish)
            .map_err(|_| InflateError::Failed("bad stream"))?;
        Ok(inflater.total_out() as usize)
    };

    let mut out = vec![0u8; text.len()];
    let n = archive.extract_with(&entry, &mut out, &mut decoder).unwrap();
    assert_eq!(n, text.len());
    assert_eq!(out, text);
}

#[test]
fn deflate_entry_without_backend() {
    let data = assemble(&[Member::deflated("fox.txt", &sample_text())], b"");
    let archive = Archive::open(&data).unwrap();
    let entry = archive.find("fox.txt").unwrap();

    let mut out = vec![0u8; entry.uncompressed_size as usize];
    assert_eq!(
        archive.extract_with(&entry, &mut out, &mut NoInflater),
        Err(ZipError::Unsupported(8))
    );
}

#[cfg(feature = "deflate")]
#[test]
fn deflate_entry_with_default_backend() {
    let text = sample_text();
    let data = assemble(
        &[
            Member::stored("readme", b"plain"),
            Member::deflated("fox.txt", &text),
        ],
        b"",
    );
    let archive = Archive::open(&data).unwrap();
    let mut out = vec![0u8; text.len()];

    for entry in archive.entries() {
        let entry = entry.unwrap();
        let n = archive.extract_verified(&entry, &mut out).unwrap();
        let expected: &[u8] = match entry.name {
            b"readme" => b"plain",
            b"fox.txt" => &text,
            other => panic!("unexpected entry {other:?}"),
        };
        assert_eq!(&out[..n], expected);
    }
}

fn decoy_comment(filler: u8, tail: &[u8]) -> Vec<u8> {
    let mut comment = b"see ".to_vec();
    comment.extend_from_slice(&0x06054b50u32.to_le_bytes());
    comment.extend_from_slice(&[filler; 18]);
    comment.extend_from_slice(tail);
    comment
}

#[test]
fn decoy_end_record_in_comment() {
    let comments = [
        decoy_comment(0xff, b""),
        decoy_comment(0x00, b""),
        decoy_comment(0x00, b" trailing text"),
    ];

    for comment in &comments {
        let data = assemble(&[Member::stored("a.txt", b"hi")], comment);
        let archive = Archive::open(&data).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.comment(), comment.as_slice());

        let entry = archive.find("a.txt").unwrap();
        let mut out = [0u8; 2];
        archive.extract(&entry, &mut out).unwrap();
        assert_eq!(&out, b"hi");
    }
}

#[test]
fn broken_trailer_with_nested_archive() {
    let inner = assemble(&[Member::stored("inner.txt", b"x")], b"");
    let mut outer = assemble(
        &[
            Member::stored("a.txt", b"hi"),
            Member::stored("nested.zip", &inner),
        ],
        b"",
    );
    assert_eq!(Archive::open(&outer).unwrap().len(), 2);

    let eocd = outer.len() - 22;
    let bogus = outer.len() as u32;
    outer[eocd + 16..eocd + 20].copy_from_slice(&bogus.to_le_bytes());
    assert!(matches!(
        Archive::open(&outer),
        Err(ZipError::FormatInvalid(_))
    ));
}

#[test]
fn central_directory_offset_past_end() {
    let mut data = assemble(&[Member::stored("a.txt", b"hi")], b"");
    let eocd = data.len() - 22;
    let bogus = data.len() as u32;
    data[eocd + 16..eocd + 20].copy_from_slice(&bogus.to_le_bytes());

    assert!(matches!(
        Archive::open(&data),
        Err(ZipError::FormatInvalid(_))
    ));
}

#[test]
fn local_header_offset_past_end() {
    let mut data = assemble(&[Member::stored("a.txt", b"hi")], b"");
    let cd = Archive::open(&data).unwrap().central_directory_offset() as usize;
    data[cd + 42..cd + 46].copy_from_slice(&0x00ff_ffffu32.to_le_bytes());

    let archive = Archive::open(&data).unwrap();
    let entry = archive.find("a.txt").unwrap();
    let mut out = [0u8; 2];
    assert!(matches!(
        archive.extract(&entry, &mut out),
        Err(ZipError::FormatInvalid(_))
    ));
}

#[test]
fn not_an_archive() {
    assert!(matches!(
        Archive::open(b"PK\x03\x04 definitely not a zip file"),
        Err(ZipError::FormatInvalid(_))
    ));
    assert!(matches!(Archive::open(&[]), Err(ZipError::FormatInvalid(_))));
}

#[test]
fn timestamps_from_foreign_writer() {
    let data = assemble(&[Member::stored("a.txt", b"hi")], b"");
    let archive = Archive::open(&data).unwrap();
    let entry = archive.find("a.txt").unwrap();
    assert_eq!(entry.mod_date(), (2024, 1, 1));
    assert_eq!(entry.mod_time(), (12, 0, 0));
}
