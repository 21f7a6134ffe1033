//! Image detection by leading-byte signature.
//!
//! Files are classified by content rather than extension, so `holiday.JPG`,
//! an extension-less download and a PNG saved as `.dat` are all picked up.
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

const SIGNATURES: [(ImageKind, &[u8]); 4] = [
    (ImageKind::Jpeg, &[0xFF, 0xD8, 0xFF]),
    (
        ImageKind::Png,
        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
    ),
    (ImageKind::Gif, &[0x47, 0x49, 0x46]),
    (ImageKind::Bmp, &[0x42, 0x4D]),
];

/// Longest signature in the table.
pub const MAX_SIGNATURE_LEN: usize = 8;

/// Matches `header` against the signature table.
pub fn sniff(header: &[u8]) -> Option<ImageKind> {
    SIGNATURES
        .iter()
        .find(|(_, sig)| header.starts_with(sig))
        .map(|(kind, _)| *kind)
}

/// Reads the first bytes of `path` and classifies them.
pub fn sniff_file(path: &Path) -> io::Result<Option<ImageKind>> {
    let mut header = Vec::with_capacity(MAX_SIGNATURE_LEN);
    File::open(path)?
        .take(MAX_SIGNATURE_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(sniff(&header))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_signatures() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(
            sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some(ImageKind::Png)
        );
        assert_eq!(sniff(b"GIF89a"), Some(ImageKind::Gif));
        assert_eq!(sniff(b"BM\x00\x00"), Some(ImageKind::Bmp));
    }

    #[test]
    fn truncated_or_foreign_headers() {
        assert_eq!(sniff(&[0x89, b'P', b'N', b'G']), None);
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(b"%PDF-1.7"), None);
        assert_eq!(sniff(b"B"), None);
    }

    #[test]
    fn sniff_file_reads_only_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("noext");
        std::fs::write(&png, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3]).unwrap();
        assert_eq!(sniff_file(&png).unwrap(), Some(ImageKind::Png));
        let txt = dir.path().join("notes.jpg");
        std::fs::write(&txt, "hello").unwrap();
        assert_eq!(sniff_file(&txt).unwrap(), None);
    }
}
