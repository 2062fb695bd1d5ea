//! Checksum utilities for file verification

use crate::error::Result;
use crate::types::ChecksumAlgorithm;
use sha2::{Digest, Sha256, Sha512};
use std::io::Read;
use std::path::Path;

const READ_BUFFER_SIZE: usize = 8192;

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute checksum for any readable source, returned as lowercase hex
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            for_each_chunk(reader, |chunk| context.consume(chunk))?;
            Ok(format!("{:x}", context.compute()))
        },
        ChecksumAlgorithm::Sha256 => digest_reader::<Sha256, _>(reader),
        ChecksumAlgorithm::Sha512 => digest_reader::<Sha512, _>(reader),
    }
}

/// Compare two hex digests, ignoring case and surrounding whitespace
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

fn digest_reader<D: Digest, R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = D::new();
    for_each_chunk(reader, |chunk| hasher.update(chunk))?;
    Ok(hex::encode(hasher.finalize()))
}

fn for_each_chunk<R: Read>(reader: &mut R, mut sink: impl FnMut(&[u8])) -> Result<()> {
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        sink(&buffer[..bytes_read]);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_compute_checksum_sha256() {
        let mut cursor = Cursor::new(b"hello world");
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(checksum, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_compute_checksum_sha512() {
        let mut cursor = Cursor::new(b"hello world");
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Sha512).unwrap();
        assert_eq!(
            checksum,
            "309ecc489c12d6eb4cc40f50c902f2b4d0ed77ee511a7c7a9bcd3ca86d4cd86f989dd35bc5ff499670da34255b45b0cfd830e81f605dcf7dc5542e93ae9cd76f"
        );
    }

    #[test]
    fn test_compute_checksum_md5() {
        let mut cursor = Cursor::new(b"hello world");
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Md5).unwrap();
        assert_eq!(checksum, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_compute_file_checksum_spans_buffers() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let data = vec![7u8; READ_BUFFER_SIZE * 3 + 17];
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();

        let from_file = compute_file_checksum(temp_file.path(), ChecksumAlgorithm::Sha256).unwrap();
        let from_memory =
            compute_checksum(&mut Cursor::new(&data), ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(from_file, from_memory);
    }

    #[test]
    fn test_digests_match_ignores_case() {
        assert!(digests_match("ABCDEF", "abcdef"));
        assert!(digests_match(" abcdef\n", "ABCDEF"));
        assert!(!digests_match("abcdef", "abcdee"));
    }
}
