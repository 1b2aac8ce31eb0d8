//! Forced consumption of extracted bytes for benchmark mode.
//!
//! The byte sum is never compared against anything: it only exists so the
//! read cannot be optimized away, making benchmark timings include real
//! allocation and memory traffic. It is not an integrity check.

use std::path::Path;

use ppc_core::PpcResult;

/// Wrapping sum of every byte in `buf`.
pub fn byte_sum(buf: &[u8]) -> u64 {
    buf.iter().fold(0u64, |acc, &b| acc.wrapping_add(u64::from(b)))
}

/// Read `path` fully, checksum it, and discard both; returns bytes read.
pub fn consume_file(path: &Path) -> PpcResult<u64> {
    let buf = std::fs::read(path)?;
    std::hint::black_box(byte_sum(std::hint::black_box(&buf)));
    Ok(buf.len() as u64)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn byte_sum_adds_bytes() {
        assert_eq!(byte_sum(b""), 0);
        assert_eq!(byte_sum(&[1, 2, 3, 250]), 256);
    }

    #[test]
    fn consume_reports_length() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("f");
        std::fs::write(&p, vec![7u8; 4096]).unwrap();
        assert_eq!(consume_file(&p).unwrap(), 4096);
    }

    proptest! {
        #[test]
        fn byte_sum_splits_over_concatenation(
            a in proptest::collection::vec(any::<u8>(), 0..512),
            b in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let joined: Vec<u8> = a.iter().chain(b.iter()).copied().collect();
            prop_assert_eq!(byte_sum(&joined), byte_sum(&a).wrapping_add(byte_sum(&b)));
        }
    }
}
