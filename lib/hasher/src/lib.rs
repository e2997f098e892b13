use std::io::Read;

use recon_model::Digests;
use sha1::{Digest as _, Sha1};

/// Digest names match what the cloud collaborator reports on a `DriveItem`'s
/// `file.hashes` facet, so `compare_by_content_hash` can line digests up by
/// name without either side knowing how the other computed them.
pub const SHA1_HASH: &str = "sha1Hash";
pub const CRC32_HASH: &str = "crc32Hash";

const CHUNK: usize = 64 * 1024;

/// Hashes a byte stream with every algorithm the cloud is known to report,
/// in a single pass over the bytes.
pub fn hash_stream<T: Read>(mut stream: T) -> std::io::Result<Digests> {
    let mut sha1 = Sha1::new();
    let mut crc32 = crc32fast::Hasher::new();
    let mut buf = [0u8; CHUNK];
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sha1.update(&buf[..n]);
        crc32.update(&buf[..n]);
    }
    let mut digests = Digests::new();
    digests.insert(SHA1_HASH.to_string(), format!("{:X}", sha1.finalize()));
    digests.insert(CRC32_HASH.to_string(), crc32_hex(crc32.finalize()));
    Ok(digests)
}

/// Hashes anything already in memory (test fixtures, mostly; real files go
/// through `hash_stream` so large content never has to be buffered whole).
pub fn hash_bytes<T: AsRef<[u8]>>(bytes: T) -> Digests {
    hash_stream(std::io::Cursor::new(bytes.as_ref())).expect("hashing in-memory bytes cannot fail")
}

/// The cloud reports `crc32Hash` as the little-endian bytes of the checksum,
/// hex-encoded uppercase, not the big-endian rendering of the integer value.
fn crc32_hex(crc: u32) -> String {
    crc.to_le_bytes().iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{hash_bytes, CRC32_HASH, SHA1_HASH};

    #[test]
    fn reports_both_known_algorithms() {
        let digests = hash_bytes("here is some random text");
        assert_eq!(digests.len(), 2);
        assert!(digests.contains_key(SHA1_HASH));
        assert!(digests.contains_key(CRC32_HASH));
    }

    #[test]
    fn is_deterministic() {
        let a = hash_bytes("boop beep boop bzzzz am robot executing tests");
        let b = hash_bytes("boop beep boop bzzzz am robot executing tests");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_inputs_hash_differently() {
        for _ in 0..200 {
            let a: [u8; 32] = rand::random();
            let b: [u8; 32] = rand::random();
            if a != b {
                assert_ne!(hash_bytes(a), hash_bytes(b));
            }
        }
    }

    #[test]
    fn empty_input_hashes_to_the_well_known_sha1_digest() {
        let digests = hash_bytes("");
        assert_eq!(
            digests.get(SHA1_HASH).map(String::as_str),
            Some("DA39A3EE5E6B4B0D3255BFEF95601890AFD80709")
        );
    }

    #[test]
    fn crc32_is_hex_encoded_little_endian() {
        assert_eq!(super::crc32_hex(0xCBF43926), "2639F4CB");
    }
}
