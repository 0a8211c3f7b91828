use crate::domain::model::{CsumType, Superblock, BTRFS_CSUM_SIZE, BTRFS_SUPER_INFO_SIZE};
use crate::utils::error::Result;
use blake2::{digest::consts::U32, Blake2b, Digest};
use serde::Serialize;
use sha2::Sha256;

type Blake2b256 = Blake2b<U32>;

/// Checksum `data` the way btrfs fills a 32 byte csum field: the digest
/// first, little-endian for the integer hashes, zero padded.
pub fn checksum(csum_type: CsumType, data: &[u8]) -> [u8; BTRFS_CSUM_SIZE] {
    let mut out = [0u8; BTRFS_CSUM_SIZE];
    match csum_type {
        CsumType::Crc32 => out[..4].copy_from_slice(&crc32c::crc32c(data).to_le_bytes()),
        CsumType::Xxhash => {
            out[..8].copy_from_slice(&xxhash_rust::xxh64::xxh64(data, 0).to_le_bytes())
        }
        CsumType::Sha256 => out.copy_from_slice(&Sha256::digest(data)),
        CsumType::Blake2 => out.copy_from_slice(&Blake2b256::digest(data)),
    }
    out
}

/// The checksum covers everything after the csum field itself.
pub fn compute_superblock_csum(
    raw: &[u8; BTRFS_SUPER_INFO_SIZE],
    csum_type: CsumType,
) -> [u8; BTRFS_CSUM_SIZE] {
    checksum(csum_type, &raw[BTRFS_CSUM_SIZE..])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsumStatus {
    pub csum_type: CsumType,
    pub stored: String,
    pub computed: String,
    pub matches: bool,
}

pub fn verify(sb: &Superblock) -> Result<CsumStatus> {
    let csum_type = sb.csum_type()?;
    let raw = sb.to_bytes()?;
    let computed = compute_superblock_csum(&raw, csum_type);
    let size = csum_type.size();

    Ok(CsumStatus {
        csum_type,
        stored: hex(&sb.csum[..size]),
        computed: hex(&computed[..size]),
        matches: sb.csum[..size] == computed[..size],
    })
}

impl Superblock {
    /// Recompute and store the checksum, returning the new value.
    pub fn update_checksum(&mut self) -> Result<[u8; BTRFS_CSUM_SIZE]> {
        let csum_type = self.csum_type()?;
        let raw = self.to_bytes()?;
        self.csum = compute_superblock_csum(&raw, csum_type);
        Ok(self.csum)
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::BTRFS_MAGIC;

    fn sample() -> Superblock {
        let mut sb = Superblock::from_bytes(&[0u8; BTRFS_SUPER_INFO_SIZE]).unwrap();
        sb.magic = BTRFS_MAGIC;
        sb.generation = 42;
        sb
    }

    #[test]
    fn test_known_digests() {
        // CRC32C("123456789") = 0xe3069283
        assert_eq!(&checksum(CsumType::Crc32, b"123456789")[..4], &0xe306_9283u32.to_le_bytes());
        assert_eq!(&checksum(CsumType::Crc32, b"123456789")[4..], &[0u8; 28]);
        // XXH64("", 0) = 0xef46db3751d8e999
        assert_eq!(&checksum(CsumType::Xxhash, b"")[..8], &0xef46_db37_51d8_e999u64.to_le_bytes());
        assert_eq!(
            hex(&checksum(CsumType::Sha256, b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_update_then_verify_for_every_algorithm() {
        for csum_type in [CsumType::Crc32, CsumType::Xxhash, CsumType::Sha256, CsumType::Blake2] {
            let mut sb = sample();
            sb.csum_type = csum_type as u16;

            assert!(!verify(&sb).unwrap().matches);
            sb.update_checksum().unwrap();

            let status = verify(&sb).unwrap();
            assert!(status.matches, "{:?} should verify", csum_type);
            assert_eq!(status.csum_type, csum_type);
            assert_eq!(status.stored.len(), csum_type.size() * 2);
        }
    }

    #[test]
    fn test_crc32_matches_checksummed_region() {
        let mut sb = sample();
        sb.update_checksum().unwrap();
        let b = sb.to_bytes().unwrap();
        assert_eq!(sb.crc32().unwrap(), crc32c::crc32c(&b[32..]));
    }

    #[test]
    fn test_any_field_change_breaks_checksum() {
        let mut sb = sample();
        sb.update_checksum().unwrap();
        sb.generation += 1;
        let status = verify(&sb).unwrap();
        assert!(!status.matches);
        assert_ne!(status.stored, status.computed);
    }
}
