use crate::domain::flags::BTRFS_FEATURE_INCOMPAT_METADATA_UUID;
use crate::utils::error::{Result, SbError};
use binrw::{io::Cursor, BinRead, BinReaderExt, BinWrite, BinWriterExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const BTRFS_SUPER_POS: u64 = 0x10000;
pub const BTRFS_SUPER_INFO_SIZE: usize = 4096;
pub const BTRFS_CSUM_SIZE: usize = 32;
pub const BTRFS_LABEL_SIZE: usize = 256;
pub const BTRFS_UUID_SIZE: usize = 16;
pub const BTRFS_FSID_SIZE: usize = 16;
pub const BTRFS_SYSTEM_CHUNK_ARRAY_SIZE: usize = 2048;
pub const BTRFS_NUM_BACKUP_ROOTS: usize = 4;
pub const BTRFS_MAGIC: [u8; 8] = *b"_BHRfS_M";
pub const BTRFS_SUPER_MIRROR_MAX: u32 = 3;
pub const BTRFS_SUPER_MIRROR_SHIFT: u32 = 12;

/// Btrfs Superblock
///
/// Layout follows `struct btrfs_super_block` in btrfs-progs `kernel-shared/uapi/btrfs_tree.h`.
#[derive(BinRead, BinWrite, Clone, Copy, Debug)]
#[brw(little)]
pub struct Superblock {
    pub csum: [u8; BTRFS_CSUM_SIZE],
    pub fsid: [u8; BTRFS_FSID_SIZE],
    /// Physical address of this copy, differs between mirrors.
    pub bytenr: u64,
    pub flags: u64,
    pub magic: [u8; 8],
    pub generation: u64,
    pub root: u64,
    pub chunk_root: u64,
    pub log_root: u64,
    pub log_root_transid: u64,
    pub total_bytes: u64,
    pub bytes_used: u64,
    pub root_dir_objectid: u64,
    pub num_devices: u64,
    pub sectorsize: u32,
    pub nodesize: u32,
    unused_leafsize: u32,
    pub stripesize: u32,
    pub sys_chunk_array_size: u32,
    pub chunk_root_generation: u64,
    pub compat_flags: u64,
    pub compat_ro_flags: u64,
    pub incompat_flags: u64,
    pub csum_type: u16,
    pub root_level: u8,
    pub chunk_root_level: u8,
    pub log_root_level: u8,
    pub dev_item: DevItem,
    pub label: [u8; BTRFS_LABEL_SIZE],
    pub cache_generation: u64,
    pub uuid_tree_generation: u64,
    pub metadata_uuid: [u8; BTRFS_FSID_SIZE],
    pub nr_global_roots: u64,
    pub block_group_root: u64,
    pub block_group_root_generation: u64,
    pub block_group_root_level: u8,
    reserved8: [u8; 7],
    reserved: [u64; 24],
    pub sys_chunk_array: [u8; BTRFS_SYSTEM_CHUNK_ARRAY_SIZE],
    pub super_roots: [RootBackup; BTRFS_NUM_BACKUP_ROOTS],
    padding: [u8; 565],
}

impl Superblock {
    /// Decode one on-disk copy. The buffer must be exactly one superblock long.
    pub fn from_bytes(buf: &[u8]) -> Result<Superblock> {
        if buf.len() != BTRFS_SUPER_INFO_SIZE {
            return Err(SbError::SizeMismatch {
                expected: BTRFS_SUPER_INFO_SIZE,
                actual: buf.len(),
            });
        }

        let mut reader = Cursor::new(buf);
        let sb: Superblock = reader.read_le()?;
        Ok(sb)
    }

    pub fn to_bytes(&self) -> Result<[u8; BTRFS_SUPER_INFO_SIZE]> {
        let mut writer = Cursor::new(Vec::with_capacity(BTRFS_SUPER_INFO_SIZE));
        writer.write_le(self)?;

        <[u8; BTRFS_SUPER_INFO_SIZE]>::try_from(writer.into_inner()).map_err(|v| {
            SbError::SizeMismatch {
                expected: BTRFS_SUPER_INFO_SIZE,
                actual: v.len(),
            }
        })
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic == BTRFS_MAGIC
    }

    pub fn csum_type(&self) -> Result<CsumType> {
        CsumType::try_from(self.csum_type)
    }

    /// Stored CRC32C value, only meaningful for CRC32 filesystems.
    pub fn crc32(&self) -> Result<u32> {
        let csum_type = self.csum_type()?;
        if csum_type != CsumType::Crc32 {
            return Err(SbError::CsumTypeMismatch {
                expected: CsumType::Crc32,
                actual: csum_type,
            });
        }
        let mut crc_value = [0u8; 4];
        crc_value.copy_from_slice(&self.csum[..4]);
        Ok(u32::from_le_bytes(crc_value))
    }

    pub fn label(&self) -> String {
        let end = self
            .label
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(BTRFS_LABEL_SIZE);
        String::from_utf8_lossy(&self.label[..end]).into_owned()
    }

    pub fn set_label(&mut self, label: &str) -> Result<()> {
        crate::utils::validation::validate_label("label", label)?;
        self.label = [0u8; BTRFS_LABEL_SIZE];
        self.label[..label.len()].copy_from_slice(label.as_bytes());
        Ok(())
    }

    pub fn fsid(&self) -> Uuid {
        Uuid::from_bytes(self.fsid)
    }

    pub fn has_metadata_uuid(&self) -> bool {
        self.incompat_flags & BTRFS_FEATURE_INCOMPAT_METADATA_UUID != 0
    }

    /// The uuid stamped into tree block headers: `metadata_uuid` when the
    /// METADATA_UUID feature is on, the fsid otherwise.
    pub fn metadata_uuid(&self) -> Uuid {
        if self.has_metadata_uuid() {
            Uuid::from_bytes(self.metadata_uuid)
        } else {
            self.fsid()
        }
    }

    pub fn backup_roots(&self) -> &[RootBackup; BTRFS_NUM_BACKUP_ROOTS] {
        &self.super_roots
    }
}

/// Checksum algorithms, numbered as in `enum btrfs_csum_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsumType {
    Crc32 = 0,
    Xxhash = 1,
    Sha256 = 2,
    Blake2 = 3,
}

impl CsumType {
    pub fn name(self) -> &'static str {
        match self {
            CsumType::Crc32 => "crc32c",
            CsumType::Xxhash => "xxhash64",
            CsumType::Sha256 => "sha256",
            CsumType::Blake2 => "blake2b",
        }
    }

    /// Number of meaningful bytes at the start of the 32 byte csum field.
    pub fn size(self) -> usize {
        match self {
            CsumType::Crc32 => 4,
            CsumType::Xxhash => 8,
            CsumType::Sha256 | CsumType::Blake2 => 32,
        }
    }
}

impl TryFrom<u16> for CsumType {
    type Error = SbError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(CsumType::Crc32),
            1 => Ok(CsumType::Xxhash),
            2 => Ok(CsumType::Sha256),
            3 => Ok(CsumType::Blake2),
            other => Err(SbError::UnsupportedCsumType(other)),
        }
    }
}

impl std::fmt::Display for CsumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Dev Item, the `btrfs_dev_item` of the device this copy was read from.
#[derive(BinRead, BinWrite, Clone, Copy, Debug, PartialEq, Eq)]
#[brw(little)]
pub struct DevItem {
    pub devid: u64,
    pub total_bytes: u64,
    pub bytes_used: u64,
    pub io_align: u32,
    pub io_width: u32,
    pub sector_size: u32,
    pub item_type: u64,
    pub generation: u64,
    pub start_offset: u64,
    pub dev_group: u32,
    pub seek_speed: u8,
    pub bandwidth: u8,
    pub uuid: [u8; BTRFS_UUID_SIZE],
    pub fsid: [u8; BTRFS_FSID_SIZE],
}

impl DevItem {
    pub fn uuid(&self) -> Uuid {
        Uuid::from_bytes(self.uuid)
    }

    pub fn fsid(&self) -> Uuid {
        Uuid::from_bytes(self.fsid)
    }
}

/// One of the rotating tree root backups kept in the superblock.
#[derive(BinRead, BinWrite, Clone, Copy, Debug, PartialEq, Eq)]
#[brw(little)]
pub struct RootBackup {
    pub tree_root: u64,
    pub tree_root_gen: u64,

    pub chunk_root: u64,
    pub chunk_root_gen: u64,

    pub extent_root: u64,
    pub extent_root_gen: u64,

    pub fs_root: u64,
    pub fs_root_gen: u64,

    pub dev_root: u64,
    pub dev_root_gen: u64,

    pub csum_root: u64,
    pub csum_root_gen: u64,

    pub total_bytes: u64,
    pub bytes_used: u64,
    pub num_devices: u64,
    unused_64: [u64; 4],

    pub tree_root_level: u8,
    pub chunk_root_level: u8,
    pub extent_root_level: u8,
    pub fs_root_level: u8,
    pub dev_root_level: u8,
    pub csum_root_level: u8,
    unused_8: [u8; 10],
}

impl RootBackup {
    /// Slots that were never written by the kernel stay zeroed.
    pub fn is_empty(&self) -> bool {
        self.tree_root == 0 && self.tree_root_gen == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Superblock {
        Superblock::from_bytes(&[0u8; BTRFS_SUPER_INFO_SIZE]).unwrap()
    }

    #[test]
    fn test_encoded_size_is_one_block() {
        let b = blank().to_bytes().unwrap();
        assert_eq!(b.len(), BTRFS_SUPER_INFO_SIZE);
    }

    #[test]
    fn test_field_offsets_match_disk_layout() {
        let mut sb = blank();
        sb.magic = BTRFS_MAGIC;
        sb.generation = 0x1122_3344_5566_7788;
        sb.csum_type = 2;
        sb.dev_item.devid = 7;
        sb.label[0] = b'x';
        sb.super_roots[0].tree_root = 0xdead_beef;

        let b = sb.to_bytes().unwrap();
        assert_eq!(&b[0x40..0x48], b"_BHRfS_M");
        assert_eq!(&b[0x48..0x50], &0x1122_3344_5566_7788u64.to_le_bytes());
        assert_eq!(&b[0xc4..0xc6], &2u16.to_le_bytes());
        assert_eq!(&b[0xc9..0xd1], &7u64.to_le_bytes());
        assert_eq!(b[0x12b], b'x');
        assert_eq!(&b[0xb2b..0xb33], &0xdead_beefu64.to_le_bytes());
    }

    #[test]
    fn test_from_bytes_rejects_short_buffer() {
        let err = Superblock::from_bytes(&[0u8; 100]).unwrap_err();
        assert!(matches!(
            err,
            SbError::SizeMismatch {
                expected: BTRFS_SUPER_INFO_SIZE,
                actual: 100
            }
        ));
    }

    #[test]
    fn test_csum_type_decoding() {
        let mut sb = blank();
        for (raw, expected) in [
            (0, CsumType::Crc32),
            (1, CsumType::Xxhash),
            (2, CsumType::Sha256),
            (3, CsumType::Blake2),
        ] {
            sb.csum_type = raw;
            assert_eq!(sb.csum_type().unwrap(), expected);
        }

        sb.csum_type = 9;
        assert!(matches!(sb.csum_type(), Err(SbError::UnsupportedCsumType(9))));
    }

    #[test]
    fn test_crc32_requires_crc32_type() {
        let mut sb = blank();
        sb.csum[..4].copy_from_slice(&0xaabb_ccddu32.to_le_bytes());
        assert_eq!(sb.crc32().unwrap(), 0xaabb_ccdd);

        sb.csum_type = 2;
        assert!(matches!(sb.crc32(), Err(SbError::CsumTypeMismatch { .. })));
    }

    #[test]
    fn test_label_round_trip() {
        let mut sb = blank();
        assert_eq!(sb.label(), "");
        sb.set_label("backup-pool").unwrap();
        assert_eq!(sb.label(), "backup-pool");
        sb.set_label("x").unwrap();
        assert_eq!(sb.label(), "x");
        assert!(sb.set_label(&"y".repeat(300)).is_err());
        assert_eq!(sb.label(), "x");
    }

    #[test]
    fn test_metadata_uuid_falls_back_to_fsid() {
        let mut sb = blank();
        sb.fsid = [1u8; 16];
        sb.metadata_uuid = [2u8; 16];
        assert_eq!(sb.metadata_uuid(), Uuid::from_bytes([1u8; 16]));

        sb.incompat_flags |= BTRFS_FEATURE_INCOMPAT_METADATA_UUID;
        assert_eq!(sb.metadata_uuid(), Uuid::from_bytes([2u8; 16]));
    }
}
