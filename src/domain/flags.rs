// Bit definitions from btrfs-progs kernel-shared/uapi/btrfs.h and btrfs_tree.h.

pub const BTRFS_HEADER_FLAG_WRITTEN: u64 = 1 << 0;
pub const BTRFS_HEADER_FLAG_RELOC: u64 = 1 << 1;
pub const BTRFS_SUPER_FLAG_ERROR: u64 = 1 << 2;
pub const BTRFS_SUPER_FLAG_SEEDING: u64 = 1 << 32;
pub const BTRFS_SUPER_FLAG_METADUMP: u64 = 1 << 33;
pub const BTRFS_SUPER_FLAG_METADUMP_V2: u64 = 1 << 34;
pub const BTRFS_SUPER_FLAG_CHANGING_FSID: u64 = 1 << 35;
pub const BTRFS_SUPER_FLAG_CHANGING_FSID_V2: u64 = 1 << 36;

pub const BTRFS_FEATURE_COMPAT_RO_FREE_SPACE_TREE: u64 = 1 << 0;
pub const BTRFS_FEATURE_COMPAT_RO_FREE_SPACE_TREE_VALID: u64 = 1 << 1;
pub const BTRFS_FEATURE_COMPAT_RO_VERITY: u64 = 1 << 2;
pub const BTRFS_FEATURE_COMPAT_RO_BLOCK_GROUP_TREE: u64 = 1 << 3;

pub const BTRFS_FEATURE_INCOMPAT_MIXED_BACKREF: u64 = 1 << 0;
pub const BTRFS_FEATURE_INCOMPAT_DEFAULT_SUBVOL: u64 = 1 << 1;
pub const BTRFS_FEATURE_INCOMPAT_MIXED_GROUPS: u64 = 1 << 2;
pub const BTRFS_FEATURE_INCOMPAT_COMPRESS_LZO: u64 = 1 << 3;
pub const BTRFS_FEATURE_INCOMPAT_COMPRESS_ZSTD: u64 = 1 << 4;
pub const BTRFS_FEATURE_INCOMPAT_BIG_METADATA: u64 = 1 << 5;
pub const BTRFS_FEATURE_INCOMPAT_EXTENDED_IREF: u64 = 1 << 6;
pub const BTRFS_FEATURE_INCOMPAT_RAID56: u64 = 1 << 7;
pub const BTRFS_FEATURE_INCOMPAT_SKINNY_METADATA: u64 = 1 << 8;
pub const BTRFS_FEATURE_INCOMPAT_NO_HOLES: u64 = 1 << 9;
pub const BTRFS_FEATURE_INCOMPAT_METADATA_UUID: u64 = 1 << 10;
pub const BTRFS_FEATURE_INCOMPAT_RAID1C34: u64 = 1 << 11;
pub const BTRFS_FEATURE_INCOMPAT_ZONED: u64 = 1 << 12;
pub const BTRFS_FEATURE_INCOMPAT_EXTENT_TREE_V2: u64 = 1 << 13;

const SUPER_FLAG_NAMES: &[(u64, &str)] = &[
    (BTRFS_HEADER_FLAG_WRITTEN, "WRITTEN"),
    (BTRFS_HEADER_FLAG_RELOC, "RELOC"),
    (BTRFS_SUPER_FLAG_ERROR, "ERROR"),
    (BTRFS_SUPER_FLAG_SEEDING, "SEEDING"),
    (BTRFS_SUPER_FLAG_METADUMP, "METADUMP"),
    (BTRFS_SUPER_FLAG_METADUMP_V2, "METADUMP_V2"),
    (BTRFS_SUPER_FLAG_CHANGING_FSID, "CHANGING_FSID"),
    (BTRFS_SUPER_FLAG_CHANGING_FSID_V2, "CHANGING_FSID_V2"),
];

const COMPAT_RO_NAMES: &[(u64, &str)] = &[
    (BTRFS_FEATURE_COMPAT_RO_FREE_SPACE_TREE, "FREE_SPACE_TREE"),
    (BTRFS_FEATURE_COMPAT_RO_FREE_SPACE_TREE_VALID, "FREE_SPACE_TREE_VALID"),
    (BTRFS_FEATURE_COMPAT_RO_VERITY, "VERITY"),
    (BTRFS_FEATURE_COMPAT_RO_BLOCK_GROUP_TREE, "BLOCK_GROUP_TREE"),
];

const INCOMPAT_NAMES: &[(u64, &str)] = &[
    (BTRFS_FEATURE_INCOMPAT_MIXED_BACKREF, "MIXED_BACKREF"),
    (BTRFS_FEATURE_INCOMPAT_DEFAULT_SUBVOL, "DEFAULT_SUBVOL"),
    (BTRFS_FEATURE_INCOMPAT_MIXED_GROUPS, "MIXED_GROUPS"),
    (BTRFS_FEATURE_INCOMPAT_COMPRESS_LZO, "COMPRESS_LZO"),
    (BTRFS_FEATURE_INCOMPAT_COMPRESS_ZSTD, "COMPRESS_ZSTD"),
    (BTRFS_FEATURE_INCOMPAT_BIG_METADATA, "BIG_METADATA"),
    (BTRFS_FEATURE_INCOMPAT_EXTENDED_IREF, "EXTENDED_IREF"),
    (BTRFS_FEATURE_INCOMPAT_RAID56, "RAID56"),
    (BTRFS_FEATURE_INCOMPAT_SKINNY_METADATA, "SKINNY_METADATA"),
    (BTRFS_FEATURE_INCOMPAT_NO_HOLES, "NO_HOLES"),
    (BTRFS_FEATURE_INCOMPAT_METADATA_UUID, "METADATA_UUID"),
    (BTRFS_FEATURE_INCOMPAT_RAID1C34, "RAID1C34"),
    (BTRFS_FEATURE_INCOMPAT_ZONED, "ZONED"),
    (BTRFS_FEATURE_INCOMPAT_EXTENT_TREE_V2, "EXTENT_TREE_V2"),
];

fn decode(value: u64, table: &[(u64, &str)]) -> Vec<String> {
    let mut names = Vec::new();
    let mut known = 0u64;

    for &(bit, name) in table {
        known |= bit;
        if value & bit != 0 {
            names.push(name.to_string());
        }
    }

    let unknown = value & !known;
    if unknown != 0 {
        names.push(format!("unknown({:#x})", unknown));
    }

    names
}

pub fn describe_super_flags(flags: u64) -> Vec<String> {
    decode(flags, SUPER_FLAG_NAMES)
}

pub fn describe_compat_ro_flags(flags: u64) -> Vec<String> {
    decode(flags, COMPAT_RO_NAMES)
}

pub fn describe_incompat_flags(flags: u64) -> Vec<String> {
    decode(flags, INCOMPAT_NAMES)
}
