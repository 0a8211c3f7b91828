//! Structural checks on a decoded superblock, modelled on the kernel's
//! `btrfs_validate_super`. They never touch the device.

use crate::domain::model::{Superblock, BTRFS_SYSTEM_CHUNK_ARRAY_SIZE};
use serde::Serialize;

const MIN_SECTORSIZE: u32 = 4096;
const MAX_BLOCKSIZE: u32 = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub field: &'static str,
    pub message: String,
}

impl Issue {
    fn error(field: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message,
        }
    }

    fn warning(field: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            field,
            message,
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", level, self.field, self.message)
    }
}

pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

pub fn check(sb: &Superblock, expected_bytenr: u64) -> Vec<Issue> {
    let mut issues = Vec::new();

    if !sb.has_valid_magic() {
        issues.push(Issue::error(
            "magic",
            format!("expected _BHRfS_M, found {:02x?}", sb.magic),
        ));
        // Nothing else is trustworthy without the magic.
        return issues;
    }

    if sb.bytenr != expected_bytenr {
        issues.push(Issue::error(
            "bytenr",
            format!("{:#x} does not match the copy location {:#x}", sb.bytenr, expected_bytenr),
        ));
    }

    if let Err(e) = sb.csum_type() {
        issues.push(Issue::error("csum_type", e.to_string()));
    }

    let sectorsize = sb.sectorsize;
    let sectorsize_ok = sectorsize.is_power_of_two()
        && (MIN_SECTORSIZE..=MAX_BLOCKSIZE).contains(&sectorsize);
    if !sectorsize_ok {
        issues.push(Issue::error(
            "sectorsize",
            format!("{} is not a power of two in [{}, {}]", sectorsize, MIN_SECTORSIZE, MAX_BLOCKSIZE),
        ));
    }

    let nodesize = sb.nodesize;
    if !nodesize.is_power_of_two() || nodesize < sectorsize || nodesize > MAX_BLOCKSIZE {
        issues.push(Issue::error(
            "nodesize",
            format!(
                "{} must be a power of two between sectorsize ({}) and {}",
                nodesize, sectorsize, MAX_BLOCKSIZE
            ),
        ));
    }

    if sb.stripesize != sectorsize {
        issues.push(Issue::error(
            "stripesize",
            format!("{} differs from sectorsize {}", sb.stripesize, sectorsize),
        ));
    }

    if sb.sys_chunk_array_size as usize > BTRFS_SYSTEM_CHUNK_ARRAY_SIZE {
        issues.push(Issue::error(
            "sys_chunk_array_size",
            format!("{} exceeds {}", sb.sys_chunk_array_size, BTRFS_SYSTEM_CHUNK_ARRAY_SIZE),
        ));
    }

    if sectorsize_ok {
        let align = u64::from(sectorsize);
        for (field, value) in [("root", sb.root), ("chunk_root", sb.chunk_root), ("log_root", sb.log_root)] {
            if value % align != 0 {
                issues.push(Issue::error(
                    field,
                    format!("{:#x} is not aligned to sectorsize {}", value, sectorsize),
                ));
            }
        }
    }

    if sb.num_devices == 0 {
        issues.push(Issue::error("num_devices", "must be at least 1".to_string()));
    }

    if sb.bytes_used > sb.total_bytes {
        issues.push(Issue::warning(
            "bytes_used",
            format!("{} exceeds total_bytes {}", sb.bytes_used, sb.total_bytes),
        ));
    }

    if !sb.has_metadata_uuid() && sb.metadata_uuid != [0u8; 16] && sb.metadata_uuid != sb.fsid {
        issues.push(Issue::warning(
            "metadata_uuid",
            "set on disk but METADATA_UUID feature is off, it will be ignored".to_string(),
        ));
    }

    if sb.dev_item.fsid() != sb.metadata_uuid() {
        issues.push(Issue::error(
            "dev_item.fsid",
            format!(
                "{} does not match metadata uuid {}",
                sb.dev_item.fsid(),
                sb.metadata_uuid()
            ),
        ));
    }

    issues
}
