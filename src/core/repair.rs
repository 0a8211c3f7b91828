use crate::core::checksum::{self, hex};
use crate::core::scanner::{mirror_offset, SuperblockScanner};
use crate::domain::model::{Superblock, BTRFS_SUPER_INFO_SIZE};
use crate::domain::ports::{BlockDevice, Storage};
use crate::utils::error::{Result, SbError};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MirrorWrite {
    pub mirror: u32,
    pub offset: u64,
    pub old_csum: String,
    pub new_csum: String,
    /// Name of the saved copy of the previous contents, if one was taken.
    pub backup: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub action: &'static str,
    pub dry_run: bool,
    pub writes: Vec<MirrorWrite>,
}

pub struct SuperblockRepairer<D: BlockDevice, S: Storage> {
    scanner: SuperblockScanner<D>,
    backups: Option<S>,
}

impl<D: BlockDevice, S: Storage> SuperblockRepairer<D, S> {
    /// Passing `None` for `backups` disables saving previous contents.
    pub fn new(device: D, backups: Option<S>) -> Self {
        Self {
            scanner: SuperblockScanner::new(device),
            backups,
        }
    }

    pub fn scanner(&self) -> &SuperblockScanner<D> {
        &self.scanner
    }

    pub fn backup_name(mirror: u32, offset: u64) -> String {
        format!("sb-{}-{:#x}.bin", mirror, offset)
    }

    /// Recompute the checksum of one copy in place.
    pub async fn fix_checksum(&self, mirror: u32, dry_run: bool) -> Result<RepairOutcome> {
        let offset = mirror_offset(mirror)?;
        let mut sb = self.scanner.require_mirror(mirror).await?;

        if !sb.has_valid_magic() {
            return Err(SbError::UnsafeRepair {
                reason: format!("mirror {} has no btrfs magic, recomputing its checksum would hide that", mirror),
            });
        }

        let status = checksum::verify(&sb)?;
        if status.matches {
            tracing::info!(mirror, "Checksum already correct, nothing to do");
            return Ok(RepairOutcome {
                action: "fix-csum",
                dry_run,
                writes: Vec::new(),
            });
        }

        tracing::warn!(
            mirror,
            stored = %status.stored,
            computed = %status.computed,
            "Checksum mismatch, rewriting"
        );

        let prepared = Self::prepare(mirror, offset, &mut sb, raw_of(&self.scanner, offset).await?)?;
        self.commit("fix-csum", dry_run, vec![prepared]).await
    }

    /// Overwrite every other copy with `source`, like btrfs-select-super.
    pub async fn restore_from(&self, source: u32, dry_run: bool) -> Result<RepairOutcome> {
        let report = match self.scanner.inspect(source).await? {
            Some(report) => report,
            // inspect only yields None for a copy past the device end
            None => {
                let err = self.scanner.require_mirror(source).await.err();
                return Err(err.unwrap_or(SbError::InvalidMirror(source)));
            }
        };

        if !report.is_valid() {
            return Err(SbError::UnsafeRepair {
                reason: format!("source mirror {} fails magic or checksum verification", source),
            });
        }

        let mut prepared = Vec::new();
        for mirror in self.scanner.available_mirrors().await? {
            if mirror == source {
                continue;
            }
            let offset = mirror_offset(mirror)?;
            let mut copy = report.superblock;
            copy.bytenr = offset;
            let previous = raw_of(&self.scanner, offset).await?;
            prepared.push(Self::prepare(mirror, offset, &mut copy, previous)?);
        }

        tracing::info!(source, copies = prepared.len(), dry_run, "Restoring superblock copies");
        self.commit("restore", dry_run, prepared).await
    }

    /// Rewrite the label in every copy that carries the btrfs magic.
    ///
    /// Copies without magic are skipped. A copy with magic that fails
    /// checksum verification aborts the whole call before anything is
    /// written.
    pub async fn set_label(&self, label: &str, dry_run: bool) -> Result<RepairOutcome> {
        crate::utils::validation::validate_label("label", label)?;

        let mut prepared = Vec::new();
        for mirror in self.scanner.available_mirrors().await? {
            let Some(report) = self.scanner.inspect(mirror).await? else {
                continue;
            };
            if !report.magic_ok {
                tracing::warn!(mirror, "Skipping copy without btrfs magic");
                continue;
            }
            if !report.is_valid() {
                tracing::warn!(mirror, "Copy fails checksum verification, refusing to relabel");
                return Err(SbError::UnsafeRepair {
                    reason: format!(
                        "mirror {} fails checksum verification; run `restore` from a valid copy first",
                        mirror
                    ),
                });
            }

            let mut sb = report.superblock;
            sb.set_label(label)?;
            let previous = raw_of(&self.scanner, report.offset).await?;
            prepared.push(Self::prepare(mirror, report.offset, &mut sb, previous)?);
        }

        if prepared.is_empty() {
            return Err(SbError::NoValidSuperblock);
        }
        self.commit("label", dry_run, prepared).await
    }

    /// Checksum and encode one target without touching the device.
    fn prepare(
        mirror: u32,
        offset: u64,
        sb: &mut Superblock,
        previous: Vec<u8>,
    ) -> Result<PreparedWrite> {
        let csum_size = sb.csum_type()?.size();
        let old_csum = hex(&previous[..csum_size]);

        sb.update_checksum()?;
        let raw = sb.to_bytes()?;
        let new_csum = hex(&sb.csum[..csum_size]);

        Ok(PreparedWrite {
            mirror,
            offset,
            previous,
            raw,
            old_csum,
            new_csum,
        })
    }

    /// Every backup is saved before the first device write.
    async fn commit(
        &self,
        action: &'static str,
        dry_run: bool,
        prepared: Vec<PreparedWrite>,
    ) -> Result<RepairOutcome> {
        let mut backups = Vec::with_capacity(prepared.len());
        for p in &prepared {
            if dry_run {
                tracing::info!(mirror = p.mirror, offset = p.offset, new_csum = %p.new_csum, "Dry run, not writing");
                backups.push(None);
                continue;
            }
            match &self.backups {
                Some(storage) => {
                    let name = Self::backup_name(p.mirror, p.offset);
                    storage.write_file(&name, &p.previous).await?;
                    tracing::info!(mirror = p.mirror, backup = %name, "Saved previous superblock");
                    backups.push(Some(name));
                }
                None => backups.push(None),
            }
        }

        let mut writes = Vec::with_capacity(prepared.len());
        for (p, backup) in prepared.into_iter().zip(backups) {
            if !dry_run {
                self.scanner.device().write_at(p.offset, &p.raw).await?;
                tracing::info!(
                    mirror = p.mirror,
                    offset = p.offset,
                    old_csum = %p.old_csum,
                    new_csum = %p.new_csum,
                    "Wrote superblock"
                );
            }
            writes.push(MirrorWrite {
                mirror: p.mirror,
                offset: p.offset,
                old_csum: p.old_csum,
                new_csum: p.new_csum,
                backup,
            });
        }

        if !dry_run && !writes.is_empty() {
            self.scanner.device().sync().await?;
        }
        Ok(RepairOutcome {
            action,
            dry_run,
            writes,
        })
    }
}

struct PreparedWrite {
    mirror: u32,
    offset: u64,
    previous: Vec<u8>,
    raw: [u8; BTRFS_SUPER_INFO_SIZE],
    old_csum: String,
    new_csum: String,
}

async fn raw_of<D: BlockDevice>(scanner: &SuperblockScanner<D>, offset: u64) -> Result<Vec<u8>> {
    scanner.device().read_at(offset, BTRFS_SUPER_INFO_SIZE).await
}
