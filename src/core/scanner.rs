use crate::core::checksum::{self, CsumStatus};
use crate::core::sanity::{self, Issue};
use crate::domain::model::{
    Superblock, BTRFS_SUPER_INFO_SIZE, BTRFS_SUPER_MIRROR_MAX, BTRFS_SUPER_MIRROR_SHIFT,
    BTRFS_SUPER_POS,
};
use crate::domain::ports::BlockDevice;
use crate::utils::error::{Result, SbError};

/// Byte offset of superblock copy `mirror`: 64KiB, 64MiB and 256GiB.
pub fn mirror_offset(mirror: u32) -> Result<u64> {
    if mirror >= BTRFS_SUPER_MIRROR_MAX {
        return Err(SbError::InvalidMirror(mirror));
    }
    if mirror == 0 {
        return Ok(BTRFS_SUPER_POS);
    }
    Ok((16 * 1024u64) << (BTRFS_SUPER_MIRROR_SHIFT * mirror))
}

pub fn mirror_fits(mirror: u32, device_size: u64) -> Result<bool> {
    let offset = mirror_offset(mirror)?;
    Ok(offset + BTRFS_SUPER_INFO_SIZE as u64 <= device_size)
}

/// Everything known about one superblock copy.
#[derive(Debug, Clone)]
pub struct MirrorReport {
    pub mirror: u32,
    pub offset: u64,
    pub superblock: Superblock,
    pub magic_ok: bool,
    /// `None` when the checksum type is not recognised.
    pub csum: Option<CsumStatus>,
    pub issues: Vec<Issue>,
}

impl MirrorReport {
    pub fn csum_ok(&self) -> bool {
        self.csum.as_ref().is_some_and(|c| c.matches)
    }

    /// Usable as a source of truth: right magic and checksum.
    pub fn is_valid(&self) -> bool {
        self.magic_ok && self.csum_ok()
    }

    pub fn is_clean(&self) -> bool {
        self.is_valid() && !sanity::has_errors(&self.issues)
    }
}

pub struct SuperblockScanner<D: BlockDevice> {
    device: D,
}

impl<D: BlockDevice> SuperblockScanner<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_inner(self) -> D {
        self.device
    }

    /// Mirror indexes whose copy fits on the device.
    pub async fn available_mirrors(&self) -> Result<Vec<u32>> {
        let size = self.device.size().await?;
        let mut mirrors = Vec::new();
        for mirror in 0..BTRFS_SUPER_MIRROR_MAX {
            if mirror_fits(mirror, size)? {
                mirrors.push(mirror);
            }
        }
        Ok(mirrors)
    }

    pub async fn read_raw(&self, mirror: u32) -> Result<Option<Vec<u8>>> {
        let offset = mirror_offset(mirror)?;
        let size = self.device.size().await?;
        if !mirror_fits(mirror, size)? {
            tracing::debug!(mirror, offset, size, "Mirror is beyond the end of the device");
            return Ok(None);
        }
        let raw = self.device.read_at(offset, BTRFS_SUPER_INFO_SIZE).await?;
        Ok(Some(raw))
    }

    pub async fn read_mirror(&self, mirror: u32) -> Result<Option<Superblock>> {
        match self.read_raw(mirror).await? {
            Some(raw) => Ok(Some(Superblock::from_bytes(&raw)?)),
            None => Ok(None),
        }
    }

    /// Like `read_mirror`, but a copy past the device end is an error.
    pub async fn require_mirror(&self, mirror: u32) -> Result<Superblock> {
        match self.read_mirror(mirror).await? {
            Some(sb) => Ok(sb),
            None => Err(SbError::MirrorOutOfRange {
                mirror,
                offset: mirror_offset(mirror)?,
                device_size: self.device.size().await?,
            }),
        }
    }

    /// The primary copy must exist and carry the btrfs magic.
    pub async fn read_primary(&self) -> Result<Superblock> {
        let sb = self.require_mirror(0).await?;

        if !sb.has_valid_magic() {
            return Err(SbError::BadMagic {
                offset: BTRFS_SUPER_POS,
                found: sb.magic,
            });
        }
        Ok(sb)
    }

    pub async fn inspect(&self, mirror: u32) -> Result<Option<MirrorReport>> {
        let offset = mirror_offset(mirror)?;
        let Some(superblock) = self.read_mirror(mirror).await? else {
            return Ok(None);
        };

        let magic_ok = superblock.has_valid_magic();
        let csum = match checksum::verify(&superblock) {
            Ok(status) => Some(status),
            Err(SbError::UnsupportedCsumType(t)) => {
                tracing::warn!(mirror, csum_type = t, "Unknown checksum type, skipping verification");
                None
            }
            Err(e) => return Err(e),
        };
        let issues = sanity::check(&superblock, offset);

        Ok(Some(MirrorReport {
            mirror,
            offset,
            superblock,
            magic_ok,
            csum,
            issues,
        }))
    }

    pub async fn scan(&self) -> Result<Vec<MirrorReport>> {
        let mut reports = Vec::new();
        for mirror in self.available_mirrors().await? {
            if let Some(report) = self.inspect(mirror).await? {
                tracing::info!(
                    mirror,
                    offset = report.offset,
                    generation = report.superblock.generation,
                    magic_ok = report.magic_ok,
                    csum_ok = report.csum_ok(),
                    "Scanned superblock copy"
                );
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// The valid copy with the highest generation; ties go to the lower mirror.
    pub async fn best_mirror(&self) -> Result<MirrorReport> {
        let reports = self.scan().await?;
        select_best(reports).ok_or(SbError::NoValidSuperblock)
    }
}

pub fn select_best(reports: Vec<MirrorReport>) -> Option<MirrorReport> {
    reports
        .into_iter()
        .filter(MirrorReport::is_valid)
        .fold(None, |best: Option<MirrorReport>, r| match best {
            Some(b) if b.superblock.generation >= r.superblock.generation => Some(b),
            _ => Some(r),
        })
}

/// Whether every copy is valid and free of sanity errors. Warnings are
/// allowed. An empty scan has nothing to vouch for the device.
pub fn all_clean(reports: &[MirrorReport]) -> Result<bool> {
    if reports.is_empty() {
        return Err(SbError::NoValidSuperblock);
    }
    Ok(reports.iter().all(MirrorReport::is_clean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryDevice;
    use crate::domain::model::BTRFS_MAGIC;

    #[test]
    fn test_mirror_offsets() {
        assert_eq!(mirror_offset(0).unwrap(), 0x10000);
        assert_eq!(mirror_offset(1).unwrap(), 0x400_0000);
        assert_eq!(mirror_offset(2).unwrap(), 0x40_0000_0000);
        assert!(matches!(mirror_offset(3), Err(SbError::InvalidMirror(3))));
    }

    #[test]
    fn test_mirror_fits() {
        assert!(!mirror_fits(0, 0x10000).unwrap());
        assert!(mirror_fits(0, 0x11000).unwrap());
        assert!(!mirror_fits(1, 0x400_0fff).unwrap());
        assert!(mirror_fits(1, 0x400_1000).unwrap());
    }

    async fn device_with(mirrors: &[(u32, u64)], size: u64) -> MemoryDevice {
        let dev = MemoryDevice::new(size);
        for &(mirror, generation) in mirrors {
            let mut sb = Superblock::from_bytes(&[0u8; BTRFS_SUPER_INFO_SIZE]).unwrap();
            sb.magic = BTRFS_MAGIC;
            sb.bytenr = mirror_offset(mirror).unwrap();
            sb.generation = generation;
            sb.update_checksum().unwrap();
            dev.write_at(sb.bytenr, &sb.to_bytes().unwrap()).await.unwrap();
        }
        dev
    }

    #[tokio::test]
    async fn test_small_device_has_only_primary() {
        let scanner = SuperblockScanner::new(device_with(&[(0, 5)], 1 << 20).await);
        assert_eq!(scanner.available_mirrors().await.unwrap(), vec![0]);
        assert!(scanner.read_mirror(1).await.unwrap().is_none());
        assert_eq!(scanner.read_primary().await.unwrap().generation, 5);
    }

    #[tokio::test]
    async fn test_read_primary_rejects_missing_magic() {
        let scanner = SuperblockScanner::new(MemoryDevice::new(1 << 20));
        assert!(matches!(
            scanner.read_primary().await,
            Err(SbError::BadMagic { offset: 0x10000, .. })
        ));

        let scanner = SuperblockScanner::new(MemoryDevice::new(4096));
        assert!(matches!(
            scanner.read_primary().await,
            Err(SbError::MirrorOutOfRange { mirror: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_best_mirror_prefers_newest_valid_copy() {
        let dev = device_with(&[(0, 10), (1, 12)], 0x400_1000).await;
        let scanner = SuperblockScanner::new(dev);

        let reports = scanner.scan().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(MirrorReport::is_valid));

        let best = scanner.best_mirror().await.unwrap();
        assert_eq!(best.mirror, 1);

        // corrupt mirror 1 without fixing its checksum
        scanner.device().write_at(0x400_0000 + 0x48, &[0xff]).await.unwrap();
        let best = scanner.best_mirror().await.unwrap();
        assert_eq!(best.mirror, 0);
    }

    #[tokio::test]
    async fn test_no_valid_superblock() {
        let scanner = SuperblockScanner::new(MemoryDevice::new(1 << 20));
        let reports = scanner.scan().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].magic_ok);
        assert!(matches!(scanner.best_mirror().await, Err(SbError::NoValidSuperblock)));
    }

    fn sane_copy(mirror: u32) -> Superblock {
        let mut sb = Superblock::from_bytes(&[0u8; BTRFS_SUPER_INFO_SIZE]).unwrap();
        sb.magic = BTRFS_MAGIC;
        sb.bytenr = mirror_offset(mirror).unwrap();
        sb.generation = 7;
        sb.sectorsize = 4096;
        sb.nodesize = 16384;
        sb.stripesize = 4096;
        sb.num_devices = 1;
        sb.total_bytes = 1 << 30;
        sb.bytes_used = 1 << 20;
        sb
    }

    async fn scan_of(copies: Vec<Superblock>) -> Vec<MirrorReport> {
        let dev = MemoryDevice::new(0x400_1000);
        for mut sb in copies {
            sb.update_checksum().unwrap();
            dev.write_at(sb.bytenr, &sb.to_bytes().unwrap()).await.unwrap();
        }
        SuperblockScanner::new(dev).scan().await.unwrap()
    }

    #[tokio::test]
    async fn test_all_clean_tolerates_warnings() {
        let mut overfull = sane_copy(1);
        overfull.bytes_used = overfull.total_bytes + 1;
        let reports = scan_of(vec![sane_copy(0), overfull]).await;

        assert!(!reports[1].issues.is_empty());
        assert!(!sanity::has_errors(&reports[1].issues));
        assert!(all_clean(&reports).unwrap());
    }

    #[tokio::test]
    async fn test_all_clean_fails_on_sanity_error() {
        let mut misplaced = sane_copy(1);
        misplaced.bytenr = 0x10000;
        let dev = MemoryDevice::new(0x400_1000);
        let mut primary = sane_copy(0);
        primary.update_checksum().unwrap();
        dev.write_at(0x10000, &primary.to_bytes().unwrap()).await.unwrap();
        misplaced.update_checksum().unwrap();
        dev.write_at(0x400_0000, &misplaced.to_bytes().unwrap()).await.unwrap();

        let reports = SuperblockScanner::new(dev).scan().await.unwrap();
        assert!(reports[1].is_valid());
        assert!(!reports[1].is_clean());
        assert!(!all_clean(&reports).unwrap());
    }

    #[test]
    fn test_all_clean_needs_a_copy() {
        assert!(matches!(all_clean(&[]), Err(SbError::NoValidSuperblock)));
    }
}
