use crate::core::checksum::{self, hex};
use crate::core::repair::RepairOutcome;
use crate::core::sanity::{Issue, Severity};
use crate::core::scanner::MirrorReport;
use crate::domain::flags;
use crate::domain::model::{CsumType, DevItem, RootBackup, Superblock};
use crate::utils::error::{Result, SbError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Serialize)]
pub struct DevItemSummary {
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
    pub uuid: String,
    pub fsid: String,
}

impl From<&DevItem> for DevItemSummary {
    fn from(d: &DevItem) -> Self {
        Self {
            devid: d.devid,
            total_bytes: d.total_bytes,
            bytes_used: d.bytes_used,
            io_align: d.io_align,
            io_width: d.io_width,
            sector_size: d.sector_size,
            item_type: d.item_type,
            generation: d.generation,
            start_offset: d.start_offset,
            dev_group: d.dev_group,
            seek_speed: d.seek_speed,
            bandwidth: d.bandwidth,
            uuid: d.uuid().to_string(),
            fsid: d.fsid().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupRootSummary {
    pub slot: usize,
    pub tree_root: u64,
    pub tree_root_gen: u64,
    pub tree_root_level: u8,
    pub chunk_root: u64,
    pub chunk_root_gen: u64,
    pub chunk_root_level: u8,
    pub extent_root: u64,
    pub extent_root_gen: u64,
    pub extent_root_level: u8,
    pub fs_root: u64,
    pub fs_root_gen: u64,
    pub fs_root_level: u8,
    pub dev_root: u64,
    pub dev_root_gen: u64,
    pub dev_root_level: u8,
    pub csum_root: u64,
    pub csum_root_gen: u64,
    pub csum_root_level: u8,
    pub total_bytes: u64,
    pub bytes_used: u64,
    pub num_devices: u64,
}

impl BackupRootSummary {
    fn new(slot: usize, r: &RootBackup) -> Self {
        Self {
            slot,
            tree_root: r.tree_root,
            tree_root_gen: r.tree_root_gen,
            tree_root_level: r.tree_root_level,
            chunk_root: r.chunk_root,
            chunk_root_gen: r.chunk_root_gen,
            chunk_root_level: r.chunk_root_level,
            extent_root: r.extent_root,
            extent_root_gen: r.extent_root_gen,
            extent_root_level: r.extent_root_level,
            fs_root: r.fs_root,
            fs_root_gen: r.fs_root_gen,
            fs_root_level: r.fs_root_level,
            dev_root: r.dev_root,
            dev_root_gen: r.dev_root_gen,
            dev_root_level: r.dev_root_level,
            csum_root: r.csum_root,
            csum_root_gen: r.csum_root_gen,
            csum_root_level: r.csum_root_level,
            total_bytes: r.total_bytes,
            bytes_used: r.bytes_used,
            num_devices: r.num_devices,
        }
    }
}

/// Flattened, printable view of a superblock.
#[derive(Debug, Clone, Serialize)]
pub struct SuperblockSummary {
    pub csum_type: String,
    pub csum: String,
    pub csum_matches: Option<bool>,
    pub bytenr: u64,
    pub flags: u64,
    pub flag_names: Vec<String>,
    pub magic: String,
    pub magic_ok: bool,
    pub fsid: String,
    pub metadata_uuid: String,
    pub label: String,
    pub generation: u64,
    pub root: u64,
    pub root_level: u8,
    pub chunk_root: u64,
    pub chunk_root_generation: u64,
    pub chunk_root_level: u8,
    pub log_root: u64,
    pub log_root_transid: u64,
    pub log_root_level: u8,
    pub total_bytes: u64,
    pub bytes_used: u64,
    pub sectorsize: u32,
    pub nodesize: u32,
    pub stripesize: u32,
    pub root_dir_objectid: u64,
    pub num_devices: u64,
    pub compat_flags: u64,
    pub compat_ro_flags: u64,
    pub compat_ro_names: Vec<String>,
    pub incompat_flags: u64,
    pub incompat_names: Vec<String>,
    pub cache_generation: u64,
    pub uuid_tree_generation: u64,
    pub sys_chunk_array_size: u32,
    pub nr_global_roots: u64,
    pub block_group_root: u64,
    pub block_group_root_generation: u64,
    pub block_group_root_level: u8,
    pub dev_item: DevItemSummary,
    pub backup_roots: Vec<BackupRootSummary>,
}

impl From<&Superblock> for SuperblockSummary {
    fn from(sb: &Superblock) -> Self {
        let csum_type = sb.csum_type();
        let (csum_type_name, csum_len) = match csum_type {
            Ok(t) => (format!("{} ({})", t as u16, t), t.size()),
            Err(_) => (format!("{} (unknown)", sb.csum_type), sb.csum.len()),
        };
        let csum_matches = match csum_type {
            Ok(_) => checksum::verify(sb).ok().map(|s| s.matches),
            Err(_) => None,
        };

        Self {
            csum_type: csum_type_name,
            csum: hex(&sb.csum[..csum_len]),
            csum_matches,
            bytenr: sb.bytenr,
            flags: sb.flags,
            flag_names: flags::describe_super_flags(sb.flags),
            magic: String::from_utf8_lossy(&sb.magic).into_owned(),
            magic_ok: sb.has_valid_magic(),
            fsid: sb.fsid().to_string(),
            metadata_uuid: sb.metadata_uuid().to_string(),
            label: sb.label(),
            generation: sb.generation,
            root: sb.root,
            root_level: sb.root_level,
            chunk_root: sb.chunk_root,
            chunk_root_generation: sb.chunk_root_generation,
            chunk_root_level: sb.chunk_root_level,
            log_root: sb.log_root,
            log_root_transid: sb.log_root_transid,
            log_root_level: sb.log_root_level,
            total_bytes: sb.total_bytes,
            bytes_used: sb.bytes_used,
            sectorsize: sb.sectorsize,
            nodesize: sb.nodesize,
            stripesize: sb.stripesize,
            root_dir_objectid: sb.root_dir_objectid,
            num_devices: sb.num_devices,
            compat_flags: sb.compat_flags,
            compat_ro_flags: sb.compat_ro_flags,
            compat_ro_names: flags::describe_compat_ro_flags(sb.compat_ro_flags),
            incompat_flags: sb.incompat_flags,
            incompat_names: flags::describe_incompat_flags(sb.incompat_flags),
            cache_generation: sb.cache_generation,
            uuid_tree_generation: sb.uuid_tree_generation,
            sys_chunk_array_size: sb.sys_chunk_array_size,
            nr_global_roots: sb.nr_global_roots,
            block_group_root: sb.block_group_root,
            block_group_root_generation: sb.block_group_root_generation,
            block_group_root_level: sb.block_group_root_level,
            dev_item: DevItemSummary::from(&sb.dev_item),
            backup_roots: backup_summaries(sb),
        }
    }
}

impl SuperblockSummary {
    /// Ordered `(field, value)` pairs, shared by the text and CSV renderers.
    pub fn fields(&self) -> Vec<(String, String)> {
        fn flags_value(raw: u64, names: &[String]) -> String {
            if names.is_empty() {
                format!("{:#x}", raw)
            } else {
                format!("{:#x} ( {} )", raw, names.join(" |\n\t\t\t  "))
            }
        }

        let match_note = match self.csum_matches {
            Some(true) => " [match]",
            Some(false) => " [DON'T MATCH]",
            None => "",
        };
        let magic_note = if self.magic_ok { " [match]" } else { " [DON'T MATCH]" };
        let d = &self.dev_item;

        let mut out = vec![
            ("csum_type".to_string(), self.csum_type.clone()),
            ("csum".to_string(), format!("0x{}{}", self.csum, match_note)),
            ("bytenr".to_string(), self.bytenr.to_string()),
            ("flags".to_string(), flags_value(self.flags, &self.flag_names)),
            ("magic".to_string(), format!("{}{}", self.magic, magic_note)),
            ("fsid".to_string(), self.fsid.clone()),
            ("metadata_uuid".to_string(), self.metadata_uuid.clone()),
            ("label".to_string(), self.label.clone()),
            ("generation".to_string(), self.generation.to_string()),
            ("root".to_string(), self.root.to_string()),
            ("sys_array_size".to_string(), self.sys_chunk_array_size.to_string()),
            ("chunk_root_generation".to_string(), self.chunk_root_generation.to_string()),
            ("root_level".to_string(), self.root_level.to_string()),
            ("chunk_root".to_string(), self.chunk_root.to_string()),
            ("chunk_root_level".to_string(), self.chunk_root_level.to_string()),
            ("log_root".to_string(), self.log_root.to_string()),
            ("log_root_transid".to_string(), self.log_root_transid.to_string()),
            ("log_root_level".to_string(), self.log_root_level.to_string()),
            ("total_bytes".to_string(), self.total_bytes.to_string()),
            ("bytes_used".to_string(), self.bytes_used.to_string()),
            ("sectorsize".to_string(), self.sectorsize.to_string()),
            ("nodesize".to_string(), self.nodesize.to_string()),
            ("stripesize".to_string(), self.stripesize.to_string()),
            ("root_dir".to_string(), self.root_dir_objectid.to_string()),
            ("num_devices".to_string(), self.num_devices.to_string()),
            ("compat_flags".to_string(), format!("{:#x}", self.compat_flags)),
            ("compat_ro_flags".to_string(), flags_value(self.compat_ro_flags, &self.compat_ro_names)),
            ("incompat_flags".to_string(), flags_value(self.incompat_flags, &self.incompat_names)),
            ("cache_generation".to_string(), self.cache_generation.to_string()),
            ("uuid_tree_generation".to_string(), self.uuid_tree_generation.to_string()),
        ];

        if self.block_group_root != 0 {
            out.push(("block_group_root".to_string(), self.block_group_root.to_string()));
            out.push((
                "block_group_root_generation".to_string(),
                self.block_group_root_generation.to_string(),
            ));
            out.push((
                "block_group_root_level".to_string(),
                self.block_group_root_level.to_string(),
            ));
        }

        out.extend([
            ("dev_item.uuid".to_string(), d.uuid.clone()),
            ("dev_item.fsid".to_string(), d.fsid.clone()),
            ("dev_item.type".to_string(), d.item_type.to_string()),
            ("dev_item.total_bytes".to_string(), d.total_bytes.to_string()),
            ("dev_item.bytes_used".to_string(), d.bytes_used.to_string()),
            ("dev_item.io_align".to_string(), d.io_align.to_string()),
            ("dev_item.io_width".to_string(), d.io_width.to_string()),
            ("dev_item.sector_size".to_string(), d.sector_size.to_string()),
            ("dev_item.devid".to_string(), d.devid.to_string()),
            ("dev_item.dev_group".to_string(), d.dev_group.to_string()),
            ("dev_item.seek_speed".to_string(), d.seek_speed.to_string()),
            ("dev_item.bandwidth".to_string(), d.bandwidth.to_string()),
            ("dev_item.generation".to_string(), d.generation.to_string()),
        ]);

        out
    }
}

fn backup_summaries(sb: &Superblock) -> Vec<BackupRootSummary> {
    sb.backup_roots()
        .iter()
        .enumerate()
        .map(|(slot, r)| BackupRootSummary::new(slot, r))
        .collect()
}

fn csv_string<F>(fill: F) -> Result<String>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<()>,
{
    let mut wtr = csv::Writer::from_writer(Vec::new());
    fill(&mut wtr)?;
    let data = wtr
        .into_inner()
        .map_err(|e| SbError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn text_table(fields: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in fields {
        let _ = writeln!(out, "{:<24}{}", key, value);
    }
    out
}

pub fn render_summary(summary: &SuperblockSummary, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Csv => csv_string(|wtr| {
            wtr.write_record(["field", "value"])?;
            for (key, value) in summary.fields() {
                wtr.write_record([key, value.replace("\n\t\t\t  ", " ")])?;
            }
            Ok(())
        }),
        OutputFormat::Text => {
            let mut out = format!("superblock: bytenr={}\n", summary.bytenr);
            out.push_str(&"-".repeat(57));
            out.push('\n');
            out.push_str(&text_table(&summary.fields()));
            Ok(out)
        }
    }
}

pub fn render_backups(sb: &Superblock, format: OutputFormat) -> Result<String> {
    let backups = backup_summaries(sb);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&backups)?),
        OutputFormat::Csv => csv_string(|wtr| {
            for b in &backups {
                wtr.serialize(b)?;
            }
            Ok(())
        }),
        OutputFormat::Text => {
            let mut out = String::from("backup_roots[4]:\n");
            for (b, raw) in backups.iter().zip(sb.backup_roots()) {
                if raw.is_empty() {
                    let _ = writeln!(out, "\tbackup {}: (empty)", b.slot);
                    continue;
                }
                let _ = writeln!(out, "\tbackup {}:", b.slot);
                let _ = writeln!(
                    out,
                    "\t\tbackup_tree_root:\t{}\tgen: {}\tlevel: {}",
                    b.tree_root, b.tree_root_gen, b.tree_root_level
                );
                let _ = writeln!(
                    out,
                    "\t\tbackup_chunk_root:\t{}\tgen: {}\tlevel: {}",
                    b.chunk_root, b.chunk_root_gen, b.chunk_root_level
                );
                let _ = writeln!(
                    out,
                    "\t\tbackup_extent_root:\t{}\tgen: {}\tlevel: {}",
                    b.extent_root, b.extent_root_gen, b.extent_root_level
                );
                let _ = writeln!(
                    out,
                    "\t\tbackup_fs_root:\t\t{}\tgen: {}\tlevel: {}",
                    b.fs_root, b.fs_root_gen, b.fs_root_level
                );
                let _ = writeln!(
                    out,
                    "\t\tbackup_dev_root:\t{}\tgen: {}\tlevel: {}",
                    b.dev_root, b.dev_root_gen, b.dev_root_level
                );
                let _ = writeln!(
                    out,
                    "\t\tbackup_csum_root:\t{}\tgen: {}\tlevel: {}",
                    b.csum_root, b.csum_root_gen, b.csum_root_level
                );
                let _ = writeln!(out, "\t\tbackup_total_bytes:\t{}", b.total_bytes);
                let _ = writeln!(out, "\t\tbackup_bytes_used:\t{}", b.bytes_used);
                let _ = writeln!(out, "\t\tbackup_num_devices:\t{}", b.num_devices);
            }
            Ok(out)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    pub mirror: u32,
    pub offset: u64,
    pub generation: u64,
    pub csum_type: Option<CsumType>,
    pub magic_ok: bool,
    pub csum_ok: bool,
    pub issues: Vec<Issue>,
}

impl From<&MirrorReport> for ScanEntry {
    fn from(r: &MirrorReport) -> Self {
        Self {
            mirror: r.mirror,
            offset: r.offset,
            generation: r.superblock.generation,
            csum_type: r.csum.as_ref().map(|c| c.csum_type),
            magic_ok: r.magic_ok,
            csum_ok: r.csum_ok(),
            issues: r.issues.clone(),
        }
    }
}

pub fn render_scan(reports: &[MirrorReport], format: OutputFormat) -> Result<String> {
    let entries: Vec<ScanEntry> = reports.iter().map(ScanEntry::from).collect();
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&entries)?),
        OutputFormat::Csv => csv_string(|wtr| {
            wtr.write_record(["mirror", "offset", "generation", "csum_type", "magic_ok", "csum_ok", "errors", "warnings"])?;
            for e in &entries {
                let count = |s: Severity| e.issues.iter().filter(|i| i.severity == s).count();
                wtr.write_record([
                    e.mirror.to_string(),
                    e.offset.to_string(),
                    e.generation.to_string(),
                    e.csum_type.map(|t| t.name().to_string()).unwrap_or_default(),
                    e.magic_ok.to_string(),
                    e.csum_ok.to_string(),
                    count(Severity::Error).to_string(),
                    count(Severity::Warning).to_string(),
                ])?;
            }
            Ok(())
        }),
        OutputFormat::Text => {
            let mut out = String::new();
            for e in &entries {
                let status = if e.magic_ok && e.csum_ok { "ok" } else { "BAD" };
                let _ = writeln!(
                    out,
                    "mirror {} @ {:#x}: generation {} magic {} csum {} [{}]",
                    e.mirror,
                    e.offset,
                    e.generation,
                    if e.magic_ok { "ok" } else { "bad" },
                    if e.csum_ok { "ok" } else { "bad" },
                    status
                );
                for issue in &e.issues {
                    let _ = writeln!(out, "\t{}", issue);
                }
            }
            Ok(out)
        }
    }
}

pub fn render_outcome(outcome: &RepairOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Csv => csv_string(|wtr| {
            for w in &outcome.writes {
                wtr.serialize(w)?;
            }
            Ok(())
        }),
        OutputFormat::Text => {
            let prefix = if outcome.dry_run { "[dry run] " } else { "" };
            if outcome.writes.is_empty() {
                return Ok(format!("{}{}: nothing to do\n", prefix, outcome.action));
            }
            let mut out = String::new();
            for w in &outcome.writes {
                let _ = write!(
                    out,
                    "{}{}: mirror {} @ {:#x} csum {} -> {}",
                    prefix, outcome.action, w.mirror, w.offset, w.old_csum, w.new_csum
                );
                match &w.backup {
                    Some(name) => {
                        let _ = writeln!(out, " (backup: {})", name);
                    }
                    None => out.push('\n'),
                }
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flags::BTRFS_FEATURE_INCOMPAT_NO_HOLES;
    use crate::domain::model::{BTRFS_MAGIC, BTRFS_SUPER_INFO_SIZE};

    fn sample() -> Superblock {
        let mut sb = Superblock::from_bytes(&[0u8; BTRFS_SUPER_INFO_SIZE]).unwrap();
        sb.magic = BTRFS_MAGIC;
        sb.bytenr = 65536;
        sb.generation = 17;
        sb.incompat_flags = BTRFS_FEATURE_INCOMPAT_NO_HOLES;
        sb.set_label("scratch").unwrap();
        sb.super_roots[1].tree_root = 30_408_704;
        sb.super_roots[1].tree_root_gen = 17;
        sb.update_checksum().unwrap();
        sb
    }

    #[test]
    fn test_summary_fields() {
        let summary = SuperblockSummary::from(&sample());
        assert_eq!(summary.csum_type, "0 (crc32c)");
        assert_eq!(summary.csum.len(), 8);
        assert_eq!(summary.csum_matches, Some(true));
        assert_eq!(summary.label, "scratch");
        assert_eq!(summary.incompat_names, vec!["NO_HOLES"]);
        assert_eq!(summary.backup_roots.len(), 4);
    }

    #[test]
    fn test_text_rendering() {
        let text = render_summary(&SuperblockSummary::from(&sample()), OutputFormat::Text).unwrap();
        assert!(text.starts_with("superblock: bytenr=65536\n"));
        assert!(text.contains("magic                   _BHRfS_M [match]"));
        assert!(text.contains("label                   scratch"));
        assert!(text.contains("incompat_flags          0x200 ( NO_HOLES )"));
    }

    #[test]
    fn test_json_rendering() {
        let json = render_summary(&SuperblockSummary::from(&sample()), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["generation"], 17);
        assert_eq!(value["label"], "scratch");
        assert_eq!(value["dev_item"]["devid"], 0);
    }

    #[test]
    fn test_csv_rendering() {
        let csv = render_summary(&SuperblockSummary::from(&sample()), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("field,value"));
        assert!(csv.lines().any(|l| l == "generation,17"));
    }

    #[test]
    fn test_backups_text_marks_empty_slots() {
        let text = render_backups(&sample(), OutputFormat::Text).unwrap();
        assert!(text.contains("backup 0: (empty)"));
        assert!(text.contains("backup_tree_root:\t30408704\tgen: 17"));

        let csv = render_backups(&sample(), OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 5);
    }

    fn report_of(mirror: u32, sb: Superblock) -> MirrorReport {
        MirrorReport {
            mirror,
            offset: sb.bytenr,
            superblock: sb,
            magic_ok: sb.has_valid_magic(),
            csum: Some(checksum::verify(&sb).unwrap()),
            issues: crate::core::sanity::check(&sb, sb.bytenr),
        }
    }

    fn two_copies() -> Vec<MirrorReport> {
        let mut stale = sample();
        stale.bytenr = 0x400_0000;
        stale.update_checksum().unwrap();
        stale.generation = 18;
        vec![report_of(0, sample()), report_of(1, stale)]
    }

    #[test]
    fn test_scan_text_rendering() {
        let text = render_scan(&two_copies(), OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "mirror 0 @ 0x10000: generation 17 magic ok csum ok [ok]");
        assert!(lines[1].starts_with("\terror: sectorsize: "));
        assert!(text.contains("mirror 1 @ 0x4000000: generation 18 magic ok csum bad [BAD]\n"));
    }

    #[test]
    fn test_scan_json_rendering() {
        let json = render_scan(&two_copies(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["csum_type"], "crc32");
        assert_eq!(value[0]["csum_ok"], true);
        assert_eq!(value[1]["offset"], 0x400_0000);
        assert_eq!(value[1]["csum_ok"], false);
        assert_eq!(value[1]["issues"][0]["severity"], "error");
    }

    fn outcome(dry_run: bool) -> RepairOutcome {
        RepairOutcome {
            action: "restore",
            dry_run,
            writes: vec![crate::core::repair::MirrorWrite {
                mirror: 1,
                offset: 0x400_0000,
                old_csum: "00000000".to_string(),
                new_csum: "9a3f01c2".to_string(),
                backup: Some("sb-1-0x4000000.bin".to_string()),
            }],
        }
    }

    #[test]
    fn test_outcome_text_rendering() {
        let text = render_outcome(&outcome(false), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "restore: mirror 1 @ 0x4000000 csum 00000000 -> 9a3f01c2 (backup: sb-1-0x4000000.bin)\n"
        );

        let mut dry = outcome(true);
        dry.writes[0].backup = None;
        let text = render_outcome(&dry, OutputFormat::Text).unwrap();
        assert_eq!(text, "[dry run] restore: mirror 1 @ 0x4000000 csum 00000000 -> 9a3f01c2\n");

        dry.writes.clear();
        assert_eq!(
            render_outcome(&dry, OutputFormat::Text).unwrap(),
            "[dry run] restore: nothing to do\n"
        );
    }

    #[test]
    fn test_outcome_json_rendering() {
        let json = render_outcome(&outcome(true), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["action"], "restore");
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["writes"][0]["mirror"], 1);
        assert_eq!(value["writes"][0]["backup"], "sb-1-0x4000000.bin");
    }
}
