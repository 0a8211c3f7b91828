use btrfs_sb::core::report::{self, SuperblockSummary};
use btrfs_sb::core::scanner::all_clean;
use btrfs_sb::utils::error::{ErrorSeverity, Result};
use btrfs_sb::utils::logger;
use btrfs_sb::utils::validation::Validate;
use btrfs_sb::{
    CliConfig, Command, FileDevice, LocalStorage, Overrides, Settings, SuperblockRepairer,
    SuperblockScanner, TomlConfig,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<i32> {
    cli.command.validate()?;

    let file = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            Some(TomlConfig::from_file(path)?)
        }
        None => None,
    };
    let settings = Settings::resolve(Overrides::from(&cli), file.as_ref())?;
    let path = settings.device_path()?;
    let format = settings.format;

    let writable = cli.command.writes_device() && !settings.dry_run;
    let device = FileDevice::open(path, writable).await?;
    tracing::info!("Opened {} ({})", path, if writable { "read-write" } else { "read-only" });

    let output = match cli.command {
        Command::Dump { mirror } => {
            let scanner = SuperblockScanner::new(device);
            let sb = scanner.require_mirror(mirror).await?;
            report::render_summary(&SuperblockSummary::from(&sb), format)?
        }
        Command::Backups { mirror } => {
            let scanner = SuperblockScanner::new(device);
            let sb = scanner.require_mirror(mirror).await?;
            report::render_backups(&sb, format)?
        }
        Command::Scan => {
            let scanner = SuperblockScanner::new(device);
            report::render_scan(&scanner.scan().await?, format)?
        }
        Command::Verify => {
            let scanner = SuperblockScanner::new(device);
            let reports = scanner.scan().await?;
            print!("{}", report::render_scan(&reports, format)?);

            let clean = all_clean(&reports)?;
            if clean {
                tracing::info!("✅ All {} superblock copies verified", reports.len());
            } else {
                tracing::warn!("Some superblock copies failed verification");
            }
            return Ok(if clean { 0 } else { 1 });
        }
        Command::FixCsum { mirror } => {
            let repairer = repairer(device, &settings);
            let outcome = repairer.fix_checksum(mirror, settings.dry_run).await?;
            report::render_outcome(&outcome, format)?
        }
        Command::Restore { from } => {
            let repairer = repairer(device, &settings);
            let source = match from {
                Some(mirror) => mirror,
                None => {
                    let best = repairer.scanner().best_mirror().await?;
                    tracing::info!(
                        "Using mirror {} (generation {}) as the source",
                        best.mirror,
                        best.superblock.generation
                    );
                    best.mirror
                }
            };
            let outcome = repairer.restore_from(source, settings.dry_run).await?;
            report::render_outcome(&outcome, format)?
        }
        Command::Label { label } => {
            let repairer = repairer(device, &settings);
            let outcome = repairer.set_label(&label, settings.dry_run).await?;
            report::render_outcome(&outcome, format)?
        }
    };

    print!("{}", output);
    Ok(0)
}

fn repairer(device: FileDevice, settings: &Settings) -> SuperblockRepairer<FileDevice, LocalStorage> {
    if let Some(dir) = &settings.backup_dir {
        tracing::info!("💾 Backups go to {}", dir.display());
    }
    SuperblockRepairer::new(device, settings.backup_dir.clone().map(LocalStorage::new))
}
