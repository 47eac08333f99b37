use anyhow::Context;
use clap::Parser;
use peer_engine::adapters::roster::IdListRoster;
use peer_engine::adapters::storage::save_snapshot;
use peer_engine::config::cli::Command;
use peer_engine::core::{ConfigProvider, RosterSource};
use peer_engine::domain::model::{Assignment, AssignmentSnapshot, Roster};
use peer_engine::utils::error::{EngineError, ErrorSeverity};
use peer_engine::utils::{logger, validation::Validate};
use peer_engine::{AssignmentEngine, CliConfig, CsvRoster, EngineConfig, LocalStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入配置 (檔案為選用)
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => EngineConfig::default(),
    };
    cli.apply_to(&mut config);

    // 初始化日誌
    if config.logging.json {
        logger::init_json_logger(config.logging.level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose, config.logging.level.as_deref());
    }

    tracing::info!("Starting peer-engine");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&cli, config).await {
        Ok(Some(path)) => {
            tracing::info!("📁 Assignment saved to: {}", path);
            println!("📁 Assignment saved to: {}", path);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(
                "❌ Assignment failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn load_roster(cli: &CliConfig) -> Result<Roster, EngineError> {
    let args = cli.roster_args();
    let roster = match &args.roster {
        Some(path) => {
            let source = CsvRoster::new(path.clone());
            source.load_roster().await?
        }
        None => {
            let source = IdListRoster::new(args.students.clone());
            source.load_roster().await?
        }
    };
    Ok(roster)
}

async fn run(cli: &CliConfig, config: EngineConfig) -> Result<Option<String>, EngineError> {
    let roster = load_roster(cli).await?;
    tracing::info!("👥 Loaded roster of {} students", roster.len());

    let pretty = config.output.pretty;
    let seed = config.seed();
    let storage = LocalStorage::new(config.output_path().to_string());
    let engine = AssignmentEngine::new(config);
    let ids = roster.ids();

    let (name, assignment) = match &cli.command {
        Command::Groups { .. } => {
            let size = engine.config().default_group_size().ok_or_else(|| {
                EngineError::invalid_input("group size is required (--group-size)")
            })?;
            let grouping = engine.partition_roster(&ids, size, seed)?;
            for group in &grouping.groups {
                let names: Vec<&str> = group
                    .members
                    .iter()
                    .filter_map(|id| roster.get(*id).map(|s| s.name.as_str()))
                    .collect();
                println!("Group {}: {}", group.id, names.join(", "));
            }
            ("groups", Assignment::Groups(grouping))
        }
        Command::Reviews { .. } => {
            let count = engine
                .config()
                .default_reviews_per_submission()
                .ok_or_else(|| {
                    EngineError::invalid_input(
                        "reviews per submission is required (--reviews-per-submission)",
                    )
                })?;
            let pairing = engine.allocate_roster(&ids, count, seed)?;
            for (reviewee, reviewers) in pairing.to_map() {
                let name = roster.get(reviewee).map(|s| s.name.as_str()).unwrap_or("?");
                println!("{} <- {:?}", name, reviewers);
            }
            ("reviews", Assignment::Reviews(pairing))
        }
    };

    if cli.dry_run {
        tracing::info!("🔍 Dry run, nothing saved");
        return Ok(None);
    }

    let snapshot = AssignmentSnapshot::new(seed, assignment);
    let file = save_snapshot(&storage, name, &snapshot, pretty).await?;
    Ok(Some(format!("{}/{}", storage_base(&engine), file)))
}

fn storage_base(engine: &AssignmentEngine<EngineConfig>) -> String {
    engine.config().output_path().trim_end_matches('/').to_string()
}
