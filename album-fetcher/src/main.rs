use album_fetcher::cli::{Cli, Commands, FetchArgs};
use album_fetcher::config::{self, CollectionSpec, Delays};
use album_fetcher::{Crawler, YupooClient, fix_extensions, logger, parse};
use clap::Parser;
use shared::layout::sanitize_filename;

fn collection_stem(args: &FetchArgs) -> String {
    args.name
        .as_deref()
        .map(sanitize_filename)
        .or_else(|| parse::category_id(&args.url).map(|id| format!("category_{id}")))
        .unwrap_or_else(|| "fetch".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // 日志文件按集合命名，多次运行互不覆盖
    let log_stem = match &cli.command {
        Commands::Fetch(args) => collection_stem(args),
        Commands::Audit(args) => format!("audit_{}", collection_stem(args)),
        Commands::FetchMany { .. } => "fetch-many".to_string(),
        Commands::AuditMany { .. } => "audit-many".to_string(),
        Commands::FixExtensions { .. } => "fix-extensions".to_string(),
    };
    logger::init_logger(cli.log_dir.as_deref(), &log_stem);

    match cli.command {
        Commands::Fetch(args) => {
            let spec = CollectionSpec::from(args);
            let client = YupooClient::new(spec.base_url())?;
            let crawler = Crawler::new(&client, &cli.out, Delays::default());
            let summary = crawler.run(&spec).await?;
            summary.log();
        }
        Commands::FetchMany { file } => {
            let specs = config::load_collections(&file)?;
            let referer = specs.first().map(|s| s.base_url().to_string()).unwrap_or_default();
            let client = YupooClient::new(&referer)?;
            let crawler = Crawler::new(&client, &cli.out, Delays::default());
            let results = crawler.run_many(&specs).await;
            let failed = results.iter().filter(|r| r.is_err()).count();
            tracing::info!(
                collections = results.len(),
                failed,
                "All collections processed"
            );
        }
        Commands::Audit(args) => {
            let spec = CollectionSpec::from(args);
            let client = YupooClient::new(spec.base_url())?;
            let crawler = Crawler::new(&client, &cli.out, Delays::default());
            let audit = crawler.audit(&spec).await?;
            audit.log();
        }
        Commands::AuditMany { file } => {
            let specs = config::load_collections(&file)?;
            let referer = specs.first().map(|s| s.base_url().to_string()).unwrap_or_default();
            let client = YupooClient::new(&referer)?;
            let crawler = Crawler::new(&client, &cli.out, Delays::default());
            let results = crawler.audit_many(&specs).await;
            let audits: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            tracing::info!(
                collections = results.len(),
                failed = results.len() - audits.len(),
                online_unique = audits.iter().map(|a| a.online_unique).sum::<usize>(),
                local_unique = audits.iter().map(|a| a.local_unique).sum::<usize>(),
                missing = audits.iter().map(|a| a.missing()).sum::<usize>(),
                "All audits finished"
            );
        }
        Commands::FixExtensions {
            dir,
            owner,
            dry_run,
        } => {
            let root = dir.unwrap_or(cli.out);
            let client = YupooClient::new(&format!("https://{owner}.x.yupoo.com/"))?;
            let summary = fix_extensions::fix_twins(&client, &root, &owner, dry_run).await?;
            tracing::info!(
                groups = summary.groups,
                deleted = summary.deleted.len(),
                errors = summary.errors.len(),
                dry_run,
                "Extension cleanup finished"
            );
        }
    }

    Ok(())
}
