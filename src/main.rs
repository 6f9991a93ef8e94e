use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use serde_json::json;
use sqlx::MySqlPool;
use std::sync::Arc;

use name_resolver::cli::{Cli, Command, parse_cli_to_app_config};
use name_resolver::config::AppConfig;
use name_resolver::db;
use name_resolver::export::csv_export::export_outcomes;
use name_resolver::ingest::{load_csv, seed_store};
use name_resolver::logging::init_logging;
use name_resolver::matching::DoubleMetaphoneEncoder;
use name_resolver::models::{NamePatch, NewName};
use name_resolver::orchestrator::{LookupFailure, store_service};
use name_resolver::store::NameStore;
use name_resolver::util::envfile::{load_dotenv_if_present, write_env_template};

#[tokio::main]
async fn main() {
    // .env may carry RUST_LOG / NAME_RESOLVER_PLAIN_LOG, so it is read first
    let dotenv = load_dotenv_if_present();
    init_logging();
    match dotenv {
        Ok(skipped) => skipped.iter().for_each(|w| warn!("{}", w)),
        Err(e) => error!("{:#}", e),
    }

    let (cli, cfg) = match parse_cli_to_app_config() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    match run(cli, cfg).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Where the reference table lives for this run.
enum Source {
    Csv,
    Db(MySqlPool),
}

async fn open_store(cfg: &AppConfig) -> Result<(Arc<NameStore>, Source)> {
    let encoder = DoubleMetaphoneEncoder::with_max_distance(cfg.matching.phonetic_max_distance);
    let store = Arc::new(NameStore::new(Arc::new(encoder)));
    if let Some(path) = cfg.source.csv_path.as_deref() {
        seed_store(&store, path)?;
        return Ok((store, Source::Csv));
    }
    let db_cfg = cfg
        .database
        .as_ref()
        .context("No database configured (set DB_HOST or pass --csv)")?;
    let pool = db::make_pool(db_cfg).await?;
    db::ensure_schema(&pool, &cfg.source.table).await?;
    let n = db::load_store(&pool, &cfg.source.table, &store).await?;
    info!("Reference table {} has {} names", cfg.source.table, n);
    Ok((store, Source::Db(pool)))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, cfg: AppConfig) -> Result<i32> {
    if let Command::EnvTemplate { path } = &cli.command {
        let path = path.as_deref().unwrap_or(".env.template");
        write_env_template(path)?;
        println!("Wrote {}. Copy to .env and edit values as needed.", path);
        return Ok(0);
    }
    let (store, source) = open_store(&cfg).await?;
    let table = cfg.source.table.as_str();

    match cli.command {
        Command::Resolve { name } => {
            let service = store_service(Arc::clone(&store), cfg.matching.resolver_options());
            match service.resolve(&name) {
                Ok(res) => {
                    print_json(&res)?;
                    Ok(0)
                }
                Err(LookupFailure::NotFound(e)) => {
                    print_json(&json!({
                        "Not found": e.to_string(),
                        "metaphone": e.phonetic_code(),
                    }))?;
                    Ok(1)
                }
                Err(e @ LookupFailure::Invalid(_)) => {
                    print_json(&json!({ "error": e.to_string() }))?;
                    Ok(2)
                }
            }
        }
        Command::Batch { input, out } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input))?;
            let queries: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            let service = store_service(Arc::clone(&store), cfg.matching.resolver_options());
            let (outcomes, summary) = service.resolve_batch(&queries);
            export_outcomes(&out, &outcomes)?;
            println!("{}", summary);
            Ok(0)
        }
        Command::Get { name } => {
            let found = match &source {
                // read through so rows written by other processes are visible
                Source::Db(pool) => db::get_name_by_name(pool, table, &name).await?,
                Source::Csv => store.get_by_name(&name),
            };
            match found {
                Some(s) => {
                    print_json(&s)?;
                    Ok(0)
                }
                None => {
                    print_json(&json!({ "Not found": "name not found" }))?;
                    Ok(1)
                }
            }
        }
        Command::Phonetic { name } => {
            print_json(&store.find_by_phonetic_code(&name))?;
            Ok(0)
        }
        Command::Add {
            name,
            classification,
            variations,
        } => {
            let pool = require_db(&source)?;
            // store insert validates and computes the phonetic code
            let staged = store.insert(NewName {
                name,
                classification,
                variations,
            })?;
            let id = db::insert_name(pool, table, &staged.record).await?;
            db::load_store(pool, table, &store).await?;
            print_json(&store.get(id))?;
            Ok(0)
        }
        Command::Update {
            id,
            name,
            classification,
            variations,
        } => {
            let pool = require_db(&source)?;
            let staged = store.update(
                id,
                NamePatch {
                    name,
                    classification,
                    variations,
                },
            )?;
            if !db::update_name(pool, table, id, &staged.record).await? {
                bail!("name id not found: {}", id);
            }
            db::load_store(pool, table, &store).await?;
            print_json(&store.get(id))?;
            Ok(0)
        }
        Command::Delete { id } => {
            let pool = require_db(&source)?;
            store.delete(id)?;
            if !db::delete_name(pool, table, id).await? {
                bail!("name id not found: {}", id);
            }
            db::load_store(pool, table, &store).await?;
            print_json(&json!({ "Message": "id deleted", "id": id }))?;
            Ok(0)
        }
        Command::Import { csv_path } => {
            let pool = require_db(&source)?;
            let start = std::time::Instant::now();
            let mut inserted = 0usize;
            for new in load_csv(&csv_path)? {
                match store.insert(new) {
                    Ok(staged) => {
                        db::insert_name(pool, table, &staged.record).await?;
                        inserted += 1;
                    }
                    Err(e) => log::warn!("Skipping CSV row: {}", e),
                }
            }
            db::load_store(pool, table, &store).await?;
            let total = db::count_names(pool, table).await?;
            info!(
                "Imported {} names from {} in {:?} (table now {})",
                inserted,
                csv_path,
                start.elapsed(),
                total
            );
            Ok(0)
        }
        Command::EnvTemplate { .. } => Ok(0),
    }
}

fn require_db(source: &Source) -> Result<&MySqlPool> {
    match source {
        Source::Db(pool) => Ok(pool),
        Source::Csv => bail!("This command writes to the database; it is not available with --csv"),
    }
}
