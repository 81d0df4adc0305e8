use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use transcache::{
    resolve, AnyEntity, Config, EntityTranslator, JobStatus, Language, SourceType,
    TranslationQueue, TranslationStore,
};

#[derive(Parser)]
#[command(name = "transcache")]
#[command(version, about = "Translate site content and inspect the translation cache")]
struct Cli {
    /// Translation store database (overrides config and TRANSCACHE_STORE_PATH)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate an entity (or a JSON array of entities) into every target language
    Translate {
        /// Entity kind, e.g. service, service_option, gallery_group
        kind: String,
        /// JSON file holding the entity
        input: PathBuf,
    },
    /// Print the view of an entity in a language
    Resolve {
        kind: String,
        input: PathBuf,
        /// Language code, e.g. en, ja, zh
        #[arg(short, long)]
        lang: String,
    },
    /// Print the stored translations of an entity
    Show { kind: String, id: i64 },
    /// Delete the stored translations of an entity
    Purge { kind: String, id: i64 },
    /// List supported languages
    Languages,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "transcache=debug" } else { "transcache=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn read_entities(kind: SourceType, input: &Path) -> Result<Vec<AnyEntity>> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let items = match value {
        Value::Array(items) => items,
        single => vec![single],
    };

    items
        .into_iter()
        .map(|item| {
            AnyEntity::from_json(kind, item)
                .with_context(|| format!("{} does not hold a {}", input.display(), kind))
        })
        .collect()
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn translate(config: &Config, store: TranslationStore, kind: SourceType, input: &Path) -> Result<()> {
    let entities = read_entities(kind, input)?;
    let translator = EntityTranslator::from_config(config, store)
        .context("Translation is unavailable")?;

    let progress = ProgressBar::new(entities.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entities")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let queue = TranslationQueue::new(translator, config.concurrency).with_progress(progress.clone());

    let mut jobs = Vec::with_capacity(entities.len());
    for entity in entities {
        jobs.push(queue.trigger_translation(entity).await);
    }
    queue.wait_idle().await;
    progress.finish_and_clear();

    let mut reports = Vec::with_capacity(jobs.len());
    let mut incomplete = 0;
    for id in jobs {
        match queue.status(id).await {
            Some(JobStatus::Done(report)) => reports.push(report),
            Some(JobStatus::Failed(report)) => {
                incomplete += 1;
                reports.push(report);
            }
            Some(JobStatus::Aborted(reason)) => {
                incomplete += 1;
                warn!("Job {} aborted: {}", id, reason);
            }
            Some(JobStatus::Pending) | Some(JobStatus::Running) | None => {
                incomplete += 1;
                warn!("Job {} did not finish", id);
            }
        }
    }

    print_json(&reports)?;
    if incomplete > 0 {
        anyhow::bail!("{} entity translation(s) incomplete", incomplete);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(store) = cli.store {
        config.store_path = Some(store);
    }
    config.validate().context("Configuration validation failed")?;

    if config.store_path.is_none() && !matches!(cli.command, Command::Languages) {
        warn!("No store path configured; translations will not outlive this process");
    }

    let store = TranslationStore::open(config.store_path.clone())
        .await
        .context("Failed to open translation store")?;
    info!("Store:    {}", store.backend_name());

    match cli.command {
        Command::Translate { kind, input } => {
            let kind: SourceType = kind.parse()?;
            translate(&config, store, kind, &input).await?;
        }
        Command::Resolve { kind, input, lang } => {
            let kind: SourceType = kind.parse()?;
            let mut views = Vec::new();
            for entity in read_entities(kind, &input)? {
                views.push(resolve(&entity, &lang, &store).await);
            }
            match views.len() {
                1 => print_json(&views[0])?,
                _ => print_json(&views)?,
            }
        }
        Command::Show { kind, id } => {
            let kind: SourceType = kind.parse()?;
            match store.get_all_fields(kind, id).await {
                Some(fields) => print_json(&fields)?,
                None => anyhow::bail!("No translations stored for {}:{}", kind, id),
            }
        }
        Command::Purge { kind, id } => {
            let kind: SourceType = kind.parse()?;
            store.delete(kind, id).await?;
            info!("Purged translations for {}:{}", kind, id);
        }
        Command::Languages => {
            for lang in Language::ALL {
                let role = if lang.is_source() { "source" } else { "target" };
                println!("{}\t{}\t{}", lang.code(), lang.name(), role);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use transcache::Translatable;

    #[test]
    fn test_cli_parses_resolve() {
        let cli = Cli::parse_from([
            "transcache",
            "--store",
            "/tmp/t.db",
            "resolve",
            "service",
            "svc.json",
            "--lang",
            "en",
        ]);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/t.db")));
        match cli.command {
            Command::Resolve { kind, lang, .. } => {
                assert_eq!(kind, "service");
                assert_eq!(lang, "en");
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_read_entities_single_and_array() {
        let mut single = tempfile::NamedTempFile::new().unwrap();
        write!(single, r#"{{"id": 1, "title": "웨딩"}}"#).unwrap();
        let entities = read_entities(SourceType::GalleryGroup, single.path()).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id(), 1);

        let mut many = tempfile::NamedTempFile::new().unwrap();
        write!(many, r#"[{{"id": 1, "content": "a"}}, {{"id": 2, "content": "b"}}]"#).unwrap();
        let entities = read_entities(SourceType::PrivacyPolicy, many.path()).unwrap();
        assert_eq!(entities.len(), 2);
    }
}
