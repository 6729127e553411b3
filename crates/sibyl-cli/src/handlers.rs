//! Command handlers for CLI operations.

use crate::cli::{Cli, Command};
use anyhow::{Result, bail};
use serde::Serialize;
use sibyl_core::EngineConfig;
use sibyl_engine::{IntentEngine, RegistryStore as _, TomlFileStore, starter_records};
use std::path::{Path, PathBuf};

/// Routes a parsed command line to its handler.
///
/// # Errors
/// Returns an error when the underlying operation fails or, for `validate`
/// and `apply`, when the submitted records are rejected, so scripts can
/// rely on the exit code.
pub fn dispatch(cli: Cli) -> Result<()> {
    let store = registry_store(cli.registry)?;
    match cli.command {
        Command::Init => handle_init(&store),
        Command::Validate { file } => handle_validate(&store, file),
        Command::List => handle_list(&store),
        Command::Classify { utterance } => handle_classify(&store, &utterance),
        Command::Apply { file } => handle_apply(&store, &file),
        Command::Reload { file } => handle_reload(&store, &file),
        Command::Stats => handle_stats(&store),
    }
}

fn registry_store(path: Option<PathBuf>) -> Result<TomlFileStore> {
    let path = match path {
        Some(path) => path,
        None => TomlFileStore::default_path()?,
    };
    Ok(TomlFileStore::new(path))
}

/// Load or create the engine configuration, falling back to defaults when
/// the config file is unreadable.
fn engine_config() -> EngineConfig {
    EngineConfig::load_or_create().unwrap_or_else(|error| {
        tracing::warn!("Failed to load config from ~/.sibyl/config.toml: {error}");
        tracing::warn!("Using default configuration");
        EngineConfig::default()
    })
}

fn bootstrapped_engine(store: &TomlFileStore) -> Result<IntentEngine> {
    let engine =
        IntentEngine::new(engine_config())?.with_store(Box::new(store.clone()));
    let version = engine.bootstrap()?;
    tracing::info!("registry loaded at v{version} from {}", store.path().display());
    Ok(engine)
}

fn handle_init(store: &TomlFileStore) -> Result<()> {
    if store.path().exists() {
        bail!("refusing to overwrite existing registry {}", store.path().display());
    }
    store.save(&starter_records())?;
    tracing::info!("wrote starter registry to {}", store.path().display());
    Ok(())
}

fn handle_validate(store: &TomlFileStore, file: Option<PathBuf>) -> Result<()> {
    let report = match file {
        Some(path) => {
            let candidates = TomlFileStore::new(path).load()?;
            let engine = IntentEngine::new(engine_config())?;
            engine.validate_only(Some(&candidates))
        }
        None => {
            let engine = bootstrapped_engine(store)?;
            engine.validate_only(None)
        }
    };
    print_json(&report)?;
    if !report.valid {
        bail!("validation failed with {} errors", report.errors.len());
    }
    Ok(())
}

fn handle_list(store: &TomlFileStore) -> Result<()> {
    let engine = bootstrapped_engine(store)?;
    print_json(&engine.list_intents())
}

fn handle_classify(store: &TomlFileStore, utterance: &str) -> Result<()> {
    let engine = bootstrapped_engine(store)?;
    print_json(&engine.classify(utterance))
}

fn handle_apply(store: &TomlFileStore, file: &Path) -> Result<()> {
    let engine = bootstrapped_engine(store)?;
    let records = TomlFileStore::new(file).load()?;
    if records.is_empty() {
        bail!("{} holds no records to apply", file.display());
    }

    let mut failures = 0_usize;
    for record in records {
        let intent_id = record.intent_id.clone();
        let outcome = engine.apply_single(record);
        if !outcome.success {
            failures += 1;
            tracing::warn!("record {intent_id} rejected");
        }
        print_json(&outcome)?;
    }

    if failures > 0 {
        bail!("{failures} record(s) rejected; active registry keeps the rest");
    }
    engine.persist()?;
    Ok(())
}

fn handle_reload(store: &TomlFileStore, file: &Path) -> Result<()> {
    let engine = IntentEngine::new(engine_config())?.with_store(Box::new(store.clone()));
    let candidates = TomlFileStore::new(file).load()?;

    let report = engine.stage_records(candidates);
    print_json(&report)?;
    if !report.valid {
        bail!("reload rejected with {} errors", report.errors.len());
    }

    let activation = engine.activate_staged()?;
    engine.persist()?;
    tracing::info!(
        "registry replaced at v{} from {}",
        activation.version,
        file.display()
    );
    Ok(())
}

fn handle_stats(store: &TomlFileStore) -> Result<()> {
    let engine = bootstrapped_engine(store)?;
    print_json(&engine.stats())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout, reason = "CLI results go to stdout")]
    {
        println!("{rendered}");
    }
    Ok(())
}
