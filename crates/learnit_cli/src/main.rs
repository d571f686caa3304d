//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `learnit_core` linkage with deterministic output.
//! - Optionally load a JSON config, run startup hydration and print the
//!   content outline.
//!
//! Usage: `learnit_cli [CONFIG_JSON] [--user USER_ID] [--export]`
//! Without `--user` the session is anonymous and stays in local mode.

use learnit_core::{
    export_selection, init_from_config, Capability, CoreConfig, LocalStore, RemoteBackend,
    RemoteClient, SqliteDocumentStore, SqliteKvStorage, StoreInitializer, TreeStore,
};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("learnit_core ping={}", learnit_core::ping());
    println!("learnit_core version={}", learnit_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let mut user_id = None;
    let mut export = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--export" => export = true,
            "--user" => user_id = args.next(),
            other => {
                eprintln!("unknown argument `{other}`");
                return ExitCode::FAILURE;
            }
        }
    }

    let config = match std::fs::read_to_string(&config_path)
        .map_err(|err| err.to_string())
        .and_then(|raw| CoreConfig::from_json_str(&raw).map_err(|err| err.to_string()))
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid config `{config_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let storage = match config.local_db_path.as_deref() {
        Some(path) => SqliteKvStorage::open(path),
        None => SqliteKvStorage::open_in_memory(),
    };
    let storage = match storage {
        Ok(storage) => storage,
        Err(err) => {
            error!("event=cli_open module=cli status=error target=local error={err}");
            eprintln!("failed to open local storage: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut store = TreeStore::new(LocalStore::new(Box::new(storage)));

    if let Some(path) = config.remote_db_path.as_deref() {
        match SqliteDocumentStore::open(path) {
            Ok(docs) => store.set_remote(Some(Box::new(RemoteBackend::new(RemoteClient::new(
                docs,
            ))))),
            Err(err) => {
                error!("event=cli_open module=cli status=error target=remote error={err}");
                eprintln!("remote storage unavailable, continuing locally: {err}");
            }
        }
    }

    let capability = Capability {
        is_authenticated: user_id.is_some(),
        is_authorized_role: user_id.is_some(),
        remote_backend_enabled: config.remote_backend_enabled && store.has_remote(),
        user_id,
    };
    let mut initializer = StoreInitializer::new();
    let state = initializer.apply(&mut store, capability);
    println!("state={} backend={}", state.as_str(), store.active_kind().as_str());

    for subject in store.subjects_in_order() {
        println!("{}", subject.title);
        for topic in store.topics_of(&subject.id) {
            println!("  {}", topic.title);
            for subtopic in store.subtopics_of(&topic.id) {
                println!(
                    "    {} [{}%]",
                    subtopic.title, subtopic.completion_percentage
                );
            }
        }
    }

    if export {
        match export_selection(store.tree()) {
            Some(markdown) => {
                println!("--- {} ---", markdown.file_name);
                println!("{}", markdown.body);
            }
            None => println!("nothing selected to export"),
        }
    }
    ExitCode::SUCCESS
}
