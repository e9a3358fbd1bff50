//! Run one cost entry request against a JSON installation snapshot.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Parser;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use costs::CostsSettings;
use costs::domain::ports::{
    CostEntryCommand, CostEntryCommandError, CostEntryLookup, CreateCostEntryRequest,
    PrepareCostEntryRequest, UpdateCostEntryRequest,
};
use costs::domain::{CostEntryPorts, CostEntryService, Error};
use costs::outbound::memory::{CostsWorld, InMemoryCostsStore, RecordingCommitHook};

/// `costlog-check` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "costlog-check",
    about = "Authorise and validate a cost entry request against a JSON snapshot",
    version
)]
struct CliArgs {
    /// Installation snapshot: memberships, issues, cost types, entries.
    #[arg(long = "world", value_name = "path")]
    world_path: PathBuf,
    /// Request to run, tagged by `operation`.
    #[arg(long = "request", value_name = "path")]
    request_path: PathBuf,
    /// Date used for defaults instead of the current UTC date.
    #[arg(long = "today", value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,
    /// Include the resulting snapshot in the output.
    #[arg(long = "dump-world")]
    dump_world: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
enum CliRequest {
    Prepare(PrepareCostEntryRequest),
    Create(CreateCostEntryRequest),
    Edit(CostEntryLookup),
    Update(UpdateCostEntryRequest),
    Delete(CostEntryLookup),
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome {
    Accepted { result: Value, committed: Value },
    Rejected { error: Error },
}

struct FixedDateClock {
    today: NaiveDate,
}

impl Clock for FixedDateClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.today.and_time(NaiveTime::default()))
    }
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = CostsSettings::load_from_iter([OsString::from("costlog-check")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let policy = settings
        .policy()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

    let world: CostsWorld = read_json(&args.world_path)?;
    let request: CliRequest = read_json(&args.request_path)?;

    let store = Arc::new(InMemoryCostsStore::from_world(world));
    let hook = Arc::new(RecordingCommitHook::new());
    let clock: Arc<dyn Clock> = match args.today {
        Some(today) => Arc::new(FixedDateClock { today }),
        None => Arc::new(DefaultClock),
    };
    let ports = CostEntryPorts {
        membership: Arc::clone(&store),
        issues: Arc::clone(&store),
        cost_types: Arc::clone(&store),
        entries: Arc::clone(&store),
        hook: Arc::clone(&hook),
    };
    let command = CostEntryService::new(ports, clock).with_policy(policy);

    let result = match request {
        CliRequest::Prepare(request) => to_value(command.prepare(request).await),
        CliRequest::Create(request) => to_value(command.create(request).await),
        CliRequest::Edit(request) => to_value(command.edit(request).await),
        CliRequest::Update(request) => to_value(command.update(request).await),
        CliRequest::Delete(request) => to_value(command.delete(request).await),
    }?;

    let outcome = match result {
        Ok(result) => Outcome::Accepted {
            result,
            committed: serde_json::to_value(hook.events()).map_err(io::Error::other)?,
        },
        Err(error) => Outcome::Rejected {
            error: error.into(),
        },
    };

    let mut report = serde_json::to_value(&outcome).map_err(io::Error::other)?;
    if args.dump_world {
        let world = store.world().map_err(io::Error::other)?;
        if let Value::Object(fields) = &mut report {
            fields.insert("world".to_owned(), json!(world));
        }
    }

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).map_err(io::Error::other)?;
    writeln!(stdout)
}

fn to_value<T: Serialize>(
    result: Result<T, CostEntryCommandError>,
) -> io::Result<Result<Value, CostEntryCommandError>> {
    match result {
        Ok(value) => serde_json::to_value(value).map(Ok).map_err(io::Error::other),
        Err(error) => Ok(Err(error)),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<T> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        io::Error::other(format!(
            "open input parent directory '{}': {error}",
            parent.display()
        ))
    })?;
    let mut file = directory.open(Path::new(file_name)).map_err(|error| {
        io::Error::other(format!("open input file '{}': {error}", path.display()))
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|error| {
        io::Error::other(format!("read input file '{}': {error}", path.display()))
    })?;
    serde_json::from_str(&contents).map_err(|error| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("parse '{}': {error}", path.display()),
        )
    })
}
