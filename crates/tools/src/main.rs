use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use catalog::AssetStore;
use clap::{Args, Parser, Subcommand};
use query::RawQueryParams;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline tools for geolocated asset datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a dataset and print per-type counts and its fingerprint
    Validate {
        /// Dataset JSON file
        dataset: PathBuf,
    },

    /// Run the filter engine against a dataset and print `{ items, total }`
    Query {
        /// Dataset JSON file
        dataset: PathBuf,

        #[command(flatten)]
        params: QueryArgs,
    },

    /// Print one asset by id
    Get {
        /// Dataset JSON file
        dataset: PathBuf,

        id: String,
    },
}

/// Filter parameters, passed through as raw strings so malformed values are
/// ignored exactly like they are over HTTP.
#[derive(Args, Debug)]
struct QueryArgs {
    /// Bounding box: minLon,minLat,maxLon,maxLat
    #[arg(long, allow_hyphen_values = true)]
    bbox: Option<String>,

    /// Asset type: building, road or poi
    #[arg(long = "type")]
    kind: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    min_height: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    max_height: Option<String>,

    /// Case-insensitive name search
    #[arg(short, long)]
    q: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    limit: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    offset: Option<String>,
}

impl From<QueryArgs> for RawQueryParams {
    fn from(a: QueryArgs) -> Self {
        RawQueryParams {
            bbox: a.bbox,
            kind: a.kind,
            min_height: a.min_height,
            max_height: a.max_height,
            q: a.q,
            limit: a.limit,
            offset: a.offset,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Validate { dataset } => {
            let report = tools::validate(&dataset)
                .with_context(|| format!("validating {}", dataset.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Query { dataset, params } => {
            let store = load(&dataset)?;
            let (result, ignored) = tools::run_query(&store, &params.into());
            for p in ignored {
                warn!(param = p.name, raw = %p.raw, "ignoring parameter: {}", p.reason);
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Get { dataset, id } => {
            let store = load(&dataset)?;
            let Some(asset) = tools::lookup(&store, &id) else {
                bail!("asset {id} not found");
            };
            println!("{}", serde_json::to_string_pretty(asset)?);
        }
    }
    Ok(())
}

fn load(path: &Path) -> anyhow::Result<AssetStore> {
    AssetStore::load(path).with_context(|| format!("loading {}", path.display()))
}
