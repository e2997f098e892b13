mod config;
mod display;
mod driver;

use anyhow::{Context, Result};
use clap::Parser;

use driver::SyncDirection;

#[derive(Parser, Debug)]
#[clap(version, about = "Synchronizes a local directory with a cloud drive")]
struct Args {
    /// Only pull changes from the cloud; never push local changes
    #[clap(long, conflicts_with = "upload_only")]
    download_only: bool,

    /// Only push local changes to the cloud; never pull cloud changes
    #[clap(long, conflicts_with = "download_only")]
    upload_only: bool,

    /// Set the local directory to keep in sync and exit
    #[clap(long, value_name = "DIR")]
    set_location: Option<std::path::PathBuf>,

    /// Set the id of the cloud root folder to sync against and exit
    #[clap(long, value_name = "ID")]
    set_root_id: Option<String>,

    /// Set the access token used to authenticate against the cloud and exit
    #[clap(long, value_name = "TOKEN")]
    set_token: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.set_location.is_some() || args.set_root_id.is_some() || args.set_token.is_some() {
        return apply_setters(args);
    }

    let direction = if args.download_only {
        SyncDirection::DownloadOnly
    } else if args.upload_only {
        SyncDirection::UploadOnly
    } else {
        SyncDirection::TwoWay
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("could not start the async runtime")?;

    match runtime.block_on(driver::run(direction))? {
        true => Ok(()),
        false => {
            println!("Cancelled.");
            std::process::exit(255);
        }
    }
}

fn apply_setters(args: Args) -> Result<()> {
    let config_path = config::config_path()?;
    let mut cfg = config::load(&config_path)?;

    if let Some(dir) = args.set_location {
        let dir = dir
            .canonicalize()
            .with_context(|| format!("could not resolve local directory {}", dir.display()))?;
        cfg.local_path = Some(dir.clone());
        println!("Local sync directory set to {}", dir.display());
    }

    if let Some(root_id) = args.set_root_id {
        cfg.root_id = Some(root_id.clone());
        println!("Cloud root id set to {root_id}");
    }

    config::save(&config_path, &cfg)?;

    if let Some(token) = args.set_token {
        let db = sync_store::open(config::db_path(&config_path))?;
        sync_store::set_config(&db, "token", &token)?;
        println!("Access token saved.");
    }

    Ok(())
}
