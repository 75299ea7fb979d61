use anyhow::{Context, Result};
use boxhaul::cli::{AddArgs, App, Commands};
use boxhaul::ui::progress_bar;
use boxhaul::{AddEnv, BoxAdd, ConsoleUi, DirCollection, NullHooks};
use boxhaul_fetch::DownloaderOptions;
use boxhaul_metadata::ArchRequest;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    match app.cmd {
        Commands::Add(args) => add(args).await,
    }
}

async fn add(args: AddArgs) -> Result<()> {
    let box_dir = args
        .box_dir
        .clone()
        .or_else(|| home::home_dir().map(|home| home.join(".boxhaul").join("boxes")))
        .unwrap_or_else(|| PathBuf::from("boxes"));
    let tmp_path = std::env::temp_dir().join("boxhaul");
    std::fs::create_dir_all(&tmp_path).context("creating the download directory")?;

    let mut env = AddEnv::new(
        tmp_path,
        Box::new(ConsoleUi),
        Box::new(DirCollection::new(box_dir)),
        Box::new(NullHooks),
    );
    env.name = args.name;
    env.urls = args.url;
    env.providers = args.providers;
    env.version = args.box_version;
    env.checksum = args.checksum;
    env.checksum_type = args.checksum_type;
    env.architecture = match args.architecture.as_deref() {
        None => ArchRequest::Unspecified,
        Some(arch) if arch.eq_ignore_ascii_case("auto") => ArchRequest::Auto,
        Some(arch) => ArchRequest::Explicit(arch.to_string()),
    };
    env.force = args.force;
    if args.server_url.is_some() {
        env.server_url = args.server_url;
    }

    let mut options = DownloaderOptions::default()
        .insecure(args.insecure)
        .location_trusted(args.location_trusted)
        .on_progress(progress_bar());
    options.ca_cert = args.ca_cert;
    options.ca_path = args.ca_path;
    options.client_cert = args.client_cert;
    options.disable_ssl_revoke_best_effort = args.disable_ssl_revoke_best_effort;
    env.download = options;

    BoxAdd::new().call(&mut env).await?;

    if let Some(added) = &env.box_added {
        env.ui.detail(&format!(
            "Successfully added box '{}' (v{}) for provider: {}",
            added.name, added.version, added.provider
        ));
    }
    Ok(())
}
