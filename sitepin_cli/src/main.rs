use crate::config::{FileConfig, PublishArgs, Settings};
use crate::report::LogReporter;
use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use sitepin_backend_http::HttpNode;
use sitepin_publish::PublishJob;
use std::path::PathBuf;

mod config;
mod report;
mod tls;

/// Publish a directory to a content-addressed node, retire the snapshot the
/// key pointed at before, and point the key's name record at the new one.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML file supplying any of the publish options
    #[arg(short, long, value_name = "FILE", env = "SITEPIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    publish: PublishArgs,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let file = cli.config.as_deref().map(FileConfig::load).transpose()?;
    let settings = Settings::resolve(cli.publish, file)?;

    let client = tls::build_client(&settings.certificate_path, &settings.private_key_path)?;
    let node = HttpNode::new(client, &settings.shell_url)
        .with_context(|| format!("{} cannot be used as a node API URL", settings.shell_url))?;

    let outcome = PublishJob::new(settings.key_name, settings.target_path)
        .run(&node, &LogReporter)
        .await?;

    println!("{}\t{}", outcome.address, outcome.record.key);
    Ok(())
}
