use std::env;

use anyhow::Context;
use log::{info, LevelFilter};
use structopt::StructOpt;

use hyperk::embed::{self, EmbedOutcome};
use hyperk::{package, BuildEnv, Version};

mod cli;

fn print_version(build_env: &BuildEnv) {
    let version = Version::resolve(build_env.project_dir());

    println!("{}", version.build_flag());
    println!("{}", version.program_name());
}

fn embed_assets(build_env: &BuildEnv) -> Result<(), anyhow::Error> {
    let version = build_env.embed_version();
    let outcome = embed::embed_web_files(build_env.data_dir(), build_env.include_dir(), &version)
        .with_context(|| {
            format!(
                "Failed to embed web assets from {}",
                build_env.data_dir().display()
            )
        })?;

    if outcome == EmbedOutcome::Skipped {
        info!("No web resources table generated");
    }

    Ok(())
}

fn package_release(build_env: &BuildEnv) -> Result<(), anyhow::Error> {
    let target = build_env.build_target()?;
    let esptool = build_env.merger()?;

    let version = build_env.release_version();

    package::package(&target, &version, build_env.release_dir(), &esptool)
        .with_context(|| format!("Failed to package build target {}", target.name))?;

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    use cli::Command;

    // Log everything at Info level or above unless RUST_LOG says otherwise
    let mut logger = pretty_env_logger::formatted_timed_builder();
    logger.filter_level(LevelFilter::Info);

    if let Ok(filters) = env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }

    logger.init();

    let opts = cli::Opts::from_args();
    let build_env = opts.build_env();

    match opts.command {
        Command::Version => print_version(&build_env),
        Command::Embed => embed_assets(&build_env)?,
        Command::Package => package_release(&build_env)?,
    }

    Ok(())
}
