//! sqljson CLI
//!
//! A thin wrapper around the sqljson-cli library.

use clap::Parser;
use sqljson_cli::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let output = sqljson_cli::run(&args, &mut std::io::stdin().lock())?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
