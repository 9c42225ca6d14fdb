use anyhow::Result;
use clap::Args;
use futures::future::ready;
use std::{io::Write, path::PathBuf};
use vtstore::{StorageConfig, TileStorage};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// root directory of the store
	#[arg(required = true)]
	root: PathBuf,

	/// only list entries of this zoom level
	#[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=31))]
	zoom: Option<u8>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut stdout = std::io::stdout().lock();
	list(arguments, &mut stdout).await
}

/// Prints one `z/x/y size` line per entry.
async fn list(arguments: &Subcommand, out: &mut impl Write) -> Result<()> {
	let storage = TileStorage::open(&arguments.root, StorageConfig::default())?;
	let entries = match arguments.zoom {
		Some(level) => storage.get_entries_for_zoom(level),
		None => storage.get_entries(),
	};
	entries
		.try_for_each_async(|entry| ready(writeln!(out, "{} {}", entry.coord, entry.data.len()).map_err(Into::into)))
		.await
}
