use anyhow::Result;
use clap::Args;
use futures::{TryStreamExt, future::ready};
use std::{collections::BTreeMap, io::Write, path::PathBuf};
use vtstore::{StorageConfig, TileStorage};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// root directory of the store
	#[arg(required = true)]
	root: PathBuf,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut stdout = std::io::stdout().lock();
	probe(arguments, &mut stdout).await
}

async fn probe(arguments: &Subcommand, out: &mut impl Write) -> Result<()> {
	log::debug!("probe {:?}", arguments.root);
	let storage = TileStorage::open(&arguments.root, StorageConfig::default())?;

	writeln!(out, "root: {:?}", storage.root())?;
	match storage.get_metadata().try_next().await? {
		Some(metadata) => writeln!(out, "metadata: {}", metadata.as_string())?,
		None => writeln!(out, "metadata: none")?,
	}
	writeln!(out, "default metadata: {}", storage.generate_default().await?.as_string())?;
	match storage.get_max_zoom_level().try_next().await? {
		Some(level) => writeln!(out, "max zoom: {level}")?,
		None => writeln!(out, "max zoom: none")?,
	}

	// level -> (entries, bytes)
	let mut levels: BTreeMap<u8, (u64, u64)> = BTreeMap::new();
	storage
		.get_entries()
		.try_for_each_async(|entry| {
			let counts = levels.entry(entry.level()).or_default();
			counts.0 += 1;
			counts.1 += entry.data.len();
			ready(Ok(()))
		})
		.await?;
	for (level, (count, bytes)) in levels {
		writeln!(out, "level {level}: {count} entries, {bytes} bytes")?;
	}
	Ok(())
}
