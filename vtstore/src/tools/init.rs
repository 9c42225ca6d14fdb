use anyhow::Result;
use clap::Args;
use futures::future::ready;
use std::{io::Write, path::PathBuf};
use vtstore::{StorageConfig, TileStorage};

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// root directory of the store, created if it does not exist
	#[arg(required = true)]
	root: PathBuf,

	/// attribution text to store in the metadata
	#[arg(long)]
	attribution: Option<String>,

	/// name to store in the metadata
	#[arg(long)]
	name: Option<String>,

	/// YAML file with the storage configuration,
	/// e.g. `create_if_missing: false` to require an existing root
	#[arg(long, short, verbatim_doc_comment)]
	config: Option<PathBuf>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut stdout = std::io::stdout().lock();
	init(arguments, &mut stdout).await
}

async fn init(arguments: &Subcommand, out: &mut impl Write) -> Result<()> {
	let config = match &arguments.config {
		Some(path) => StorageConfig::from_path(path)?,
		None => StorageConfig::create_if_missing(),
	};
	let storage = TileStorage::open(&arguments.root, config)?;

	let mut metadata = storage.generate_default().await?;
	if let Some(attribution) = &arguments.attribution {
		metadata.set_attribution(attribution);
	}
	if let Some(name) = &arguments.name {
		metadata.set_string("name", name)?;
	}
	log::debug!("initialize {:?} with {metadata:?}", storage.root());

	let text = metadata.as_string();
	storage.put_metadata(ready(Ok(metadata))).await?;
	writeln!(out, "{text}")?;
	Ok(())
}
