//! `picshrink` command line front end

mod args;

use anyhow::{bail, Context, Result};
use args::Cli;
use clap::Parser;
use picshrink::archive::{archive_file_name, build_zip, dedupe_names, download_name};
use picshrink::session::config::load_default_options;
use picshrink::utils::format::{format_bytes, saving_percent};
use picshrink::utils::logging::init_tracing;
use picshrink::{IncomingFile, Item, ItemState, Pipeline, Session, SessionHandle};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let session = SessionHandle::new(Session::with_defaults(cli.options(load_default_options())));
    let files = read_inputs(&cli.files).await?;
    session.lock().add_files(files)?;

    let report = Pipeline::new(session.clone()).process_all().await?;

    let items = session.lock().items().to_vec();
    for item in &items {
        println!("{}", describe(item));
    }

    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", cli.out_dir.display()))?;

    if cli.zip {
        let entries = session.lock().export_entries();
        if !entries.is_empty() {
            let archive = build_zip(&entries)?;
            let path = cli.out_dir.join(archive_file_name(SystemTime::now()));
            write_output(&path, &archive).await?;
            println!("Wrote {} ({})", path.display(), format_bytes(archive.len() as u64, 2));
        }
    } else {
        write_individual(&items, &cli.out_dir).await?;
    }

    if report.failed > 0 {
        bail!("{} of {} images failed", report.failed, report.attempted);
    }
    Ok(())
}

async fn read_inputs(paths: &[PathBuf]) -> Result<Vec<IncomingFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(IncomingFile::from_name(name, bytes));
    }
    Ok(files)
}

fn describe(item: &Item) -> String {
    match (&item.state, &item.processed) {
        (ItemState::Done, Some(processed)) => format!(
            "{}: {} -> {} ({:.1}% smaller)",
            item.original.name,
            format_bytes(item.original.size, 2),
            format_bytes(processed.size, 2),
            saving_percent(item.original.size, processed.size)
        ),
        (ItemState::Failed(message), _) => format!("{}: {}", item.original.name, message),
        (state, _) => format!("{}: {}", item.original.name, state.name()),
    }
}

async fn write_individual(items: &[Item], out_dir: &Path) -> Result<()> {
    let done: Vec<_> = items
        .iter()
        .filter_map(|item| item.processed.as_ref().map(|processed| (item, processed)))
        .collect();
    let names = dedupe_names(
        done.iter()
            .map(|(item, processed)| download_name(&item.original.name, processed.format))
            .collect(),
    );

    for (name, (_, processed)) in names.iter().zip(&done) {
        write_output(&out_dir.join(name), &processed.bytes).await?;
    }
    Ok(())
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
