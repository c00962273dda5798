//! Media command handlers.

use super::commands::{Commands, OutputFormat};
use medialib::{
    DeleteTarget, JsonError, ListOptions, MediaBlob, MediaLibrary, MediaLibraryConfig,
    MediaResult, MediaUpdate, UploadOptions, UploadOutcome,
};
use std::io::Write;

/// Handle a command that needs a connected library.
pub async fn handle_media_command(cmd: Commands, config: &MediaLibraryConfig) -> MediaResult<()> {
    if let Commands::Config = cmd {
        return show_config(config);
    }

    let library = config.connect().await?;
    let result = match cmd {
        Commands::Upload {
            path,
            folder,
            name,
            storage,
            alt,
            mime,
        } => {
            let mut options = UploadOptions::default().with_folder(folder);
            if let Some(name) = name {
                options = options.with_file_name(name);
            }
            if let Some(storage) = storage {
                options = options.with_storage_type(storage.into());
            }
            if let Some(alt) = alt {
                options = options.with_alt_text(alt);
            }
            let blob = MediaBlob::read_from(&path, mime).await?;
            upload(&library, &blob, options).await
        }

        Commands::List {
            folder,
            mime_prefix,
            limit,
            format,
        } => {
            let mut options = ListOptions::default();
            if let Some(folder) = folder {
                options = options.with_folder(folder);
            }
            if let Some(prefix) = mime_prefix {
                options = options.with_mime_prefix(prefix);
            }
            if let Some(limit) = limit {
                options = options.with_limit(limit);
            }
            list(&library, &options, format).await
        }

        Commands::Delete { items } => delete(&library, &items).await,

        Commands::Edit {
            id,
            name,
            alt,
            folder,
        } => {
            let mut update = MediaUpdate::default();
            if let Some(name) = name {
                update = update.with_filename(name);
            }
            if let Some(alt) = alt {
                update = update.with_alt_text(alt);
            }
            if let Some(folder) = folder {
                update = update.with_folder(folder);
            }
            edit(&library, &id, &update).await
        }

        Commands::Config => Ok(()),
    };

    // Let queued ledger writes land before the process exits.
    if let Err(e) = library.flush().await {
        tracing::warn!(error = %e, "Remote ledger replication did not finish");
    }
    result
}

async fn upload(library: &MediaLibrary, blob: &MediaBlob, options: UploadOptions) -> MediaResult<()> {
    let options = options.with_progress(|percent| {
        eprint!("\rUploading... {:>3}%", percent);
        let _ = std::io::stderr().flush();
    });
    let outcome = library.upload(blob, &options).await;
    eprintln!();

    if let UploadOutcome::FellBack {
        requested, causes, ..
    } = &outcome
    {
        eprintln!("Warning: {} unavailable, stored locally instead", requested);
        for cause in causes {
            eprintln!("  {}", cause.kind());
        }
    }
    let record = outcome.into_result()?;
    println!("{}", record.url());
    Ok(())
}

async fn list(library: &MediaLibrary, options: &ListOptions, format: OutputFormat) -> MediaResult<()> {
    let records = library.list_files(options).await;
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&records)
                .map_err(|e| JsonError::new(e.to_string()))?;
            println!("{}", json);
        }
        OutputFormat::Human => {
            for record in &records {
                println!(
                    "{}  {:<9} {:>10}  {:<20} {}",
                    record.created_at().format("%Y-%m-%d %H:%M"),
                    record.provider().as_str(),
                    record.size_bytes(),
                    record.folder(),
                    record.filename()
                );
                println!("    id:  {}", record.id());
                println!("    url: {}", record.url());
            }
            println!("Total: {} items", records.len());
        }
    }
    Ok(())
}

async fn delete(library: &MediaLibrary, items: &[String]) -> MediaResult<()> {
    let ids = items.iter().step_by(2).cloned();
    let urls = items.iter().skip(1).step_by(2).cloned();
    let targets = DeleteTarget::zip(ids, urls)?;

    let report = library.delete_files(&targets).await;
    for target in report.deleted() {
        println!("deleted {}", target.url());
    }
    for (target, error) in report.failed() {
        eprintln!("failed  {}: {}", target.url(), error.kind());
    }
    match report.failed().first() {
        Some((_, error)) => Err(error.clone().into()),
        None => Ok(()),
    }
}

async fn edit(library: &MediaLibrary, id: &str, update: &MediaUpdate) -> MediaResult<()> {
    if update.is_empty() {
        eprintln!("Nothing to change: pass --name, --alt or --folder");
        return Ok(());
    }
    let record = library.update_file(id, update).await?;
    let json = serde_json::to_string_pretty(&record).map_err(|e| JsonError::new(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn show_config(config: &MediaLibraryConfig) -> MediaResult<()> {
    let json = serde_json::to_string_pretty(&config.redacted())
        .map_err(|e| JsonError::new(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
