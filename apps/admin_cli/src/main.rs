use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    filters::{default_filters, INCLUDE_CANCELLED_KEY, SEARCH_KEY},
    selection::SelectionScope,
    sort::SortState,
    load_settings, CollectionController, Decision, FileIngestPipeline, HttpBackend, Notifier,
    PendingConfirmation, TracingNotifier, UploadCandidate,
};
use shared::{
    domain::{EntityKind, FileId, RecordId, RecordSummary},
    protocol::SortDirection,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Manage admin collections and record attachments")]
struct Args {
    /// Overrides the configured API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token sent with every request.
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of a collection.
    List {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        include_cancelled: bool,
        /// Extra text filters as `key=value`.
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Sort field; defaults to the collection's default sort.
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending instead of ascending.
        #[arg(long)]
        desc: bool,
    },
    /// Delete records by id. Asks for `--yes`.
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(long)]
        yes: bool,
    },
    /// List the files attached to an item.
    Files {
        parent: i64,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Upload local files to an item; unsupported extensions are skipped.
    Upload {
        parent: i64,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete attachments of an item by file id. Asks for `--yes`.
    DeleteFiles {
        parent: i64,
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(long)]
        yes: bool,
    },
    /// Download every attachment of an item as one ZIP.
    Archive {
        parent: i64,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn parse_kind(raw: &str) -> Result<EntityKind, String> {
    EntityKind::parse(raw).ok_or_else(|| format!("unknown collection '{raw}'"))
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

/// The sort asked for on the command line, if any. `--desc` alone reverses the
/// current field.
fn requested_sort(current_field: &str, sort: Option<String>, desc: bool) -> Option<SortState> {
    if sort.is_none() && !desc {
        return None;
    }
    let direction = if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    Some(SortState {
        field: sort.unwrap_or_else(|| current_field.to_string()),
        direction,
    })
}

fn decide<T>(pending: PendingConfirmation<T>, yes: bool) -> Option<T> {
    if yes {
        return pending.resolve(Decision::Confirmed);
    }
    println!("{} (re-run with --yes to confirm)", pending.prompt());
    pending.resolve(Decision::Cancelled)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.api_url {
        settings.api_base_url = url;
    }
    if args.token.is_some() {
        settings.api_token = args.token;
    }
    info!(api_base_url = %settings.api_base_url, "using admin API");

    let backend = Arc::new(HttpBackend::from_settings(&settings)?);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    match args.command {
        Command::List {
            kind,
            search,
            include_cancelled,
            filters,
            page,
            sort,
            desc,
        } => {
            let controller = CollectionController::<RecordSummary>::new(
                kind,
                backend,
                notifier,
                settings.page_size,
            );
            let mut criteria = default_filters(kind);
            if let Some(search) = search {
                criteria = criteria.with_text(SEARCH_KEY, search);
            }
            if include_cancelled {
                criteria = criteria.with_flag(INCLUDE_CANCELLED_KEY, true);
            }
            for (key, value) in filters {
                criteria = criteria.with_text(key, value);
            }
            controller.apply_filters(criteria).await;
            let current = controller.query().await.sort_field;
            if let Some(requested) = requested_sort(&current, sort, desc) {
                controller.set_sort(requested).await;
            }
            controller.refresh().await?;
            // The page count is only known after the first fetch.
            if page > 1 {
                if controller.go_to_page(page).await.page != page {
                    bail!("page {page} is out of range");
                }
                controller.refresh().await?;
            }

            let snapshot = controller.snapshot().await;
            for record in &snapshot.page.items {
                println!("{}", serde_json::to_string(record)?);
            }
            println!(
                "page {}/{} ({} records)",
                snapshot.page.current_page, snapshot.page.total_pages, snapshot.page.total_count
            );
        }
        Command::Delete { kind, ids, yes } => {
            let controller = CollectionController::<RecordSummary>::new(
                kind,
                backend,
                notifier,
                settings.page_size,
            )
            .with_selection_scope(SelectionScope::Global);
            for id in ids {
                controller.toggle_select(RecordId(id)).await;
            }
            let Some(pending) = controller.request_bulk_delete().await else {
                return Ok(());
            };
            if let Some(batch) = decide(pending, yes) {
                let deleted = controller.bulk_delete(batch).await?;
                println!("deleted {deleted} record(s)");
            }
        }
        Command::Files { parent, page } => {
            let pipeline =
                FileIngestPipeline::new(RecordId(parent), backend, notifier, settings.file_page_size);
            pipeline.load().await?;
            if page > 1 && !pipeline.go_to_page(page).await {
                bail!("page {page} is out of range");
            }
            let snapshot = pipeline.snapshot().await;
            for entry in &snapshot.visible {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.file.id,
                    entry.file.file_name,
                    entry.display.formatted_size,
                    entry.display.formatted_upload_date
                );
            }
            println!("page {} ({} files)", snapshot.current_page, snapshot.total_files);
        }
        Command::Upload { parent, paths } => {
            let mut candidates = Vec::with_capacity(paths.len());
            for path in &paths {
                let candidate = UploadCandidate::from_path(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                candidates.push(candidate);
            }
            let pipeline =
                FileIngestPipeline::new(RecordId(parent), backend, notifier, settings.file_page_size);
            let ids = pipeline.ingest(candidates).await?;
            println!("uploaded {} file(s)", ids.len());
        }
        Command::DeleteFiles { parent, ids, yes } => {
            let pipeline =
                FileIngestPipeline::new(RecordId(parent), backend, notifier, settings.file_page_size)
                    .with_selection_scope(SelectionScope::Global);
            pipeline.load().await?;
            for id in ids {
                pipeline.toggle_select(FileId(id)).await;
            }
            let Some(pending) = pipeline.request_bulk_delete().await else {
                return Ok(());
            };
            if let Some(batch) = decide(pending, yes) {
                let deleted = pipeline.bulk_delete(batch).await?;
                println!("deleted {deleted} file(s)");
            }
        }
        Command::Archive { parent, out } => {
            let pipeline =
                FileIngestPipeline::new(RecordId(parent), backend, notifier, settings.file_page_size);
            let archive = pipeline.download_archive().await?;
            let path = archive
                .save_to(&out)
                .await
                .with_context(|| format!("failed to write archive into {}", out.display()))?;
            println!("saved {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_flag_on_default_field_stays_ascending() {
        assert_eq!(
            requested_sort("name", Some("name".into()), false),
            Some(SortState::ascending("name"))
        );
    }

    #[test]
    fn desc_flag_is_absolute() {
        let expected = SortState {
            field: "name".into(),
            direction: SortDirection::Desc,
        };
        assert_eq!(requested_sort("name", Some("name".into()), true), Some(expected.clone()));
        assert_eq!(requested_sort("name", None, true), Some(expected));
    }

    #[test]
    fn no_flags_keep_current_sort() {
        assert_eq!(requested_sort("plateNumber", None, false), None);
    }
}
