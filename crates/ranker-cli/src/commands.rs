//! CLI command implementations.

use crate::interactive;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use console::style;
use dialoguer::Confirm;
use ranker_core::{Category, ChangeSet, EditOp, EditorCommand, EditorEvent};
use ranker_editor::{open_session, EditorHandle};
use ranker_store::FileStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Initialize a new store.
pub fn init(path: &Path, format: OutputFormat) -> Result<()> {
    FileStore::init(path).context("Failed to initialize store")?;
    output::print_success(&format!("Initialized store at {}", path.display()), format);
    Ok(())
}

/// Add an item to the catalog.
pub fn add(
    path: &Path,
    name: &str,
    category: Category,
    uid: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let store = FileStore::open(path).context("Failed to open store")?;
    let item = store
        .add_item(name, category, uid)
        .context("Failed to add item")?;
    output::print(&item, format);
    Ok(())
}

/// Show the aggregated order.
pub fn list(path: &Path, format: OutputFormat) -> Result<()> {
    let store = FileStore::open(path).context("Failed to open store")?;
    let items = store.order()?;
    output::print(items.as_slice(), format);
    Ok(())
}

/// Show recently added items.
pub fn recent(path: &Path, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let store = FileStore::open(path).context("Failed to open store")?;
    let limit = limit.unwrap_or(store.config().editor.recent_display_count);
    let items = store.recent(Some(limit))?;
    output::print(items.as_slice(), format);
    Ok(())
}

/// Search the catalog.
pub fn search(path: &Path, query: &str, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let store = FileStore::open(path).context("Failed to open store")?;
    let limit = limit.unwrap_or(store.config().editor.suggestion_limit);
    let items = store.search(query, Some(limit))?;
    output::print(items.as_slice(), format);
    Ok(())
}

/// Options for the `edit` command.
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub dry_run: bool,
    pub yes: bool,
    pub interactive: bool,
}

/// Open an editing session and apply edit operations, or prompt for them.
pub fn edit(path: &Path, ops: &[String], options: &EditOptions, format: OutputFormat) -> Result<()> {
    let ops = ops
        .iter()
        .map(|op| EditOp::parse(op))
        .collect::<ranker_core::Result<Vec<_>>>()
        .context("Invalid edit operation")?;

    if ops.is_empty() && !options.interactive {
        bail!("No edit operations given (use -i for interactive mode)");
    }

    let store = Arc::new(FileStore::open(path).context("Failed to open store")?);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let settings = store.config().editor.clone();
        let mut handle = open_session(Arc::clone(&store), settings).await;
        let Some(EditorEvent::Loaded { working, recent }) = handle.next_event().await else {
            bail!("Editing session failed to start");
        };
        info!(session = %handle.session_id(), items = working.len(), "Editing");

        if options.interactive {
            let committed = interactive::run(&mut handle, working, recent).await?;
            finish(handle, committed, format).await;
            return Ok(());
        }

        let mut has_changes = false;
        let mut payload = ChangeSet::new();
        for op in &ops {
            let command = match op {
                EditOp::Insert { category, key } => EditorCommand::Insert {
                    item: store
                        .find(key.as_str(), *category)
                        .with_context(|| format!("Cannot insert '{key}'"))?,
                },
                EditOp::Delete(index) => EditorCommand::Delete { index: *index },
                EditOp::Move { from, to } => EditorCommand::Move {
                    from: *from,
                    to: *to,
                },
            };

            if let EditorEvent::Changed {
                has_changes: changed,
                payload: pending,
                ..
            } = handle
                .edit(command)
                .await
                .with_context(|| format!("Failed to apply '{op}'"))?
            {
                has_changes = changed;
                payload = pending;
            }
        }

        output::print(&payload, format);

        if !has_changes || options.dry_run {
            handle.close().await;
            return Ok(());
        }

        if !options.yes
            && !Confirm::new()
                .with_prompt(format!("Send {} change(s)?", payload.len()))
                .default(true)
                .interact()?
        {
            finish(handle, false, format).await;
            return Ok(());
        }

        handle.commit().await.context("Commit failed")?;
        finish(handle, true, format).await;
        Ok::<_, anyhow::Error>(())
    })
}

async fn finish(handle: EditorHandle, committed: bool, format: OutputFormat) {
    handle.close().await;
    if committed {
        output::print_success("Changes committed", format);
    } else if format == OutputFormat::Human {
        println!("{}", style("  Discarded.").dim());
    }
}

/// Start the HTTP server for a store.
pub fn serve(path: &Path, host: &str, port: u16) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { ranker_server::serve(path, host, port).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranker_store::StoreError;
    use tempfile::TempDir;

    fn ops(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_edit_insert_respects_category() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::init(tmp.path()).unwrap();
        store.add_item("X ev", Category::Event, Some("x")).unwrap();
        store.add_item("X loc", Category::Location, Some("x")).unwrap();

        let options = EditOptions {
            yes: true,
            ..EditOptions::default()
        };

        let err = edit(tmp.path(), &ops(&["ins:x"]), &options, OutputFormat::Json).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::AmbiguousKey(_))
        ));
        assert!(store.order().unwrap().is_empty());

        edit(tmp.path(), &ops(&["ins:location:x"]), &options, OutputFormat::Json).unwrap();

        let order = store.order().unwrap();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].category(), Category::Location);
        assert_eq!(order[0].name(), Some("X loc"));
    }
}
