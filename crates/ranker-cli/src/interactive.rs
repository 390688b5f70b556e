//! Interactive reorder session driven by prompts.

use crate::output::HumanDisplay;
use anyhow::{Context, Result};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use ranker_core::{ChangeSet, EditorCommand, EditorEvent, Item};
use ranker_editor::{EditorError, EditorHandle};

/// Actions offered on each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Move,
    Delete,
    InsertRecent,
    Search,
    Commit,
    Cancel,
}

impl Action {
    const ALL: [Self; 6] = [
        Self::Move,
        Self::Delete,
        Self::InsertRecent,
        Self::Search,
        Self::Commit,
        Self::Cancel,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Move => "Move an item",
            Self::Delete => "Delete an item",
            Self::InsertRecent => "Insert a recently added item",
            Self::Search => "Search and insert",
            Self::Commit => "Commit changes",
            Self::Cancel => "Cancel (discard everything)",
        }
    }
}

/// What the operator currently sees.
struct View {
    working: Vec<Item>,
    recent: Vec<Item>,
    has_changes: bool,
    payload: ChangeSet,
}

impl View {
    fn update(&mut self, event: EditorEvent) {
        if let EditorEvent::Changed {
            working,
            has_changes,
            payload,
        } = event
        {
            self.working = working;
            self.has_changes = has_changes;
            self.payload = payload;
        }
    }
}

fn labels(items: &[Item]) -> Vec<String> {
    items.iter().map(HumanDisplay::human_display).collect()
}

fn pick(theme: &ColorfulTheme, prompt: &str, items: &[Item]) -> Result<Option<usize>> {
    if items.is_empty() {
        println!("{}", style("  Nothing to choose from.").dim());
        return Ok(None);
    }
    Ok(Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels(items))
        .default(0)
        .interact_opt()?)
}

/// Run the prompt loop until the operator commits or cancels.
///
/// Returns `true` if changes were committed.
pub async fn run(handle: &mut EditorHandle, working: Vec<Item>, recent: Vec<Item>) -> Result<bool> {
    let theme = ColorfulTheme::default();
    let mut view = View {
        working,
        recent,
        has_changes: false,
        payload: ChangeSet::new(),
    };

    loop {
        println!();
        println!("{}", view.working.human_display());
        if view.has_changes {
            println!("\n{}", style("Pending changes:").bold());
            println!("{}", view.payload.human_display());
        }
        println!();

        let actions: Vec<&str> = Action::ALL.iter().map(|a| a.label()).collect();
        let Some(choice) = Select::with_theme(&theme)
            .with_prompt("Action")
            .items(&actions)
            .default(0)
            .interact_opt()?
        else {
            continue;
        };

        let command = match Action::ALL[choice] {
            Action::Move => {
                let Some(from) = pick(&theme, "Item to move", &view.working)? else {
                    continue;
                };
                let to: usize = Input::with_theme(&theme)
                    .with_prompt(format!("New position (0-{})", view.working.len() - 1))
                    .validate_with(|n: &usize| {
                        if *n < view.working.len() {
                            Ok(())
                        } else {
                            Err("Position out of range")
                        }
                    })
                    .interact_text()?;
                EditorCommand::Move { from, to }
            }
            Action::Delete => {
                let Some(index) = pick(&theme, "Item to delete", &view.working)? else {
                    continue;
                };
                EditorCommand::Delete { index }
            }
            Action::InsertRecent => {
                let Some(index) = pick(&theme, "Item to insert", &view.recent)? else {
                    continue;
                };
                EditorCommand::InsertRecent { index }
            }
            Action::Search => {
                let query: String = Input::with_theme(&theme)
                    .with_prompt("Search")
                    .interact_text()?;
                let Some(items) = search(handle, query).await? else {
                    continue;
                };
                let Some(index) = pick(&theme, "Item to insert", &items)? else {
                    continue;
                };
                EditorCommand::InsertSuggestion { index }
            }
            Action::Commit => {
                if !view.has_changes {
                    println!("{}", style("  Nothing to commit.").dim());
                    continue;
                }
                let confirmed = Confirm::with_theme(&theme)
                    .with_prompt(format!("Send {} change(s)?", view.payload.len()))
                    .default(true)
                    .interact()?;
                if !confirmed {
                    continue;
                }
                match handle.commit().await {
                    Ok(()) => return Ok(true),
                    Err(EditorError::CommitFailed(reason)) => {
                        println!("{} {reason}", style("  Commit failed:").red());
                        continue;
                    }
                    Err(e) => return Err(e).context("Commit failed"),
                }
            }
            Action::Cancel => return Ok(false),
        };

        match handle.edit(command).await {
            Ok(event) => view.update(event),
            Err(EditorError::Rejected { reason, .. }) => {
                println!("{} {reason}", style("  Rejected:").yellow());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Issue a search and wait for its suggestions.
async fn search(handle: &mut EditorHandle, query: String) -> Result<Option<Vec<Item>>> {
    handle.send(EditorCommand::Search { query }).await?;
    while let Some(event) = handle.next_event().await {
        if let EditorEvent::Suggestions { items, .. } = event {
            if items.is_empty() {
                println!("{}", style("  No matches.").dim());
                return Ok(None);
            }
            return Ok(Some(items));
        }
    }
    Err(EditorError::Closed.into())
}
