//! Editing session actor and the handle a UI shell drives it through.

use crate::error::{EditorError, Result};
use crate::search::SearchTracker;
use ranker_core::{
    normalize_all, EditSession, EditorCommand, EditorEvent, Item, RawRecord, SaveState,
};
use ranker_store::{EditorSettings, RemoteStore, StoreError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Capacity of the command queue between UI and session.
const COMMAND_BUFFER: usize = 32;

/// Results of background work, fed back into the session loop.
enum Completion {
    Search {
        generation: u64,
        query: String,
        result: std::result::Result<Vec<RawRecord>, StoreError>,
    },
    Commit(std::result::Result<(), StoreError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Handle to a running editing session.
///
/// Dropping the handle closes the session without sending anything.
#[derive(Debug)]
pub struct EditorHandle {
    id: Uuid,
    commands: mpsc::Sender<EditorCommand>,
    events: mpsc::UnboundedReceiver<EditorEvent>,
    task: JoinHandle<()>,
}

impl EditorHandle {
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.id
    }

    /// Queue a command.
    ///
    /// # Errors
    /// Returns `EditorError::Closed` if the session has ended.
    pub async fn send(&self, command: EditorCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EditorError::Closed)
    }

    /// Next event from the session; `None` once it has ended.
    pub async fn next_event(&mut self) -> Option<EditorEvent> {
        self.events.recv().await
    }

    /// Send an edit command and wait for its outcome.
    ///
    /// Events unrelated to the edit (such as suggestions) are skipped.
    ///
    /// # Errors
    /// Returns `EditorError::Rejected` if the session refused the edit, or
    /// `EditorError::Closed` if it has ended.
    pub async fn edit(&mut self, command: EditorCommand) -> Result<EditorEvent> {
        self.send(command).await?;
        loop {
            match self.next_event().await.ok_or(EditorError::Closed)? {
                event @ EditorEvent::Changed { .. } => return Ok(event),
                EditorEvent::Rejected { command, reason } => {
                    return Err(EditorError::Rejected { command, reason });
                }
                EditorEvent::Closed | EditorEvent::Committed => return Err(EditorError::Closed),
                other => debug!(event = ?other, "Skipping event while waiting for edit"),
            }
        }
    }

    /// Commit and wait until the remote store has answered.
    ///
    /// # Errors
    /// Returns `EditorError::CommitFailed` if the store refused the batch,
    /// `EditorError::Rejected` if there was nothing to commit, or
    /// `EditorError::Closed` if the session ended first.
    pub async fn commit(&mut self) -> Result<()> {
        self.send(EditorCommand::Commit).await?;
        loop {
            match self.next_event().await.ok_or(EditorError::Closed)? {
                EditorEvent::Committed => return Ok(()),
                EditorEvent::CommitFailed { reason } => {
                    return Err(EditorError::CommitFailed(reason));
                }
                EditorEvent::Rejected { command, reason } => {
                    return Err(EditorError::Rejected { command, reason });
                }
                EditorEvent::Closed => return Err(EditorError::Closed),
                other => debug!(event = ?other, "Waiting for commit outcome"),
            }
        }
    }

    /// Discard the session and wait for it to stop.
    pub async fn close(self) {
        // Already gone is fine; there is nothing left to discard.
        let _ = self.commands.send(EditorCommand::Close).await;
        drop(self.commands);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Editor task ended abnormally");
        }
    }
}

/// Open an editing session against `store`.
///
/// Loads the aggregated order and the recently-added list concurrently. A
/// list that fails to load is left empty; the session still opens. The first
/// event on the handle is always `Loaded`.
pub async fn open_session<S: RemoteStore>(store: Arc<S>, settings: EditorSettings) -> EditorHandle {
    let id = Uuid::new_v4();
    let span = info_span!("editor", session = %id);

    let (order, recent) = async {
        let (order, recent) =
            tokio::join!(store.fetch_aggregated_order(), store.fetch_recently_added());
        (
            ingest("aggregated order", order),
            ingest("recently added", recent),
        )
    }
    .instrument(span.clone())
    .await;

    let mut recent = recent;
    recent.truncate(settings.recent_display_count);

    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    // Receiver is in hand, so this cannot fail.
    let _ = event_tx.send(EditorEvent::Loaded {
        working: order.clone(),
        recent: recent.clone(),
    });

    let editor = Editor {
        store,
        settings,
        session: EditSession::new(order),
        recent,
        suggestions: Vec::new(),
        search: SearchTracker::default(),
        events: event_tx,
    };

    span.in_scope(|| info!(items = editor.session.working().len(), "Opened editing session"));
    let task = tokio::spawn(editor.run(command_rx).instrument(span));

    EditorHandle {
        id,
        commands: command_tx,
        events: event_rx,
        task,
    }
}

fn ingest(what: &str, fetched: std::result::Result<Vec<RawRecord>, StoreError>) -> Vec<Item> {
    match fetched {
        Ok(records) => {
            let (items, rejected) = normalize_all(records);
            if rejected > 0 {
                warn!(list = what, rejected, "Dropped malformed records");
            }
            items
        }
        Err(e) => {
            warn!(list = what, error = %e, "Failed to load list, continuing with it empty");
            Vec::new()
        }
    }
}

struct Editor<S> {
    store: Arc<S>,
    settings: EditorSettings,
    session: EditSession,
    recent: Vec<Item>,
    suggestions: Vec<Item>,
    search: SearchTracker,
    events: mpsc::UnboundedSender<EditorEvent>,
}

impl<S: RemoteStore> Editor<S> {
    async fn run(mut self, mut commands: mpsc::Receiver<EditorCommand>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        loop {
            // Commands first, so a newer search is seen before an older result.
            let flow = tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => self.handle(command, &done_tx),
                    None => {
                        debug!("Command channel dropped");
                        Flow::Stop
                    }
                },
                Some(done) = done_rx.recv() => self.complete(done),
            };

            if flow == Flow::Stop {
                break;
            }
        }

        self.search.cancel();
        if self.session.state() == SaveState::Saving {
            warn!("Session closed with a commit still in flight");
        }
        info!("Editing session ended");
    }

    fn emit(&self, event: EditorEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn emit_changed(&self) {
        self.emit(EditorEvent::Changed {
            working: self.session.working().to_vec(),
            has_changes: self.session.has_changes(),
            payload: self.session.payload(),
        });
    }

    fn reject(&self, command: &str, reason: impl ToString) {
        let reason = reason.to_string();
        warn!(command, reason = %reason, "Command rejected");
        self.emit(EditorEvent::Rejected {
            command: command.to_string(),
            reason,
        });
    }

    fn insert_from(&mut self, command: &str, source: Option<Item>, index: usize) {
        match source {
            Some(item) => self.insert(command, item),
            None => self.reject(command, format!("no entry at index {index}")),
        }
    }

    fn insert(&mut self, command: &str, item: Item) {
        let key = item.key().clone();
        match self.session.insert(item) {
            Ok(inserted) => {
                debug!(key = %key, inserted, "Insert");
                self.emit_changed();
            }
            Err(e) => self.reject(command, e),
        }
    }

    fn handle(&mut self, command: EditorCommand, done: &mpsc::UnboundedSender<Completion>) -> Flow {
        let name = command.name();
        debug!(command = name, "Handling command");

        match command {
            EditorCommand::Insert { item } => self.insert(name, item),
            EditorCommand::InsertSuggestion { index } => {
                let item = self.suggestions.get(index).cloned();
                self.insert_from(name, item, index);
            }
            EditorCommand::InsertRecent { index } => {
                let item = self.recent.get(index).cloned();
                self.insert_from(name, item, index);
            }
            EditorCommand::Delete { index } => match self.session.delete(index) {
                Ok(item) => {
                    debug!(key = %item.key(), index, "Deleted");
                    self.emit_changed();
                }
                Err(e) => self.reject(name, e),
            },
            EditorCommand::Move { from, to } => match self.session.move_item(from, to) {
                Ok(_) => self.emit_changed(),
                Err(e) => self.reject(name, e),
            },
            EditorCommand::Search { query } => self.search(query, done),
            EditorCommand::Commit => self.commit(done),
            EditorCommand::Close => {
                self.emit(EditorEvent::Closed);
                return Flow::Stop;
            }
        }

        Flow::Continue
    }

    fn search(&mut self, query: String, done: &mpsc::UnboundedSender<Completion>) {
        let generation = self.search.next();

        if query.trim().is_empty() {
            self.suggestions.clear();
            self.emit(EditorEvent::Suggestions {
                query,
                items: Vec::new(),
            });
            return;
        }

        let store = Arc::clone(&self.store);
        let done = done.clone();
        let debounce = self.settings.search_debounce();

        let task = tokio::spawn(
            async move {
                tokio::time::sleep(debounce).await;
                let result = store.fetch_suggestions(&query).await;
                let _ = done.send(Completion::Search {
                    generation,
                    query,
                    result,
                });
            }
            .in_current_span(),
        );
        self.search.track(task);
    }

    fn commit(&mut self, done: &mpsc::UnboundedSender<Completion>) {
        if self.session.state() == SaveState::Idle && !self.session.has_changes() {
            self.reject("commit", "no changes to commit");
            return;
        }

        let Some(payload) = self.session.begin_commit() else {
            self.emit(EditorEvent::CommitIgnored);
            return;
        };

        info!(records = payload.len(), "Committing changes");
        self.emit(EditorEvent::CommitStarted {
            payload: payload.clone(),
        });

        let store = Arc::clone(&self.store);
        let done = done.clone();
        tokio::spawn(
            async move {
                let result = store.apply_changes(&payload).await;
                let _ = done.send(Completion::Commit(result));
            }
            .in_current_span(),
        );
    }

    fn complete(&mut self, done: Completion) -> Flow {
        match done {
            Completion::Search {
                generation,
                query,
                result,
            } => {
                if !self.search.is_current(generation) {
                    debug!(query = %query, "Discarding stale suggestions");
                    return Flow::Continue;
                }

                self.suggestions = ingest("suggestions", result);
                self.suggestions.truncate(self.settings.suggestion_limit);
                self.emit(EditorEvent::Suggestions {
                    query,
                    items: self.suggestions.clone(),
                });
                Flow::Continue
            }
            Completion::Commit(Ok(())) => {
                self.session.finish_commit(true);
                info!("Changes committed");
                self.emit(EditorEvent::Committed);
                Flow::Stop
            }
            Completion::Commit(Err(e)) => {
                self.session.finish_commit(false);
                error!(error = %e, "Commit failed");
                self.emit(EditorEvent::CommitFailed {
                    reason: e.to_string(),
                });
                Flow::Continue
            }
        }
    }
}
