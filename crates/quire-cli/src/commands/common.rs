use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quire_core::api::{ApiClient, ParentRemote};
use quire_core::models::{ChildId, ChildRecord, ParentRecord};
use quire_core::session::{SessionEvent, SessionEvents};
use quire_core::sync::{ChildListView, NoticeLevel, Outcome, ParentNotifier, Rejection, Settlement};
use quire_core::{Attachment, Note, TodoItem, TodoList};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::config::{load_client_config, resolve_config_path};
use crate::error::CliError;

pub type RemoteView<P> = ChildListView<P, ApiClient>;

/// Everything a command needs to talk to the API.
pub struct Context {
    pub client: Arc<ApiClient>,
    pub request_timeout: Duration,
    pub json: bool,
    session: broadcast::Receiver<SessionEvent>,
}

impl Context {
    pub fn connect(config_path: Option<&Path>, json: bool) -> Result<Self, CliError> {
        let path = resolve_config_path(config_path)?;
        let config = load_client_config(&path)?;
        let events = SessionEvents::new();
        let session = events.subscribe();
        let client = ApiClient::from_config(&config, events)?;
        tracing::debug!("Using API at {}", client.base_url());

        Ok(Self {
            client: Arc::new(client),
            request_timeout: config.request_timeout(),
            json,
            session,
        })
    }

    /// Turn any failure into [`CliError::SessionExpired`] once the client has
    /// reported a rejected session.
    pub fn finish<T>(&mut self, result: Result<T, CliError>) -> Result<T, CliError> {
        match result {
            Err(error) if self.session_expired() => {
                tracing::debug!("Request failed after session expiry: {error}");
                Err(CliError::SessionExpired)
            }
            other => other,
        }
    }

    fn session_expired(&mut self) -> bool {
        loop {
            match self.session.try_recv() {
                Ok(SessionEvent::Expired) => return true,
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return false,
            }
        }
    }

    pub async fn list_parents<P: ParentRecord>(&self) -> Result<Vec<P>, CliError> {
        Ok(ParentRemote::<P>::list_parents(self.client.as_ref()).await?)
    }

    pub async fn find_parent<P: ParentRecord>(
        &self,
        kind: &'static str,
        id: &str,
    ) -> Result<P, CliError> {
        let id = normalize_identifier(kind, id)?;
        self.list_parents::<P>()
            .await?
            .into_iter()
            .find(|parent| parent.id().as_str() == id)
            .ok_or(CliError::NotFound { kind, id })
    }

    /// Open a child view on `parent` and load its children.
    pub async fn open_view<P: ParentRecord>(
        &self,
        parent: P,
    ) -> Result<(RemoteView<P>, mpsc::UnboundedReceiver<P>), CliError> {
        let (notifier, receiver) = ParentNotifier::channel();
        let view = ChildListView::new(Arc::clone(&self.client), self.request_timeout, notifier);
        view.open(parent).await?;
        Ok((view, receiver))
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), CliError> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Print queued notices and translate the outcome into a CLI result.
///
/// Failure notices are folded into the returned error instead of printed.
pub fn settled<P: ParentRecord>(
    view: &RemoteView<P>,
    settlement: Settlement<P::Child>,
    id: &str,
    quiet: bool,
) -> Result<Vec<P::Child>, CliError> {
    let notices = view.take_notices();
    if !quiet {
        for notice in notices.iter().filter(|notice| notice.level == NoticeLevel::Success) {
            eprintln!("{}", notice.message);
        }
    }

    if settlement.session_expired() {
        return Err(CliError::SessionExpired);
    }

    match settlement.outcome {
        Outcome::Applied => Ok(settlement.children),
        Outcome::Skipped => {
            tracing::debug!(
                "{} {} settled after the list moved on",
                <P::Child as ChildRecord>::LABEL,
                id
            );
            Ok(settlement.children)
        }
        Outcome::Rejected(Rejection::Pending) => Err(CliError::Busy(id.to_string())),
        Outcome::Rejected(Rejection::Missing) => Err(CliError::NotFound {
            kind: <P::Child as ChildRecord>::LABEL,
            id: id.to_string(),
        }),
        Outcome::Failed(error) => {
            let message = notices
                .into_iter()
                .rev()
                .find(|notice| notice.level == NoticeLevel::Error)
                .map_or_else(|| error.to_string(), |notice| notice.message);
            Err(CliError::MutationFailed(message))
        }
    }
}

/// The most recent parent delivered to `receiver`, if any.
pub fn latest_parent<P>(receiver: &mut mpsc::UnboundedReceiver<P>) -> Option<P> {
    let mut latest = None;
    while let Ok(parent) = receiver.try_recv() {
        latest = Some(parent);
    }
    latest
}

/// First child in `after` whose id is not in `before`.
pub fn added_child<'a, C: ChildRecord>(before: &[C], after: &'a [C]) -> Option<&'a C> {
    after
        .iter()
        .find(|child| !before.iter().any(|existing| existing.id() == child.id()))
}

pub fn child_id(kind: &'static str, id: &str) -> Result<ChildId, CliError> {
    normalize_identifier(kind, id).map(ChildId::from)
}

pub fn normalize_identifier(kind: &'static str, id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyIdentifier(kind))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn join_words(parts: &[String]) -> String {
    parts.join(" ").trim().to_string()
}

pub fn format_todo_list_line(list: &TodoList, now: DateTime<Utc>) -> String {
    let progress = format!("{}/{} done", list.completed_count(), list.total_count());
    format!(
        "{:<13}  {:<32}  {progress:<10}  {}",
        short_id(list.id.as_str()),
        truncate(&list.title, 32),
        format_relative_time(list.updated_at, now)
    )
}

pub fn format_todo_summary(list: &TodoList) -> String {
    format!(
        "{}: {}/{} done",
        list.title,
        list.completed_count(),
        list.total_count()
    )
}

pub fn format_item_line(item: &TodoItem) -> String {
    let mark = if item.completed { 'x' } else { ' ' };
    format!(
        "[{mark}] {:<13}  {}",
        short_id(item.id.as_str()),
        item.description
    )
}

pub fn format_note_line(note: &Note, now: DateTime<Utc>) -> String {
    let attachments = match note.attachments.len() {
        0 => String::new(),
        1 => "  (1 attachment)".to_string(),
        count => format!("  ({count} attachments)"),
    };
    format!(
        "{:<13}  {:<24}  {:<40}  {}{attachments}",
        short_id(note.id.as_str()),
        truncate(&note.title, 24),
        truncate(&note.content_preview(80), 40),
        format_relative_time(note.updated_at, now)
    )
}

pub fn format_attachment_line(attachment: &Attachment) -> String {
    format!(
        "{:<13}  {:<32}  {:<24}  {}",
        short_id(attachment.id.as_str()),
        truncate(&attachment.file_name, 32),
        attachment.content_type,
        format_size(attachment.size_bytes)
    )
}

fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn format_size(size_bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;

    if size_bytes < KIB {
        format!("{size_bytes} B")
    } else if size_bytes < MIB {
        format!("{:.1} KB", size_bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", size_bytes as f64 / MIB as f64)
    }
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp).num_seconds().max(0);
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
