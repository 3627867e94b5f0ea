use chrono::Utc;
use quire_core::api::ParentRemote;
use quire_core::models::NoteDraft;
use quire_core::Note;

use crate::cli::NoteCommands;
use crate::commands::common::{format_note_line, Context};
use crate::error::CliError;

pub const KIND: &str = "Note";

pub async fn run_note(ctx: &Context, command: NoteCommands) -> Result<(), CliError> {
    match command {
        NoteCommands::List => run_list(ctx).await,
        NoteCommands::Add { title, content } => run_add(ctx, &title, &content).await,
        NoteCommands::Edit { id, title, content } => run_edit(ctx, &id, title, content).await,
        NoteCommands::Remove { id } => run_remove(ctx, &id).await,
    }
}

/// Merge optional edits over the stored note.
pub fn edited_draft(
    note: &Note,
    title: Option<String>,
    content: Option<String>,
) -> Result<NoteDraft, CliError> {
    if title.is_none() && content.is_none() {
        return Err(CliError::NothingToEdit);
    }
    let title = title.unwrap_or_else(|| note.title.clone());
    if title.trim().is_empty() {
        return Err(CliError::EmptyTitle);
    }
    Ok(NoteDraft::new(
        title,
        content.unwrap_or_else(|| note.content.clone()),
    )?)
}

async fn run_list(ctx: &Context) -> Result<(), CliError> {
    let notes = ctx.list_parents::<Note>().await?;

    if ctx.json {
        return ctx.print_json(&notes);
    }
    if notes.is_empty() {
        eprintln!("No notes yet");
    }
    let now = Utc::now();
    for note in &notes {
        println!("{}", format_note_line(note, now));
    }
    Ok(())
}

async fn run_add(ctx: &Context, title: &str, content: &str) -> Result<(), CliError> {
    if title.trim().is_empty() {
        return Err(CliError::EmptyTitle);
    }
    let draft = NoteDraft::new(title, content)?;
    let note = ParentRemote::<Note>::create_parent(ctx.client.as_ref(), &draft).await?;
    tracing::info!("Created note {}", note.id);

    if ctx.json {
        return ctx.print_json(&note);
    }
    println!("{}", note.id);
    Ok(())
}

async fn run_edit(
    ctx: &Context,
    id: &str,
    title: Option<String>,
    content: Option<String>,
) -> Result<(), CliError> {
    let existing = ctx.find_parent::<Note>(KIND, id).await?;
    let draft = edited_draft(&existing, title, content)?;
    let note = ParentRemote::<Note>::update_parent(ctx.client.as_ref(), &existing.id, &draft).await?;

    if ctx.json {
        return ctx.print_json(&note);
    }
    println!("Updated {}", note.id);
    Ok(())
}

async fn run_remove(ctx: &Context, id: &str) -> Result<(), CliError> {
    let note = ctx.find_parent::<Note>(KIND, id).await?;
    ParentRemote::<Note>::delete_parent(ctx.client.as_ref(), &note.id).await?;
    tracing::info!("Deleted note {}", note.id);

    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "deleted": note.id }));
    }
    println!("Deleted {}", note.id);
    Ok(())
}
