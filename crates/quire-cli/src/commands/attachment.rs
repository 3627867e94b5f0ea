use std::path::Path;

use quire_core::models::AttachmentUpload;
use quire_core::{Attachment, Note};
use tokio::sync::mpsc;

use crate::cli::AttachmentCommands;
use crate::commands::common::{
    added_child, child_id, format_attachment_line, latest_parent, settled, Context, RemoteView,
};
use crate::commands::note::KIND as NOTE_KIND;
use crate::error::CliError;

const KIND: &str = "Attachment";

pub async fn run_attachment(ctx: &Context, command: AttachmentCommands) -> Result<(), CliError> {
    match command {
        AttachmentCommands::List { note_id } => run_list(ctx, &note_id).await,
        AttachmentCommands::Upload { note_id, path } => run_upload(ctx, &note_id, &path).await,
        AttachmentCommands::Remove {
            note_id,
            attachment_id,
        } => run_remove(ctx, &note_id, &attachment_id).await,
    }
}

async fn open(
    ctx: &Context,
    note_id: &str,
) -> Result<(RemoteView<Note>, mpsc::UnboundedReceiver<Note>), CliError> {
    let note = ctx.find_parent::<Note>(NOTE_KIND, note_id).await?;
    ctx.open_view(note).await
}

fn print_note_after(
    ctx: &Context,
    receiver: &mut mpsc::UnboundedReceiver<Note>,
) -> Result<(), CliError> {
    let Some(note) = latest_parent(receiver) else {
        return Ok(());
    };
    if ctx.json {
        ctx.print_json(&note)
    } else {
        println!("{}: {} attachment(s)", note.title, note.attachments.len());
        Ok(())
    }
}

async fn run_list(ctx: &Context, note_id: &str) -> Result<(), CliError> {
    let (view, _receiver) = open(ctx, note_id).await?;
    let attachments = view.children();

    if ctx.json {
        return ctx.print_json(&attachments);
    }
    if attachments.is_empty() {
        eprintln!("No attachments");
    }
    for attachment in &attachments {
        println!("{}", format_attachment_line(attachment));
    }
    Ok(())
}

async fn run_upload(ctx: &Context, note_id: &str, path: &Path) -> Result<(), CliError> {
    let upload = AttachmentUpload::from_path(path)?;
    tracing::debug!("Uploading {:?}", upload);

    let (view, mut receiver) = open(ctx, note_id).await?;
    let before = view.children();
    let settlement = view.create(upload).await?;
    let attachments = settled(&view, settlement, "new attachment", ctx.json)?;

    if !ctx.json {
        if let Some(attachment) = added_child::<Attachment>(&before, &attachments) {
            println!("{}", format_attachment_line(attachment));
        }
    }
    print_note_after(ctx, &mut receiver)
}

async fn run_remove(ctx: &Context, note_id: &str, attachment_id: &str) -> Result<(), CliError> {
    let id = child_id(KIND, attachment_id)?;
    let (view, mut receiver) = open(ctx, note_id).await?;
    let settlement = view.delete(&id).await?;
    settled(&view, settlement, id.as_str(), ctx.json)?;

    if !ctx.json {
        println!("Deleted {id}");
    }
    print_note_after(ctx, &mut receiver)
}
