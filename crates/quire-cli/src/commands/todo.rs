use chrono::Utc;
use quire_core::api::ParentRemote;
use quire_core::models::TodoListDraft;
use quire_core::TodoList;

use crate::cli::TodoCommands;
use crate::commands::common::{format_todo_list_line, join_words, Context};
use crate::error::CliError;

pub const KIND: &str = "Todo list";

pub async fn run_todo(ctx: &Context, command: TodoCommands) -> Result<(), CliError> {
    match command {
        TodoCommands::List => run_list(ctx).await,
        TodoCommands::Add { title } => run_add(ctx, &title).await,
        TodoCommands::Rename { id, title } => run_rename(ctx, &id, &title).await,
        TodoCommands::Remove { id } => run_remove(ctx, &id).await,
    }
}

fn draft_from_words(words: &[String]) -> Result<TodoListDraft, CliError> {
    let title = join_words(words);
    if title.is_empty() {
        return Err(CliError::EmptyTitle);
    }
    Ok(TodoListDraft::new(title)?)
}

async fn run_list(ctx: &Context) -> Result<(), CliError> {
    let lists = ctx.list_parents::<TodoList>().await?;

    if ctx.json {
        return ctx.print_json(&lists);
    }
    if lists.is_empty() {
        eprintln!("No todo lists yet");
    }
    let now = Utc::now();
    for list in &lists {
        println!("{}", format_todo_list_line(list, now));
    }
    Ok(())
}

async fn run_add(ctx: &Context, title: &[String]) -> Result<(), CliError> {
    let draft = draft_from_words(title)?;
    let list = ParentRemote::<TodoList>::create_parent(ctx.client.as_ref(), &draft).await?;
    tracing::info!("Created todo list {}", list.id);

    if ctx.json {
        return ctx.print_json(&list);
    }
    println!("{}", list.id);
    Ok(())
}

async fn run_rename(ctx: &Context, id: &str, title: &[String]) -> Result<(), CliError> {
    let draft = draft_from_words(title)?;
    let existing = ctx.find_parent::<TodoList>(KIND, id).await?;
    let list =
        ParentRemote::<TodoList>::update_parent(ctx.client.as_ref(), &existing.id, &draft).await?;

    if ctx.json {
        return ctx.print_json(&list);
    }
    println!("Renamed {} to {}", list.id, list.title);
    Ok(())
}

async fn run_remove(ctx: &Context, id: &str) -> Result<(), CliError> {
    let list = ctx.find_parent::<TodoList>(KIND, id).await?;
    ParentRemote::<TodoList>::delete_parent(ctx.client.as_ref(), &list.id).await?;
    tracing::info!("Deleted todo list {}", list.id);

    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "deleted": list.id }));
    }
    println!("Deleted {}", list.id);
    Ok(())
}
