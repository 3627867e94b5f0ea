use quire_core::models::TodoItemDraft;
use quire_core::{TodoItem, TodoList};
use tokio::sync::mpsc;

use crate::cli::ItemCommands;
use crate::commands::common::{
    added_child, child_id, format_item_line, format_todo_summary, join_words, latest_parent,
    settled, Context, RemoteView,
};
use crate::commands::todo::KIND as LIST_KIND;
use crate::error::CliError;

const KIND: &str = "Item";

pub async fn run_item(ctx: &Context, command: ItemCommands) -> Result<(), CliError> {
    match command {
        ItemCommands::List { list_id } => run_list(ctx, &list_id).await,
        ItemCommands::Add {
            list_id,
            description,
        } => run_add(ctx, &list_id, &description).await,
        ItemCommands::Toggle { list_id, item_id } => run_toggle(ctx, &list_id, &item_id).await,
        ItemCommands::Edit {
            list_id,
            item_id,
            description,
        } => run_edit(ctx, &list_id, &item_id, &description).await,
        ItemCommands::Remove { list_id, item_id } => run_remove(ctx, &list_id, &item_id).await,
    }
}

async fn open(
    ctx: &Context,
    list_id: &str,
) -> Result<(RemoteView<TodoList>, mpsc::UnboundedReceiver<TodoList>), CliError> {
    let list = ctx.find_parent::<TodoList>(LIST_KIND, list_id).await?;
    ctx.open_view(list).await
}

/// Print the list after a mutation: JSON gets the whole list, text a summary.
fn print_list_after(
    ctx: &Context,
    view: &RemoteView<TodoList>,
    receiver: &mut mpsc::UnboundedReceiver<TodoList>,
) -> Result<(), CliError> {
    let Some(list) = latest_parent(receiver).or_else(|| view.parent()) else {
        return Ok(());
    };
    if ctx.json {
        ctx.print_json(&list)
    } else {
        println!("{}", format_todo_summary(&list));
        Ok(())
    }
}

async fn run_list(ctx: &Context, list_id: &str) -> Result<(), CliError> {
    let (view, _receiver) = open(ctx, list_id).await?;
    let items = view.children();

    if ctx.json {
        return ctx.print_json(&items);
    }
    if let Some(list) = view.parent() {
        let list = TodoList {
            items: items.clone(),
            ..list
        };
        println!("{}", format_todo_summary(&list));
    }
    for item in &items {
        println!("{}", format_item_line(item));
    }
    Ok(())
}

async fn run_add(ctx: &Context, list_id: &str, description: &[String]) -> Result<(), CliError> {
    let draft =
        TodoItemDraft::new(join_words(description)).map_err(|_| CliError::EmptyDescription)?;

    let (view, mut receiver) = open(ctx, list_id).await?;
    let before = view.children();
    let settlement = view.create(draft).await?;
    let items = settled(&view, settlement, "new item", ctx.json)?;

    if !ctx.json {
        if let Some(item) = added_child::<TodoItem>(&before, &items) {
            println!("{}", format_item_line(item));
        }
    }
    print_list_after(ctx, &view, &mut receiver)
}

async fn run_toggle(ctx: &Context, list_id: &str, item_id: &str) -> Result<(), CliError> {
    let id = child_id(KIND, item_id)?;
    let (view, mut receiver) = open(ctx, list_id).await?;
    let settlement = view.toggle_completion(&id).await?;
    let items = settled(&view, settlement, id.as_str(), ctx.json)?;

    if !ctx.json {
        if let Some(item) = items.iter().find(|item| item.id == id) {
            println!("{}", format_item_line(item));
        }
    }
    print_list_after(ctx, &view, &mut receiver)
}

async fn run_edit(
    ctx: &Context,
    list_id: &str,
    item_id: &str,
    description: &[String],
) -> Result<(), CliError> {
    let id = child_id(KIND, item_id)?;
    let description = join_words(description);
    let (view, mut receiver) = open(ctx, list_id).await?;
    let settlement = view.update_text(&id, &description).await?;
    let items = settled(&view, settlement, id.as_str(), ctx.json)?;

    if !ctx.json {
        match items.iter().find(|item| item.id == id) {
            Some(item) => println!("{}", format_item_line(item)),
            None => println!("Deleted {id}"),
        }
    }
    print_list_after(ctx, &view, &mut receiver)
}

async fn run_remove(ctx: &Context, list_id: &str, item_id: &str) -> Result<(), CliError> {
    let id = child_id(KIND, item_id)?;
    let (view, mut receiver) = open(ctx, list_id).await?;
    let settlement = view.delete(&id).await?;
    settled(&view, settlement, id.as_str(), ctx.json)?;

    if !ctx.json {
        println!("Deleted {id}");
    }
    print_list_after(ctx, &view, &mut receiver)
}
