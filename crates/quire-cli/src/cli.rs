use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Todo lists and notes with attachments from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the client config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage todo lists
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },
    /// Manage checklist items on a todo list
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Manage note attachments
    Attachment {
        #[command(subcommand)]
        command: AttachmentCommands,
    },
    /// Configure the API endpoint
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TodoCommands {
    /// List todo lists with completion counts
    List,
    /// Create a todo list
    #[command(alias = "new")]
    Add {
        /// List title
        title: Vec<String>,
    },
    /// Rename a todo list
    Rename {
        /// Todo list ID
        id: String,
        /// New title
        title: Vec<String>,
    },
    /// Delete a todo list
    #[command(alias = "rm")]
    Remove {
        /// Todo list ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Show the items of a todo list
    List {
        /// Todo list ID
        list_id: String,
    },
    /// Add an item
    #[command(alias = "new")]
    Add {
        /// Todo list ID
        list_id: String,
        /// Item description
        description: Vec<String>,
    },
    /// Flip an item between done and not done
    Toggle {
        /// Todo list ID
        list_id: String,
        /// Item ID
        item_id: String,
    },
    /// Change an item's description (an empty description deletes it)
    Edit {
        /// Todo list ID
        list_id: String,
        /// Item ID
        item_id: String,
        /// New description
        description: Vec<String>,
    },
    /// Delete an item
    #[command(alias = "rm")]
    Remove {
        /// Todo list ID
        list_id: String,
        /// Item ID
        item_id: String,
    },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// List notes
    List,
    /// Create a note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: String,
        /// Note body
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Update a note's title and/or content
    Edit {
        /// Note ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Remove {
        /// Note ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AttachmentCommands {
    /// List a note's attachments
    List {
        /// Note ID
        note_id: String,
    },
    /// Upload a file as an attachment
    Upload {
        /// Note ID
        note_id: String,
        /// File to upload
        path: PathBuf,
    },
    /// Delete an attachment
    #[command(alias = "rm")]
    Remove {
        /// Note ID
        note_id: String,
        /// Attachment ID
        attachment_id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the config file
    Init {
        /// API base URL (e.g. <https://api.example.com>)
        #[arg(long, value_name = "URL")]
        api_url: String,
        /// Bearer token attached to every request
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
        /// Seconds before a request is abandoned
        #[arg(long, value_name = "SECONDS")]
        timeout_secs: Option<u64>,
    },
    /// Print the effective configuration
    Show,
}
