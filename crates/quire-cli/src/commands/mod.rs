pub mod attachment;
pub mod common;
pub mod completions;
pub mod config;
pub mod item;
pub mod note;
pub mod todo;
