use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ql", about = concat!("[>] questlog v", env!("CARGO_PKG_VERSION"), " - daily tasks with a reset at dawn"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different tracker directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all tasks, grouped by category (default)
    List(ListArgs),
    /// Add a task
    Add(AddArgs),
    /// Mark a task done
    Done(TaskSelectArgs),
    /// Delete a task without recording a completion
    Delete(TaskSelectArgs),
    /// Reinstate the most recently completed task
    Undo,
    /// Show the completion log
    Log,
    /// Weekly review: missed recurring tasks and stale ad-hoc work
    Review,
    /// Topic management
    Topic(TopicCmd),
    /// Merge tasks from an exported file
    Import(ImportArgs),
    /// Export the full task file
    Export(ExportArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct ListArgs {
    /// Show only this category (recurring, adhoc, main, side)
    #[arg(long)]
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Category to add to (recurring, adhoc, main, side)
    pub category: String,
    /// Task name
    pub name: String,
    /// Topic to file the task under (topical categories only;
    /// default "Uncategorized")
    #[arg(long)]
    pub topic: Option<String>,
}

#[derive(Args)]
pub struct TaskSelectArgs {
    /// Task name
    pub name: String,
    /// Category the task lives in (searched if omitted)
    #[arg(long)]
    pub category: Option<String>,
    /// Topic the task lives under
    #[arg(long)]
    pub topic: Option<String>,
}

// ---------------------------------------------------------------------------
// Topic management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TopicCmd {
    #[command(subcommand)]
    pub action: TopicAction,
}

#[derive(Subcommand)]
pub enum TopicAction {
    /// Delete a topic and everything in it
    Delete(TopicDeleteArgs),
}

#[derive(Args)]
pub struct TopicDeleteArgs {
    /// Category the topic lives in (adhoc, main, side)
    pub category: String,
    /// Topic name
    pub topic: String,
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ImportArgs {
    /// Exported task file to merge in
    pub file: String,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination path
    pub file: String,
}
