use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::lock;
use crate::model::category::{Category, parse_category};
use crate::store::Store;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let dir = match cli.dir {
        Some(ref d) => std::fs::canonicalize(d)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", d, e))?,
        None => std::env::current_dir()?,
    };

    match cli.command {
        // No subcommand → list everything
        None => cmd_list(&dir, ListArgs::default(), json),
        Some(cmd) => match cmd {
            // Read commands
            Commands::List(args) => cmd_list(&dir, args, json),
            Commands::Log => cmd_log(&dir, json),
            Commands::Review => cmd_review(&dir, json),

            // Write commands
            Commands::Add(args) => cmd_add(&dir, args),
            Commands::Done(args) => cmd_done(&dir, args),
            Commands::Delete(args) => cmd_delete(&dir, args),
            Commands::Undo => cmd_undo(&dir),
            Commands::Topic(args) => match args.action {
                TopicAction::Delete(args) => cmd_topic_delete(&dir, args),
            },
            Commands::Import(args) => cmd_import(&dir, args, json),
            Commands::Export(args) => cmd_export(&dir, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open_store(dir: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    Ok(Store::open(dir, now())?)
}

/// Resolve where a task lives: explicit --category wins, otherwise scan
/// the store (Recurring first, then topical categories in order).
fn resolve_target(
    store: &Store,
    args: &TaskSelectArgs,
) -> Result<(Category, Option<String>), Box<dyn std::error::Error>> {
    match args.category {
        Some(ref c) => Ok((parse_category(c)?, args.topic.clone())),
        None => store
            .find_task(&args.name)
            .ok_or_else(|| format!("task not found: {}", args.name).into()),
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(dir: &Path, args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Opening persists the reset, so read commands hold the lock too.
    let _guard = lock::hold(dir)?;
    let store = open_store(dir)?;
    let doc = store.document();
    let filter = match args.category {
        Some(ref c) => Some(parse_category(c)?),
        None => None,
    };
    let wanted = |cat: Category| filter.is_none_or(|f| f == cat);

    let recurring: Vec<RecurringTaskJson> = doc
        .tasks
        .recurring
        .iter()
        .map(|name| RecurringTaskJson {
            name: name.clone(),
            streak: store.streak_annotation(name, today()),
        })
        .collect();

    if json {
        let out = ListJson {
            recurring: wanted(Category::Recurring).then_some(recurring),
            adhoc: wanted(Category::Adhoc).then(|| topics_to_json(doc, Category::Adhoc)),
            main_quest: wanted(Category::MainQuest)
                .then(|| topics_to_json(doc, Category::MainQuest)),
            side_quest: wanted(Category::SideQuest)
                .then(|| topics_to_json(doc, Category::SideQuest)),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut first = true;
    if wanted(Category::Recurring) {
        println!("{}", format_category_header(Category::Recurring));
        for task in &recurring {
            println!("{}", format_recurring_line(&task.name, &task.streak));
        }
        first = false;
    }
    for cat in Category::TOPICAL {
        if !wanted(cat) {
            continue;
        }
        if !first {
            println!();
        }
        first = false;
        println!("{}", format_category_header(cat));
        if let Some(topics) = doc.tasks.topics(cat) {
            for (topic, records) in topics {
                let names: Vec<String> = records.iter().map(|r| r.task.clone()).collect();
                println!("{}", format_topic_line(topic, &names));
            }
        }
    }
    Ok(())
}

fn cmd_log(dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let store = open_store(dir)?;
    let completed = &store.document().completed;

    if json {
        let out: Vec<CompletionJson> = completed.iter().map(completion_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("== Completed ==");
    for c in completed {
        println!("{}", format_completion_line(c));
    }
    Ok(())
}

fn cmd_review(dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let store = open_store(dir)?;
    let review = store.weekly_review(today());

    if json {
        println!("{}", serde_json::to_string_pretty(&review)?);
        return Ok(());
    }

    for line in format_review(&review) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(dir: &Path, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let mut store = open_store(dir)?;
    let category = parse_category(&args.category)?;
    if !category.is_topical() && args.topic.is_some() {
        return Err("recurring tasks have no topic".into());
    }
    store.add_task(category, args.topic.as_deref(), &args.name, now())?;
    println!("added: {}", args.name);
    Ok(())
}

fn cmd_done(dir: &Path, args: TaskSelectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let mut store = open_store(dir)?;
    let (category, topic) = resolve_target(&store, &args)?;
    store.complete_task(category, topic.as_deref(), &args.name, now())?;
    println!("done: {}", args.name);
    Ok(())
}

fn cmd_delete(dir: &Path, args: TaskSelectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let mut store = open_store(dir)?;
    let (category, topic) = resolve_target(&store, &args)?;
    store.delete_task(category, topic.as_deref(), &args.name)?;
    println!("deleted: {}", args.name);
    Ok(())
}

fn cmd_undo(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let mut store = open_store(dir)?;
    store.undo_last(now())?;
    println!("undone");
    Ok(())
}

fn cmd_topic_delete(dir: &Path, args: TopicDeleteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let mut store = open_store(dir)?;
    let category = parse_category(&args.category)?;
    if !category.is_topical() {
        return Err("recurring tasks have no topics".into());
    }
    store.delete_topic(category, &args.topic)?;
    println!("deleted topic: {}", args.topic);
    Ok(())
}

fn cmd_import(dir: &Path, args: ImportArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let mut store = open_store(dir)?;
    let stats = store.merge_import(&PathBuf::from(&args.file), now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&merge_stats_to_json(&stats))?);
        return Ok(());
    }
    println!("{}", format_merge_stats(&stats));
    Ok(())
}

fn cmd_export(dir: &Path, args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lock::hold(dir)?;
    let store = open_store(dir)?;
    store.export_snapshot(Path::new(&args.file))?;
    println!("exported to {}", args.file);
    Ok(())
}
