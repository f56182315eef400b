//! archivum CLI: knowledge-base content, categories and search.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use archivum::category::Placement;
use archivum::config::EngineConfig;
use archivum::engine::{Engine, NewContent};
use archivum::graph::NodeId;
use archivum::ingest::IndexOutcome;
use archivum::paths::ArchivumPaths;
use archivum::text::ContentSource;
use archivum::text::extract::ContentFormat;

#[derive(Parser)]
#[command(name = "archivum", version, about = "Knowledge-base content backend")]
struct Cli {
    /// Data directory for persistent storage.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to the XDG config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config and data directories.
    Init,

    /// Show engine info and statistics.
    Info,

    /// List all content items.
    List,

    /// Add a content item and index its text.
    Add {
        /// Content class (Document, Note, Image, Record).
        #[arg(long)]
        class: String,

        /// Explicit uri; generated when omitted.
        #[arg(long)]
        uri: Option<String>,

        /// Title property.
        #[arg(long)]
        title: Option<String>,

        /// Append the new item to this category (name or id).
        #[arg(long)]
        category: Option<String>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Delete a content item with its index entries and memberships.
    Delete {
        uri: String,
    },

    /// Replace the indexed text of a content item.
    Reindex {
        uri: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Search content by words.
    Search {
        query: String,

        /// Limit results to a category subtree (name or id).
        #[arg(long)]
        category: Option<String>,
    },

    /// Manage categories and the order of their members.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Read the text from a file (PDF, EPUB, HTML, text).
    #[arg(long, conflicts_with_all = ["text", "html"])]
    file: Option<PathBuf>,

    /// Inline plain text.
    #[arg(long, conflicts_with = "html")]
    text: Option<String>,

    /// Inline HTML.
    #[arg(long)]
    html: Option<String>,

    /// Format of --file when its extension is missing or misleading.
    #[arg(long, requires = "file")]
    format: Option<String>,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Create a category.
    Create {
        name: String,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Delete a category. Its content stays.
    Delete { category: String },
    /// List all categories.
    List,
    /// Pin a category (or with --off, unpin it).
    Pin {
        category: String,
        #[arg(long)]
        off: bool,
    },
    /// Show the ordered members of a category.
    Show { category: String },
    /// Add an item at the end (or with --top, the beginning).
    Add {
        category: String,
        uri: String,
        #[arg(long)]
        top: bool,
    },
    /// Place an item directly after another member.
    After {
        category: String,
        uri: String,
        anchor: String,
    },
    /// Exchange the positions of two members.
    Swap {
        category: String,
        a: String,
        b: String,
    },
    /// Move a member after the n-th other member (0 = top).
    Move {
        category: String,
        uri: String,
        n: usize,
    },
    /// Move members from one category to another.
    Relocate {
        from: String,
        to: String,
        #[arg(required = true)]
        uris: Vec<String>,
        /// Insert after this member of the target instead of at the end.
        #[arg(long)]
        after: Option<String>,
    },
    /// Nest a category under another.
    Link { parent: String, child: String },
    /// Remove a nesting link.
    Unlink { parent: String, child: String },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            if let Ok(paths) = ArchivumPaths::resolve() {
                paths.ensure_dirs()?;
                let file = cli.config.clone().unwrap_or_else(|| paths.config_file());
                if !file.exists() {
                    config.save(&file)?;
                    println!("Wrote config {}", file.display());
                }
            }
            let engine = Engine::new(config)?;
            engine.persist()?;
            if let Some(dir) = &engine.config().data_dir {
                println!("Initialized archivum at {}", dir.display());
            }
            println!("{}", engine.info());
        }

        Commands::Info => {
            let engine = Engine::new(config)?;
            if json {
                print_json(&engine.info())?;
            } else {
                println!("{}", engine.info());
            }
        }

        Commands::List => {
            let engine = Engine::new(config)?;
            let items = engine.list_content();
            if items.is_empty() {
                println!("No content.");
            }
            for (id, uri, class) in items {
                println!("  {id}  {uri} [{class}]");
            }
        }

        Commands::Add {
            class,
            uri,
            title,
            category,
            source,
        } => {
            let engine = Engine::new(config)?;
            let target = category
                .map(|c| engine.resolve_category(&c))
                .transpose()?;
            let mut new = NewContent::new(class);
            if let Some(uri) = uri {
                new = new.uri(uri);
            }
            if let Some(title) = title {
                new = new.property("title", title);
            }
            if let Some(source) = source.into_source()? {
                new = new.source(source);
            }
            let created = engine.create_content(new)?;
            if let Some(cat) = target {
                engine.add_at_end(cat, created.id)?;
            }
            engine.persist()?;
            if json {
                print_json(&created)?;
            } else {
                println!("Added {} / {}", created.uri, created.id);
                print_outcome(&created.indexing);
            }
        }

        Commands::Delete { uri } => {
            let engine = Engine::new(config)?;
            let id = engine.content_id(&uri)?;
            engine.delete_content(id)?;
            engine.persist()?;
            println!("Deleted {uri}");
        }

        Commands::Reindex { uri, source } => {
            let engine = Engine::new(config)?;
            let id = engine.content_id(&uri)?;
            let Some(source) = source.into_source()? else {
                miette::bail!("reindex needs --file, --text or --html");
            };
            let class = engine.content(id)?.class;
            let outcome = engine.index_content(id, &class, &source)?;
            engine.persist()?;
            if json {
                print_json(&outcome)?;
            } else {
                print_outcome(&outcome);
            }
        }

        Commands::Search { query, category } => {
            let engine = Engine::new(config)?;
            let scope = category
                .map(|c| engine.resolve_category(&c))
                .transpose()?;
            let results = engine.search(&query, scope)?;
            if json {
                print_json(&results)?;
            } else {
                println!("{}", results.caption);
                for (i, record) in results.records.iter().enumerate() {
                    let title = record
                        .properties
                        .get("title")
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    let categories: Vec<&str> =
                        record.categories.iter().map(|c| c.name.as_str()).collect();
                    println!(
                        "  {}. {} [{}] {} (matched: {}){}",
                        i + 1,
                        record.uri,
                        record.class,
                        title,
                        record.matched_words,
                        if categories.is_empty() {
                            String::new()
                        } else {
                            format!(" in {}", categories.join(", "))
                        }
                    );
                }
            }
        }

        Commands::Category { action } => {
            let engine = Engine::new(config)?;
            run_category(&engine, action, json)?;
        }
    }

    Ok(())
}

fn run_category(engine: &Engine, action: CategoryAction, json: bool) -> Result<()> {
    let content = |uri: &str| -> Result<NodeId> { Ok(engine.content_id(uri)?) };

    match action {
        CategoryAction::Create { name, remarks } => {
            let id = engine.create_category(&name, remarks)?;
            println!("Created category \"{name}\" / {id}");
        }
        CategoryAction::Delete { category } => {
            let id = engine.resolve_category(&category)?;
            let removed = engine.delete_category(id)?;
            println!("Deleted category \"{}\"", removed.name);
        }
        CategoryAction::List => {
            let all = engine.list_categories();
            if json {
                return print_json(&all);
            }
            if all.is_empty() {
                println!("No categories.");
            }
            for c in &all {
                println!(
                    "  {} / {}{} ({} items, {} subcategories)",
                    c.name,
                    c.id,
                    if c.pinned { " [pinned]" } else { "" },
                    c.members,
                    c.subcategories
                );
            }
            return Ok(());
        }
        CategoryAction::Pin { category, off } => {
            let id = engine.resolve_category(&category)?;
            engine.set_pinned(id, !off)?;
            println!("{} \"{category}\"", if off { "Unpinned" } else { "Pinned" });
        }
        CategoryAction::Show { category } => {
            let id = engine.resolve_category(&category)?;
            let members = engine.ordered_members(id)?;
            if json {
                return print_json(&members);
            }
            println!("Category {id} ({} items):", members.len());
            for (i, m) in members.iter().enumerate() {
                let uri = engine.content(m.item)?.uri;
                println!("  {}. {} (position {})", i + 1, uri, m.position);
            }
            return Ok(());
        }
        CategoryAction::Add { category, uri, top } => {
            let cat = engine.resolve_category(&category)?;
            let item = content(&uri)?;
            let position = if top {
                engine.add_at_beginning(cat, item)?
            } else {
                engine.add_at_end(cat, item)?
            };
            println!("Placed {uri} at position {position}");
        }
        CategoryAction::After {
            category,
            uri,
            anchor,
        } => {
            let cat = engine.resolve_category(&category)?;
            let position = engine.add_after(cat, content(&uri)?, content(&anchor)?)?;
            println!("Placed {uri} at position {position}");
        }
        CategoryAction::Swap { category, a, b } => {
            let cat = engine.resolve_category(&category)?;
            engine.swap(cat, content(&a)?, content(&b)?)?;
            println!("Swapped {a} and {b}");
        }
        CategoryAction::Move { category, uri, n } => {
            let cat = engine.resolve_category(&category)?;
            let position = engine.reposition_after_nth(cat, content(&uri)?, n)?;
            println!("Moved {uri} to position {position}");
        }
        CategoryAction::Relocate {
            from,
            to,
            uris,
            after,
        } => {
            let from = engine.resolve_category(&from)?;
            let to = engine.resolve_category(&to)?;
            let items = uris
                .iter()
                .map(|u| content(u))
                .collect::<Result<Vec<_>>>()?;
            let placement = match after {
                Some(anchor) => Placement::After(content(&anchor)?),
                None => Placement::End,
            };
            let report = engine.relocate_across_categories(&items, from, to, placement)?;
            if json {
                print_json(&report)?;
            } else {
                println!("Moved {} of {} items", report.moved, items.len());
                for (id, reason) in &report.failed {
                    println!("  failed {id}: {reason}");
                }
            }
        }
        CategoryAction::Link { parent, child } => {
            let p = engine.resolve_category(&parent)?;
            let c = engine.resolve_category(&child)?;
            engine.link_subcategory(p, c)?;
            println!("Linked \"{child}\" under \"{parent}\"");
        }
        CategoryAction::Unlink { parent, child } => {
            let p = engine.resolve_category(&parent)?;
            let c = engine.resolve_category(&child)?;
            if engine.unlink_subcategory(p, c)? {
                println!("Unlinked \"{child}\" from \"{parent}\"");
            } else {
                println!("\"{child}\" was not linked under \"{parent}\"");
            }
        }
    }

    engine.persist()?;
    Ok(())
}

impl SourceArgs {
    fn into_source(self) -> Result<Option<ContentSource>> {
        if let Some(text) = self.text {
            return Ok(Some(ContentSource::Text(text)));
        }
        if let Some(html) = self.html {
            return Ok(Some(ContentSource::Html(html)));
        }
        let Some(path) = self.file else {
            return Ok(None);
        };
        match self.format {
            Some(name) => {
                let Some(format) = ContentFormat::parse(&name) else {
                    miette::bail!("unknown format \"{name}\" (expected text, html, pdf or epub)");
                };
                let data = std::fs::read(&path).into_diagnostic()?;
                Ok(Some(ContentSource::Bytes {
                    data,
                    format: Some(format),
                }))
            }
            None => Ok(Some(ContentSource::File(path))),
        }
    }
}

/// Config from `--config`, else the XDG config file, else defaults. The data
/// directory flag overrides the file.
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let paths = ArchivumPaths::resolve();
    let mut config = match (&cli.config, &paths) {
        (Some(file), _) => EngineConfig::load(file)?,
        (None, Ok(paths)) => EngineConfig::load_or_default(&paths.config_file())?,
        (None, Err(_)) => EngineConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if config.data_dir.is_none() {
        config.data_dir = Some(paths?.default_data_dir());
    }
    Ok(config)
}

fn print_outcome(outcome: &IndexOutcome) {
    match outcome {
        IndexOutcome::Indexed {
            format,
            words,
            changes,
        } => println!(
            "Indexed {words} words from {format} (+{} -{} ={})",
            changes.added, changes.removed, changes.kept
        ),
        IndexOutcome::Skipped { reason } => println!("Not indexed: {reason}"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
