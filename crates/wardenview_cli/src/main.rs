//! Command-line front end for the WardenView bookmark cache.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wardenview_background::{
    spawn_background, Dispatcher, FolderView, Preferences, RefreshScheduler, ViewSession,
};
use wardenview_core::folder_ops::FolderChoice;
use wardenview_core::models::{Folder, FolderId, Link, LinkDraft, SortOrder, Tag};
use wardenview_core::{ApiResult, Cache, Config, FileStore};

#[derive(Parser)]
#[command(name = "wv", about = "WardenView bookmark cache CLI", version)]
struct Cli {
    /// Cache file (can also be set via WARDENVIEW_STORE_PATH)
    #[arg(long, global = true)]
    store: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn parse_sort_order(value: &str) -> Result<SortOrder, String> {
    value.parse()
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Store host, token and display preferences
    Configure {
        #[arg(long)]
        host: String,
        #[arg(long)]
        token: String,
        #[arg(long, value_parser = parse_sort_order)]
        sort_links: Option<SortOrder>,
        #[arg(long, value_parser = parse_sort_order)]
        sort_folders: Option<SortOrder>,
        #[arg(long)]
        open_new_tab: Option<bool>,
    },
    /// Show configuration and cache freshness
    Status,
    /// Run a full refresh now
    Refresh,
    /// Print the folder tree
    Tree,
    /// Search cached links by name, URL or tag
    Search { query: String },
    /// List remote tags
    Tags,
    /// Save a new link
    Add {
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        folder: Option<FolderId>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Edit a cached link; omitted fields keep their cached values
    EditLink {
        id: i64,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        folder: Option<FolderId>,
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },
    /// Delete a link
    RmLink { id: i64 },
    /// Create a folder
    Mkdir {
        name: String,
        #[arg(long, default_value_t = 0)]
        parent: FolderId,
    },
    /// Rename and/or move a folder; omitted fields keep their cached values
    /// (`--parent 0` moves it to the top level)
    Mvdir {
        id: FolderId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        parent: Option<FolderId>,
    },
    /// Delete a folder
    Rmdir { id: FolderId },
    /// Open or close a folder in the tree
    Open { folder_id: FolderId },
    /// Keep the cache fresh until interrupted
    Watch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    store: String,
    host: Option<String>,
    configured: bool,
    last_update: Option<i64>,
    refresh_due: bool,
    folders: usize,
    links: usize,
    open_folders: Vec<FolderId>,
    preferences: Preferences,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("response encoding error: {}", err))
}

fn format_timestamp(ms: Option<i64>) -> String {
    ms.and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|stamp| stamp.to_rfc3339())
        .unwrap_or_else(|| "never".to_string())
}

fn format_status_output(report: &StatusReport, json: bool) -> Result<String, String> {
    if json {
        return to_json(report);
    }
    let mut lines = vec![
        format!("store:       {}", report.store),
        format!("host:        {}", report.host.as_deref().unwrap_or("(not set)")),
        format!("configured:  {}", report.configured),
        format!("last update: {}", format_timestamp(report.last_update)),
        format!("refresh due: {}", report.refresh_due),
        format!("folders:     {}", report.folders),
        format!("links:       {}", report.links),
    ];
    lines.push(format!(
        "sorting:     links {}, folders {}",
        report.preferences.sort_links.as_str(),
        report.preferences.sort_folders.as_str()
    ));
    Ok(lines.join("\n"))
}

fn format_link_line(link: &Link, indent: usize) -> String {
    let mut line = format!("{}- {} <{}>", " ".repeat(indent), link.name, link.url);
    if !link.tags.is_empty() {
        let tags: Vec<&str> = link.tags.iter().map(|tag| tag.name.as_str()).collect();
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    line
}

fn format_tree_output(rows: &[FolderView], json: bool) -> Result<String, String> {
    if json {
        let value: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "folder": row.folder,
                    "depth": row.depth,
                    "open": row.is_open,
                    "linkCount": row.link_count,
                    "links": row.links,
                })
            })
            .collect();
        return to_json(&value);
    }

    let mut lines = Vec::new();
    for row in rows {
        let indent = row.depth * 2;
        let marker = if row.is_open { "[-]" } else { "[+]" };
        lines.push(format!(
            "{}{} {} (#{}, {} links)",
            " ".repeat(indent),
            marker,
            row.folder.name,
            row.folder.id,
            row.link_count
        ));
        for link in &row.links {
            lines.push(format_link_line(link, indent + 4));
        }
    }
    Ok(lines.join("\n"))
}

fn format_links_output(links: &[Link], json: bool) -> Result<String, String> {
    if json {
        return to_json(links);
    }
    Ok(links
        .iter()
        .map(|link| format!("{:<8} {}", link.id, format_link_line(link, 0)))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn format_tags_output(tags: &[Tag], json: bool) -> Result<String, String> {
    if json {
        return to_json(tags);
    }
    Ok(tags
        .iter()
        .map(|tag| format!("{:<8} {}", tag.id, tag.name))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn format_choices_output(choices: &[FolderChoice]) -> String {
    choices
        .iter()
        .map(|choice| format!("{:<8} {}", choice.id, choice.path))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_output(action: &str, output: Result<String, String>) {
    match output {
        Ok(output) if output.is_empty() => {}
        Ok(output) => println!("{}", output),
        Err(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

fn exit_on_failure<T>(action: &str, result: ApiResult<T>) -> T {
    match result {
        ApiResult::Success(value) => value,
        ApiResult::Failure(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

/// Build the edit draft for `id`, filling omitted fields from the cache.
fn edit_draft(
    cached: Option<&Link>,
    id: i64,
    url: Option<String>,
    title: Option<String>,
    folder: Option<FolderId>,
    tags: Option<Vec<String>>,
) -> Result<LinkDraft, String> {
    let base = cached.map(Link::to_draft);
    let missing = |field: &str| format!("link {} is not cached; pass --{}", id, field);
    Ok(LinkDraft {
        id,
        url: match url {
            Some(url) => url,
            None => base.as_ref().map(|b| b.url.clone()).ok_or_else(|| missing("url"))?,
        },
        title: match title {
            Some(title) => title,
            None => base
                .as_ref()
                .map(|b| b.title.clone())
                .ok_or_else(|| missing("title"))?,
        },
        collection_id: match folder {
            Some(folder) => folder,
            None => base
                .as_ref()
                .map(|b| b.collection_id)
                .ok_or_else(|| missing("folder"))?,
        },
        tags: tags
            .or_else(|| base.as_ref().map(|b| b.tags.clone()))
            .unwrap_or_default(),
    })
}

/// Parent to send for a folder edit; an omitted `--parent` keeps the current one.
fn resolve_parent(current: &Folder, parent: Option<FolderId>) -> FolderId {
    parent.unwrap_or_else(|| current.parent().unwrap_or(0))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wardenview=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        store,
        json,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    init_tracing();

    let mut config = Config::from_env();
    if let Some(store) = store {
        config.store_path = store;
    }
    let cache = Cache::new(Arc::new(FileStore::new(&config.store_path)));
    let dispatcher = Dispatcher::start(cache.clone(), config.clone()).await?;
    let session = ViewSession::new(spawn_background(dispatcher), cache.clone(), &config);
    let refresh_due = session.initial_load().await?;

    match command {
        // Handled before setup.
        Commands::Completions { .. } => {}
        Commands::Configure {
            host,
            token,
            sort_links,
            sort_folders,
            open_new_tab,
        } => {
            let current = session.state().preferences;
            let preferences = Preferences {
                sort_links: sort_links.unwrap_or(current.sort_links),
                sort_folders: sort_folders.unwrap_or(current.sort_folders),
                open_new_tab: open_new_tab.unwrap_or(current.open_new_tab),
            };
            let configured =
                exit_on_failure("Configure", session.save_options(&host, &token, preferences).await);
            if !configured {
                eprintln!("Configure: host is not a usable http(s) URL");
                std::process::exit(1);
            }
            let had_errors = session.refresh_from_options().await?;
            if had_errors {
                let status = session.status().unwrap_or_default();
                eprintln!("Configure: saved, but the first refresh failed: {}", status);
                std::process::exit(1);
            }
            println!("Configured {}", host.trim().trim_end_matches('/'));
        }
        Commands::Status => {
            let state = session.state();
            let report = StatusReport {
                store: cache.store().path().display().to_string(),
                host: cache.host().await,
                configured: state.configured,
                last_update: state.last_update,
                refresh_due,
                folders: state.folders.len(),
                links: state.links_by_folder.values().map(Vec::len).sum(),
                open_folders: state.open_folders.iter().copied().collect(),
                preferences: state.preferences,
            };
            print_output("Status", format_status_output(&report, json));
        }
        Commands::Refresh => {
            exit_on_failure("Refresh", session.load_all_links().await);
            let state = session.state();
            let links: usize = state.links_by_folder.values().map(Vec::len).sum();
            if json {
                print_output("Refresh", format_tree_output(&session.tree(), true));
            } else {
                println!(
                    "Refreshed {} folders, {} links",
                    state.folders.len(),
                    links
                );
            }
        }
        Commands::Tree => {
            if refresh_due {
                if let ApiResult::Failure(message) = session.load_all_links().await {
                    eprintln!("Refresh failed, showing cached data: {}", message);
                }
            }
            print_output("Tree", format_tree_output(&session.tree(), json));
        }
        Commands::Search { query } => {
            if refresh_due {
                if let ApiResult::Failure(message) = session.load_all_links().await {
                    eprintln!("Refresh failed, searching cached data: {}", message);
                }
            }
            print_output("Search", format_links_output(&session.search(&query), json));
        }
        Commands::Tags => {
            let tags = exit_on_failure("Tags", session.fetch_tags().await);
            print_output("Tags", format_tags_output(&tags, json));
        }
        Commands::Add {
            url,
            title,
            folder,
            tags,
        } => {
            let title = title.unwrap_or_else(|| url.clone());
            let mut draft = session.new_link_draft(&url, &title);
            if let Some(folder) = folder {
                draft.collection_id = folder;
            }
            session.set_draft_tags(&mut draft, tags);
            exit_on_failure("Add", session.save_new_link(&draft).await);
            println!("Saved {}", url);
        }
        Commands::EditLink {
            id,
            url,
            title,
            folder,
            tags,
        } => {
            let state = session.state();
            let cached = state
                .links_by_folder
                .values()
                .flatten()
                .find(|link| link.id == id);
            let mut draft = match edit_draft(cached, id, url, title, folder, tags) {
                Ok(draft) => draft,
                Err(message) => {
                    eprintln!("Edit link failed: {}", message);
                    std::process::exit(1);
                }
            };
            let names = std::mem::take(&mut draft.tags);
            session.set_draft_tags(&mut draft, names);
            exit_on_failure("Edit link", session.save_edited_link(&draft).await);
            println!("Updated link {}", id);
        }
        Commands::RmLink { id } => {
            exit_on_failure("Delete link", session.delete_link(id).await);
            println!("Deleted link {}", id);
        }
        Commands::Mkdir { name, parent } => {
            exit_on_failure("Create folder", session.create_folder(&name, parent).await);
            println!("Created folder {}", name.trim());
        }
        Commands::Mvdir { id, name, parent } => {
            let current = session
                .state()
                .folders
                .into_iter()
                .find(|folder| folder.id == id);
            let Some(current) = current else {
                eprintln!("Move folder failed: folder {} is not cached", id);
                std::process::exit(1);
            };
            let parent = resolve_parent(&current, parent);
            let name = name.unwrap_or(current.name);
            if let ApiResult::Failure(message) =
                session.save_edited_folder(id, &name, parent).await
            {
                eprintln!("Move folder failed: {}", message);
                eprintln!("Valid parents:\n{}", format_choices_output(&session.folder_choices(id)));
                std::process::exit(1);
            }
            println!("Updated folder {}", id);
        }
        Commands::Rmdir { id } => {
            exit_on_failure("Delete folder", session.delete_folder(id).await);
            println!("Deleted folder {}", id);
        }
        Commands::Open { folder_id } => {
            let open = exit_on_failure("Open", session.toggle_folder(folder_id).await);
            if json {
                print_output("Open", format_tree_output(&session.tree(), true));
            } else {
                println!(
                    "Folder {} is now {}",
                    folder_id,
                    if open { "open" } else { "closed" }
                );
            }
        }
        Commands::Watch => {
            if !session.state().configured {
                eprintln!("Watch failed: {}", wardenview_background::UNCONFIGURED_MESSAGE);
                std::process::exit(1);
            }
            let scheduler = RefreshScheduler::start(session.clone(), &config);
            tracing::info!(
                "Watching; refreshing every {} ms (Ctrl-C to stop)",
                config.refresh_interval_ms
            );
            tokio::signal::ctrl_c().await?;
            scheduler.shutdown();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
