use super::{
    edit_draft, format_choices_output, format_links_output, format_status_output,
    format_tags_output, format_timestamp, format_tree_output, resolve_parent, Cli, Commands,
    StatusReport,
};
use chrono::{TimeZone, Utc};
use clap::Parser;
use wardenview_background::{FolderView, Preferences};
use wardenview_core::folder_ops::FolderChoice;
use wardenview_core::models::{Folder, FolderRef, Link, SortOrder, Tag};

fn folder(id: i64, name: &str) -> Folder {
    Folder {
        id,
        name: name.to_string(),
        owner_id: 1,
        parent_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        icon: None,
        icon_weight: None,
        color: "#0ea5e9".to_string(),
    }
}

fn link(id: i64, name: &str, url: &str, tags: &[&str], folder_id: i64) -> Link {
    Link {
        id,
        name: name.to_string(),
        url: url.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        tags: tags
            .iter()
            .enumerate()
            .map(|(i, name)| Tag {
                id: i as i64 + 1,
                name: name.to_string(),
            })
            .collect(),
        folder: FolderRef {
            id: folder_id,
            name: "Reading".to_string(),
            owner_id: 1,
        },
    }
}

fn report() -> StatusReport {
    StatusReport {
        store: "/tmp/wv.json".to_string(),
        host: Some("https://links.example".to_string()),
        configured: true,
        last_update: Some(0),
        refresh_due: false,
        folders: 2,
        links: 5,
        open_folders: vec![1],
        preferences: Preferences::default(),
    }
}

#[test]
fn parses_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["wv", "tree", "--json", "--store", "/tmp/x.json"])
        .expect("parse");
    assert!(cli.json);
    assert_eq!(cli.store.as_deref(), Some("/tmp/x.json"));
    assert!(matches!(cli.command, Commands::Tree));
}

#[test]
fn parses_add_with_repeated_tags() {
    let cli = Cli::try_parse_from([
        "wv",
        "add",
        "https://example.com",
        "--folder",
        "4",
        "--tag",
        "rust",
        "--tag",
        "async",
    ])
    .expect("parse");
    match cli.command {
        Commands::Add {
            url,
            title,
            folder,
            tags,
        } => {
            assert_eq!(url, "https://example.com");
            assert_eq!(title, None);
            assert_eq!(folder, Some(4));
            assert_eq!(tags, vec!["rust", "async"]);
        }
        _ => panic!("expected add"),
    }
}

#[test]
fn configure_validates_sort_orders() {
    let cli = Cli::try_parse_from([
        "wv",
        "configure",
        "--host",
        "https://links.example",
        "--token",
        "t",
        "--sort-links",
        "date_descending",
    ])
    .expect("parse");
    match cli.command {
        Commands::Configure {
            sort_links,
            sort_folders,
            ..
        } => {
            assert_eq!(sort_links, Some(SortOrder::DateDescending));
            assert_eq!(sort_folders, None);
        }
        _ => panic!("expected configure"),
    }

    assert!(Cli::try_parse_from([
        "wv",
        "configure",
        "--host",
        "h",
        "--token",
        "t",
        "--sort-folders",
        "sideways",
    ])
    .is_err());
}

#[test]
fn mvdir_rename_keeps_the_current_parent() {
    let cli = Cli::try_parse_from(["wv", "mvdir", "2", "--name", "Renamed"]).expect("parse");
    let Commands::Mvdir { id, name, parent } = cli.command else {
        panic!("expected mvdir");
    };
    assert_eq!(id, 2);
    assert_eq!(name.as_deref(), Some("Renamed"));
    assert_eq!(parent, None);

    let mut nested = folder(2, "Rust");
    nested.parent_id = Some(1);
    assert_eq!(resolve_parent(&nested, parent), 1);
    assert_eq!(resolve_parent(&folder(3, "Top"), None), 0);
}

#[test]
fn mvdir_explicit_parent_wins() {
    let cli = Cli::try_parse_from(["wv", "mvdir", "2", "--parent", "0"]).expect("parse");
    let Commands::Mvdir { parent, .. } = cli.command else {
        panic!("expected mvdir");
    };
    let mut nested = folder(2, "Rust");
    nested.parent_id = Some(1);
    assert_eq!(resolve_parent(&nested, parent), 0);
}

#[test]
fn timestamps_render_as_rfc3339_or_never() {
    assert_eq!(format_timestamp(None), "never");
    assert_eq!(format_timestamp(Some(0)), "1970-01-01T00:00:00+00:00");
}

#[test]
fn status_output_text_and_json() {
    let text = format_status_output(&report(), false).expect("text");
    assert!(text.contains("host:        https://links.example"));
    assert!(text.contains("last update: 1970-01-01T00:00:00+00:00"));
    assert!(text.contains("sorting:     links name_ascending, folders name_ascending"));

    let json = format_status_output(&report(), true).expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["refreshDue"], false);
    assert_eq!(value["openFolders"], serde_json::json!([1]));
    assert_eq!(value["preferences"]["sortLinks"], "name_ascending");
}

#[test]
fn tree_output_indents_children_and_links() {
    let mut child = folder(2, "Rust");
    child.parent_id = Some(1);
    let rows = vec![
        FolderView {
            folder: folder(1, "Reading"),
            depth: 0,
            is_open: true,
            link_count: 1,
            links: vec![link(10, "Zebra", "https://z.example", &["animals"], 1)],
        },
        FolderView {
            folder: child,
            depth: 1,
            is_open: false,
            link_count: 3,
            links: Vec::new(),
        },
    ];

    let text = format_tree_output(&rows, false).expect("text");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[-] Reading (#1, 1 links)",
            "    - Zebra <https://z.example> [animals]",
            "  [+] Rust (#2, 3 links)",
        ]
    );

    let json = format_tree_output(&rows, true).expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value[1]["depth"], 1);
    assert_eq!(value[1]["open"], false);
    assert_eq!(value[0]["links"][0]["id"], 10);
}

#[test]
fn links_and_tags_output() {
    let links = vec![link(11, "Apple pie", "https://pie.example", &[], 1)];
    let text = format_links_output(&links, false).expect("text");
    assert_eq!(text, "11       - Apple pie <https://pie.example>");

    let tags = vec![Tag {
        id: 3,
        name: "food".to_string(),
    }];
    assert_eq!(format_tags_output(&tags, false).expect("text"), "3        food");
    let json = format_tags_output(&tags, true).expect("json");
    assert!(json.contains("\"name\": \"food\""));
}

#[test]
fn choices_output_lists_paths() {
    let choices = vec![
        FolderChoice {
            id: 1,
            path: "Reading".to_string(),
        },
        FolderChoice {
            id: 2,
            path: "Reading / Rust".to_string(),
        },
    ];
    assert_eq!(
        format_choices_output(&choices),
        "1        Reading\n2        Reading / Rust"
    );
}

#[test]
fn edit_draft_fills_from_cache() {
    let cached = link(20, "Tokio docs", "https://tokio.rs", &["rust"], 2);
    let draft = edit_draft(
        Some(&cached),
        20,
        None,
        Some("Tokio".to_string()),
        None,
        None,
    )
    .expect("draft");
    assert_eq!(draft.url, "https://tokio.rs");
    assert_eq!(draft.title, "Tokio");
    assert_eq!(draft.collection_id, 2);
    assert_eq!(draft.tags, vec!["rust"]);
}

#[test]
fn edit_draft_without_cache_needs_every_field() {
    let err = edit_draft(None, 5, Some("https://x".to_string()), None, Some(1), None)
        .expect_err("title missing");
    assert_eq!(err, "link 5 is not cached; pass --title");

    let draft = edit_draft(
        None,
        5,
        Some("https://x".to_string()),
        Some("X".to_string()),
        Some(1),
        None,
    )
    .expect("draft");
    assert!(draft.tags.is_empty());
}
