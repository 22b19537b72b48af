use super::*;
use chrono::{TimeZone, Utc};
use serde_json::json;

fn folder(id: i64, parent_id: Option<i64>) -> Folder {
    Folder {
        id,
        name: format!("f{}", id),
        owner_id: 1,
        parent_id,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        icon: None,
        icon_weight: None,
        color: "#0ea5e9".to_string(),
    }
}

#[test]
fn zero_parent_reads_as_root() {
    assert!(folder(1, None).is_root());
    assert!(folder(1, Some(0)).is_root());
    assert_eq!(folder(2, Some(1)).parent(), Some(1));
}

#[test]
fn folder_serializes_with_camel_case_keys() {
    let value = serde_json::to_value(folder(3, Some(1))).expect("serialize");
    assert_eq!(value["ownerId"], 1);
    assert_eq!(value["parentId"], 1);
    assert!(value.get("icon").is_none());

    let parsed: Folder = serde_json::from_value(value).expect("deserialize");
    assert_eq!(parsed.parent(), Some(1));
}

#[test]
fn links_by_folder_uses_string_keys_on_the_wire() {
    let link = Link {
        id: 10,
        name: "Rust".to_string(),
        url: "https://rust-lang.org".to_string(),
        created_at: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap(),
        tags: vec![Tag {
            id: 4,
            name: "lang".to_string(),
        }],
        folder: folder(7, None).to_ref(),
    };
    let mut map = LinksByFolder::new();
    map.insert(7, vec![link.clone()]);

    let value = serde_json::to_value(&map).expect("serialize");
    assert!(value.get("7").is_some());

    let parsed: LinksByFolder = serde_json::from_value(value).expect("deserialize");
    assert_eq!(parsed.get(&7).map(Vec::len), Some(1));

    let draft = link.to_draft();
    assert_eq!(draft.collection_id, 7);
    assert_eq!(draft.tags, vec!["lang".to_string()]);
}

#[test]
fn draft_defaults_missing_fields() {
    let draft: LinkDraft =
        serde_json::from_value(json!({"url": "https://example.com"})).expect("draft");
    assert_eq!(draft.id, 0);
    assert_eq!(draft.collection_id, 0);
    assert!(draft.tags.is_empty());
}

#[test]
fn sort_order_round_trips_option_strings() {
    for order in [
        SortOrder::NameAscending,
        SortOrder::NameDescending,
        SortOrder::DateAscending,
        SortOrder::DateDescending,
    ] {
        assert_eq!(order.as_str().parse::<SortOrder>(), Ok(order));
        assert_eq!(serde_json::to_value(order).expect("serialize"), json!(order.as_str()));
    }
    assert!("sideways".parse::<SortOrder>().is_err());
}
