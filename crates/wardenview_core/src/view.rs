//! Sorting, searching and tag helpers for presenting cached data.

use crate::constants::MAX_TAG_NAME_LEN;
use crate::models::{Folder, Link, LinksByFolder, SortOrder, Tag};
use std::cmp::Ordering;

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Sort folders in place by `order`. Ties keep their id order.
pub fn sort_folders(folders: &mut [Folder], order: SortOrder) {
    folders.sort_by(|a, b| {
        let primary = match order {
            SortOrder::NameAscending => compare_names(&a.name, &b.name),
            SortOrder::NameDescending => compare_names(&b.name, &a.name),
            SortOrder::DateAscending => a.created_at.cmp(&b.created_at),
            SortOrder::DateDescending => b.created_at.cmp(&a.created_at),
        };
        primary.then(a.id.cmp(&b.id))
    });
}

/// Sort links in place by `order`. Ties keep their id order.
pub fn sort_links(links: &mut [Link], order: SortOrder) {
    links.sort_by(|a, b| {
        let primary = match order {
            SortOrder::NameAscending => compare_names(&a.name, &b.name),
            SortOrder::NameDescending => compare_names(&b.name, &a.name),
            SortOrder::DateAscending => a.created_at.cmp(&b.created_at),
            SortOrder::DateDescending => b.created_at.cmp(&a.created_at),
        };
        primary.then(a.id.cmp(&b.id))
    });
}

/// Case-insensitive search over link names, URLs and tag names.
///
/// An empty (or all-whitespace) query matches nothing; callers show the
/// folder tree instead.
pub fn search_links(links_by_folder: &LinksByFolder, query: &str) -> Vec<Link> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    links_by_folder
        .values()
        .flatten()
        .filter(|link| {
            link.name.to_lowercase().contains(&needle)
                || link.url.to_lowercase().contains(&needle)
                || link
                    .tags
                    .iter()
                    .any(|tag| tag.name.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Drop tag names the remote service would reject.
pub fn filter_tag_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && name.chars().count() <= MAX_TAG_NAME_LEN)
        .collect()
}

/// Add every name not already known to `all_tags` as a pending tag.
///
/// # Returns
/// The number of tags added.
pub fn merge_new_tags(all_tags: &mut Vec<Tag>, names: &[String]) -> usize {
    let mut added = 0;
    for name in names {
        if !all_tags.iter().any(|tag| &tag.name == name) {
            all_tags.push(Tag::pending(name.clone()));
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FolderRef;
    use chrono::{TimeZone, Utc};

    fn link(id: i64, name: &str, url: &str, day: u32, tags: &[&str]) -> Link {
        Link {
            id,
            name: name.to_string(),
            url: url.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            tags: tags
                .iter()
                .enumerate()
                .map(|(i, name)| Tag {
                    id: i as i64 + 1,
                    name: name.to_string(),
                })
                .collect(),
            folder: FolderRef {
                id: 1,
                name: "A".to_string(),
                owner_id: 1,
            },
        }
    }

    #[test]
    fn sorts_links_by_each_order() {
        let mut links = vec![
            link(1, "beta", "https://b", 2, &[]),
            link(2, "Alpha", "https://a", 3, &[]),
            link(3, "gamma", "https://c", 1, &[]),
        ];
        let ids = |links: &[Link]| links.iter().map(|l| l.id).collect::<Vec<_>>();

        sort_links(&mut links, SortOrder::NameAscending);
        assert_eq!(ids(&links), vec![2, 1, 3]);
        sort_links(&mut links, SortOrder::NameDescending);
        assert_eq!(ids(&links), vec![3, 1, 2]);
        sort_links(&mut links, SortOrder::DateAscending);
        assert_eq!(ids(&links), vec![3, 1, 2]);
        sort_links(&mut links, SortOrder::DateDescending);
        assert_eq!(ids(&links), vec![2, 1, 3]);
    }

    #[test]
    fn search_matches_name_url_and_tags() {
        let mut map = LinksByFolder::new();
        map.insert(
            1,
            vec![
                link(1, "Rust Book", "https://doc.rust-lang.org", 1, &[]),
                link(2, "Recipes", "https://food.example", 2, &["Cooking"]),
                link(3, "News", "https://NEWS.example", 3, &[]),
            ],
        );

        let found = |q: &str| search_links(&map, q).iter().map(|l| l.id).collect::<Vec<_>>();
        assert_eq!(found("rust"), vec![1]);
        assert_eq!(found("cook"), vec![2]);
        assert_eq!(found("news.EXAMPLE"), vec![3]);
        assert!(found("   ").is_empty());
    }

    #[test]
    fn tag_names_over_limit_are_dropped() {
        let long = "x".repeat(51);
        let exact = "y".repeat(50);
        let names = filter_tag_names(vec![long, exact.clone(), " ok ".to_string(), String::new()]);
        assert_eq!(names, vec![exact, "ok".to_string()]);
    }

    #[test]
    fn merge_adds_only_unknown_names_as_pending() {
        let mut tags = vec![Tag {
            id: 9,
            name: "rust".to_string(),
        }];
        let added = merge_new_tags(&mut tags, &["rust".to_string(), "web".to_string()]);
        assert_eq!(added, 1);
        assert!(tags[1].is_pending());
        assert_eq!(tags[1].name, "web");
    }
}
