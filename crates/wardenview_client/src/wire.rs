//! JSON shapes exchanged with the Linkwarden API.

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wardenview_core::color::normalize_optional_color;
use wardenview_core::constants::ROOT_PARENT_SENTINEL;
use wardenview_core::models::{Folder, FolderId, FolderRef, Link, LinkDraft, Tag};

/// Every API payload is wrapped as `{"response": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteCollection {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub owner_id: i64,
    #[serde(default)]
    pub parent_id: Option<FolderId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_weight: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<RemoteCollection> for Folder {
    fn from(value: RemoteCollection) -> Self {
        Self {
            id: value.id,
            name: value.name,
            owner_id: value.owner_id,
            parent_id: value.parent_id.filter(|id| *id != 0),
            created_at: value.created_at,
            icon: value.icon,
            icon_weight: value.icon_weight,
            color: normalize_optional_color(value.color.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteCollectionRef {
    pub id: FolderId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteTag {
    pub id: i64,
    pub name: String,
}

impl From<RemoteTag> for Tag {
    fn from(value: RemoteTag) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteLink {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub import_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<RemoteTag>,
    pub collection: RemoteCollectionRef,
}

impl From<RemoteLink> for Link {
    fn from(value: RemoteLink) -> Self {
        Self {
            id: value.id,
            name: value.name.unwrap_or_default(),
            url: value.url.unwrap_or_default(),
            // Imported links keep their original save time.
            created_at: value.import_date.unwrap_or(value.created_at),
            tags: value.tags.into_iter().map(Tag::from).collect(),
            folder: FolderRef {
                id: value.collection.id,
                name: value.collection.name,
                owner_id: value.collection.owner_id,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TagName<'a> {
    pub name: &'a str,
}

fn tag_names(draft: &LinkDraft) -> Vec<TagName<'_>> {
    draft
        .tags
        .iter()
        .map(|name| TagName {
            name: name.as_str(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub(crate) struct CollectionId {
    pub id: FolderId,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewLinkRequest<'a> {
    pub name: &'a str,
    pub url: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub collection: CollectionId,
    pub tags: Vec<TagName<'a>>,
}

impl<'a> NewLinkRequest<'a> {
    pub fn from_draft(draft: &'a LinkDraft) -> Self {
        Self {
            name: draft.title.as_str(),
            url: draft.url.as_str(),
            kind: "url",
            collection: CollectionId {
                id: draft.collection_id,
            },
            tags: tag_names(draft),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionOwner {
    pub id: FolderId,
    pub owner_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateLinkRequest<'a> {
    pub id: i64,
    pub name: &'a str,
    pub url: &'a str,
    pub collection: CollectionOwner,
    pub tags: Vec<TagName<'a>>,
}

impl<'a> UpdateLinkRequest<'a> {
    pub fn from_draft(draft: &'a LinkDraft, collection_owner_id: i64) -> Self {
        Self {
            id: draft.id,
            name: draft.title.as_str(),
            url: draft.url.as_str(),
            collection: CollectionOwner {
                id: draft.collection_id,
                owner_id: collection_owner_id,
            },
            tags: tag_names(draft),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewCollectionRequest<'a> {
    pub name: &'a str,
    pub parent_id: FolderId,
}

/// Overlay a rename/move onto the folder exactly as the server returned it.
///
/// The update endpoint wants the full object; fields set through the
/// service's own UI (icon, color, description, permissions) must survive.
pub(crate) fn overlay_folder_update(
    current: Value,
    id: FolderId,
    name: &str,
    parent_id: FolderId,
) -> Result<Value, ClientError> {
    let Value::Object(mut fields) = current else {
        return Err(ClientError::Decode(format!(
            "folder {} is not a JSON object",
            id
        )));
    };
    fields.insert("id".to_string(), Value::from(id));
    fields.insert("name".to_string(), Value::from(name));
    let parent = if parent_id == 0 {
        Value::from(ROOT_PARENT_SENTINEL)
    } else {
        Value::from(parent_id)
    };
    fields.insert("parentId".to_string(), parent);
    Ok(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_preserves_unrelated_fields() {
        let current = json!({
            "id": 4,
            "name": "Old",
            "parentId": 2,
            "color": "#ff0000",
            "icon": "star",
            "members": [{"userId": 9}]
        });
        let updated = overlay_folder_update(current, 4, "New", 0).expect("overlay");
        assert_eq!(updated["name"], "New");
        assert_eq!(updated["parentId"], "root");
        assert_eq!(updated["color"], "#ff0000");
        assert_eq!(updated["icon"], "star");
        assert_eq!(updated["members"][0]["userId"], 9);

        let moved = overlay_folder_update(updated, 4, "New", 7).expect("overlay");
        assert_eq!(moved["parentId"], 7);
    }

    #[test]
    fn overlay_rejects_non_objects() {
        assert!(overlay_folder_update(json!([1]), 4, "x", 0).is_err());
    }

    #[test]
    fn remote_link_prefers_import_date() {
        let link: RemoteLink = serde_json::from_value(json!({
            "id": 1,
            "name": "n",
            "url": "https://u",
            "createdAt": "2024-05-01T00:00:00.000Z",
            "importDate": "2019-03-04T00:00:00.000Z",
            "tags": [{"id": 2, "name": "t"}],
            "collection": {"id": 3, "name": "c", "ownerId": 5}
        }))
        .expect("link");
        let link = Link::from(link);
        assert_eq!(link.created_at.to_rfc3339(), "2019-03-04T00:00:00+00:00");
        assert_eq!(link.folder.owner_id, 5);

        let plain: RemoteLink = serde_json::from_value(json!({
            "id": 1,
            "url": null,
            "createdAt": "2024-05-01T00:00:00Z",
            "importDate": null,
            "collection": {"id": 3}
        }))
        .expect("link");
        let plain = Link::from(plain);
        assert_eq!(plain.created_at.to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(plain.url, "");
    }

    #[test]
    fn collection_color_and_zero_parent_are_normalized() {
        let remote: RemoteCollection = serde_json::from_value(json!({
            "id": 1,
            "name": "A",
            "ownerId": 2,
            "parentId": 0,
            "createdAt": "2024-01-01T00:00:00Z",
            "color": "#ABC"
        }))
        .expect("collection");
        let folder = Folder::from(remote);
        assert_eq!(folder.color, "#aabbcc");
        assert!(folder.parent_id.is_none());
    }

    #[test]
    fn link_requests_send_tag_names() {
        let draft = LinkDraft {
            id: 12,
            url: "https://e".to_string(),
            title: "E".to_string(),
            collection_id: 5,
            tags: vec!["a".to_string(), "b".to_string()],
        };
        let create = serde_json::to_value(NewLinkRequest::from_draft(&draft)).expect("create");
        assert_eq!(
            create,
            json!({"name": "E", "url": "https://e", "type": "url", "collection": {"id": 5},
                   "tags": [{"name": "a"}, {"name": "b"}]})
        );
        let update = serde_json::to_value(UpdateLinkRequest::from_draft(&draft, 8)).expect("update");
        assert_eq!(update["collection"], json!({"id": 5, "ownerId": 8}));
        assert_eq!(update["id"], 12);
    }
}
