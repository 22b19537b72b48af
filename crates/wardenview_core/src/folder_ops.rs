//! Folder tree operations over a cached folder list.
//!
//! The remote service does not stop a folder from being moved under its own
//! descendant, and a cached list may be inconsistent (dangling parents, or
//! cycles introduced elsewhere). Every walk here is bounded by a visited set.

use crate::error::AppError;
use crate::models::{Folder, FolderId};
use std::collections::{HashMap, HashSet};

fn index_by_id(folders: &[Folder]) -> HashMap<FolderId, &Folder> {
    folders.iter().map(|folder| (folder.id, folder)).collect()
}

/// Look up the parent of `folder` in `folders`.
///
/// # Returns
/// `None` for root folders and for folders whose parent is not in the list.
pub fn parent_of<'a>(folders: &'a [Folder], folder: &Folder) -> Option<&'a Folder> {
    let parent_id = folder.parent()?;
    folders.iter().find(|candidate| candidate.id == parent_id)
}

/// Parent id that actually resolves within `folders`.
///
/// A parent id missing from the snapshot is treated as root.
pub fn effective_parent(folders: &[Folder], folder: &Folder) -> Option<FolderId> {
    parent_of(folders, folder).map(|parent| parent.id)
}

/// Folders displayed at the top level of the tree.
///
/// Folders caught in a parent cycle never sit below a real root, so the
/// lowest-id member of each such cycle is listed at the top level as well.
pub fn root_folders(folders: &[Folder]) -> Vec<&Folder> {
    let mut roots: Vec<&Folder> = folders
        .iter()
        .filter(|folder| effective_parent(folders, folder).is_none())
        .collect();

    let mut reached = HashSet::new();
    for root in &roots {
        mark_subtree(folders, root.id, &mut reached);
    }
    let by_id = index_by_id(folders);
    for folder in folders {
        if reached.contains(&folder.id) {
            continue;
        }
        if let Some(member) = lowest_cycle_member(&by_id, folder) {
            mark_subtree(folders, member.id, &mut reached);
            roots.push(member);
        }
    }
    roots
}

fn mark_subtree(folders: &[Folder], id: FolderId, reached: &mut HashSet<FolderId>) {
    let mut stack = vec![id];
    while let Some(id) = stack.pop() {
        if reached.insert(id) {
            stack.extend(subfolders(folders, id).into_iter().map(|child| child.id));
        }
    }
}

/// Walk up from `start` and return the lowest-id folder of the cycle the
/// chain runs into, or `None` when the chain ends at a root.
fn lowest_cycle_member<'a>(
    by_id: &HashMap<FolderId, &'a Folder>,
    start: &'a Folder,
) -> Option<&'a Folder> {
    let mut path: Vec<&Folder> = Vec::new();
    let mut current = start;
    loop {
        if let Some(pos) = path.iter().position(|seen| seen.id == current.id) {
            return path[pos..].iter().copied().min_by_key(|folder| folder.id);
        }
        path.push(current);
        current = by_id.get(&current.parent()?).copied()?;
    }
}

/// Direct children of `parent_id`, in list order.
pub fn subfolders(folders: &[Folder], parent_id: FolderId) -> Vec<&Folder> {
    folders
        .iter()
        .filter(|folder| folder.parent() == Some(parent_id))
        .collect()
}

/// Slash-separated path from the root down to `folder`.
///
/// A cyclic parent chain stops at the first repeated folder.
///
/// # Examples
/// A folder `C` under `B` under `A` yields `"A/B/C"`.
pub fn full_path_name(folders: &[Folder], folder: &Folder) -> String {
    let by_id = index_by_id(folders);
    let mut segments = vec![folder.name.as_str()];
    let mut visited = HashSet::from([folder.id]);
    let mut current = folder.parent();

    while let Some(id) = current {
        let Some(parent) = by_id.get(&id) else {
            break;
        };
        if !visited.insert(parent.id) {
            break;
        }
        segments.push(parent.name.as_str());
        current = parent.parent();
    }

    segments.reverse();
    segments.join("/")
}

/// Returns `true` if placing `folder_id` under `new_parent_id` introduces a cycle.
///
/// # Arguments
/// - `folders`: Full folder list.
/// - `folder_id`: Folder being re-parented.
/// - `new_parent_id`: Proposed parent id; `0` means root and never cycles.
///
/// # Returns
/// `true` when `new_parent_id` is the folder itself or one of its descendants,
/// or when the existing chain above the proposed parent is already cyclic.
pub fn introduces_cycle(folders: &[Folder], folder_id: FolderId, new_parent_id: FolderId) -> bool {
    if new_parent_id == 0 {
        return false;
    }
    let by_id = index_by_id(folders);
    let mut current = Some(new_parent_id);
    let mut visited = HashSet::new();

    while let Some(id) = current {
        if id == folder_id || !visited.insert(id) {
            return true;
        }
        current = by_id.get(&id).and_then(|folder| folder.parent());
    }

    false
}

/// Validate a proposed parent for `folder_id` before it is sent remotely.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the parent is not a known folder and
/// [`AppError::BadRequest`] when the move would make the folder its own
/// ancestor.
pub fn ensure_valid_parent(
    folders: &[Folder],
    folder_id: FolderId,
    new_parent_id: FolderId,
) -> Result<(), AppError> {
    if new_parent_id == 0 {
        return Ok(());
    }
    if !folders.iter().any(|folder| folder.id == new_parent_id) {
        return Err(AppError::NotFound);
    }
    if introduces_cycle(folders, folder_id, new_parent_id) {
        return Err(AppError::BadRequest(format!(
            "Folder {} cannot be moved under its own descendant {}",
            folder_id, new_parent_id
        )));
    }
    Ok(())
}

/// Folders that may become the parent of `editing_id`.
///
/// `editing_id == 0` means a new folder, in which case every folder
/// qualifies. Otherwise the folder itself and all of its descendants are
/// removed.
pub fn assignable_parents(folders: &[Folder], editing_id: FolderId) -> Vec<&Folder> {
    if editing_id == 0 {
        return folders.iter().collect();
    }
    folders
        .iter()
        .filter(|candidate| !introduces_cycle(folders, editing_id, candidate.id))
        .collect()
}

/// A parent candidate labelled with its full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderChoice {
    pub id: FolderId,
    pub path: String,
}

/// Parent candidates for `editing_id`, labelled by full path and sorted.
pub fn folder_choices(folders: &[Folder], editing_id: FolderId) -> Vec<FolderChoice> {
    let mut choices: Vec<FolderChoice> = assignable_parents(folders, editing_id)
        .into_iter()
        .map(|folder| FolderChoice {
            id: folder.id,
            path: full_path_name(folders, folder),
        })
        .collect();
    choices.sort_by(|a, b| a.path.cmp(&b.path).then(a.id.cmp(&b.id)));
    choices
}
