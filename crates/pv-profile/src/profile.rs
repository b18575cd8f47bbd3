//! File-tree model: `UserProfile` root aggregate and `FileTreeNode` arena
//!
//! Nodes live in an id-keyed arena; the child→parent relation is a plain
//! id back-pointer, so navigation needs no ownership cycles. Invariants:
//! every non-root node has exactly one parent, and sibling names are
//! unique.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use pv_core::{PvError, PvResult};
use pv_crypto::{ContentHash, NodeKeyPair};

/// Handle to a node in the profile's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

/// The root directory node of every profile.
pub const ROOT: NodeId = NodeId(0);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the synchronized hierarchy: a directory or a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTreeNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    keys: NodeKeyPair,
    /// Content hash, present for files only.
    content_hash: Option<ContentHash>,
}

impl FileTreeNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn key_pair(&self) -> &NodeKeyPair {
        &self.keys
    }

    /// The node's identity / DHT lookup key.
    pub fn public_key(&self) -> VerifyingKey {
        self.keys.public()
    }

    pub fn content_hash(&self) -> Option<&ContentHash> {
        self.content_hash.as_ref()
    }

    pub fn is_file(&self) -> bool {
        self.content_hash.is_some()
    }
}

/// The versioned root aggregate: one user's whole synchronized file tree.
///
/// The version counter is stamped by the synchronization engine on every
/// commit; it is the optimistic-concurrency token carried into the
/// encrypted envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    user_id: String,
    version: u64,
    /// Write-protection key pair, installed into the session at login.
    protection_keys: NodeKeyPair,
    next_id: u32,
    nodes: BTreeMap<u32, FileTreeNode>,
}

impl UserProfile {
    /// Create an empty profile: a lone root directory, version 0.
    pub fn new(user_id: impl Into<String>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            ROOT.0,
            FileTreeNode {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                keys: NodeKeyPair::generate(),
                content_hash: None,
            },
        );
        Self {
            user_id: user_id.into(),
            version: 0,
            protection_keys: NodeKeyPair::generate(),
            next_id: 1,
            nodes,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stamp a new version. Called by the synchronization engine at commit
    /// time; mutating it anywhere else defeats the concurrency check.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn protection_keys(&self) -> &NodeKeyPair {
        &self.protection_keys
    }

    pub fn node(&self, id: NodeId) -> Option<&FileTreeNode> {
        self.nodes.get(&id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve a root-relative path ("docs/report.pdf"). Leading and
    /// trailing slashes are tolerated; the empty path is the root.
    pub fn find_by_path(&self, path: &str) -> PvResult<NodeId> {
        let mut current = ROOT;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .child_by_name(current, segment)
                .ok_or_else(|| PvError::NotFound(format!("path segment '{segment}' in '{path}'")))?;
        }
        Ok(current)
    }

    /// Resolve a node by its identity key. Used when only a key is
    /// available, e.g. during rollback after the path context is gone.
    pub fn find_by_key(&self, key: &VerifyingKey) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.public_key() == *key)
            .map(|(id, _)| NodeId(*id))
    }

    /// Look up a direct child of `parent` by name.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let parent = self.nodes.get(&parent.0)?;
        parent
            .children
            .iter()
            .copied()
            .find(|child| self.nodes.get(&child.0).map(|n| n.name.as_str()) == Some(name))
    }

    /// Create a node under an existing parent.
    ///
    /// `content_hash` present marks a file, absent a directory. Fails with
    /// a structural violation if the parent is missing, the name is empty
    /// or contains a separator, or a sibling already carries the name.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        keys: NodeKeyPair,
        content_hash: Option<ContentHash>,
    ) -> PvResult<NodeId> {
        if name.is_empty() || name.contains('/') {
            return Err(PvError::StructuralViolation(format!(
                "invalid node name: '{name}'"
            )));
        }
        if !self.nodes.contains_key(&parent.0) {
            return Err(PvError::StructuralViolation(format!(
                "parent node {parent} not in tree"
            )));
        }
        if self.child_by_name(parent, name).is_some() {
            return Err(PvError::StructuralViolation(format!(
                "duplicate child name '{name}' under node {parent}"
            )));
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id.0,
            FileTreeNode {
                name: name.to_string(),
                parent: Some(parent),
                children: Vec::new(),
                keys,
                content_hash,
            },
        );
        self.nodes
            .get_mut(&parent.0)
            .expect("parent checked above")
            .children
            .push(id);
        Ok(id)
    }

    /// Detach a node and drop its whole subtree. The root cannot be
    /// removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> PvResult<()> {
        if id == ROOT {
            return Err(PvError::StructuralViolation(
                "cannot remove the root node".into(),
            ));
        }
        let node = self
            .nodes
            .get(&id.0)
            .ok_or_else(|| PvError::NotFound(format!("node {id}")))?;

        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent.0) {
                parent_node.children.retain(|c| *c != id);
            }
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&next.0) {
                pending.extend(removed.children);
            }
        }
        Ok(())
    }

    /// Enumerate all root-relative paths, sorted. Directories and files
    /// alike; the root itself is not listed.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(ROOT, "", &mut out);
        out.sort();
        out
    }

    fn collect_paths(&self, id: NodeId, prefix: &str, out: &mut Vec<String>) {
        let Some(node) = self.nodes.get(&id.0) else {
            return;
        };
        for child_id in &node.children {
            if let Some(child) = self.nodes.get(&child_id.0) {
                let path = if prefix.is_empty() {
                    child.name.clone()
                } else {
                    format!("{prefix}/{}", child.name)
                };
                out.push(path.clone());
                self.collect_paths(*child_id, &path, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_crypto::hash_bytes;

    fn dir(profile: &mut UserProfile, parent: NodeId, name: &str) -> NodeId {
        profile
            .add_child(parent, name, NodeKeyPair::generate(), None)
            .unwrap()
    }

    fn file(profile: &mut UserProfile, parent: NodeId, name: &str) -> NodeId {
        profile
            .add_child(
                parent,
                name,
                NodeKeyPair::generate(),
                Some(hash_bytes(name.as_bytes())),
            )
            .unwrap()
    }

    #[test]
    fn test_new_profile_is_empty_root() {
        let profile = UserProfile::new("alice");
        assert_eq!(profile.version(), 0);
        assert_eq!(profile.node_count(), 1);
        assert!(profile.paths().is_empty());
        assert_eq!(profile.find_by_path("").unwrap(), ROOT);
    }

    #[test]
    fn test_add_and_find_by_path() {
        let mut profile = UserProfile::new("alice");
        let docs = dir(&mut profile, ROOT, "docs");
        let report = file(&mut profile, docs, "report.pdf");

        assert_eq!(profile.find_by_path("docs").unwrap(), docs);
        assert_eq!(profile.find_by_path("docs/report.pdf").unwrap(), report);
        assert_eq!(profile.find_by_path("/docs/report.pdf/").unwrap(), report);
        assert!(matches!(
            profile.find_by_path("docs/missing.txt"),
            Err(PvError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_sibling_name_rejected() {
        let mut profile = UserProfile::new("alice");
        dir(&mut profile, ROOT, "docs");

        let result = profile.add_child(ROOT, "docs", NodeKeyPair::generate(), None);
        assert!(matches!(result, Err(PvError::StructuralViolation(_))));

        // Same name under a different parent is fine.
        let docs = profile.find_by_path("docs").unwrap();
        assert!(profile
            .add_child(docs, "docs", NodeKeyPair::generate(), None)
            .is_ok());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut profile = UserProfile::new("alice");
        for bad in ["", "a/b"] {
            let result = profile.add_child(ROOT, bad, NodeKeyPair::generate(), None);
            assert!(matches!(result, Err(PvError::StructuralViolation(_))), "{bad:?}");
        }
    }

    #[test]
    fn test_missing_parent_rejected() {
        let mut profile = UserProfile::new("alice");
        let ghost = NodeId(99);
        let result = profile.add_child(ghost, "x", NodeKeyPair::generate(), None);
        assert!(matches!(result, Err(PvError::StructuralViolation(_))));
    }

    #[test]
    fn test_find_by_key() {
        let mut profile = UserProfile::new("alice");
        let docs = dir(&mut profile, ROOT, "docs");
        let key = profile.node(docs).unwrap().public_key();

        assert_eq!(profile.find_by_key(&key), Some(docs));
        assert_eq!(
            profile.find_by_key(&NodeKeyPair::generate().public()),
            None
        );
    }

    #[test]
    fn test_remove_subtree_drops_descendants() {
        let mut profile = UserProfile::new("alice");
        let docs = dir(&mut profile, ROOT, "docs");
        let sub = dir(&mut profile, docs, "2024");
        file(&mut profile, sub, "report.pdf");
        file(&mut profile, ROOT, "readme.txt");

        profile.remove_subtree(docs).unwrap();

        assert_eq!(profile.paths(), vec!["readme.txt".to_string()]);
        assert!(profile.node(docs).is_none());
        assert!(profile.node(sub).is_none());
    }

    #[test]
    fn test_remove_root_rejected() {
        let mut profile = UserProfile::new("alice");
        assert!(matches!(
            profile.remove_subtree(ROOT),
            Err(PvError::StructuralViolation(_))
        ));
    }

    #[test]
    fn test_remove_missing_node_is_not_found() {
        let mut profile = UserProfile::new("alice");
        assert!(matches!(
            profile.remove_subtree(NodeId(42)),
            Err(PvError::NotFound(_))
        ));
    }

    #[test]
    fn test_every_node_reachable_by_its_path() {
        let mut profile = UserProfile::new("alice");
        let docs = dir(&mut profile, ROOT, "docs");
        let sub = dir(&mut profile, docs, "2024");
        file(&mut profile, sub, "report.pdf");
        file(&mut profile, docs, "notes.txt");
        file(&mut profile, ROOT, "readme.txt");

        for path in profile.paths() {
            let id = profile.find_by_path(&path).unwrap();
            let node = profile.node(id).unwrap();
            // Non-root nodes resolve to exactly one parent, and that parent
            // lists them as a child.
            let parent = node.parent().expect("non-root node has a parent");
            assert!(profile.node(parent).unwrap().children().contains(&id));
        }
    }

    #[test]
    fn test_files_and_dirs_distinguished_by_hash() {
        let mut profile = UserProfile::new("alice");
        let d = dir(&mut profile, ROOT, "docs");
        let f = file(&mut profile, ROOT, "readme.txt");

        assert!(!profile.node(d).unwrap().is_file());
        assert!(profile.node(f).unwrap().is_file());
    }

    #[test]
    fn test_serde_roundtrip_preserves_tree() {
        let mut profile = UserProfile::new("alice");
        let docs = dir(&mut profile, ROOT, "docs");
        file(&mut profile, docs, "report.pdf");
        profile.set_version(5);

        let json = serde_json::to_string(&profile).unwrap();
        let restored: UserProfile = serde_json::from_str(&json).unwrap();

        assert_eq!(profile, restored);
        assert_eq!(restored.version(), 5);
        assert_eq!(restored.paths(), profile.paths());
    }
}
