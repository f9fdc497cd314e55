//! In-memory collection tree
//!
//! The tree is stored as an arena of nodes addressed by [`NodeId`]. The root
//! is always the collection node. Aggregates (size, duration, folder and file
//! counts) are not stored: every call walks the current subtree again.

use std::fmt::Write as _;

use crate::error::ScanError;
use crate::models::{AudioFormat, AudioTags, CollectionSummary};

/// Default name of the collection root
pub const DEFAULT_COLLECTION_NAME: &str = "AudioCollection";

/// Handle to a node inside a [`CollectionTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The four node kinds of a collection
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Collection,
    Volume,
    Folder,
    File(AudioTags),
}

impl NodeKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Collection => "collection",
            NodeKind::Volume => "volume",
            NodeKind::Folder => "folder",
            NodeKind::File(_) => "file",
        }
    }

    /// Whether a node of kind `child` may hang directly below this one
    fn accepts(&self, child: &NodeKind) -> bool {
        match self {
            NodeKind::Collection => matches!(child, NodeKind::Volume),
            NodeKind::Volume | NodeKind::Folder => {
                matches!(child, NodeKind::Folder | NodeKind::File(_))
            }
            NodeKind::File(_) => false,
        }
    }
}

/// A single node of the tree
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Tag record for file nodes
    pub fn tags(&self) -> Option<&AudioTags> {
        match &self.kind {
            NodeKind::File(tags) => Some(tags),
            _ => None,
        }
    }

    /// Audio format inferred from the node name
    pub fn format(&self) -> AudioFormat {
        AudioFormat::from_file_name(&self.name)
    }
}

/// Collection → volumes → folders → files
#[derive(Debug, Clone)]
pub struct CollectionTree {
    nodes: Vec<Node>,
}

impl Default for CollectionTree {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION_NAME)
    }
}

impl CollectionTree {
    /// Create a tree holding only the collection root
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                name: name.into(),
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Collection,
            }],
        }
    }

    /// The collection root
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Get a node by handle
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this tree. Use [`Self::get`] for
    /// handles of unknown origin.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Get a node by handle, or `None` if this tree has no such node
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Total number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Attach a new node below `parent`
    ///
    /// Fails with a structural error when the pairing breaks the nesting
    /// rules: only volumes under the collection, only folders and files under
    /// volumes and folders, nothing under files.
    pub fn attach(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId, ScanError> {
        let name = name.into();
        let parent_node = self
            .get(parent)
            .ok_or_else(|| ScanError::structural(&name, "Parent node does not exist in this tree"))?;
        if !parent_node.kind.accepts(&kind) {
            return Err(ScanError::structural(
                &name,
                format!(
                    "A {} cannot be attached below the {} {:?}",
                    kind.as_str(),
                    parent_node.kind.as_str(),
                    parent_node.name
                ),
            ));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Attach a volume to the collection root
    pub fn add_volume(&mut self, name: impl Into<String>) -> Result<NodeId, ScanError> {
        self.attach(self.root(), name, NodeKind::Volume)
    }

    /// Attach a folder below a volume or folder
    pub fn add_folder(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, ScanError> {
        self.attach(parent, name, NodeKind::Folder)
    }

    /// Attach an audio file below a volume or folder
    pub fn add_file(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        tags: AudioTags,
    ) -> Result<NodeId, ScanError> {
        self.attach(parent, name, NodeKind::File(tags))
    }

    /// Depth of a node, the root being at depth 1
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 1;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Total byte size of the subtree
    pub fn size(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        match &node.kind {
            NodeKind::File(tags) => tags.size,
            _ => node.children.iter().map(|&c| self.size(c)).sum(),
        }
    }

    /// Total duration of the subtree in seconds
    pub fn duration(&self, id: NodeId) -> f64 {
        let node = self.node(id);
        match &node.kind {
            NodeKind::File(tags) => tags.duration,
            _ => node.children.iter().map(|&c| self.duration(c)).sum(),
        }
    }

    /// Number of folder nodes anywhere below this node
    ///
    /// Volumes are never counted, so the collection reports the folders held
    /// by its volumes.
    pub fn folder_count(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        match &node.kind {
            NodeKind::File(_) => 0,
            NodeKind::Collection => node.children.iter().map(|&c| self.folder_count(c)).sum(),
            NodeKind::Volume | NodeKind::Folder => {
                let direct = node
                    .children
                    .iter()
                    .filter(|&&c| matches!(self.node(c).kind, NodeKind::Folder))
                    .count() as u64;
                direct
                    + node
                        .children
                        .iter()
                        .map(|&c| self.folder_count(c))
                        .sum::<u64>()
            }
        }
    }

    /// Number of audio files anywhere below this node (1 for a file)
    pub fn file_count(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        match &node.kind {
            NodeKind::File(_) => 1,
            _ => node.children.iter().map(|&c| self.file_count(c)).sum(),
        }
    }

    /// Aggregates of the whole collection
    pub fn summary(&self) -> CollectionSummary {
        let root = self.root();
        CollectionSummary {
            name: self.node(root).name.clone(),
            volumes: self.node(root).children.len(),
            folders: self.folder_count(root),
            files: self.file_count(root),
            size: self.size(root),
            duration: self.duration(root),
        }
    }

    /// Render the tree as an indented outline, one node per line
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let root = self.root();
        let _ = writeln!(out, "{}", self.node(root).name);
        self.outline_children(root, "", &mut out);
        out
    }

    fn outline_children(&self, id: NodeId, prefix: &str, out: &mut String) {
        let children = &self.node(id).children;
        for (i, &child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let branch = if last { "└── " } else { "├── " };
            let _ = writeln!(out, "{}{}{}", prefix, branch, self.node(child).name);
            let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
            self.outline_children(child, &next, out);
        }
    }
}
