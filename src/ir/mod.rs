//! Expression tree data structures for the instruction selector.
//!
//! Trees are stored in a flat arena (`ExprTree`) addressed by [`NodeId`]
//! indices; parent/child relations are indices too, so passes can walk and
//! annotate the tree without shared mutable references. The tree shape is
//! immutable once the parser is done — the tiler keeps its own state in a
//! separate [`crate::tiler::Tiling`].
//!
//! # Expression format
//!
//! ```text
//! MOVE ( MEM ( + ( FP , CONST a ) ) , TEMP j )
//! ```

use std::fmt;

pub mod parser;

pub use parser::parse_line;

/// Index of a node in the [`ExprTree`] arena.
pub type NodeId = u32;

/// Kind tag for an IR node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Move,
    Mem,
    Add,
    Sub,
    Mul,
    Div,
    Const,
    Temp,
    /// Any token outside the keyword set; the node's value holds its text.
    Opaque,
}

impl NodeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Move => "MOVE",
            Self::Mem => "MEM",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Const => "CONST",
            Self::Temp => "TEMP",
            Self::Opaque => "<opaque>",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Literal value for `CONST`/`TEMP` leaves that consumed a value token,
    /// and the original text for `Opaque` leaves.
    pub value: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Flat arena of [`Node`]s plus the root index.
#[derive(Debug, Clone, Default)]
pub struct ExprTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl ExprTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, value: Option<String>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node {
            kind,
            value,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child as usize].parent = Some(parent);
        self.nodes[parent as usize].children.push(child);
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// The `n`-th child of `id`, if present.
    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.node(id).children.get(n).copied()
    }

    /// Label used when printing a node; opaque leaves show their own text.
    pub fn label(&self, id: NodeId) -> &str {
        let node = self.node(id);
        match node.kind {
            NodeKind::Opaque => node.value.as_deref().unwrap_or("?"),
            kind => kind.as_str(),
        }
    }

    /// All node ids in post-order (children before parents), the order every
    /// pass over the tree uses.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if !self.nodes.is_empty() {
            self.visit_post(self.root, &mut order);
        }
        order
    }

    fn visit_post(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.node(id).children {
            self.visit_post(child, out);
        }
        out.push(id);
    }

    /// Glyph-drawn rendering of the tree, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.nodes.is_empty() {
            self.render_node(self.root, "", true, &mut out);
        }
        out
    }

    fn render_node(&self, id: NodeId, prefix: &str, is_last: bool, out: &mut String) {
        let node = self.node(id);
        out.push_str(prefix);
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(self.label(id));
        if matches!(node.kind, NodeKind::Const | NodeKind::Temp) {
            if let Some(value) = &node.value {
                out.push_str(" (");
                out.push_str(value);
                out.push(')');
            }
        }
        out.push('\n');

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let count = node.children.len();
        for (idx, &child) in node.children.iter().enumerate() {
            self.render_node(child, &child_prefix, idx + 1 == count, out);
        }
    }
}

impl fmt::Display for ExprTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
