use super::ast::{BinaryOp, Node, UnaryOp};
use super::error::TransformError;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Var(String),
    Str(String),
    Num(i64),
    Bool(bool),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl Label {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Label::Unary(_) | Label::Binary(_))
    }

    fn arity(&self) -> usize {
        match self {
            Label::Unary(_) => 1,
            Label::Binary(_) => 2,
            _ => 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Label::Var(_) => "Var",
            Label::Str(_) => "Str",
            Label::Num(_) => "Num",
            Label::Bool(_) => "Bool",
            Label::Unary(UnaryOp::Not) => "Not",
            Label::Unary(_) => "UnaryTemporal",
            Label::Binary(op) if op.is_comparator() => "Comparator",
            Label::Binary(op) if op.is_arithmetic() => "Arithmetic",
            Label::Binary(op) if op.is_temporal() => "BinaryTemporal",
            Label::Binary(_) => "Binary",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Var(name) => f.write_str(name),
            Label::Str(value) => write!(f, "\"{value}\""),
            Label::Num(n) => write!(f, "{n}"),
            Label::Bool(true) => f.write_str("TRUE"),
            Label::Bool(false) => f.write_str("FALSE"),
            Label::Unary(op) => f.write_str(op.symbol()),
            Label::Binary(op) => f.write_str(op.symbol()),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    label: Label,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Syntax tree stored as an arena with parent links.
///
/// Rewrites (splicing subtrees, relabelling terminals) work in place on
/// node ids; convert back with [`Tree::to_ast`] when done. Removed nodes
/// leave empty slots so ids stay stable.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    slots: Vec<Option<Slot>>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn from_ast(node: &Node) -> Self {
        let mut tree = Tree::default();
        let root = tree.insert(node, None);
        tree.root = Some(root);
        tree
    }

    fn insert(&mut self, node: &Node, parent: Option<NodeId>) -> NodeId {
        let (label, operands): (Label, Vec<&Node>) = match node {
            Node::Var(name) => (Label::Var(name.clone()), Vec::new()),
            Node::Str(value) => (Label::Str(value.clone()), Vec::new()),
            Node::Num(n) => (Label::Num(*n), Vec::new()),
            Node::Bool(b) => (Label::Bool(*b), Vec::new()),
            Node::Unary { op, operand } => (Label::Unary(*op), vec![operand.as_ref()]),
            Node::Binary { op, left, right } => {
                (Label::Binary(*op), vec![left.as_ref(), right.as_ref()])
            }
        };
        let id = self.slots.len();
        self.slots.push(Some(Slot {
            label,
            parent,
            children: Vec::with_capacity(operands.len()),
        }));
        for operand in operands {
            let child = self.insert(operand, Some(id));
            if let Some(slot) = self.slots[id].as_mut() {
                slot.children.push(child);
            }
        }
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, TransformError> {
        self.slots
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(TransformError::UnknownNode(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, TransformError> {
        self.slots
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(TransformError::UnknownNode(id))
    }

    pub fn label(&self, id: NodeId) -> Result<&Label, TransformError> {
        Ok(&self.slot(id)?.label)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TransformError> {
        Ok(self.slot(id)?.parent)
    }

    /// Operands of `id`, in position order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TransformError> {
        Ok(&self.slot(id)?.children)
    }

    /// Ids of all live nodes, in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|_| id))
    }

    pub fn len(&self) -> usize {
        self.node_ids().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// `(parent, child, position)` for every edge.
    pub fn edges(&self) -> Vec<(NodeId, NodeId, usize)> {
        let mut out = Vec::new();
        for id in self.node_ids() {
            if let Ok(children) = self.children(id) {
                for (pos, child) in children.iter().enumerate() {
                    out.push((id, *child, pos));
                }
            }
        }
        out
    }

    pub fn variables(&self) -> BTreeSet<String> {
        self.node_ids()
            .filter_map(|id| match self.label(id) {
                Ok(Label::Var(name)) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn to_ast(&self) -> Result<Node, TransformError> {
        let root = self.root.ok_or(TransformError::EmptyTree)?;
        self.subtree_to_ast(root)
    }

    pub fn subtree_to_ast(&self, id: NodeId) -> Result<Node, TransformError> {
        let slot = self.slot(id)?;
        let node = match (&slot.label, slot.children.as_slice()) {
            (Label::Var(name), []) => Node::Var(name.clone()),
            (Label::Str(value), []) => Node::Str(value.clone()),
            (Label::Num(n), []) => Node::Num(*n),
            (Label::Bool(b), []) => Node::Bool(*b),
            (Label::Unary(op), [operand]) => Node::unary(*op, self.subtree_to_ast(*operand)?),
            (Label::Binary(op), [left, right]) => Node::binary(
                *op,
                self.subtree_to_ast(*left)?,
                self.subtree_to_ast(*right)?,
            ),
            _ => {
                return Err(TransformError::BadRelabel {
                    id,
                    reason: "operand count does not match the operator",
                });
            }
        };
        Ok(node)
    }

    /// Replace the label of a node, keeping its operands.
    pub fn relabel(&mut self, id: NodeId, label: Label) -> Result<(), TransformError> {
        let slot = self.slot_mut(id)?;
        if slot.label.arity() != label.arity() {
            return Err(TransformError::BadRelabel {
                id,
                reason: "new label has a different number of operands",
            });
        }
        slot.label = label;
        Ok(())
    }

    /// Put `tree` in place of `leaf`.
    ///
    /// The subtree root takes the leaf's position under the leaf's parent,
    /// or becomes the root if the leaf was the root. Returns the id the
    /// subtree root got in `self`.
    pub fn add_subtree(&mut self, leaf: NodeId, tree: &Tree) -> Result<NodeId, TransformError> {
        let leaf_slot = self.slot(leaf)?;
        if !leaf_slot.children.is_empty() {
            return Err(TransformError::NotALeaf(leaf));
        }
        let parent = leaf_slot.parent;
        let other_root = tree.root.ok_or(TransformError::EmptyTree)?;

        let offset = self.slots.len();
        for slot in &tree.slots {
            self.slots.push(slot.as_ref().map(|s| Slot {
                label: s.label.clone(),
                parent: s.parent.map(|p| p + offset),
                children: s.children.iter().map(|c| c + offset).collect(),
            }));
        }
        let new_root = other_root + offset;
        self.slot_mut(new_root)?.parent = parent;

        match parent {
            Some(p) => {
                let slot = self.slot_mut(p)?;
                for child in &mut slot.children {
                    if *child == leaf {
                        *child = new_root;
                    }
                }
            }
            None => self.root = Some(new_root),
        }
        self.slots[leaf] = None;
        Ok(new_root)
    }

    /// Graphviz rendering. Node labels are operators or terminal values,
    /// `detailed` appends the node kind; edge labels are operand positions.
    pub fn to_dot(&self, detailed: bool) -> String {
        let mut out = String::from("digraph ast {\n    ordering=out;\n");
        for id in self.node_ids() {
            let Ok(label) = self.label(id) else {
                continue;
            };
            let mut text = label.to_string();
            if detailed {
                text.push('\n');
                text.push_str(label.kind());
            }
            out.push_str(&format!("    n{id} [label=\"{}\"];\n", escape_dot(&text)));
        }
        for (parent, child, pos) in self.edges() {
            out.push_str(&format!("    n{parent} -> n{child} [label=\"{pos}\"];\n"));
        }
        out.push_str("}\n");
        out
    }

    pub fn write_dot(&self, path: &Path, detailed: bool) -> std::io::Result<()> {
        std::fs::write(path, self.to_dot(detailed))
    }
}

fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_ast() {
            Ok(node) => write!(f, "{node}"),
            Err(err) => write!(f, "<{err}>"),
        }
    }
}
