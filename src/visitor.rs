//! The single authoritative traversal mechanism for IR trees.
//!
//! Rules:
//! 1. Traversal order is depth-first, children in index order, and fixed.
//! 2. Implementers override `visit_*` methods to add behavior.
//! 3. Implementers MUST call `walk_*` functions to continue traversal
//!    unless pruning is intended.
//! 4. No manual recursion outside of this system, except code generation,
//!    which owns its emission order.

use crate::ir::IrNode;

pub trait IrVisitor {
    fn visit_node(&mut self, node: &IrNode) {
        walk_node(self, node);
    }

    fn visit_children(&mut self, children: &[IrNode]) {
        walk_children(self, children);
    }
}

pub fn walk_node<V: IrVisitor + ?Sized>(visitor: &mut V, node: &IrNode) {
    visitor.visit_children(&node.children);
}

pub fn walk_children<V: IrVisitor + ?Sized>(visitor: &mut V, children: &[IrNode]) {
    for child in children {
        visitor.visit_node(child);
    }
}

/// Mutable counterpart, used by pruning passes that retain or reorder
/// children in place.
pub trait IrVisitorMut {
    fn visit_node(&mut self, node: &mut IrNode) {
        walk_node_mut(self, node);
    }

    fn visit_children(&mut self, children: &mut Vec<IrNode>) {
        walk_children_mut(self, children);
    }
}

pub fn walk_node_mut<V: IrVisitorMut + ?Sized>(visitor: &mut V, node: &mut IrNode) {
    visitor.visit_children(&mut node.children);
}

pub fn walk_children_mut<V: IrVisitorMut + ?Sized>(visitor: &mut V, children: &mut Vec<IrNode>) {
    for child in children {
        visitor.visit_node(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IconHint, LayoutSpec, NodeKind, Rect};

    fn leaf(id: &str) -> IrNode {
        IrNode {
            id: id.to_string(),
            name: id.to_string(),
            kind: NodeKind::Frame,
            own_visible: true,
            visible_effective: true,
            bounds: Rect::default(),
            bounds_relative: Rect::default(),
            offset: (0.0, 0.0),
            layout: LayoutSpec::default(),
            absolutely_positioned: false,
            fills: vec![],
            background: None,
            stroke: None,
            corner_radii: Default::default(),
            box_shadow: None,
            opacity: 1.0,
            clips_content: false,
            text: None,
            rotation: 0.0,
            index: 0,
            z_index: None,
            is_root: false,
            icon: IconHint::default(),
            class_tokens: vec![],
            children: vec![],
        }
    }

    struct IdCollector {
        ids: Vec<String>,
    }

    impl IrVisitor for IdCollector {
        fn visit_node(&mut self, node: &IrNode) {
            self.ids.push(node.id.clone());
            walk_node(self, node);
        }
    }

    #[test]
    fn test_depth_first_order() {
        let mut root = leaf("root");
        let mut a = leaf("a");
        a.children.push(leaf("a1"));
        root.children.push(a);
        root.children.push(leaf("b"));

        let mut collector = IdCollector { ids: vec![] };
        collector.visit_node(&root);
        assert_eq!(collector.ids, vec!["root", "a", "a1", "b"]);
    }
}
