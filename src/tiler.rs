//! Greedy, kind-driven tree-pattern tiler — the core of the selector.
//!
//! One post-order traversal labels every node with a tile and a pattern id
//! from the catalog. Rules are strictly first-match: no alternative
//! coverings are explored or compared by cost. A parent may absorb a child's
//! already-committed tile (enlarging it and demoting the child's root
//! status); once committed, a tile only changes through the one re-entrant
//! path, the memory-to-memory move.
//!
//! That case (`MOVE` with two `MEM` children) discards the address patterns
//! its operands matched, so the address subtrees that were absorbed into
//! them must be labeled again. Instead of re-invoking the whole traversal
//! recursively, those subtrees go on an explicit worklist drained after the
//! main pass; only nodes that are no longer members of a live tile are
//! dispatched again.

use crate::catalog::{self, PatternId};
use crate::ir::{ExprTree, NodeId, NodeKind};

/// Index of a tile in the [`Tiling`] arena.
pub type TileId = u32;

/// A connected group of nodes matched as one instruction's operand set.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Member nodes, absorbing root first.
    pub members: Vec<NodeId>,
    /// The node cost and instruction text derive from.
    pub root: NodeId,
    /// Catalog index; `None` marks an unresolved tile the emitter skips.
    pub pattern: Option<PatternId>,
}

/// The finished covering: a tile arena plus a per-node membership map.
///
/// Absorption and re-tiling overwrite `tile_of` entries and leave the
/// superseded tile dead in the arena; collection passes skip dead tiles.
#[derive(Debug, Clone)]
pub struct Tiling {
    tiles: Vec<Tile>,
    tile_of: Vec<Option<TileId>>,
}

impl Tiling {
    fn new(node_count: usize) -> Self {
        Self {
            tiles: Vec::new(),
            tile_of: vec![None; node_count],
        }
    }

    /// The tile `node` currently belongs to.
    pub fn tile_of(&self, node: NodeId) -> Option<TileId> {
        self.tile_of[node as usize]
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id as usize]
    }

    /// A tile is live while its root still claims it.
    pub fn is_live(&self, id: TileId) -> bool {
        self.tile_of[self.tiles[id as usize].root as usize] == Some(id)
    }

    /// Whether `node` is the root of the live tile it belongs to.
    pub fn is_root(&self, node: NodeId) -> bool {
        match self.tile_of(node) {
            Some(id) => self.tiles[id as usize].root == node,
            None => false,
        }
    }

    /// Live tiles in post-order of their roots; cost collection and emission
    /// both consume exactly this order.
    pub fn roots(&self, tree: &ExprTree) -> Vec<TileId> {
        tree.post_order()
            .into_iter()
            .filter(|&node| self.is_root(node))
            .filter_map(|node| self.tile_of(node))
            .collect()
    }

    fn assign(&mut self, members: Vec<NodeId>, root: NodeId, pattern: Option<PatternId>) {
        let id = self.tiles.len() as TileId;
        for &member in &members {
            self.tile_of[member as usize] = Some(id);
        }
        self.tiles.push(Tile {
            members,
            root,
            pattern,
        });
    }
}

/// Covers `tree` with catalog patterns and returns the finished tiling.
pub fn tile_tree(tree: &ExprTree) -> Tiling {
    let mut tiler = Tiler {
        tree,
        tiling: Tiling::new(tree.len()),
        pending: Vec::new(),
    };
    if !tree.is_empty() {
        tiler.visit(tree.root());
    }
    // Address subtrees deferred at MOVEM sites.
    while let Some(subtree) = tiler.pending.pop() {
        tiler.revisit(subtree);
    }
    tiler.tiling
}

struct Tiler<'t> {
    tree: &'t ExprTree,
    tiling: Tiling,
    pending: Vec<NodeId>,
}

impl Tiler<'_> {
    fn visit(&mut self, node: NodeId) {
        let tree = self.tree;
        for &child in &tree.node(node).children {
            self.visit(child);
        }
        self.dispatch(node);
    }

    /// Re-entrant pass for worklist subtrees: nodes whose tile was killed by
    /// an absorbed address pattern are labeled again, settled nodes are left
    /// alone.
    fn revisit(&mut self, node: NodeId) {
        let tree = self.tree;
        for &child in &tree.node(node).children {
            self.revisit(child);
        }
        if !self.is_settled(node) {
            self.dispatch(node);
        }
    }

    fn is_settled(&self, node: NodeId) -> bool {
        match self.tiling.tile_of(node) {
            Some(id) => self.tiling.is_live(id),
            None => false,
        }
    }

    fn dispatch(&mut self, node: NodeId) {
        match self.tree.kind(node) {
            NodeKind::Add => self.tile_add(node),
            NodeKind::Sub => self.tile_sub(node),
            NodeKind::Mul => self.tiling.assign(vec![node], node, Some(catalog::MUL)),
            NodeKind::Div => self.tiling.assign(vec![node], node, Some(catalog::DIV)),
            NodeKind::Mem => self.tile_mem(node),
            NodeKind::Move => self.tile_move(node),
            NodeKind::Const => self.tiling.assign(vec![node], node, Some(catalog::LOAD_IMM)),
            NodeKind::Temp => self.tiling.assign(vec![node], node, Some(catalog::TEMP_REG)),
            // Opaque leaves are costed but never matched to an instruction.
            NodeKind::Opaque => self.tiling.assign(vec![node], node, None),
        }
        if let Some(id) = self.tiling.tile_of(node) {
            log::trace!(
                "tiled {} as pattern {:?}",
                self.tree.label(node),
                self.tiling.tile(id).pattern
            );
        }
    }

    fn tile_add(&mut self, node: NodeId) {
        let tree = self.tree;
        // Lowest-index constant child wins the fold.
        let folded = tree
            .node(node)
            .children
            .iter()
            .copied()
            .find(|&child| tree.kind(child) == NodeKind::Const);
        match folded {
            Some(child) => self
                .tiling
                .assign(vec![node, child], node, Some(catalog::ADDI)),
            None => self.tiling.assign(vec![node], node, Some(catalog::ADD)),
        }
    }

    fn tile_sub(&mut self, node: NodeId) {
        let tree = self.tree;
        // Only a right-side constant folds; the operation is not commutative.
        match tree.child(node, 1) {
            Some(right) if tree.kind(right) == NodeKind::Const => {
                self.tiling
                    .assign(vec![node, right], node, Some(catalog::SUBI))
            }
            _ => self.tiling.assign(vec![node], node, Some(catalog::SUB)),
        }
    }

    fn tile_mem(&mut self, node: NodeId) {
        let tree = self.tree;
        if let Some(child) = tree.child(node, 0) {
            if tree.kind(child) == NodeKind::Add {
                if let Some(id) = self.tiling.tile_of(child) {
                    if self.tiling.tile(id).members.len() == 2 {
                        // The child folded a constant (ADDI shape), so the
                        // whole address computation fits one load.
                        let absorbed = self.tiling.tile(id).members.clone();
                        let mut members = Vec::with_capacity(absorbed.len() + 1);
                        members.push(node);
                        members.extend(absorbed);
                        self.tiling
                            .assign(members, node, Some(catalog::LOAD_BASE_OFFSET));
                        return;
                    }
                }
            } else if tree.kind(child) == NodeKind::Const {
                self.tiling
                    .assign(vec![node, child], node, Some(catalog::LOAD_ABS));
                return;
            }
        }
        self.tiling.assign(vec![node], node, Some(catalog::LOAD_BASE));
    }

    fn tile_move(&mut self, node: NodeId) {
        let tree = self.tree;
        let left = tree.child(node, 0);
        let right = tree.child(node, 1);
        match (left, right) {
            (Some(l), Some(r))
                if tree.kind(l) == NodeKind::Mem && tree.kind(r) != NodeKind::Mem =>
            {
                // Mirror the load pattern the left operand matched.
                let (pattern, absorbed) = match self.tiling.tile_of(l).map(|id| self.tiling.tile(id))
                {
                    Some(t) if t.pattern == Some(catalog::LOAD_BASE_OFFSET) => {
                        (catalog::STORE_BASE_OFFSET, t.members.clone())
                    }
                    Some(t) if t.pattern == Some(catalog::LOAD_ABS) => {
                        (catalog::STORE_ABS, t.members.clone())
                    }
                    _ => (catalog::STORE_BASE, vec![l]),
                };
                let mut members = Vec::with_capacity(absorbed.len() + 1);
                members.push(node);
                members.extend(absorbed);
                self.tiling.assign(members, node, Some(pattern));
            }
            (Some(l), Some(r))
                if tree.kind(l) == NodeKind::Mem && tree.kind(r) == NodeKind::Mem =>
            {
                // Block move discards the operands' load patterns; address
                // subtrees absorbed into them must be labeled again.
                for mem in [l, r] {
                    if let Some(address) = tree.child(mem, 0) {
                        if !self.tiling.is_root(address) {
                            log::debug!(
                                "deferring address subtree {} under MOVEM",
                                tree.label(address)
                            );
                            self.pending.push(address);
                        }
                    }
                }
                self.tiling.assign(vec![node, l, r], node, Some(catalog::MOVEM));
            }
            _ => {
                // Operand shape matches no store pattern: left unresolved,
                // the emitter skips it.
                log::warn!("MOVE operands match no store pattern; no instruction emitted");
                self.tiling.assign(vec![node], node, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::parse_line;

    fn tile(expr: &str) -> (ExprTree, Tiling) {
        let tree = parse_line(expr).unwrap().expect("non-blank expression");
        let tiling = tile_tree(&tree);
        (tree, tiling)
    }

    fn root_pattern(tree: &ExprTree, tiling: &Tiling) -> Option<PatternId> {
        let id = tiling.tile_of(tree.root()).unwrap();
        tiling.tile(id).pattern
    }

    #[test]
    fn test_add_without_const_is_register_add() {
        let (tree, tiling) = tile("+ ( TEMP a , TEMP b )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::ADD));
    }

    #[test]
    fn test_add_folds_lowest_index_const() {
        let (tree, tiling) = tile("+ ( CONST 1 , CONST 2 )");
        let id = tiling.tile_of(tree.root()).unwrap();
        let t = tiling.tile(id);
        assert_eq!(t.pattern, Some(catalog::ADDI));
        let first_const = tree.child(tree.root(), 0).unwrap();
        assert_eq!(t.members, vec![tree.root(), first_const]);
        // The second constant stays in its own load-immediate tile.
        let second_const = tree.child(tree.root(), 1).unwrap();
        assert!(tiling.is_root(second_const));
    }

    #[test]
    fn test_sub_folds_only_right_const() {
        let (tree, tiling) = tile("- ( TEMP a , CONST 1 )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::SUBI));

        let (tree, tiling) = tile("- ( CONST 1 , TEMP a )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::SUB));
    }

    #[test]
    fn test_mul_never_folds() {
        let (tree, tiling) = tile("* ( TEMP a , CONST 2 )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::MUL));
        let konst = tree.child(tree.root(), 1).unwrap();
        let id = tiling.tile_of(konst).unwrap();
        assert_eq!(tiling.tile(id).pattern, Some(catalog::LOAD_IMM));
    }

    #[test]
    fn test_mem_dispatch_variants() {
        let (tree, tiling) = tile("MEM ( + ( FP , CONST a ) )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::LOAD_BASE_OFFSET));
        let id = tiling.tile_of(tree.root()).unwrap();
        assert_eq!(tiling.tile(id).members.len(), 3);

        let (tree, tiling) = tile("MEM ( CONST 4 )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::LOAD_ABS));

        let (tree, tiling) = tile("MEM ( TEMP t )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::LOAD_BASE));

        // An add that folded nothing cannot be absorbed into the load.
        let (tree, tiling) = tile("MEM ( + ( TEMP a , TEMP b ) )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::LOAD_BASE));
    }

    #[test]
    fn test_move_mirrors_left_load_pattern() {
        let (tree, tiling) = tile("MOVE ( MEM ( + ( FP , CONST a ) ) , TEMP j )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::STORE_BASE_OFFSET));

        let (tree, tiling) = tile("MOVE ( MEM ( CONST 8 ) , TEMP j )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::STORE_ABS));

        let (tree, tiling) = tile("MOVE ( MEM ( TEMP t ) , TEMP j )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::STORE_BASE));
    }

    #[test]
    fn test_unresolved_move_keeps_silent_tile() {
        let (tree, tiling) = tile("MOVE ( TEMP a , TEMP b )");
        let id = tiling.tile_of(tree.root()).unwrap();
        assert_eq!(tiling.tile(id).pattern, None);
        assert_eq!(tiling.tile(id).members, vec![tree.root()]);
    }

    #[test]
    fn test_movem_retiles_absorbed_address_subtree() {
        let (tree, tiling) = tile("MOVE ( MEM ( CONST 6 ) , MEM ( + ( FP , CONST x ) ) )");
        assert_eq!(root_pattern(&tree, &tiling), Some(catalog::MOVEM));

        // CONST 6 was absorbed into the left load, then re-tiled as a
        // load-immediate root by the worklist pass.
        let left_mem = tree.child(tree.root(), 0).unwrap();
        let konst = tree.child(left_mem, 0).unwrap();
        assert!(tiling.is_root(konst));
        let id = tiling.tile_of(konst).unwrap();
        assert_eq!(tiling.tile(id).pattern, Some(catalog::LOAD_IMM));

        // The right address computation folds again under its own root.
        let right_mem = tree.child(tree.root(), 1).unwrap();
        let add = tree.child(right_mem, 0).unwrap();
        assert!(tiling.is_root(add));
        let id = tiling.tile_of(add).unwrap();
        assert_eq!(tiling.tile(id).pattern, Some(catalog::ADDI));
        assert_eq!(tiling.tile(id).members.len(), 2);
    }

    #[test]
    fn test_every_node_in_exactly_one_live_tile() {
        let exprs = [
            "MOVE ( MEM ( + ( FP , CONST a ) ) , TEMP j )",
            "MOVE ( MEM ( / ( CONST 6 , FP ) ) , MEM ( + ( FP , CONST x ) ) )",
            "- ( * ( TEMP a , TEMP b ) , CONST 3 )",
        ];
        for expr in exprs {
            let (tree, tiling) = tile(expr);
            for node in tree.post_order() {
                let id = tiling
                    .tile_of(node)
                    .unwrap_or_else(|| panic!("node {node} untiled in '{expr}'"));
                assert!(tiling.is_live(id), "node {node} in dead tile in '{expr}'");
                let roots = tiling
                    .tile(id)
                    .members
                    .iter()
                    .filter(|&&m| tiling.is_root(m))
                    .count();
                assert_eq!(roots, 1, "tile of node {node} in '{expr}' needs one root");
            }
        }
    }
}
