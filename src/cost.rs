//! Additive cost model over a finished tile covering.
//!
//! Tile costs are memoized in an explicit [`CostCache`] keyed by the tile's
//! member-kind sequence, never by node identity, so repeated tile shapes —
//! including across different expressions in one run — reuse the cached sum.
//! The pass is strictly read-only over the tiling.

use hashbrown::HashMap;

use crate::ir::{ExprTree, NodeKind};
use crate::tiler::Tiling;

/// Fixed per-kind cost table.
pub const fn kind_cost(kind: NodeKind) -> u32 {
    match kind {
        NodeKind::Temp => 0,
        NodeKind::Move => 2,
        NodeKind::Add
        | NodeKind::Sub
        | NodeKind::Mul
        | NodeKind::Div
        | NodeKind::Const
        | NodeKind::Mem
        | NodeKind::Opaque => 1,
    }
}

/// Memoized tile costs, owned by the caller and shared across a whole run.
#[derive(Debug, Default)]
pub struct CostCache {
    memo: HashMap<Vec<NodeKind>, u32>,
}

impl CostCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct tile shapes seen so far.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    fn tile_cost(&mut self, kinds: Vec<NodeKind>) -> u32 {
        if let Some(&cost) = self.memo.get(&kinds) {
            log::trace!("cost cache hit for {kinds:?}");
            return cost;
        }
        let cost = kinds.iter().copied().map(kind_cost).sum();
        self.memo.insert(kinds, cost);
        cost
    }
}

/// Total cost of the covering: the sum over all live tiles, visited in root
/// collection order, of their summed member-kind costs.
pub fn total_cost(tree: &ExprTree, tiling: &Tiling, cache: &mut CostCache) -> u32 {
    tiling
        .roots(tree)
        .into_iter()
        .map(|id| {
            let kinds: Vec<NodeKind> = tiling
                .tile(id)
                .members
                .iter()
                .map(|&node| tree.kind(node))
                .collect();
            cache.tile_cost(kinds)
        })
        .sum()
}
