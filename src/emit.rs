//! Template-driven code emission from a finished tile covering.
//!
//! Each live tile root is rendered through its catalog template, in the same
//! post-order the cost pass uses. Placeholder extraction reads fixed
//! child/grandchild positions of the tile's members: pattern 10, for
//! example, reads the grandchild pair holding the base register and the
//! offset constant. A tile with no pattern id emits nothing and consumes no
//! line number.
//!
//! Virtual registers are a monotone counter plus a root-to-register map.
//! Patterns in the catalog's allocating set claim a fresh register for their
//! result; the others reuse the current counter value without claiming it.
//! Operand registers resolve through the operand's tile root, and leaves
//! that never emit (opaque tokens such as `FP`) get a register lazily on
//! first use. Register allocation proper is out of scope.

use hashbrown::HashMap;

use crate::catalog::{self, PatternId};
use crate::error::{SelectError, SelectResult};
use crate::ir::{ExprTree, NodeId};
use crate::tiler::{Tile, Tiling};

/// Renders every emitting tile into a numbered instruction line.
pub fn emit(tree: &ExprTree, tiling: &Tiling) -> SelectResult<Vec<String>> {
    let mut emitter = Emitter {
        tree,
        tiling,
        regs: HashMap::new(),
        next_reg: 1,
    };
    let mut lines = Vec::new();
    for id in tiling.roots(tree) {
        if let Some(text) = emitter.emit_tile(tiling.tile(id))? {
            lines.push(format!("{}: {}", lines.len() + 1, text));
        }
    }
    Ok(lines)
}

#[derive(Default)]
struct Operands {
    i: Option<u32>,
    j: Option<u32>,
    k: Option<u32>,
    c: Option<String>,
}

impl Operands {
    fn render(&self, template: &str) -> String {
        let mut text = template.to_string();
        if let Some(i) = self.i {
            text = text.replace("{i}", &i.to_string());
        }
        if let Some(j) = self.j {
            text = text.replace("{j}", &j.to_string());
        }
        if let Some(k) = self.k {
            text = text.replace("{k}", &k.to_string());
        }
        if let Some(c) = &self.c {
            text = text.replace("{c}", c);
        }
        text
    }
}

struct Emitter<'t> {
    tree: &'t ExprTree,
    tiling: &'t Tiling,
    /// Result register per tile root, plus lazily registered bare leaves.
    regs: HashMap<NodeId, u32>,
    next_reg: u32,
}

impl Emitter<'_> {
    fn alloc(&mut self) -> u32 {
        let reg = self.next_reg;
        self.next_reg += 1;
        reg
    }

    /// Records the register produced by the tile rooted at `root`.
    fn define(&mut self, root: NodeId, pattern: PatternId) -> u32 {
        let reg = if catalog::allocates_register(pattern) {
            self.alloc()
        } else {
            self.next_reg
        };
        self.regs.insert(root, reg);
        reg
    }

    /// Register holding `node`'s value: the result register of the tile the
    /// node belongs to, assigned on first use for leaves that never emit.
    fn operand_reg(&mut self, node: NodeId) -> u32 {
        let root = match self.tiling.tile_of(node) {
            Some(id) => self.tiling.tile(id).root,
            None => node,
        };
        if let Some(&reg) = self.regs.get(&root) {
            return reg;
        }
        let reg = self.alloc();
        self.regs.insert(root, reg);
        reg
    }

    fn value_text(&self, node: NodeId) -> String {
        self.tree
            .node(node)
            .value
            .clone()
            .unwrap_or_else(|| "0".to_string())
    }

    fn child(&self, node: NodeId, n: usize) -> SelectResult<NodeId> {
        self.tree.child(node, n).ok_or_else(|| SelectError::CodeGeneration {
            reason: format!("node '{}' is missing operand {n}", self.tree.label(node)),
        })
    }

    /// The add operand that was not folded into the tile.
    fn base_operand(&self, add: NodeId, folded: NodeId) -> SelectResult<NodeId> {
        self.tree
            .node(add)
            .children
            .iter()
            .copied()
            .find(|&child| child != folded)
            .ok_or_else(|| SelectError::CodeGeneration {
                reason: "folded operation has no base operand".to_string(),
            })
    }

    fn emit_tile(&mut self, tile: &Tile) -> SelectResult<Option<String>> {
        // No pattern means no instruction for this tile, not a fault.
        let Some(pattern) = tile.pattern else {
            return Ok(None);
        };
        let root = tile.root;
        let mut ops = Operands::default();

        match pattern {
            catalog::TEMP_REG => {
                ops.i = Some(self.define(root, pattern));
            }
            catalog::ADD | catalog::MUL | catalog::SUB | catalog::DIV => {
                ops.i = Some(self.define(root, pattern));
                let left = self.child(root, 0)?;
                let right = self.child(root, 1)?;
                ops.j = Some(self.operand_reg(left));
                ops.k = Some(self.operand_reg(right));
            }
            catalog::ADDI | catalog::ADDI_ALT | catalog::SUBI => {
                ops.i = Some(self.define(root, pattern));
                let folded = member(tile, 1)?;
                let base = self.base_operand(root, folded)?;
                ops.j = Some(self.operand_reg(base));
                ops.c = Some(self.value_text(folded));
            }
            catalog::LOAD_IMM => {
                ops.i = Some(self.define(root, pattern));
                ops.j = Some(0);
                ops.c = Some(self.value_text(root));
            }
            catalog::LOAD_BASE_OFFSET => {
                ops.i = Some(self.define(root, pattern));
                // Members are [mem, add, const]; the base register lives in
                // the add's other child.
                let address = member(tile, 1)?;
                let folded = member(tile, 2)?;
                let base = self.base_operand(address, folded)?;
                ops.j = Some(self.operand_reg(base));
                ops.c = Some(self.value_text(folded));
            }
            catalog::LOAD_ABS => {
                ops.i = Some(self.define(root, pattern));
                ops.j = Some(0);
                ops.c = Some(self.value_text(member(tile, 1)?));
            }
            catalog::LOAD_BASE | catalog::LOAD_BASE_BASE => {
                ops.i = Some(self.define(root, pattern));
                let base = self.child(root, 0)?;
                ops.j = Some(self.operand_reg(base));
                ops.c = Some("0".to_string());
            }
            catalog::STORE_BASE_OFFSET => {
                self.define(root, pattern);
                // Members are [move, mem, add, const].
                let address = member(tile, 2)?;
                let folded = member(tile, 3)?;
                let base = self.base_operand(address, folded)?;
                ops.j = Some(self.operand_reg(base));
                ops.c = Some(self.value_text(folded));
                let source = self.child(root, 1)?;
                ops.i = Some(self.operand_reg(source));
            }
            catalog::STORE_ABS => {
                self.define(root, pattern);
                ops.j = Some(0);
                ops.c = Some(self.value_text(member(tile, 2)?));
                let source = self.child(root, 1)?;
                ops.i = Some(self.operand_reg(source));
            }
            catalog::STORE_BASE | catalog::STORE_BASE_BASE => {
                self.define(root, pattern);
                let mem = self.child(root, 0)?;
                ops.j = Some(match self.tree.child(mem, 0) {
                    Some(base) => self.operand_reg(base),
                    None => 0,
                });
                ops.c = Some("0".to_string());
                let source = self.child(root, 1)?;
                ops.i = Some(self.operand_reg(source));
            }
            catalog::MOVEM => {
                self.define(root, pattern);
                let left = self.child(root, 0)?;
                let right = self.child(root, 1)?;
                ops.j = Some(match self.tree.child(left, 0) {
                    Some(address) => self.operand_reg(address),
                    None => 0,
                });
                ops.i = Some(match self.tree.child(right, 0) {
                    Some(address) => self.operand_reg(address),
                    None => 0,
                });
            }
            other => {
                return Err(SelectError::CodeGeneration {
                    reason: format!("pattern id {other} is outside the catalog"),
                })
            }
        }

        let template = catalog::template(pattern).ok_or_else(|| SelectError::CodeGeneration {
            reason: format!("pattern id {pattern} has no template"),
        })?;
        Ok(Some(ops.render(template)))
    }
}

fn member(tile: &Tile, n: usize) -> SelectResult<NodeId> {
    tile.members
        .get(n)
        .copied()
        .ok_or_else(|| SelectError::CodeGeneration {
            reason: format!("tile is missing member {n}"),
        })
}
