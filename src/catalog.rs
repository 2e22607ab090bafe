//! The fixed 18-entry instruction pattern catalog.
//!
//! Pattern ids are 1-based indices into [`TEMPLATES`]. The tiler assigns
//! ids, the emitter fills the template placeholders: `{i}`, `{j}` and `{k}`
//! are register operands, `{c}` is a constant. Entries 7, 13 and 17 exist in
//! the catalog but are never produced by the current dispatch rules.

/// 1-based index into the instruction-template catalog.
pub type PatternId = u8;

pub const TEMP_REG: PatternId = 1;
pub const ADD: PatternId = 2;
pub const MUL: PatternId = 3;
pub const SUB: PatternId = 4;
pub const DIV: PatternId = 5;
pub const ADDI: PatternId = 6;
pub const ADDI_ALT: PatternId = 7;
/// Immediate load with zero base.
pub const LOAD_IMM: PatternId = 8;
pub const SUBI: PatternId = 9;
/// LOAD base+offset (folded address computation).
pub const LOAD_BASE_OFFSET: PatternId = 10;
/// LOAD base0+const (absolute address).
pub const LOAD_ABS: PatternId = 11;
/// LOAD base+zero.
pub const LOAD_BASE: PatternId = 12;
pub const LOAD_BASE_BASE: PatternId = 13;
/// STORE variants mirror the LOAD cases.
pub const STORE_BASE_OFFSET: PatternId = 14;
pub const STORE_ABS: PatternId = 15;
pub const STORE_BASE: PatternId = 16;
pub const STORE_BASE_BASE: PatternId = 17;
/// Memory-to-memory block move.
pub const MOVEM: PatternId = 18;

pub const COUNT: usize = 18;

/// Instruction templates, indexed by pattern id minus one.
pub const TEMPLATES: [&str; COUNT] = [
    "TEMP r{i}",
    "ADD r{i} <- r{j} + r{k}",
    "MUL r{i} <- r{j} * r{k}",
    "SUB r{i} <- r{j} - r{k}",
    "DIV r{i} <- r{j} / r{k}",
    "ADDI r{i} <- r{j} + {c}",
    "ADDI r{i} <- r{j} + {c}",
    "ADDI r{i} <- r{j} + {c}",
    "SUBI r{i} <- r{j} - {c}",
    "LOAD r{i} <- M[r{j} + {c}]",
    "LOAD r{i} <- M[r{j} + {c}]",
    "LOAD r{i} <- M[r{j} + {c}]",
    "LOAD r{i} <- M[r{j} + {c}]",
    "STORE M[r{j} + {c}] <- r{i}",
    "STORE M[r{j} + {c}] <- r{i}",
    "STORE M[r{j} + {c}] <- r{i}",
    "STORE M[r{j} + {c}] <- r{i}",
    "MOVEM M[r{j}] <- M[r{i}]",
];

/// The template text for `id`, or `None` for an out-of-catalog id.
pub fn template(id: PatternId) -> Option<&'static str> {
    (id as usize)
        .checked_sub(1)
        .and_then(|idx| TEMPLATES.get(idx).copied())
}

/// Whether the pattern claims a fresh virtual register for its result and
/// advances the register counter. The remaining patterns reuse the current
/// counter value without claiming it.
pub const fn allocates_register(id: PatternId) -> bool {
    matches!(id, 1..=7 | 9..=11 | 14 | 15)
}
