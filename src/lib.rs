//! munch - greedy tree-pattern instruction selection over a toy IR.
//!
//! munch parses one-line IR expressions (`MOVE`/`MEM` and arithmetic over
//! `CONST`/`TEMP` leaves), covers each tree with a fixed 18-pattern
//! instruction catalog, prices the covering with a memoized additive cost
//! model, and renders one instruction line per tile. Tiling is strictly
//! greedy and first-match; no search, no register allocation.
//!
//! # Primary Usage
//!
//! ```
//! use munch::{analyze, CostCache};
//!
//! let mut cache = CostCache::new();
//! let report = analyze("MOVE ( MEM ( + ( FP , CONST a ) ) , TEMP j )", &mut cache)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(report.total_cost, 6);
//! ```
//!
//! # Architecture
//!
//! - [`ir`] - flat-arena expression tree and line parser
//! - [`catalog`] - the fixed instruction pattern catalog
//! - [`tiler`] - greedy, kind-driven tiler (the core)
//! - [`cost`] - memoized additive cost model
//! - [`emit`] - template-driven code emitter
//! - [`report`] - textual report assembly and the per-source driver

pub mod catalog;
pub mod cost;
pub mod emit;
pub mod error;
pub mod ir;
pub mod report;
pub mod tiler;

pub use catalog::PatternId;
pub use cost::CostCache;
pub use error::{SelectError, SelectResult};
pub use ir::{ExprTree, NodeId, NodeKind};
pub use report::{analyze, run_source, Report};
pub use tiler::{tile_tree, Tile, TileId, Tiling};
