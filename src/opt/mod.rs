//! Optimization passes over IR.
//!
//! Passes consume analyses computed elsewhere in the pipeline, and report
//! whether they changed anything so that callers know when those analyses
//! must be recomputed.

use rustc_hash::FxHashMap;

use crate::ir::LoopId;

pub mod unroll;

pub use unroll::unroll_loops;

/// What is known about a single loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoopInfo {
    /// The most iterations the loop can run; negative if unknown.
    pub max_iterations: i32,
    /// The number of `break`s and `continue`s in the body.
    pub num_loop_jumps: u32,
}

/// Per-loop analysis results, keyed by loop ID.
#[derive(Clone, Debug, Default)]
pub struct LoopAnalysis {
    loops: FxHashMap<LoopId, LoopInfo>,
}

impl LoopAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what is known about a loop, replacing any earlier record.
    pub fn insert(&mut self, id: LoopId, info: LoopInfo) -> Option<LoopInfo> {
        self.loops.insert(id, info)
    }

    pub fn get(&self, id: LoopId) -> Option<&LoopInfo> {
        self.loops.get(&id)
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

/// Options for loop unrolling.
#[derive(Copy, Clone, Debug)]
pub struct UnrollOptions {
    /// Loops that may run more iterations than this are left alone.
    pub max_iterations: u32,
}

impl Default for UnrollOptions {
    fn default() -> Self {
        Self { max_iterations: 32 }
    }
}
