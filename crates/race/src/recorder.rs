//! FIFO recording of search operations.
//!
//! The engine races all rovers to completion in one shot; what the user
//! watches afterwards is this log, drained by [`crate::playback`] in the
//! exact order the searches produced it. The log doubles as the
//! [`SearchProbe`] handed to the engine, so recording costs one push per
//! operation and no intermediate collection.

use std::collections::VecDeque;
use std::hash::Hasher;

use bevy::prelude::*;
use pathgrid::{NodeOp, SearchProbe};

/// Queue of recorded operations awaiting playback.
#[derive(Resource, Debug, Default)]
pub struct OperationLog {
    ops: VecDeque<NodeOp>,
}

impl OperationLog {
    pub fn push(&mut self, op: NodeOp) {
        self.ops.push_back(op);
    }

    pub fn pop(&mut self) -> Option<NodeOp> {
        self.ops.pop_front()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Order-sensitive FNV-1a digest of the remaining queue. Two races
    /// over identical courses produce identical digests, which is the
    /// replay determinism check. Fields are fed little-endian so the
    /// digest is portable.
    pub fn digest(&self) -> u64 {
        let mut hasher = Fnv1aHasher::default();
        for op in &self.ops {
            hasher.write(&op.x.to_le_bytes());
            hasher.write(&op.y.to_le_bytes());
            hasher.write(&[op.event.code(), op.value as u8, op.tag]);
        }
        hasher.finish()
    }
}

impl SearchProbe for OperationLog {
    fn record(&mut self, op: NodeOp) {
        self.push(op);
    }
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Minimal FNV-1a; stable across platforms and runs, unlike `DefaultHasher`.
struct Fnv1aHasher(u64);

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self(FNV_OFFSET)
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}
