//! Search instrumentation seam.
//!
//! A* itself lives in the `pathfinding` crate; what downstream replay needs
//! is the stream of node touches in the order the algorithm made them. The
//! search adapter reports each touch as a [`NodeOp`] to whatever probe the
//! caller supplies.

/// What happened to a node during the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    /// Node entered the frontier (or was re-opened with a better cost).
    Opened,
    /// Node was taken off the frontier and expanded.
    Closed,
    /// Node's heuristic was evaluated.
    Tested,
}

impl NodeEvent {
    /// Stable wire/display name, matching the attribute vocabulary a view
    /// declares support for.
    pub fn label(self) -> &'static str {
        match self {
            NodeEvent::Opened => "opened",
            NodeEvent::Closed => "closed",
            NodeEvent::Tested => "tested",
        }
    }

    /// Stable discriminant for digesting recordings.
    pub fn code(self) -> u8 {
        match self {
            NodeEvent::Opened => 0,
            NodeEvent::Closed => 1,
            NodeEvent::Tested => 2,
        }
    }
}

/// One recorded search side effect.
///
/// `value` is the attribute payload (always `true` for the events this
/// adapter emits; kept explicit so a replay consumer can also un-set
/// attributes). `tag` is the grid snapshot's tag, i.e. which racer's
/// search produced the op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOp {
    pub x: i32,
    pub y: i32,
    pub event: NodeEvent,
    pub value: bool,
    pub tag: u8,
}

/// Receiver for search instrumentation, in the order events happen.
pub trait SearchProbe {
    fn record(&mut self, op: NodeOp);
}

/// Probe for callers that only want the path.
#[derive(Debug, Default)]
pub struct NullProbe;

impl SearchProbe for NullProbe {
    fn record(&mut self, _op: NodeOp) {}
}
