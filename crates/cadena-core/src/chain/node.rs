//! Chain node types.
//!
//! Every node has a [`FilterId`] and a [`NodeKind`]: the input sentinel, the
//! output sentinel, or a filter instance. `FilterNode` bundles the kind with
//! the node's negotiated formats, output queue and list links.

use core::fmt;

use crate::filter::{Filter, FilterInfo, FilterIo};

/// Handle to a node in a [`FilterChain`](crate::FilterChain).
///
/// IDs are assigned sequentially and never reused within a chain instance,
/// so a handle to a removed filter stays invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterId(pub(crate) u32);

impl FilterId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterId({})", self.0)
    }
}

/// The role of a node in the chain.
pub(crate) enum NodeKind {
    /// Receives frames from the source.
    Input,
    /// Hands frames to the sink.
    Output,
    /// A filter instance with its descriptor.
    Filter {
        info: FilterInfo,
        filter: Box<dyn Filter>,
    },
}

/// Internal bookkeeping for one node.
pub(crate) struct FilterNode {
    pub kind: NodeKind,
    pub label: Option<String>,
    pub io: FilterIo,
    /// Added by negotiation rather than requested.
    pub auto_inserted: bool,
    /// Already received the end-of-stream flush in this cycle.
    pub flushed: bool,
    pub prev: Option<FilterId>,
    pub next: Option<FilterId>,
}

impl FilterNode {
    pub fn new(kind: NodeKind, label: Option<String>) -> Self {
        Self {
            kind,
            label,
            io: FilterIo::new(),
            auto_inserted: false,
            flushed: false,
            prev: None,
            next: None,
        }
    }

    pub fn name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Input => "in",
            NodeKind::Output => "out",
            NodeKind::Filter { info, .. } => info.name,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self.kind, NodeKind::Filter { .. })
    }

    /// `label` if set, otherwise the filter name.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.name())
    }
}
