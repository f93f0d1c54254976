//! Filter chain: topology mutation, control dispatch and the frame pump.
//!
//! Negotiation lives in the sibling `negotiate` module.

use core::fmt;
use std::sync::Arc;

use crate::error::ChainError;
use crate::filter::{Command, FilterFlags, FilterSettings, Reply};
use crate::format::AudioFormat;
use crate::frame::AudioFrame;
use crate::registry::FilterRegistry;
use crate::select::ChannelMapSelector;

use super::node::{FilterId, FilterNode, NodeKind};

/// Default name of the filter auto-inserted for channel and rate changes.
pub const DEFAULT_RESAMPLER: &str = "resample";

/// Negotiation state of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Never negotiated, or torn down.
    Uninitialized,
    /// Negotiation in progress.
    Negotiating,
    /// Every node agrees on its formats; frames may flow.
    Ok,
    /// Negotiation failed. Frames are refused until the chain is rebuilt.
    Broken,
}

/// Result of [`FilterChain::output_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// A frame is ready for [`FilterChain::read_output_frame`].
    Available,
    /// More input is needed.
    NotYet,
}

/// Notable chain changes, reported to the handler installed with
/// [`FilterChain::set_event_handler`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    /// Negotiation inserted a conversion filter.
    AutoInserted {
        /// Filter name.
        filter: String,
        /// The node it was inserted before.
        before: String,
    },
    /// A filter that cannot handle a passthrough stream was dropped so the
    /// stream keeps flowing.
    PassthroughRemoved {
        /// Label or name of the removed filter.
        filter: String,
    },
    /// A filter asked to be removed because it had nothing to do.
    Detached {
        /// Label or name of the removed filter.
        filter: String,
    },
    /// Negotiation failed.
    Broken {
        /// Why.
        error: ChainError,
    },
    /// The chain was torn down and rebuilt from its original settings.
    Rebuilt,
}

type EventHandler = Box<dyn FnMut(&ChainEvent) + Send>;

/// A negotiated chain of audio filters between a source and a sink.
///
/// The chain is single-threaded: negotiation and frame pumping must not run
/// concurrently on the same chain.
pub struct FilterChain {
    pub(super) registry: Arc<FilterRegistry>,
    pub(super) nodes: Vec<Option<FilterNode>>,
    pub(super) first: FilterId,
    pub(super) last: FilterId,
    /// Format produced by the source.
    pub(super) input: AudioFormat,
    /// Format required by the sink; unset fields are fixed by negotiation.
    pub(super) output: AudioFormat,
    pub(super) output_layouts: Option<ChannelMapSelector>,
    pub(super) resampler: String,
    /// Filters requested by the user, used by `init` and rebuilds.
    pub(super) settings: Vec<FilterSettings>,
    /// Negotiate the filters exactly as given: no auto-insertion, no detach.
    pub(super) forced: bool,
    pub(super) state: ChainState,
    events: Option<EventHandler>,
}

impl FilterChain {
    /// Creates an empty chain (`in` linked directly to `out`).
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        let mut input = FilterNode::new(NodeKind::Input, None);
        let mut output = FilterNode::new(NodeKind::Output, None);
        input.next = Some(FilterId(1));
        output.prev = Some(FilterId(0));
        Self {
            registry,
            nodes: vec![Some(input), Some(output)],
            first: FilterId(0),
            last: FilterId(1),
            input: AudioFormat::UNSET,
            output: AudioFormat::UNSET,
            output_layouts: None,
            resampler: DEFAULT_RESAMPLER.to_string(),
            settings: Vec::new(),
            forced: false,
            state: ChainState::Uninitialized,
            events: None,
        }
    }

    /// The filter registry this chain instantiates from.
    pub fn registry(&self) -> &Arc<FilterRegistry> {
        &self.registry
    }

    /// Current negotiation state.
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Declared source format.
    pub fn input_format(&self) -> &AudioFormat {
        &self.input
    }

    /// Sets the source format. Takes effect on the next
    /// [`reinit()`](Self::reinit).
    pub fn set_input_format(&mut self, format: AudioFormat) {
        self.input = format;
    }

    /// Sink format. After the first successful negotiation every field is
    /// set.
    pub fn output_format(&self) -> &AudioFormat {
        &self.output
    }

    /// Replaces the sink format, releasing fields fixed by earlier
    /// negotiations.
    pub fn set_output_format(&mut self, format: AudioFormat) {
        self.output = format;
    }

    /// Channel map policy used when the sink leaves its channel map unset.
    pub fn set_output_layouts(&mut self, selector: Option<ChannelMapSelector>) {
        self.output_layouts = selector;
    }

    /// Name of the filter inserted for channel and rate conversions.
    pub fn set_resampler(&mut self, name: impl Into<String>) {
        self.resampler = name.into();
    }

    /// Forced mode. The negotiator neither inserts conversion filters nor
    /// removes filters; any format mismatch fails with
    /// [`ChainError::AutoConversionDisabled`], and filters asking to detach
    /// stay in place passing their input through.
    pub fn set_forced(&mut self, forced: bool) {
        self.forced = forced;
    }

    /// Whether the chain is in forced mode.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Filters requested by the user, instantiated by [`init()`](Self::init).
    pub fn set_settings(&mut self, settings: Vec<FilterSettings>) {
        self.settings = settings;
    }

    /// The filter list [`init()`](Self::init) builds from.
    pub fn settings(&self) -> &[FilterSettings] {
        &self.settings
    }

    /// Installs a handler for [`ChainEvent`]s.
    pub fn set_event_handler(&mut self, handler: impl FnMut(&ChainEvent) + Send + 'static) {
        self.events = Some(Box::new(handler));
    }

    pub(super) fn emit(&mut self, event: ChainEvent) {
        if let Some(handler) = self.events.as_mut() {
            handler(&event);
        }
    }

    // --- Arena access ---

    pub(super) fn node(&self, id: FilterId) -> Option<&FilterNode> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub(super) fn node_mut(&mut self, id: FilterId) -> Option<&mut FilterNode> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub(super) fn slot(&self, id: FilterId) -> Result<&FilterNode, ChainError> {
        self.node(id).ok_or_else(|| stale(id))
    }

    pub(super) fn slot_mut(&mut self, id: FilterId) -> Result<&mut FilterNode, ChainError> {
        self.node_mut(id).ok_or_else(|| stale(id))
    }

    pub(super) fn next_of(&self, id: FilterId) -> Option<FilterId> {
        self.node(id).and_then(|n| n.next)
    }

    pub(super) fn prev_of(&self, id: FilterId) -> Option<FilterId> {
        self.node(id).and_then(|n| n.prev)
    }

    /// All node IDs front to back, sentinels included.
    pub(super) fn order(&self) -> Vec<FilterId> {
        let mut ids = Vec::new();
        let mut cur = Some(self.first);
        while let Some(id) = cur {
            ids.push(id);
            cur = self.next_of(id);
        }
        ids
    }

    // --- Queries ---

    /// The input sentinel.
    pub fn first(&self) -> FilterId {
        self.first
    }

    /// The output sentinel.
    pub fn last(&self) -> FilterId {
        self.last
    }

    /// Filter nodes front to back, sentinels excluded.
    pub fn filters(&self) -> Vec<FilterId> {
        self.order()
            .into_iter()
            .filter(|&id| id != self.first && id != self.last)
            .collect()
    }

    /// Number of filter nodes, sentinels excluded.
    pub fn len(&self) -> usize {
        self.filters().len()
    }

    /// True if no filter sits between the sentinels.
    pub fn is_empty(&self) -> bool {
        self.next_of(self.first) == Some(self.last)
    }

    /// Whether `id` names a node currently in the chain.
    pub fn contains(&self, id: FilterId) -> bool {
        self.node(id).is_some()
    }

    /// Filter name of a node (`in`/`out` for the sentinels).
    pub fn name(&self, id: FilterId) -> Option<&'static str> {
        self.node(id).map(FilterNode::name)
    }

    /// Label of a node.
    pub fn label(&self, id: FilterId) -> Option<&str> {
        self.node(id).and_then(|n| n.label.as_deref())
    }

    /// Whether negotiation inserted the node.
    pub fn is_auto_inserted(&self, id: FilterId) -> bool {
        self.node(id).is_some_and(|n| n.auto_inserted)
    }

    /// Negotiated input format of a node.
    pub fn node_input(&self, id: FilterId) -> Option<AudioFormat> {
        self.node(id).map(|n| n.io.input)
    }

    /// Negotiated output format of a node.
    pub fn node_output(&self, id: FilterId) -> Option<AudioFormat> {
        self.node(id).map(|n| n.io.output)
    }

    /// Declared processing delay of a node in seconds.
    pub fn node_delay(&self, id: FilterId) -> Option<f64> {
        self.node(id).map(|n| n.io.delay)
    }

    /// The node carrying `label`.
    pub fn find_by_label(&self, label: &str) -> Option<FilterId> {
        self.order()
            .into_iter()
            .find(|&id| self.label(id) == Some(label))
    }

    /// The frontmost node created from filter `name`.
    pub fn find_by_name(&self, name: &str) -> Option<FilterId> {
        self.order()
            .into_iter()
            .find(|&id| self.name(id) == Some(name))
    }

    // --- Topology ---

    /// Instantiates a filter from `settings` without linking it.
    fn create_filter(&self, settings: &FilterSettings) -> Result<FilterNode, ChainError> {
        let (info, mut filter) = self
            .registry
            .create(&settings.name)
            .ok_or_else(|| ChainError::UnknownFilter(settings.name.clone()))?;

        if info.flags.contains(FilterFlags::NOT_REENTRANT)
            && self.find_by_name(info.name).is_some()
        {
            return Err(ChainError::NotReentrant(info.name.to_string()));
        }
        if let Some(label) = &settings.label
            && self.find_by_label(label).is_some()
        {
            return Err(ChainError::DuplicateLabel(label.clone()));
        }

        for (param, value) in &settings.args {
            filter
                .set_param(param, value)
                .map_err(|source| ChainError::FilterOpen {
                    name: info.name.to_string(),
                    source,
                })?;
        }
        filter.open().map_err(|source| ChainError::FilterOpen {
            name: info.name.to_string(),
            source,
        })?;

        Ok(FilterNode::new(
            NodeKind::Filter { info, filter },
            settings.label.clone(),
        ))
    }

    fn link_before(&mut self, anchor: FilterId, mut node: FilterNode) -> Result<FilterId, ChainError> {
        let index = u32::try_from(self.nodes.len())
            .map_err(|_| ChainError::InvalidArgument("too many filter nodes".to_string()))?;
        let id = FilterId(index);
        let prev = self.prev_of(anchor);
        node.prev = prev;
        node.next = Some(anchor);
        tracing::debug!("chain_add: {} ({id})", node.display_name());
        self.nodes.push(Some(node));
        if let Some(p) = prev {
            self.slot_mut(p)?.next = Some(id);
        }
        self.slot_mut(anchor)?.prev = Some(id);
        Ok(id)
    }

    /// Creates a filter and links it before `anchor`. Anchoring on the input
    /// sentinel inserts after it instead. The chain must be renegotiated
    /// afterwards.
    pub fn insert_before(
        &mut self,
        anchor: FilterId,
        settings: &FilterSettings,
    ) -> Result<FilterId, ChainError> {
        let anchor = if matches!(self.slot(anchor)?.kind, NodeKind::Input) {
            self.next_of(anchor).ok_or_else(|| stale(anchor))?
        } else {
            anchor
        };
        let node = self.create_filter(settings)?;
        self.link_before(anchor, node)
    }

    /// Creates a filter and links it after `anchor`. Anchoring on the output
    /// sentinel inserts before it instead. The chain must be renegotiated
    /// afterwards.
    pub fn insert_after(
        &mut self,
        anchor: FilterId,
        settings: &FilterSettings,
    ) -> Result<FilterId, ChainError> {
        let before = if matches!(self.slot(anchor)?.kind, NodeKind::Output) {
            anchor
        } else {
            self.next_of(anchor).ok_or_else(|| stale(anchor))?
        };
        let node = self.create_filter(settings)?;
        self.link_before(before, node)
    }

    /// Unlinks and destroys a filter, discarding its queued frames. No-op for
    /// sentinels and unknown IDs. The chain must be renegotiated afterwards.
    pub fn remove(&mut self, id: FilterId) {
        let Some(node) = self.node(id) else {
            return;
        };
        if node.is_sentinel() {
            return;
        }
        let (prev, next) = (node.prev, node.next);
        if let Some(p) = prev.and_then(|p| self.node_mut(p)) {
            p.next = next;
        }
        if let Some(n) = next.and_then(|n| self.node_mut(n)) {
            n.prev = prev;
        }
        let Some(mut node) = self.nodes[id.0 as usize].take() else {
            return;
        };
        tracing::debug!("chain_remove: {} ({id})", node.display_name());
        if let NodeKind::Filter { filter, .. } = &mut node.kind {
            filter.uninit();
        }
    }

    /// Removes every auto-inserted filter.
    pub fn remove_auto_inserted(&mut self) {
        let auto: Vec<FilterId> = self
            .order()
            .into_iter()
            .filter(|&id| self.is_auto_inserted(id))
            .collect();
        for id in auto {
            self.remove(id);
        }
    }

    /// Removes every filter and discards all frames. The chain returns to
    /// [`ChainState::Uninitialized`].
    pub fn teardown(&mut self) {
        for id in self.filters() {
            self.remove(id);
        }
        self.discard_frames();
        for node in self.nodes.iter_mut().flatten() {
            node.io.reset_formats();
        }
        self.state = ChainState::Uninitialized;
    }

    /// Builds the chain from [`settings()`](Self::settings) and negotiates
    /// it. Any previous topology, including a broken one, is torn down first.
    pub fn init(&mut self) -> Result<(), ChainError> {
        self.teardown();
        let settings = self.settings.clone();
        for s in &settings {
            if let Err(e) = self.insert_before(self.last, s) {
                tracing::error!("chain_init: {e}");
                self.teardown();
                return Err(e);
            }
        }
        self.reinit()
    }

    pub(super) fn rebuild(&mut self) {
        tracing::warn!("chain_rebuild: restoring the configured filter list");
        self.emit(ChainEvent::Rebuilt);
        if let Err(e) = self.init() {
            tracing::error!("chain_rebuild: {e}");
        }
    }

    /// Adds a filter in front of the output and renegotiates.
    ///
    /// On success the filter joins [`settings()`](Self::settings), so later
    /// rebuilds keep it. On failure the filter is removed again and the chain
    /// renegotiated; if that fails too, the chain is rebuilt from its
    /// settings.
    pub fn add(&mut self, settings: &FilterSettings) -> Result<FilterId, ChainError> {
        let id = self.insert_before(self.last, settings)?;
        if let Err(e) = self.reinit() {
            tracing::warn!("chain_add: '{}' breaks the chain: {e}", settings.name);
            self.remove(id);
            if self.reinit().is_err() {
                self.rebuild();
            }
            return Err(e);
        }
        self.settings.push(settings.clone());
        Ok(id)
    }

    /// Removes the filter labeled `label` and renegotiates.
    ///
    /// Returns `Ok(false)` if no filter carries the label. On success the
    /// filter also leaves [`settings()`](Self::settings). If renegotiation
    /// fails the chain is rebuilt from the unchanged settings and the error
    /// returned.
    pub fn remove_by_label(&mut self, label: &str) -> Result<bool, ChainError> {
        let Some(id) = self.find_by_label(label) else {
            return Ok(false);
        };
        self.remove(id);
        if let Err(e) = self.reinit() {
            self.rebuild();
            return Err(e);
        }
        self.settings.retain(|s| s.label.as_deref() != Some(label));
        Ok(true)
    }

    // --- Control ---

    /// Sends `cmd` to one node. Sentinels answer [`Reply::Unknown`].
    pub fn control(&mut self, id: FilterId, cmd: &Command) -> Reply {
        match self.node_mut(id) {
            Some(FilterNode {
                kind: NodeKind::Filter { filter, .. },
                io,
                ..
            }) => filter.control(io, cmd),
            _ => Reply::Unknown,
        }
    }

    /// Sends `cmd` to every node front to back. Returns whether any node
    /// accepted it.
    pub fn control_all(&mut self, cmd: &Command) -> bool {
        let mut accepted = false;
        for id in self.order() {
            if self.control(id, cmd) == Reply::Ok {
                accepted = true;
            }
        }
        accepted
    }

    /// Sends `cmd` back to front and stops at the first node accepting it.
    pub fn control_any_rev(&mut self, cmd: &Command) -> Option<FilterId> {
        let mut ids = self.order();
        ids.reverse();
        ids.into_iter()
            .find(|&id| self.control(id, cmd) == Reply::Ok)
    }

    // --- Frames ---

    fn check_ready(&self) -> Result<(), ChainError> {
        match self.state {
            ChainState::Ok => Ok(()),
            ChainState::Broken => Err(ChainError::Broken),
            ChainState::Uninitialized | ChainState::Negotiating => Err(ChainError::NotInitialized),
        }
    }

    pub(super) fn discard_frames(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.io.queue.clear();
            node.flushed = false;
        }
    }

    /// Delivers a frame (or a flush) to one node.
    fn push_frame(&mut self, id: FilterId, frame: Option<AudioFrame>) -> Result<(), ChainError> {
        let FilterNode { kind, io, .. } = self.slot_mut(id)?;
        match kind {
            NodeKind::Input | NodeKind::Output => {
                if let Some(frame) = frame {
                    io.push_output(frame);
                }
                Ok(())
            }
            NodeKind::Filter { info, filter } => {
                filter
                    .filter_frame(io, frame)
                    .map_err(|source| ChainError::Filter {
                        filter: info.name.to_string(),
                        source,
                    })
            }
        }
    }

    fn produce(&mut self, id: FilterId) -> Result<(), ChainError> {
        let FilterNode { kind, io, .. } = self.slot_mut(id)?;
        match kind {
            NodeKind::Filter { info, filter } => {
                filter.filter_out(io).map_err(|source| ChainError::Filter {
                    filter: info.name.to_string(),
                    source,
                })
            }
            NodeKind::Input | NodeKind::Output => Ok(()),
        }
    }

    /// Queues a source frame at the chain input.
    pub fn filter_frame(&mut self, frame: AudioFrame) -> Result<(), ChainError> {
        self.check_ready()?;
        if *frame.format() != self.input {
            return Err(ChainError::FormatMismatch {
                expected: self.input,
                actual: *frame.format(),
            });
        }
        // New input starts a new flush cycle.
        for node in self.nodes.iter_mut().flatten() {
            node.flushed = false;
        }
        self.push_frame(self.first, Some(frame))
    }

    /// Pumps frames toward the output until one is available there or no node
    /// can make progress.
    ///
    /// With `eof` set, each node is flushed once all nodes before it have run
    /// dry.
    pub fn output_frame(&mut self, eof: bool) -> Result<OutputStatus, ChainError> {
        self.check_ready()?;
        loop {
            let mut last_with_output = None;
            for id in self.order() {
                if eof && last_with_output.is_none() {
                    let node = self.slot_mut(id)?;
                    if !node.flushed {
                        node.flushed = true;
                        self.push_frame(id, None)?;
                    }
                }
                if !self.slot(id)?.io.has_output() {
                    self.produce(id)?;
                }
                if self.slot(id)?.io.has_output() {
                    last_with_output = Some(id);
                }
            }

            let Some(last) = last_with_output else {
                return Ok(OutputStatus::NotYet);
            };
            let Some(next) = self.next_of(last) else {
                return Ok(OutputStatus::Available);
            };
            if let Some(frame) = self.slot_mut(last)?.io.pop_output() {
                self.push_frame(next, Some(frame))?;
            }
        }
    }

    /// Takes the next frame from the chain output.
    pub fn read_output_frame(&mut self) -> Option<AudioFrame> {
        if self.state != ChainState::Ok {
            return None;
        }
        let last = self.last;
        self.node_mut(last)?.io.pop_output()
    }

    /// Total latency in seconds: every node's declared delay plus the
    /// duration of frames queued anywhere in the chain.
    pub fn calc_delay(&self) -> f64 {
        self.order()
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|node| {
                let rate = node.io.output.rate;
                let queued = if rate > 0 {
                    node.io.queued_samples() as f64 / f64::from(rate)
                } else {
                    0.0
                };
                node.io.delay + queued
            })
            .sum()
    }

    /// Resets every filter and discards buffered frames, for seeks.
    pub fn seek_reset(&mut self) {
        self.control_all(&Command::Reset);
        self.discard_frames();
    }
}

fn stale(id: FilterId) -> ChainError {
    ChainError::InvalidArgument(format!("{id} is not in the chain"))
}

impl Drop for FilterChain {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.order() {
            let Some(node) = self.node(id) else {
                continue;
            };
            match node.kind {
                NodeKind::Input => writeln!(f, "[in] {}", node.io.output)?,
                NodeKind::Output => writeln!(f, "[out] {}", node.io.output)?,
                NodeKind::Filter { .. } => {
                    f.write_str("  ")?;
                    if let Some(label) = &node.label {
                        write!(f, "@{label}: ")?;
                    }
                    f.write_str(node.name())?;
                    if node.auto_inserted {
                        f.write_str(" (auto)")?;
                    }
                    writeln!(f, " -> {}", node.io.output)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .order()
            .into_iter()
            .filter_map(|id| self.node(id).map(FilterNode::display_name))
            .collect();
        f.debug_struct("FilterChain")
            .field("state", &self.state)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("nodes", &names)
            .finish_non_exhaustive()
    }
}
