//! Format negotiation.
//!
//! The negotiator walks the chain front to back. Each node is offered its
//! predecessor's output. When a node needs a different input, the mismatch
//! is fixed in this order, one property per attempt:
//!
//! 1. channel map: the predecessor adopts it, or a resampler is inserted;
//! 2. sample rate: the predecessor adopts it, or a resampler is inserted;
//! 3. sample format: the first hop of the cheapest conversion path is
//!    inserted.
//!
//! After a fix the walk restarts at the node that changed, so its new output
//! flows back into the mismatching node. Every fix costs one unit of a
//! budget of seven per node; running out breaks the chain.
//!
//! A forced chain skips all of this: the first mismatch fails.

use crate::error::ChainError;
use crate::filter::{Command, FilterSettings, Reply};
use crate::format::AudioFormat;
use crate::path::find_conversion;

use super::node::{FilterId, FilterNode, NodeKind};
use super::processing::{ChainEvent, ChainState, FilterChain};

/// Adjustment attempts allowed per node.
const RETRIES_PER_NODE: usize = 7;

impl FilterChain {
    /// Renegotiates formats along the whole chain.
    ///
    /// Auto-inserted filters are removed and all buffered frames discarded
    /// first. On failure the chain is [`ChainState::Broken`] until rebuilt
    /// with [`init()`](Self::init).
    pub fn reinit(&mut self) -> Result<(), ChainError> {
        self.state = ChainState::Negotiating;
        match self.negotiate() {
            Ok(()) => {
                self.state = ChainState::Ok;
                tracing::debug!("chain_reinit: negotiated\n{self}");
                Ok(())
            }
            Err(e) => {
                self.state = ChainState::Broken;
                tracing::error!("chain_reinit: {e}");
                tracing::debug!("chain_reinit: broken chain\n{self}");
                self.emit(ChainEvent::Broken { error: e.clone() });
                Err(e)
            }
        }
    }

    fn negotiate(&mut self) -> Result<(), ChainError> {
        self.discard_frames();
        self.remove_auto_inserted();
        for node in self.nodes.iter_mut().flatten() {
            node.io.reset_formats();
        }

        let input = self.input;
        if !input.is_complete() {
            return Err(ChainError::MalformedFormat {
                format: input,
                filter: "in".to_string(),
            });
        }
        let first = self.first;
        let io = &mut self.slot_mut(first)?.io;
        io.input = input;
        io.output = input;

        let budget_total = RETRIES_PER_NODE * self.order().len();
        let mut budget = budget_total;
        let mut cur = self.next_of(first);

        while let Some(id) = cur {
            let prev = self.prev_of(id).ok_or_else(|| {
                ChainError::InvalidArgument(format!("{id} has no predecessor"))
            })?;
            let candidate = self.slot(prev)?.io.output;
            let name = self.slot(id)?.display_name().to_string();
            if !candidate.is_complete() {
                return Err(ChainError::MalformedFormat {
                    format: candidate,
                    filter: name,
                });
            }

            let reply = self.reinit_node(id, &candidate)?;
            tracing::debug!("chain_reinit: {name} <- {candidate}: {reply:?}");

            match reply {
                Reply::Ok => {
                    let output = self.slot(id)?.io.output;
                    if !output.is_complete() {
                        return Err(ChainError::FilterRejected {
                            filter: name,
                            reason: format!("produced incomplete output {output}"),
                        });
                    }
                    cur = self.next_of(id);
                }
                Reply::NeedsAdjustment(required) => {
                    let required = candidate.overlay(&required);
                    self.slot_mut(id)?.io.input = required;
                    if self.forced {
                        return Err(ChainError::AutoConversionDisabled {
                            from: candidate,
                            to: required,
                            filter: name,
                        });
                    }
                    if budget == 0 {
                        return Err(ChainError::RetryBudgetExhausted(budget_total));
                    }
                    if let Some(restart) = self.fix_mismatch(prev, id, &candidate, &required)? {
                        budget -= 1;
                        cur = Some(restart);
                    } else if candidate.is_passthrough() != required.is_passthrough()
                        && id != self.last
                        && self.next_of(id).is_some()
                    {
                        tracing::warn!(
                            "chain_reinit: removing '{name}', it cannot take passthrough format {candidate}"
                        );
                        self.emit(ChainEvent::PassthroughRemoved { filter: name });
                        self.remove(id);
                        cur = self.next_of(prev);
                    } else {
                        return Err(ChainError::NoConversion {
                            from: candidate,
                            to: required,
                            filter: name,
                        });
                    }
                }
                Reply::Detach if self.forced => {
                    tracing::debug!("chain_reinit: '{name}' asked to detach, kept in forced mode");
                    let io = &mut self.slot_mut(id)?.io;
                    io.input = candidate;
                    io.output = candidate;
                    cur = self.next_of(id);
                }
                Reply::Detach => {
                    tracing::debug!("chain_reinit: '{name}' detached");
                    self.emit(ChainEvent::Detached { filter: name });
                    self.remove(id);
                    cur = self.next_of(prev);
                }
                Reply::Unknown => {
                    return Err(ChainError::FilterRejected {
                        filter: name,
                        reason: "reinit not supported".to_string(),
                    });
                }
                Reply::Error(e) => {
                    return Err(ChainError::FilterRejected {
                        filter: name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let actual = self.slot(self.last)?.io.output;
        self.output.fill_unset_from(&actual);
        if self.output != actual {
            return Err(ChainError::OutputFormatChanged {
                fixed: self.output,
                actual,
            });
        }
        Ok(())
    }

    /// Offers `candidate` to one node. The output sentinel accepts exactly
    /// the sink format, with unset fields taken from the candidate.
    fn reinit_node(&mut self, id: FilterId, candidate: &AudioFormat) -> Result<Reply, ChainError> {
        if id == self.last {
            let required = self.output_requirement(candidate)?;
            let io = &mut self.slot_mut(id)?.io;
            io.input = *candidate;
            if required == *candidate {
                io.output = *candidate;
                return Ok(Reply::Ok);
            }
            return Ok(Reply::NeedsAdjustment(required));
        }

        let FilterNode { kind, io, .. } = self.slot_mut(id)?;
        io.input = *candidate;
        Ok(match kind {
            NodeKind::Filter { filter, .. } => filter.control(io, &Command::Reinit(*candidate)),
            NodeKind::Input | NodeKind::Output => Reply::Unknown,
        })
    }

    fn output_requirement(&self, candidate: &AudioFormat) -> Result<AudioFormat, ChainError> {
        let mut target = self.output;
        if target.channels.is_empty()
            && let Some(selector) = &self.output_layouts
        {
            target.channels = selector
                .adjust(&candidate.channels)
                .ok_or_else(|| ChainError::NoLayout(candidate.channels.to_string()))?;
        }
        Ok(candidate.overlay(&target))
    }

    /// Applies one fix for the mismatch at `id`. Returns the node to restart
    /// from, or `None` if nothing applies.
    fn fix_mismatch(
        &mut self,
        prev: FilterId,
        id: FilterId,
        candidate: &AudioFormat,
        required: &AudioFormat,
    ) -> Result<Option<FilterId>, ChainError> {
        // Channel and rate conversion would decode the bitstream.
        let pcm = !candidate.is_passthrough() && !required.is_passthrough();

        if pcm && required.channels != candidate.channels {
            let cmd = Command::SetChannels(required.channels);
            return self.adopt_or_insert(prev, id, &cmd).map(Some);
        }
        if pcm && required.rate != candidate.rate {
            let cmd = Command::SetSampleRate(required.rate);
            return self.adopt_or_insert(prev, id, &cmd).map(Some);
        }
        if let (Some(from), Some(to)) = (candidate.format, required.format)
            && from != to
            && let Some(step) = find_conversion(&self.registry, from, to)
        {
            let name = self
                .registry
                .info(step.filter)
                .map(|info| info.name)
                .ok_or_else(|| ChainError::UnknownFilter(format!("#{}", step.filter)))?;
            let new = self.insert_auto(id, name)?;
            self.expect_ok(new, &Command::SetFormat(step.format))?;
            return Ok(Some(new));
        }
        Ok(None)
    }

    /// Asks `prev` to apply `cmd`; failing that, inserts the resampler before
    /// `id` and applies `cmd` to it.
    fn adopt_or_insert(
        &mut self,
        prev: FilterId,
        id: FilterId,
        cmd: &Command,
    ) -> Result<FilterId, ChainError> {
        if self.control(prev, cmd) == Reply::Ok {
            tracing::debug!(
                "chain_reinit: {} adopts {}",
                self.slot(prev)?.display_name(),
                cmd.name()
            );
            return Ok(prev);
        }
        let resampler = self.resampler.clone();
        let new = self.insert_auto(id, &resampler)?;
        self.expect_ok(new, cmd)?;
        Ok(new)
    }

    fn insert_auto(&mut self, before: FilterId, name: &str) -> Result<FilterId, ChainError> {
        let new = self.insert_before(before, &FilterSettings::new(name))?;
        self.slot_mut(new)?.auto_inserted = true;
        let before = self.slot(before)?.display_name().to_string();
        tracing::debug!("chain_reinit: auto-inserted '{name}' before '{before}'");
        self.emit(ChainEvent::AutoInserted {
            filter: name.to_string(),
            before,
        });
        Ok(new)
    }

    fn expect_ok(&mut self, id: FilterId, cmd: &Command) -> Result<(), ChainError> {
        match self.control(id, cmd) {
            Reply::Ok => Ok(()),
            reply => Err(ChainError::FilterRejected {
                filter: self.slot(id)?.display_name().to_string(),
                reason: format!("{} answered {reply:?}", cmd.name()),
            }),
        }
    }
}
