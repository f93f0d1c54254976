//! Channel map selection policy.
//!
//! A [`ChannelMapSelector`] describes which channel maps a sink accepts and
//! picks the best accepted map for a requested one. Sinks build one per
//! negotiation: "anything", "anything in waveext order", an explicit list of
//! maps, or any map made only of whitelisted speakers.
//!
//! Selection ([`adjust()`](ChannelMapSelector::adjust)) tries, in order: the
//! request itself, a default layout for unknown requests, the best explicit
//! map according to [`is_better()`], speaker replacements (side <-> back
//! surrounds), and finally stereo and mono.
//!
//! ```rust
//! use cadena_core::{ChannelMap, ChannelMapSelector};
//!
//! let mut sel = ChannelMapSelector::new();
//! sel.add_map(&"5.1".parse().unwrap());
//! sel.add_map(&ChannelMap::STEREO);
//!
//! let picked = sel.adjust(&"7.1".parse().unwrap()).unwrap();
//! assert_eq!(picked.to_string(), "5.1");
//! ```

use crate::chmap::{ChannelMap, SPEAKER_ID_COUNT, Speaker};

/// Speaker groups that may stand in for each other, in both directions.
const SPEAKER_REPLACEMENTS: [[&[Speaker]; 2]; 2] = [
    // 5.1 <-> 5.1(side)
    [
        &[Speaker::SideLeft, Speaker::SideRight],
        &[Speaker::BackLeft, Speaker::BackRight],
    ],
    // 7.1 <-> 7.1(rear)
    [
        &[Speaker::SideLeft, Speaker::SideRight],
        &[Speaker::SurroundDirectLeft, Speaker::SurroundDirectRight],
    ],
];

/// Conversions that are preferred over any loss-minimizing choice. Each pair
/// goes strictly from the first layout to the second.
const PREFERRED_REMIX: [(ChannelMap, ChannelMap); 1] = [(ChannelMap::MONO, ChannelMap::STEREO)];

/// Acceptance rules for channel maps.
///
/// A map is acceptable iff it is valid and at least one rule matches.
#[derive(Debug, Clone)]
pub struct ChannelMapSelector {
    allow_any: bool,
    allow_waveext: bool,
    speakers: [bool; SPEAKER_ID_COUNT],
    maps: Vec<ChannelMap>,
}

impl Default for ChannelMapSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelMapSelector {
    /// A selector that rejects everything.
    pub fn new() -> Self {
        Self {
            allow_any: false,
            allow_waveext: false,
            speakers: [false; SPEAKER_ID_COUNT],
            maps: Vec::new(),
        }
    }

    /// Accept every valid map as-is.
    pub fn allow_any(&mut self) -> &mut Self {
        self.allow_any = true;
        self
    }

    /// Accept every map representable in waveext order, reordering it.
    pub fn allow_waveext(&mut self) -> &mut Self {
        self.allow_waveext = true;
        self
    }

    /// Accept a specific map (or any reordering of it, which is then
    /// reordered to this map). Invalid maps are ignored.
    pub fn add_map(&mut self, map: &ChannelMap) -> &mut Self {
        if map.is_valid() {
            self.maps.push(*map);
        }
        self
    }

    /// Accept the default layouts for 1 to 8 channels.
    pub fn allow_waveext_defaults(&mut self) -> &mut Self {
        for n in 1..=8 {
            self.add_map(&ChannelMap::from_channels(n));
        }
        self
    }

    /// Accept any map made only of whitelisted speakers.
    pub fn add_speaker(&mut self, speaker: Speaker) -> &mut Self {
        self.speakers[speaker.id() as usize] = true;
        self
    }

    /// The explicitly allowed maps, in insertion order.
    pub fn maps(&self) -> &[ChannelMap] {
        &self.maps
    }

    fn test_speakers(&self, map: &ChannelMap) -> bool {
        map.speakers()
            .iter()
            .all(|sp| self.speakers[sp.id() as usize])
    }

    fn test_maps(&self, map: &ChannelMap) -> Option<ChannelMap> {
        self.maps.iter().find(|m| m.equals_reordered(map)).copied()
    }

    fn test_waveext(&self, map: &ChannelMap) -> Option<ChannelMap> {
        if !self.allow_waveext {
            return None;
        }
        let reordered = map.to_waveext_order();
        reordered.is_waveext_order().then_some(reordered)
    }

    /// Returns the form in which `map` is accepted (possibly reordered), or
    /// `None` if no rule accepts it.
    pub fn test(&self, map: &ChannelMap) -> Option<ChannelMap> {
        if !map.is_valid() {
            return None;
        }
        if self.allow_any {
            return Some(*map);
        }
        if let Some(t) = self.test_waveext(map) {
            return Some(t);
        }
        if self.test_speakers(map) {
            return Some(*map);
        }
        self.test_maps(map)
    }

    /// Picks the map to use for `map`.
    ///
    /// An accepted request is returned in its accepted form. Returns `None`
    /// if the policy admits no layout at all; callers must not continue with
    /// a partial map.
    pub fn adjust(&self, map: &ChannelMap) -> Option<ChannelMap> {
        if let Some(t) = self.test(map) {
            return Some(t);
        }
        if map.is_unknown()
            && let Some(def) = self.default_for(&ChannelMap::EMPTY, map.len())
            && let Some(t) = self.test(&def)
        {
            return Some(t);
        }

        if let Some(best) = self.fallback(map) {
            return Some(best);
        }

        for pair in &SPEAKER_REPLACEMENTS {
            if let Some(replaced) = replace_speakers(map, pair)
                && let Some(t) = self.test(&replaced)
            {
                return Some(t);
            }
        }

        self.test(&ChannelMap::STEREO)
            .or_else(|| self.test(&ChannelMap::MONO))
    }

    /// The best explicitly allowed map for `map` according to
    /// [`is_better()`]. Unknown entries are skipped.
    pub fn fallback(&self, map: &ChannelMap) -> Option<ChannelMap> {
        let mut best = ChannelMap::EMPTY;
        for candidate in &self.maps {
            if candidate.is_unknown() {
                continue;
            }
            if is_better(map, &best, candidate) {
                best = *candidate;
            }
        }
        (!best.is_empty()).then_some(best)
    }

    /// A layout with `count` channels for sinks that only report a channel
    /// count. Returns `map` itself if it already has `count` channels,
    /// otherwise the default layout in waveext order if accepted, otherwise
    /// the first explicit map with `count` channels.
    pub fn default_for(&self, map: &ChannelMap, count: usize) -> Option<ChannelMap> {
        if map.len() == count {
            return (!map.is_empty()).then_some(*map);
        }
        let def = ChannelMap::from_channels(count).to_waveext_order();
        self.test(&def)
            .or_else(|| self.maps.iter().find(|m| m.len() == count).copied())
    }
}

/// Replaces speakers of one group with the other, trying both directions.
/// Returns `None` if nothing was replaced or the result is invalid.
fn replace_speakers(map: &ChannelMap, pair: &[&[Speaker]; 2]) -> Option<ChannelMap> {
    if !map.is_valid() {
        return None;
    }
    for (from, to) in [(pair[1], pair[0]), (pair[0], pair[1])] {
        let mut replaced = false;
        let mut out = ChannelMap::EMPTY;
        for &sp in map.speakers() {
            let sub = match from.iter().position(|&f| f == sp) {
                Some(i) => {
                    replaced = true;
                    to[i]
                }
                None => sp,
            };
            out.push(sub);
        }
        if replaced && out.is_valid() {
            return Some(out);
        }
    }
    None
}

fn test_preferred_remix(src: &ChannelMap, dst: &ChannelMap) -> bool {
    let src = src.without_na();
    let dst = dst.without_na();
    PREFERRED_REMIX
        .iter()
        .any(|(a, b)| a.equals_reordered(&src) && b.equals_reordered(&dst))
}

/// Like [`ChannelMap::diff_count`], minimized over every speaker
/// replacement. Stereo counts as a lossless stand-in for mono.
fn diff_count_replaced(req: &ChannelMap, candidate: &ChannelMap) -> usize {
    let mut min = req.diff_count(candidate);
    for pair in &SPEAKER_REPLACEMENTS {
        if let Some(replaced) = replace_speakers(req, pair) {
            min = min.min(replaced.diff_count(candidate));
        }
    }
    if req.is_mono() && candidate.is_stereo() {
        min = 0;
    }
    min
}

/// Whether `new` should replace `old` as the pick for `req`.
///
/// An empty `old` always loses. Exact matches win, then a preferred remix,
/// then fewer lost speakers counting replacements, then fewer lost speakers
/// without replacements, then fewer real speakers, then fewer channels.
pub fn is_better(req: &ChannelMap, old: &ChannelMap, new: &ChannelMap) -> bool {
    if old.is_empty() {
        return true;
    }

    if req == old {
        return false;
    }
    if req == new {
        return true;
    }

    let old_pref = test_preferred_remix(req, old);
    let new_pref = test_preferred_remix(req, new);
    if old_pref != new_pref {
        return new_pref;
    }

    let old_lost_r = diff_count_replaced(req, old);
    let new_lost_r = diff_count_replaced(req, new);
    if new_lost_r != old_lost_r {
        return new_lost_r < old_lost_r;
    }

    let old_p = old.without_na();
    let new_p = new.without_na();

    let old_lost = req.diff_count(&old_p);
    let new_lost = req.diff_count(&new_p);
    if new_lost != old_lost {
        return new_lost < old_lost;
    }

    if old_p.len() != new_p.len() {
        return new_p.len() < old_p.len();
    }

    new.len() < old.len()
}
