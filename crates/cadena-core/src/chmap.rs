//! Speaker identifiers and channel maps.
//!
//! A [`ChannelMap`] is an ordered list of [`Speaker`]s, one per audio channel.
//! Speaker ids follow the wave-extensible bit numbering so that a map in
//! "waveext order" (strictly increasing ids) can be represented as a 64-bit
//! speaker mask. [`Speaker::Na`] marks padding channels that carry no signal.
//!
//! # String forms
//!
//! Channel maps round-trip through strings:
//!
//! - speaker lists: `"fl-fr-lfe"`
//! - standard layout names: `"stereo"`, `"5.1(side)"`, `"7.1"`
//! - channel counts: `"6"` (default layout for that count)
//! - unknown layouts: `"unknown4"` (four channels, no speaker meaning)
//!
//! ```rust
//! use cadena_core::{ChannelMap, Speaker};
//!
//! let map: ChannelMap = "5.1".parse().unwrap();
//! assert_eq!(map.len(), 6);
//! assert_eq!(map.speakers()[3], Speaker::LowFrequency);
//! assert_eq!(map.to_string(), "5.1");
//! ```

use core::fmt;
use core::str::FromStr;

/// Maximum number of channels in a [`ChannelMap`].
pub const MAX_CHANNELS: usize = 64;

/// Number of distinct speaker id slots (ids `0..=64`).
pub const SPEAKER_ID_COUNT: usize = 65;

/// A speaker position.
///
/// Discriminants are the wave-extensible speaker bit indices; ids 18..=28 are
/// unassigned. [`Speaker::Na`] (id 64) is not representable in a speaker mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Speaker {
    /// Front left.
    FrontLeft = 0,
    /// Front right.
    FrontRight = 1,
    /// Front center.
    FrontCenter = 2,
    /// Low frequency effects.
    LowFrequency = 3,
    /// Back left.
    BackLeft = 4,
    /// Back right.
    BackRight = 5,
    /// Front left-of-center.
    FrontLeftOfCenter = 6,
    /// Front right-of-center.
    FrontRightOfCenter = 7,
    /// Back center.
    BackCenter = 8,
    /// Side left.
    SideLeft = 9,
    /// Side right.
    SideRight = 10,
    /// Top center.
    TopCenter = 11,
    /// Top front left.
    TopFrontLeft = 12,
    /// Top front center.
    TopFrontCenter = 13,
    /// Top front right.
    TopFrontRight = 14,
    /// Top back left.
    TopBackLeft = 15,
    /// Top back center.
    TopBackCenter = 16,
    /// Top back right.
    TopBackRight = 17,
    /// Downmix left.
    DownmixLeft = 29,
    /// Downmix right.
    DownmixRight = 30,
    /// Wide left.
    WideLeft = 31,
    /// Wide right.
    WideRight = 32,
    /// Surround direct left.
    SurroundDirectLeft = 33,
    /// Surround direct right.
    SurroundDirectRight = 34,
    /// Second low frequency channel.
    LowFrequency2 = 35,
    /// Padding channel without signal.
    Na = 64,
}

impl Speaker {
    /// Every speaker, in id order.
    pub const ALL: [Speaker; 26] = [
        Speaker::FrontLeft,
        Speaker::FrontRight,
        Speaker::FrontCenter,
        Speaker::LowFrequency,
        Speaker::BackLeft,
        Speaker::BackRight,
        Speaker::FrontLeftOfCenter,
        Speaker::FrontRightOfCenter,
        Speaker::BackCenter,
        Speaker::SideLeft,
        Speaker::SideRight,
        Speaker::TopCenter,
        Speaker::TopFrontLeft,
        Speaker::TopFrontCenter,
        Speaker::TopFrontRight,
        Speaker::TopBackLeft,
        Speaker::TopBackCenter,
        Speaker::TopBackRight,
        Speaker::DownmixLeft,
        Speaker::DownmixRight,
        Speaker::WideLeft,
        Speaker::WideRight,
        Speaker::SurroundDirectLeft,
        Speaker::SurroundDirectRight,
        Speaker::LowFrequency2,
        Speaker::Na,
    ];

    /// Returns the numeric speaker id.
    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Looks up a speaker by numeric id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }

    /// Short name as used in channel map strings (`"fl"`, `"lfe"`, ...).
    pub const fn short_name(self) -> &'static str {
        match self {
            Speaker::FrontLeft => "fl",
            Speaker::FrontRight => "fr",
            Speaker::FrontCenter => "fc",
            Speaker::LowFrequency => "lfe",
            Speaker::BackLeft => "bl",
            Speaker::BackRight => "br",
            Speaker::FrontLeftOfCenter => "flc",
            Speaker::FrontRightOfCenter => "frc",
            Speaker::BackCenter => "bc",
            Speaker::SideLeft => "sl",
            Speaker::SideRight => "sr",
            Speaker::TopCenter => "tc",
            Speaker::TopFrontLeft => "tfl",
            Speaker::TopFrontCenter => "tfc",
            Speaker::TopFrontRight => "tfr",
            Speaker::TopBackLeft => "tbl",
            Speaker::TopBackCenter => "tbc",
            Speaker::TopBackRight => "tbr",
            Speaker::DownmixLeft => "dl",
            Speaker::DownmixRight => "dr",
            Speaker::WideLeft => "wl",
            Speaker::WideRight => "wr",
            Speaker::SurroundDirectLeft => "sdl",
            Speaker::SurroundDirectRight => "sdr",
            Speaker::LowFrequency2 => "lfe2",
            Speaker::Na => "na",
        }
    }

    /// Human-readable name.
    pub const fn long_name(self) -> &'static str {
        match self {
            Speaker::FrontLeft => "front left",
            Speaker::FrontRight => "front right",
            Speaker::FrontCenter => "front center",
            Speaker::LowFrequency => "low frequency",
            Speaker::BackLeft => "back left",
            Speaker::BackRight => "back right",
            Speaker::FrontLeftOfCenter => "front left-of-center",
            Speaker::FrontRightOfCenter => "front right-of-center",
            Speaker::BackCenter => "back center",
            Speaker::SideLeft => "side left",
            Speaker::SideRight => "side right",
            Speaker::TopCenter => "top center",
            Speaker::TopFrontLeft => "top front left",
            Speaker::TopFrontCenter => "top front center",
            Speaker::TopFrontRight => "top front right",
            Speaker::TopBackLeft => "top back left",
            Speaker::TopBackCenter => "top back center",
            Speaker::TopBackRight => "top back right",
            Speaker::DownmixLeft => "downmix left",
            Speaker::DownmixRight => "downmix right",
            Speaker::WideLeft => "wide left",
            Speaker::WideRight => "wide right",
            Speaker::SurroundDirectLeft => "surround direct left",
            Speaker::SurroundDirectRight => "surround direct right",
            Speaker::LowFrequency2 => "low frequency 2",
            Speaker::Na => "not available",
        }
    }

    /// Looks up a speaker by its short name.
    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.short_name() == name)
    }
}

/// Standard layout names and their speaker lists, in the order used for
/// display lookups.
pub const STANDARD_LAYOUTS: &[(&str, &str)] = &[
    ("empty", ""),
    ("mono", "fc"),
    ("1.0", "fc"),
    ("stereo", "fl-fr"),
    ("2.0", "fl-fr"),
    ("2.1", "fl-fr-lfe"),
    ("3.0", "fl-fr-fc"),
    ("3.0(back)", "fl-fr-bc"),
    ("4.0", "fl-fr-fc-bc"),
    ("quad", "fl-fr-bl-br"),
    ("quad(side)", "fl-fr-sl-sr"),
    ("3.1", "fl-fr-fc-lfe"),
    ("3.1(back)", "fl-fr-lfe-bc"),
    ("5.0", "fl-fr-fc-bl-br"),
    ("5.0(alsa)", "fl-fr-bl-br-fc"),
    ("5.0(side)", "fl-fr-fc-sl-sr"),
    ("4.1", "fl-fr-fc-lfe-bc"),
    ("4.1(alsa)", "fl-fr-bl-br-lfe"),
    ("5.1", "fl-fr-fc-lfe-bl-br"),
    ("5.1(alsa)", "fl-fr-bl-br-fc-lfe"),
    ("5.1(side)", "fl-fr-fc-lfe-sl-sr"),
    ("6.0", "fl-fr-fc-bc-sl-sr"),
    ("6.0(front)", "fl-fr-flc-frc-sl-sr"),
    ("hexagonal", "fl-fr-fc-bl-br-bc"),
    ("6.1", "fl-fr-fc-lfe-bc-sl-sr"),
    ("6.1(back)", "fl-fr-fc-lfe-bl-br-bc"),
    ("6.1(top)", "fl-fr-fc-lfe-bl-br-tc"),
    ("6.1(front)", "fl-fr-lfe-flc-frc-sl-sr"),
    ("7.0", "fl-fr-fc-bl-br-sl-sr"),
    ("7.0(front)", "fl-fr-fc-flc-frc-sl-sr"),
    ("7.0(rear)", "fl-fr-fc-bl-br-sdl-sdr"),
    ("7.1", "fl-fr-fc-lfe-bl-br-sl-sr"),
    ("7.1(alsa)", "fl-fr-bl-br-fc-lfe-sl-sr"),
    ("7.1(wide)", "fl-fr-fc-lfe-bl-br-flc-frc"),
    ("7.1(wide-side)", "fl-fr-fc-lfe-flc-frc-sl-sr"),
    ("7.1(rear)", "fl-fr-fc-lfe-bl-br-sdl-sdr"),
    ("octagonal", "fl-fr-fc-bl-br-bc-sl-sr"),
];

/// Error returned when a string is not a channel map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid channel map '{input}'")]
pub struct ChannelMapParseError {
    /// The rejected input.
    pub input: String,
}

/// An ordered list of speakers, one per channel.
///
/// Plain value type: cheap to copy, compared positionally by `==` and as a
/// set by [`equals_reordered()`](Self::equals_reordered). Slots beyond
/// [`len()`](Self::len) are always [`Speaker::Na`], so the derived equality
/// and hash only see the used prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMap {
    num: u8,
    speakers: [Speaker; MAX_CHANNELS],
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::EMPTY
    }
}

use Speaker::{
    BackCenter, BackLeft, BackRight, FrontCenter, FrontLeft, FrontRight, LowFrequency, SideLeft,
    SideRight,
};

impl ChannelMap {
    /// The empty map (zero channels). Used as "unset" in target formats.
    pub const EMPTY: Self = Self {
        num: 0,
        speakers: [Speaker::Na; MAX_CHANNELS],
    };

    /// Single front-center channel.
    pub const MONO: Self = Self::layout(&[FrontCenter]);

    /// Front left + front right.
    pub const STEREO: Self = Self::layout(&[FrontLeft, FrontRight]);

    /// Default layouts indexed by channel count (0..=8).
    const DEFAULT_LAYOUTS: [ChannelMap; 9] = [
        Self::EMPTY,
        Self::MONO,
        Self::STEREO,
        Self::layout(&[FrontLeft, FrontRight, LowFrequency]),
        Self::layout(&[FrontLeft, FrontRight, FrontCenter, BackCenter]),
        Self::layout(&[FrontLeft, FrontRight, FrontCenter, BackLeft, BackRight]),
        Self::layout(&[
            FrontLeft,
            FrontRight,
            FrontCenter,
            LowFrequency,
            BackLeft,
            BackRight,
        ]),
        Self::layout(&[
            FrontLeft,
            FrontRight,
            FrontCenter,
            LowFrequency,
            BackCenter,
            SideLeft,
            SideRight,
        ]),
        Self::layout(&[
            FrontLeft,
            FrontRight,
            FrontCenter,
            LowFrequency,
            BackLeft,
            BackRight,
            SideLeft,
            SideRight,
        ]),
    ];

    const fn layout(list: &[Speaker]) -> Self {
        assert!(list.len() <= MAX_CHANNELS);
        let mut map = Self::EMPTY;
        let mut i = 0;
        while i < list.len() {
            map.speakers[i] = list[i];
            i += 1;
        }
        map.num = list.len() as u8;
        map
    }

    /// Builds a map from a speaker list. Returns `None` if the list is longer
    /// than [`MAX_CHANNELS`]. The result is not checked for duplicates; see
    /// [`is_valid()`](Self::is_valid).
    pub fn from_speakers(list: &[Speaker]) -> Option<Self> {
        (list.len() <= MAX_CHANNELS).then(|| Self::layout(list))
    }

    /// Default layout for a channel count: the standard layouts for 1..=8
    /// channels, an unknown layout above that. Out-of-range counts yield the
    /// empty map.
    pub fn from_channels(count: usize) -> Self {
        match Self::DEFAULT_LAYOUTS.get(count) {
            Some(map) if count > 0 => *map,
            _ => Self::unknown(count),
        }
    }

    /// A layout of `count` padding channels: a channel count without speaker
    /// meaning. Counts of 0 or above [`MAX_CHANNELS`] yield the empty map.
    pub fn unknown(count: usize) -> Self {
        if count > MAX_CHANNELS {
            return Self::EMPTY;
        }
        let mut map = Self::EMPTY;
        map.num = count as u8;
        map
    }

    /// Number of channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.num as usize
    }

    /// Whether the map has zero channels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    /// The speakers of each channel, in channel order.
    #[inline]
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers[..self.len()]
    }

    /// Appends a speaker. Returns `false` if the map is full.
    pub fn push(&mut self, speaker: Speaker) -> bool {
        if self.len() >= MAX_CHANNELS {
            return false;
        }
        self.speakers[self.len()] = speaker;
        self.num += 1;
        true
    }

    /// At least one channel, and no speaker other than `Na` appears twice.
    pub fn is_valid(&self) -> bool {
        let mut mapped = [false; SPEAKER_ID_COUNT];
        for &sp in self.speakers() {
            let id = sp.id() as usize;
            if sp != Speaker::Na {
                if mapped[id] {
                    return false;
                }
                mapped[id] = true;
            }
        }
        !self.is_empty()
    }

    /// A valid map consisting only of padding channels.
    pub fn is_unknown(&self) -> bool {
        self.speakers().iter().all(|&s| s == Speaker::Na) && self.is_valid()
    }

    /// Whether this is exactly `fl-fr`.
    pub fn is_stereo(&self) -> bool {
        *self == Self::STEREO
    }

    /// Whether this is exactly `fc`.
    pub fn is_mono(&self) -> bool {
        *self == Self::MONO
    }

    /// Number of non-padding channels.
    pub fn speaker_count(&self) -> usize {
        self.speakers().iter().filter(|&&s| s != Speaker::Na).count()
    }

    /// Same speakers, possibly in a different order.
    pub fn equals_reordered(&self, other: &Self) -> bool {
        self.reordered_norm() == other.reordered_norm()
    }

    /// Sorted by speaker id (padding last).
    pub fn reordered_norm(&self) -> Self {
        let mut map = *self;
        let n = map.len();
        map.speakers[..n].sort_unstable();
        map
    }

    /// Copy with every padding channel removed.
    pub fn without_na(&self) -> Self {
        let mut map = Self::EMPTY;
        for &sp in self.speakers() {
            if sp != Speaker::Na {
                map.push(sp);
            }
        }
        map
    }

    /// Copy padded with `Na` channels up to `count` channels.
    pub fn with_na_fill(&self, count: usize) -> Self {
        let mut map = *self;
        while map.len() < count.min(MAX_CHANNELS) {
            map.push(Speaker::Na);
        }
        map
    }

    /// Speaker mask ignoring channel order. Unknown layouts map to the low
    /// `len()` bits so that the channel count survives; `Na` entries of
    /// partially known layouts are dropped.
    pub fn waveext_mask_unchecked(&self) -> u64 {
        if self.is_unknown() {
            return if self.len() == 64 {
                u64::MAX
            } else {
                (1u64 << self.len()) - 1
            };
        }
        self.speakers()
            .iter()
            .filter(|s| s.id() < 64)
            .fold(0u64, |mask, s| mask | (1u64 << s.id()))
    }

    /// Speaker mask, or `None` if the map is not in waveext order.
    pub fn waveext_mask(&self) -> Option<u64> {
        self.is_waveext_order()
            .then(|| self.waveext_mask_unchecked())
    }

    /// Builds a map from a speaker mask, channels in increasing id order.
    /// Bits without an assigned speaker are skipped.
    pub fn from_waveext_mask(mask: u64) -> Self {
        let mut map = Self::EMPTY;
        for bit in 0..64u8 {
            if mask & (1u64 << bit) != 0 {
                if let Some(sp) = Speaker::from_id(bit) {
                    map.push(sp);
                }
            }
        }
        map
    }

    /// Valid, and either unknown or with strictly increasing speaker ids
    /// below 64.
    pub fn is_waveext_order(&self) -> bool {
        if !self.is_valid() {
            return false;
        }
        if self.is_unknown() {
            return true;
        }
        self.speakers().windows(2).all(|w| w[0].id() < w[1].id())
            && self.speakers().iter().all(|s| s.id() < 64)
    }

    /// Reordered to waveext order. Invalid maps are returned unchanged.
    /// Padding channels of partially known maps are dropped.
    pub fn to_waveext_order(&self) -> Self {
        if !self.is_valid() {
            return *self;
        }
        if self.is_unknown() {
            return *self;
        }
        Self::from_waveext_mask(self.waveext_mask_unchecked())
    }

    /// Number of speakers present in `self` but absent from `other`.
    pub fn diff_count(&self, other: &Self) -> usize {
        let a = self.waveext_mask_unchecked();
        let b = other.waveext_mask_unchecked();
        ((a ^ b) & a).count_ones() as usize
    }

    /// For each channel of `self`, the index of the channel in `from` that
    /// carries the same speaker, or `None` if `from` lacks it. If either map
    /// is unknown, channels are matched by position.
    pub fn source_indices(&self, from: &Self) -> Vec<Option<usize>> {
        if self.is_unknown() || from.is_unknown() {
            return (0..self.len())
                .map(|n| (n < from.len()).then_some(n))
                .collect();
        }
        self.speakers()
            .iter()
            .map(|sp| from.speakers().iter().position(|s| s == sp))
            .collect()
    }

    /// Canonical speaker list string (`"fl-fr-fc"`), without layout names.
    fn speaker_list(&self) -> String {
        self.speakers()
            .iter()
            .map(|s| s.short_name())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Human-readable form: padding removed, and a standard layout name used
    /// when the speakers match one in any order (`"fc-fl-fr-na"` becomes
    /// `"3.0"`).
    pub fn to_human_string(&self) -> String {
        if self.is_unknown() {
            return self.to_string();
        }
        let mut map = self.without_na();
        for (name, _) in STANDARD_LAYOUTS {
            if let Ok(std) = name.parse::<ChannelMap>()
                && std.equals_reordered(&map)
            {
                map = std;
                break;
            }
        }
        map.to_string()
    }
}

impl fmt::Display for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "unknown{}", self.len());
        }
        let list = self.speaker_list();
        match STANDARD_LAYOUTS.iter().find(|(_, spk)| *spk == list) {
            Some((name, _)) => f.write_str(name),
            None => f.write_str(&list),
        }
    }
}

impl fmt::Debug for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelMap({self})")
    }
}

impl FromStr for ChannelMap {
    type Err = ChannelMapParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ChannelMapParseError {
            input: s.to_string(),
        };

        // Plain counts and "unknownN".
        if !s.is_empty() {
            let (unknown, digits) = match s.strip_prefix("unknown") {
                Some(rest) => (true, rest),
                None => (false, s),
            };
            if let Ok(count) = digits.parse::<usize>() {
                let map = if unknown {
                    Self::unknown(count)
                } else {
                    Self::from_channels(count)
                };
                if map.is_valid() {
                    return Ok(map);
                }
            }
        }

        let list = STANDARD_LAYOUTS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, spk)| *spk)
            .unwrap_or(s);

        let mut map = Self::EMPTY;
        if list.is_empty() {
            return Ok(map);
        }
        for token in list.split('-') {
            let speaker = match Speaker::from_short_name(token) {
                Some(sp) => sp,
                None => token
                    .strip_prefix("sp")
                    .and_then(|id| id.parse::<u8>().ok())
                    .and_then(Speaker::from_id)
                    .ok_or_else(err)?,
            };
            if !map.push(speaker) {
                return Err(err());
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(s: &str) -> ChannelMap {
        s.parse().unwrap()
    }

    #[test]
    fn parse_standard_names() {
        assert_eq!(map("stereo"), ChannelMap::STEREO);
        assert_eq!(map("mono"), ChannelMap::MONO);
        assert_eq!(map("5.1(side)").len(), 6);
        assert_eq!(map("5.1(side)").speakers()[4], Speaker::SideLeft);
    }

    #[test]
    fn parse_counts_and_unknown() {
        assert_eq!(map("2"), ChannelMap::STEREO);
        assert_eq!(map("6"), map("5.1"));
        assert!(map("unknown3").is_unknown());
        assert_eq!(map("unknown3").len(), 3);
        assert_eq!(map("10").len(), 10);
        assert!(map("10").is_unknown());
    }

    #[test]
    fn parse_speaker_list() {
        let m = map("fl-fr-lfe2-na");
        assert_eq!(
            m.speakers(),
            &[
                Speaker::FrontLeft,
                Speaker::FrontRight,
                Speaker::LowFrequency2,
                Speaker::Na
            ]
        );
        assert_eq!(map("sp0-sp1"), ChannelMap::STEREO);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("fl-xx".parse::<ChannelMap>().is_err());
        assert!("sp20".parse::<ChannelMap>().is_err());
        assert!("unknown0".parse::<ChannelMap>().is_err());
    }

    #[test]
    fn display_uses_layout_names() {
        assert_eq!(map("fl-fr-fc-lfe-bl-br").to_string(), "5.1");
        assert_eq!(map("fc-fl").to_string(), "fc-fl");
        assert_eq!(map("unknown2").to_string(), "unknown2");
        assert_eq!(ChannelMap::EMPTY.to_string(), "empty");
    }

    #[test]
    fn human_string_normalizes() {
        assert_eq!(map("fc-fl-fr-na").to_human_string(), "3.0");
        assert_eq!(map("fr-fl").to_human_string(), "stereo");
    }

    #[test]
    fn validity() {
        assert!(ChannelMap::STEREO.is_valid());
        assert!(!ChannelMap::EMPTY.is_valid());
        assert!(!map("fl-fl").is_valid());
        assert!(map("fl-na-na").is_valid());
        assert!(!map("fl-na").is_unknown());
    }

    #[test]
    fn equals_reordered_ignores_order() {
        assert!(map("fr-fl").equals_reordered(&ChannelMap::STEREO));
        assert_ne!(map("fr-fl"), ChannelMap::STEREO);
        assert!(!map("fl-fr-fc").equals_reordered(&ChannelMap::STEREO));
    }

    #[test]
    fn waveext_order_and_mask() {
        assert!(map("5.1").is_waveext_order());
        assert!(!map("5.1(alsa)").is_waveext_order());
        assert_eq!(map("5.1(alsa)").to_waveext_order(), map("5.1"));
        assert_eq!(ChannelMap::STEREO.waveext_mask(), Some(0b11));
        assert_eq!(map("5.1(alsa)").waveext_mask(), None);
        assert_eq!(ChannelMap::from_waveext_mask(0b111), map("3.0"));
        assert_eq!(map("unknown4").waveext_mask_unchecked(), 0b1111);
    }

    #[test]
    fn diff_count_counts_missing_speakers() {
        assert_eq!(map("5.1").diff_count(&ChannelMap::STEREO), 4);
        assert_eq!(ChannelMap::STEREO.diff_count(&map("5.1")), 0);
        assert_eq!(ChannelMap::MONO.diff_count(&ChannelMap::STEREO), 1);
    }

    #[test]
    fn na_helpers() {
        let m = ChannelMap::STEREO.with_na_fill(4);
        assert_eq!(m.len(), 4);
        assert_eq!(m.speaker_count(), 2);
        assert_eq!(m.without_na(), ChannelMap::STEREO);
    }

    #[test]
    fn source_indices_match_speakers() {
        let from = map("fl-fr-fc");
        let to = map("fc-fl-lfe");
        assert_eq!(to.source_indices(&from), vec![Some(2), Some(0), None]);

        let unknown = map("unknown2");
        assert_eq!(
            map("3.0").source_indices(&unknown),
            vec![Some(0), Some(1), None]
        );
    }

    #[test]
    fn speaker_lookup() {
        for sp in Speaker::ALL {
            assert_eq!(Speaker::from_id(sp.id()), Some(sp));
            assert_eq!(Speaker::from_short_name(sp.short_name()), Some(sp));
        }
        assert_eq!(Speaker::from_id(20), None);
    }
}
