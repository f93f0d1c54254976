//! Registry of the built-in cadena filters.
//!
//! This crate assembles the fixed, ordered filter table a
//! [`FilterChain`](cadena_core::FilterChain) creates filters from, and adds the
//! metadata front ends need to list them.
//!
//! # Features
//!
//! - **Filter Discovery**: List all built-in filters with metadata
//! - **Factory Table**: [`FilterCatalog::registry`] yields the
//!   [`FilterRegistry`] a chain is built on
//! - **Category System**: Filters organized by role (conversion, gain, ...)
//! - **Parameter Names**: Positional argument order for filter-list parsing
//!
//! # Example
//!
//! ```rust
//! use cadena_core::FilterChain;
//! use cadena_registry::{FilterCatalog, FilterCategory};
//!
//! let catalog = FilterCatalog::new();
//!
//! for filter in catalog.all_filters() {
//!     println!("{}: {}", filter.name(), filter.info.description);
//! }
//!
//! for filter in catalog.filters_in_category(FilterCategory::Conversion) {
//!     println!("conversion filter: {}", filter.name());
//! }
//!
//! let chain = FilterChain::new(catalog.registry());
//! assert!(chain.is_empty());
//! ```

use std::sync::Arc;

use cadena_core::{Filter, FilterFactory, FilterInfo, FilterRegistry};
use cadena_filters::{Delay, Dummy, FormatConverter, Meter, Resample, Volume};

pub use cadena_core::DEFAULT_RESAMPLER;

/// Role of a filter, for grouping in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    /// Format, rate and layout conversion
    Conversion,
    /// Gain staging
    Gain,
    /// Time-based processing
    TimeBased,
    /// Measurement without changing the audio
    Analysis,
    /// Plumbing and testing helpers
    Utility,
}

impl FilterCategory {
    /// Every category, in listing order.
    pub const ALL: [FilterCategory; 5] = [
        FilterCategory::Conversion,
        FilterCategory::Gain,
        FilterCategory::TimeBased,
        FilterCategory::Analysis,
        FilterCategory::Utility,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            FilterCategory::Conversion => "Conversion",
            FilterCategory::Gain => "Gain",
            FilterCategory::TimeBased => "Time-Based",
            FilterCategory::Analysis => "Analysis",
            FilterCategory::Utility => "Utility",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            FilterCategory::Conversion => {
                "Sample format, sample rate and channel layout conversion"
            }
            FilterCategory::Gain => "Volume and gain stages",
            FilterCategory::TimeBased => "Delays and other time-based processing",
            FilterCategory::Analysis => "Meters and statistics that leave audio untouched",
            FilterCategory::Utility => "Pass-through and helper filters",
        }
    }
}

/// Describes a filter in the catalog.
#[derive(Debug, Clone, Copy)]
pub struct FilterDescriptor {
    /// Capabilities shared with the chain.
    pub info: FilterInfo,
    /// Human-readable name.
    pub title: &'static str,
    /// Category for organization.
    pub category: FilterCategory,
}

impl FilterDescriptor {
    /// Unique filter name used in filter lists.
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// Parameter names in positional-argument order.
    pub fn params(&self) -> &'static [&'static str] {
        self.info.params
    }
}

/// The built-in filters with their metadata.
///
/// Registration order is significant: the conversion path search visits
/// filters in this order, so it decides ties between equally short paths.
#[derive(Debug, Clone)]
pub struct FilterCatalog {
    entries: Vec<FilterDescriptor>,
    registry: Arc<FilterRegistry>,
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterCatalog {
    /// Create a catalog with all built-in filters registered.
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(6);
        let mut registry = FilterRegistry::new();
        register_builtin_filters(&mut entries, &mut registry);
        Self {
            entries,
            registry: Arc::new(registry),
        }
    }

    /// Returns descriptors for all registered filters.
    pub fn all_filters(&self) -> Vec<&FilterDescriptor> {
        self.entries.iter().collect()
    }

    /// Returns descriptors for filters in a specific category.
    pub fn filters_in_category(&self, category: FilterCategory) -> Vec<&FilterDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Get a descriptor by filter name.
    pub fn get(&self, name: &str) -> Option<&FilterDescriptor> {
        self.entries.iter().find(|e| e.info.name == name)
    }

    /// The factory table for building chains.
    pub fn registry(&self) -> Arc<FilterRegistry> {
        Arc::clone(&self.registry)
    }

    /// Create a filter instance by name.
    pub fn create(&self, name: &str) -> Option<Box<dyn Filter>> {
        self.registry.create(name).map(|(_, filter)| filter)
    }

    /// Returns the number of registered filters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no filters are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn register(
    entries: &mut Vec<FilterDescriptor>,
    registry: &mut FilterRegistry,
    descriptor: FilterDescriptor,
    factory: FilterFactory,
) {
    registry.register(descriptor.info, factory);
    entries.push(descriptor);
}

/// Register all built-in filters.
fn register_builtin_filters(entries: &mut Vec<FilterDescriptor>, registry: &mut FilterRegistry) {
    register(
        entries,
        registry,
        FilterDescriptor {
            info: cadena_filters::dummy::INFO,
            title: "Dummy",
            category: FilterCategory::Utility,
        },
        || Box::new(Dummy::new()),
    );

    register(
        entries,
        registry,
        FilterDescriptor {
            info: cadena_filters::volume::INFO,
            title: "Volume",
            category: FilterCategory::Gain,
        },
        || Box::new(Volume::new()),
    );

    // The only sample format converter; the negotiator finds it through its
    // conversion predicate.
    register(
        entries,
        registry,
        FilterDescriptor {
            info: cadena_filters::convert::INFO,
            title: "Format Converter",
            category: FilterCategory::Conversion,
        },
        || Box::new(FormatConverter::new()),
    );

    register(
        entries,
        registry,
        FilterDescriptor {
            info: cadena_filters::resample::INFO,
            title: "Resampler",
            category: FilterCategory::Conversion,
        },
        || Box::new(Resample::new()),
    );

    register(
        entries,
        registry,
        FilterDescriptor {
            info: cadena_filters::delay::INFO,
            title: "Delay",
            category: FilterCategory::TimeBased,
        },
        || Box::new(Delay::new()),
    );

    register(
        entries,
        registry,
        FilterDescriptor {
            info: cadena_filters::meter::INFO,
            title: "Meter",
            category: FilterCategory::Analysis,
        },
        || Box::new(Meter::new()),
    );
}

/// Factory table with every built-in filter.
pub fn builtin_registry() -> Arc<FilterRegistry> {
    FilterCatalog::new().registry()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_core::{
        AudioFormat, ChannelMap, Command, FilterFlags, FilterIo, Reply, SampleFormat,
        find_conversion,
    };

    #[test]
    fn test_catalog_creation() {
        let catalog = FilterCatalog::new();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.registry().len(), 6);
    }

    #[test]
    fn test_registry_order_matches_catalog() {
        let catalog = FilterCatalog::new();
        let registry = catalog.registry();
        let names: Vec<_> = registry.iter().map(|i| i.name).collect();
        let listed: Vec<_> = catalog.all_filters().iter().map(|d| d.name()).collect();
        assert_eq!(names, listed);
        assert_eq!(
            names,
            ["dummy", "volume", "format", "resample", "delay", "meter"]
        );
    }

    #[test]
    fn test_get_filter() {
        let catalog = FilterCatalog::new();
        let volume = catalog.get("volume").unwrap();
        assert_eq!(volume.title, "Volume");
        assert_eq!(volume.params(), ["gain", "detach"]);
        assert!(catalog.get("nonexistent").is_none());
    }

    #[test]
    fn test_filters_by_category() {
        let catalog = FilterCatalog::new();
        let conversion = catalog.filters_in_category(FilterCategory::Conversion);
        assert_eq!(conversion.len(), 2); // format, resample
        assert_eq!(catalog.filters_in_category(FilterCategory::Gain).len(), 1);
        assert_eq!(catalog.filters_in_category(FilterCategory::Analysis).len(), 1);

        let total: usize = FilterCategory::ALL
            .iter()
            .map(|&c| catalog.filters_in_category(c).len())
            .sum();
        assert_eq!(total, catalog.len());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(FilterCategory::TimeBased.name(), "Time-Based");
        assert!(!FilterCategory::Utility.description().is_empty());
    }

    #[test]
    fn test_format_is_the_conversion_hop() {
        let registry = builtin_registry();
        let step = find_conversion(&registry, SampleFormat::S16, SampleFormat::Float).unwrap();
        assert_eq!(registry.info(step.filter).unwrap().name, "format");
        assert_eq!(step.format, SampleFormat::Float);
        assert!(find_conversion(&registry, SampleFormat::SpdifAc3, SampleFormat::Float).is_none());
    }

    #[test]
    fn test_resampler_is_registered() {
        let catalog = FilterCatalog::new();
        assert!(catalog.get(DEFAULT_RESAMPLER).is_some());
        assert!(catalog.get("meter").unwrap().info.flags.contains(FilterFlags::NOT_REENTRANT));
    }

    #[test]
    fn test_chain_inserts_the_registered_resampler() {
        let mut chain = cadena_core::FilterChain::new(builtin_registry());
        chain.set_input_format(AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 44100));
        chain.set_output_format(AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000));
        chain.init().unwrap();
        let names: Vec<_> = chain.filters().into_iter().filter_map(|id| chain.name(id)).collect();
        assert_eq!(names, [DEFAULT_RESAMPLER]);
    }

    #[test]
    fn test_all_filters_accept_float_stereo() {
        let catalog = FilterCatalog::new();
        let fmt = AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000);
        for descriptor in catalog.all_filters() {
            let mut filter = catalog.create(descriptor.name()).unwrap();
            let mut io = FilterIo::new();
            assert_eq!(
                filter.control(&mut io, &Command::Reinit(fmt)),
                Reply::Ok,
                "{} rejected {fmt}",
                descriptor.name()
            );
            assert_eq!(*io.output(), fmt);
        }
    }
}
