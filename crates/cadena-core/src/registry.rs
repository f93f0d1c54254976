//! Ordered table of filter descriptors and factories.

use crate::filter::{Filter, FilterInfo};

/// Factory function type for creating filters.
pub type FilterFactory = fn() -> Box<dyn Filter>;

/// Internal entry in the registry.
#[derive(Clone, Copy)]
struct RegistryEntry {
    info: FilterInfo,
    factory: FilterFactory,
}

/// Ordered, fixed list of filters a chain may instantiate.
///
/// Order matters: the conversion path finder breaks ties by registry index.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    entries: Vec<RegistryEntry>,
}

impl FilterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter. A later entry with the same name is shadowed by
    /// the earlier one.
    pub fn register(&mut self, info: FilterInfo, factory: FilterFactory) -> &mut Self {
        self.entries.push(RegistryEntry { info, factory });
        self
    }

    /// Descriptor by name.
    pub fn get(&self, name: &str) -> Option<&FilterInfo> {
        self.position(name).map(|i| &self.entries[i].info)
    }

    /// Index by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.info.name == name)
    }

    /// Descriptor by index.
    pub fn info(&self, index: usize) -> Option<&FilterInfo> {
        self.entries.get(index).map(|e| &e.info)
    }

    /// Creates an unopened instance by name.
    pub fn create(&self, name: &str) -> Option<(FilterInfo, Box<dyn Filter>)> {
        self.position(name).map(|i| {
            let entry = &self.entries[i];
            (entry.info, (entry.factory)())
        })
    }

    /// All descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterInfo> {
        self.entries.iter().map(|e| &e.info)
    }

    /// Number of registered filters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.info.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::filter::{Command, FilterFlags, FilterIo, Reply};
    use crate::frame::AudioFrame;

    struct Nop;

    impl Filter for Nop {
        fn control(&mut self, _io: &mut FilterIo, _cmd: &Command) -> Reply {
            Reply::Unknown
        }

        fn filter_frame(
            &mut self,
            _io: &mut FilterIo,
            _frame: Option<AudioFrame>,
        ) -> Result<(), FilterError> {
            Ok(())
        }
    }

    fn info(name: &'static str) -> FilterInfo {
        FilterInfo {
            name,
            description: "test",
            flags: FilterFlags::NONE,
            params: &[],
            test_conversion: None,
        }
    }

    #[test]
    fn lookup_and_create() {
        let mut reg = FilterRegistry::new();
        reg.register(info("a"), || Box::new(Nop))
            .register(info("b"), || Box::new(Nop));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.position("b"), Some(1));
        assert_eq!(reg.info(0).map(|i| i.name), Some("a"));
        assert!(reg.create("a").is_some());
        assert!(reg.create("zzz").is_none());
        assert_eq!(format!("{reg:?}"), r#"["a", "b"]"#);
    }
}
