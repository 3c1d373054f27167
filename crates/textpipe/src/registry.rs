//! Stage registry: maps a stage name to a factory that builds a fresh
//! [`Transform`] instance for it.

use crate::stage::Transform;
use std::collections::HashMap;

/// Builds a new, independent [`Transform`] instance on every call.
///
/// A factory rather than a shared instance because each [`crate::stage::StageWorker`]
/// owns its transform exclusively (it runs on one dedicated thread); stateful
/// transforms (e.g. the rotator stage) need their own state per pipeline
/// position even when the same stage name appears twice.
pub trait StageFactory: Send + Sync {
    fn create(&self) -> Box<dyn Transform>;
}

impl<F> StageFactory for F
where
    F: Fn() -> Box<dyn Transform> + Send + Sync,
{
    fn create(&self) -> Box<dyn Transform> {
        self()
    }
}

/// A name-indexed set of stage factories, consulted when a [`crate::pipeline::Pipeline`]
/// is constructed from a list of stage-name arguments.
#[derive(Default)]
pub struct StageRegistry {
    factories: HashMap<String, Box<dyn StageFactory>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, overwriting any previous registration.
    pub fn register(&mut self, name: &str, factory: Box<dyn StageFactory>) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Look up `name` and build a fresh transform, or `None` if unregistered.
    pub fn create(&self, name: &str) -> Option<Box<dyn Transform>> {
        self.factories.get(name).map(|f| f.create())
    }

    /// True if `name` has a registered factory.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    struct Echo;
    impl Transform for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn transform(&mut self, input: &Record) -> Option<Record> {
            Some(input.clone())
        }
    }

    #[test]
    fn unregistered_name_returns_none() {
        let registry = StageRegistry::new();
        assert!(registry.create("echo").is_none());
    }

    #[test]
    fn registered_factory_builds_independent_instances() {
        let mut registry = StageRegistry::new();
        registry.register("echo", Box::new(|| Box::new(Echo) as Box<dyn Transform>));
        assert!(registry.contains("echo"));
        let a = registry.create("echo").unwrap();
        let b = registry.create("echo").unwrap();
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn later_registration_overwrites_earlier() {
        let mut registry = StageRegistry::new();
        registry.register("echo", Box::new(|| Box::new(Echo) as Box<dyn Transform>));
        registry.register("echo", Box::new(|| Box::new(Echo) as Box<dyn Transform>));
        assert!(registry.create("echo").is_some());
    }
}
