//! The built-in transform stages and their registration into a [`crate::registry::StageRegistry`].

mod expander;
mod flipper;
mod logger;
mod rotator;
mod typewriter;
mod uppercaser;

pub use expander::Expander;
pub use flipper::Flipper;
pub use logger::Logger;
pub use rotator::Rotator;
pub use typewriter::Typewriter;
pub use uppercaser::Uppercaser;

use crate::registry::StageRegistry;
use crate::stage::Transform;

/// Register every built-in stage under its canonical name. Called once by
/// the CLI host at startup; a stage name not registered here (and not added
/// by an embedder) is an `UnknownStage` error at pipeline construction time.
pub fn register_builtin_stages(registry: &mut StageRegistry) {
    registry.register("uppercaser", Box::new(|| Box::new(Uppercaser) as Box<dyn Transform>));
    registry.register("flipper", Box::new(|| Box::new(Flipper) as Box<dyn Transform>));
    registry.register("rotator", Box::new(|| Box::new(Rotator::new()) as Box<dyn Transform>));
    registry.register("expander", Box::new(|| Box::new(Expander) as Box<dyn Transform>));
    registry.register("logger", Box::new(|| Box::new(Logger) as Box<dyn Transform>));
    registry.register("typewriter", Box::new(|| Box::new(Typewriter) as Box<dyn Transform>));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_six_builtin_names_are_registered() {
        let mut registry = StageRegistry::new();
        register_builtin_stages(&mut registry);
        for name in ["uppercaser", "flipper", "rotator", "expander", "logger", "typewriter"] {
            assert!(registry.contains(name), "missing builtin stage: {name}");
        }
    }
}
