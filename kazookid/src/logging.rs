//! Logging utilities for substitutes.

use slog::Logger;

/// Extension trait for `slog::Logger`
pub trait LoggerExtensions {
    /// Create a new child logger with a `src` key containing the short type name of `T`.
    fn new_with_component_name<T>(&self) -> Self;

    /// Create a new child logger with a `member` key containing the given member name.
    fn new_with_member_name(&self, name: &str) -> Self;
}

impl LoggerExtensions for Logger {
    fn new_with_component_name<T>(&self) -> Self {
        self.new(slog::o!("src" => short_type_name::<T>()))
    }

    fn new_with_member_name(&self, name: &str) -> Self {
        self.new(slog::o!("member" => name.to_owned()))
    }
}

/// A logger that drops every record, used when no logger is provided.
pub(crate) fn discard_logger() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

fn short_type_name<T>() -> &'static str {
    let full_name = std::any::type_name::<T>();
    let without_generics = full_name.split('<').next().unwrap_or(full_name);

    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

#[cfg(test)]
mod tests {
    use slog::debug;

    use crate::test::TestLogger;
    use crate::{Substitute, Yields};

    use super::*;

    #[test]
    fn short_type_name_strip_module_path_and_generics() {
        assert_eq!("Substitute", short_type_name::<Substitute>());
        assert_eq!("Yields", short_type_name::<Yields>());
        assert_eq!("Vec", short_type_name::<Vec<Substitute>>());
        assert_eq!("u8", short_type_name::<u8>());
    }

    #[test]
    fn child_loggers_carry_component_and_member_keys() {
        let (logger, inspector) = TestLogger::memory();

        let child = logger
            .new_with_component_name::<Substitute>()
            .new_with_member_name("render");
        debug!(child, "invoked");

        assert!(inspector.contains_log("src=Substitute"));
        assert!(inspector.contains_log("member=render"));
    }
}
