//! Package prefix relocator

use crate::relocation::Relocator;

/// Moves every class under a package prefix to a shaded prefix
///
/// Prefixes are matched literally, so `com.example` also covers
/// `com.exampleutils`; include the trailing dot to stop at the package
/// boundary. Names in path form (`com/example/Foo`) are matched against
/// the slash form of the prefix and keep their slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRelocator {
    pattern: String,
    shaded_pattern: String,
    path_pattern: String,
    shaded_path_pattern: String,
    excludes: Vec<Exclude>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Exclude {
    /// `com.example.Keep`
    Exact(String),
    /// `com.example.internal.*`
    Prefix(String),
}

impl Exclude {
    fn parse(pattern: &str) -> Self {
        match pattern.trim_end_matches('*') {
            stripped if stripped.len() < pattern.len() => Self::Prefix(stripped.to_string()),
            _ => Self::Exact(pattern.to_string()),
        }
    }

    fn covers(&self, dotted_name: &str) -> bool {
        match self {
            Self::Exact(name) => dotted_name == name,
            Self::Prefix(prefix) => dotted_name.starts_with(prefix.as_str()),
        }
    }
}

impl PrefixRelocator {
    pub fn new(pattern: impl Into<String>, shaded_pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let shaded_pattern = shaded_pattern.into();
        Self {
            path_pattern: pattern.replace('.', "/"),
            shaded_path_pattern: shaded_pattern.replace('.', "/"),
            pattern,
            shaded_pattern,
            excludes: Vec::new(),
        }
    }

    /// Leave matching classes in place
    ///
    /// A trailing `*` (as in `com.example.internal.*`) excludes everything
    /// under that prefix; anything else excludes one exact class.
    pub fn exclude(mut self, pattern: &str) -> Self {
        self.excludes.push(Exclude::parse(pattern));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn shaded_pattern(&self) -> &str {
        &self.shaded_pattern
    }

    fn is_excluded(&self, class_name: &str) -> bool {
        if self.excludes.is_empty() {
            return false;
        }
        let dotted = class_name.replace('/', ".");
        self.excludes.iter().any(|e| e.covers(&dotted))
    }
}

impl Relocator for PrefixRelocator {
    fn can_relocate(&self, class_name: &str) -> bool {
        let prefix = if class_name.contains('/') {
            &self.path_pattern
        } else {
            &self.pattern
        };
        class_name.starts_with(prefix.as_str()) && !self.is_excluded(class_name)
    }

    fn relocate(&self, class_name: &str) -> String {
        let (prefix, shaded) = if class_name.contains('/') {
            (&self.path_pattern, &self.shaded_path_pattern)
        } else {
            (&self.pattern, &self.shaded_pattern)
        };
        match class_name.strip_prefix(prefix.as_str()) {
            Some(rest) => format!("{}{}", shaded, rest),
            None => class_name.to_string(),
        }
    }
}
