//! Class name relocation
//!
//! Relocators rewrite the fully-qualified class names recorded in a plugin
//! cache so they point at shaded copies of the classes. Rules are tried in
//! the order they were supplied and the first one that accepts a name
//! decides its new value.

pub mod prefix;

pub use prefix::PrefixRelocator;

use std::fmt;
use std::sync::Arc;

/// A rename rule for fully-qualified class names
pub trait Relocator: fmt::Debug + Send + Sync {
    /// Whether this rule handles `class_name`
    fn can_relocate(&self, class_name: &str) -> bool;

    /// The relocated form of `class_name`
    ///
    /// Only called when `can_relocate` returned true for the same name.
    fn relocate(&self, class_name: &str) -> String;
}

/// Shared handle to a rule, as supplied by the host for each entry
pub type RelocatorRef = Arc<dyn Relocator>;

/// Apply the first matching rule to `class_name`
///
/// Returns `None` when no rule matches, leaving the name as it was.
pub fn relocate_first(class_name: &str, rules: &[RelocatorRef]) -> Option<String> {
    rules
        .iter()
        .find(|rule| rule.can_relocate(class_name))
        .map(|rule| rule.relocate(class_name))
}

/// Relocate `class_name` with the first matching rule, or return it unchanged
pub fn relocate(class_name: &str, rules: &[RelocatorRef]) -> String {
    relocate_first(class_name, rules).unwrap_or_else(|| class_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Exact {
        from: &'static str,
        to: &'static str,
    }

    impl Relocator for Exact {
        fn can_relocate(&self, class_name: &str) -> bool {
            class_name == self.from
        }

        fn relocate(&self, _class_name: &str) -> String {
            self.to.to_string()
        }
    }

    fn rules() -> Vec<RelocatorRef> {
        vec![
            Arc::new(PrefixRelocator::new("com.foo", "org.foo")),
            Arc::new(Exact {
                from: "com.foo.Bar",
                to: "special.Bar",
            }),
        ]
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(relocate("com.foo.Bar", &rules()), "org.foo.Bar");
    }

    #[test]
    fn later_rule_used_when_earlier_declines() {
        let mut rules = rules();
        rules.reverse();
        assert_eq!(relocate("com.foo.Bar", &rules), "special.Bar");
        assert_eq!(relocate("com.foo.Baz", &rules), "org.foo.Baz");
    }

    #[test]
    fn no_match_is_unchanged() {
        assert_eq!(relocate("net.other.Thing", &rules()), "net.other.Thing");
        assert!(relocate_first("net.other.Thing", &rules()).is_none());
    }

    #[test]
    fn no_rules_is_unchanged() {
        assert_eq!(relocate("com.foo.Bar", &[]), "com.foo.Bar");
    }

    proptest! {
        /// Names outside every rule's package come back identical.
        #[test]
        fn prop_unmatched_names_stable(name in "net\\.[a-z]{1,8}(\\.[A-Z][a-z]{0,8}){1,3}") {
            prop_assert_eq!(relocate(&name, &rules()), name);
        }

        /// The result always equals what the first accepting rule produces.
        #[test]
        fn prop_first_accepting_rule_decides(tail in "[A-Z][a-zA-Z]{0,10}") {
            let name = format!("com.foo.{}", tail);
            let rules = rules();
            let expected = rules[0].relocate(&name);
            prop_assert_eq!(relocate(&name, &rules), expected);
        }
    }
}
