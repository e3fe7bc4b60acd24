//! In-memory plugin registry
//!
//! A registry groups plugin entries by category, and each category maps a
//! plugin key to its entry. Both levels iterate in lexicographic order so
//! encoding the same registry always produces the same bytes.
//!
//! Category names are case-insensitive: they are lower-cased on lookup and
//! insertion, matching the runtime reader that consumes the cache.

pub mod codec;
pub mod mutf8;

pub use codec::{decode, encode, write_registry};

use std::collections::btree_map::{self, BTreeMap};

/// One plugin registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Lookup key, unique within its category
    pub key: String,

    /// Fully-qualified class implementing the plugin
    pub class_name: String,

    /// Plugin name as declared by the plugin author
    pub name: String,

    /// Whether the plugin's configuration may be printed
    pub printable: bool,

    /// Whether child elements are built lazily
    pub defer: bool,
}

impl RegistryEntry {
    /// Create an entry with default metadata
    pub fn new(key: impl Into<String>, class_name: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            class_name: class_name.into(),
            printable: false,
            defer: false,
        }
    }

    /// Same entry with a different class name, metadata untouched
    pub fn with_class_name(self, class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..self
        }
    }
}

/// Entries of one category, keyed by plugin key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    entries: BTreeMap<String, RegistryEntry>,
}

impl Category {
    /// Insert an entry, returning the one it replaced
    pub fn insert(&mut self, entry: RegistryEntry) -> Option<RegistryEntry> {
        self.entries.insert(entry.key.clone(), entry)
    }

    pub fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }
}

impl FromIterator<RegistryEntry> for Category {
    fn from_iter<I: IntoIterator<Item = RegistryEntry>>(iter: I) -> Self {
        let mut category = Self::default();
        for entry in iter {
            category.insert(entry);
        }
        category
    }
}

impl IntoIterator for Category {
    type Item = RegistryEntry;
    type IntoIter = btree_map::IntoValues<String, RegistryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Plugin registry: category name to category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    categories: BTreeMap<String, Category>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise a category name the way the runtime reader does
    pub fn category_key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Get a category, creating it if missing
    pub fn category_mut(&mut self, name: &str) -> &mut Category {
        self.categories.entry(Self::category_key(name)).or_default()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(&Self::category_key(name))
    }

    /// Insert an entry into a category, returning the one it replaced
    pub fn insert(&mut self, category: &str, entry: RegistryEntry) -> Option<RegistryEntry> {
        self.category_mut(category).insert(entry)
    }

    /// Look up an entry by category and key
    pub fn get(&self, category: &str, key: &str) -> Option<&RegistryEntry> {
        self.category(category).and_then(|c| c.get(key))
    }

    /// Categories in name order
    pub fn categories(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.categories.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of entries across all categories
    pub fn entry_count(&self) -> usize {
        self.categories.values().map(Category::len).sum()
    }

    /// Fold `other` into this registry; its entries win on collision.
    ///
    /// Returns how many existing entries were replaced.
    pub fn merge(&mut self, other: Registry) -> usize {
        let mut replaced = 0;
        for (name, category) in other.categories {
            let target = self.categories.entry(name).or_default();
            for entry in category {
                if target.insert(entry).is_some() {
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Build a new registry with every entry passed through `f`
    pub fn map_entries<F>(self, mut f: F) -> Registry
    where
        F: FnMut(RegistryEntry) -> RegistryEntry,
    {
        let categories = self
            .categories
            .into_iter()
            .map(|(name, category)| {
                let category: Category = category.into_iter().map(&mut f).collect();
                (name, category)
            })
            .collect();
        Registry { categories }
    }
}
