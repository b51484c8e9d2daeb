//! Hierarchical tag taxonomy.
//!
//! Tags are grouped by level; levels nearer the top weigh more when comparing
//! two tag sets. The registry is a plain value built on demand.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagLevel {
    Priority,
    CrewType,
    Location,
    Impact,
    Resource,
}

impl TagLevel {
    pub const ALL: [TagLevel; 5] = [
        TagLevel::Priority,
        TagLevel::CrewType,
        TagLevel::Location,
        TagLevel::Impact,
        TagLevel::Resource,
    ];

    /// Contribution of a shared tag at this level to similarity.
    pub fn similarity_factor(&self) -> f64 {
        match self {
            TagLevel::Priority => 0.4,
            TagLevel::CrewType => 0.3,
            TagLevel::Location => 0.2,
            TagLevel::Impact => 0.1,
            TagLevel::Resource => 0.05,
        }
    }
}

impl fmt::Display for TagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagLevel::Priority => "priority",
            TagLevel::CrewType => "crew_type",
            TagLevel::Location => "location",
            TagLevel::Impact => "impact",
            TagLevel::Resource => "resource",
        })
    }
}

/// A tag. Identity is the id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub level: TagLevel,
    pub weight: f64,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: TagLevel, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            weight,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tag {}

/// Tags of a single level.
#[derive(Debug, Clone)]
pub struct TagGroup {
    pub id: String,
    pub name: String,
    level: TagLevel,
    tags: BTreeMap<String, Tag>,
}

impl TagGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: TagLevel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            tags: BTreeMap::new(),
        }
    }

    pub fn level(&self) -> TagLevel {
        self.level
    }

    pub fn add(&mut self, tag: Tag) -> Result<()> {
        if tag.level != self.level {
            return Err(Error::invalid_input(format!(
                "tag '{}' has level {}, group '{}' holds {}",
                tag.id, tag.level, self.id, self.level
            )));
        }
        self.tags.insert(tag.id.clone(), tag);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Tag> {
        self.tags.remove(id)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Mean weight of the member tags, 0 when empty.
    pub fn weight(&self) -> f64 {
        if self.tags.is_empty() {
            return 0.0;
        }
        self.tags.values().map(|t| t.weight).sum::<f64>() / self.tags.len() as f64
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: BTreeMap<String, Tag>,
    groups: BTreeMap<String, TagGroup>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the standard priority, crew, location and impact tags.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let defaults = [
            ("P001", "Emergência", TagLevel::Priority, 5.0),
            ("P002", "Urgente", TagLevel::Priority, 4.0),
            ("P003", "Alta", TagLevel::Priority, 3.0),
            ("P004", "Média", TagLevel::Priority, 2.0),
            ("P005", "Baixa", TagLevel::Priority, 1.0),
            ("T001", "Asfalto", TagLevel::CrewType, 1.0),
            ("T002", "Hidráulica", TagLevel::CrewType, 1.0),
            ("T003", "Elétrica", TagLevel::CrewType, 1.0),
            ("T004", "Saneamento", TagLevel::CrewType, 1.0),
            ("T005", "Geral", TagLevel::CrewType, 0.5),
            ("L001", "Centro", TagLevel::Location, 1.5),
            ("L002", "Zona Norte", TagLevel::Location, 1.0),
            ("L003", "Zona Sul", TagLevel::Location, 1.0),
            ("L004", "Zona Leste", TagLevel::Location, 1.0),
            ("L005", "Zona Oeste", TagLevel::Location, 1.0),
            ("I001", "Via Principal", TagLevel::Impact, 2.0),
            ("I002", "Próximo a Hospital", TagLevel::Impact, 3.0),
            ("I003", "Próximo a Escola", TagLevel::Impact, 2.5),
            ("I004", "Área Comercial", TagLevel::Impact, 2.0),
            ("I005", "Área Residencial", TagLevel::Impact, 1.0),
        ];
        for (id, name, level, weight) in defaults {
            registry.add(Tag::new(id, name, level, weight));
        }
        registry
    }

    /// Adds or replaces a tag.
    pub fn add(&mut self, tag: Tag) {
        self.tags.insert(tag.id.clone(), tag);
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.tags.get(id)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags of `level`, ordered by id.
    pub fn by_level(&self, level: TagLevel) -> Vec<&Tag> {
        self.tags.values().filter(|t| t.level == level).collect()
    }

    /// Registers an empty group, replacing any group with the same id.
    pub fn create_group(&mut self, id: impl Into<String>, name: impl Into<String>, level: TagLevel) -> &mut TagGroup {
        let group = TagGroup::new(id, name, level);
        match self.groups.entry(group.id.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(group);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(group),
        }
    }

    pub fn group(&self, id: &str) -> Option<&TagGroup> {
        self.groups.get(id)
    }

    /// Similarity of two tag-id sets in `[0, 1]`.
    ///
    /// Shared tags contribute `weight * level factor`; the sum is divided by
    /// the smaller set's size. Ids unknown to the registry contribute nothing.
    pub fn similarity(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let shared: f64 = a
            .intersection(b)
            .filter_map(|id| self.get(id))
            .map(|t| t.weight * t.level.similarity_factor())
            .sum();
        (shared / a.len().min(b.len()) as f64).min(1.0)
    }

    /// Heaviest tag of every level not already covered by `existing`.
    pub fn suggest(&self, existing: &BTreeSet<String>) -> Vec<&Tag> {
        let covered: BTreeSet<TagLevel> = existing
            .iter()
            .filter_map(|id| self.get(id))
            .map(|t| t.level)
            .collect();

        TagLevel::ALL
            .iter()
            .filter(|level| !covered.contains(level))
            .filter_map(|&level| {
                self.by_level(level)
                    .into_iter()
                    .reduce(|best, t| if t.weight > best.weight { t } else { best })
            })
            .collect()
    }
}
