//! Generic client-side filtering of listed entities.
//!
//! Every built-in predicate treats an absent, empty-string or empty-list
//! criterion as "no constraint".

use serde::{Deserialize, Serialize};

use crate::network::Network;

/// Criteria accepted by `get_by` on contracts and wallets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityFilter {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub display_name: Option<DisplayNameFilter>,
    #[serde(default)]
    pub network: Option<Network>,
}

/// One name (substring match) or several (any of them as substring).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayNameFilter {
    One(String),
    AnyOf(Vec<String>),
}

impl From<&str> for DisplayNameFilter {
    fn from(name: &str) -> Self {
        DisplayNameFilter::One(name.to_string())
    }
}

impl From<Vec<String>> for DisplayNameFilter {
    fn from(names: Vec<String>) -> Self {
        DisplayNameFilter::AnyOf(names)
    }
}

impl DisplayNameFilter {
    pub fn names(&self) -> Vec<&str> {
        match self {
            DisplayNameFilter::One(name) => vec![name.as_str()],
            DisplayNameFilter::AnyOf(names) => names.iter().map(String::as_str).collect(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            DisplayNameFilter::One(name) => name.is_empty(),
            DisplayNameFilter::AnyOf(names) => names.is_empty(),
        }
    }
}

/// Fields the built-in predicates read from an entity.
pub trait Filterable {
    fn display_name(&self) -> Option<&str>;
    fn tags(&self) -> Vec<&str>;
    /// Network id as the remote reports it (a decimal string).
    fn network_id(&self) -> &str;
}

pub type Predicate<E, C> = fn(&E, &C) -> bool;

/// Named predicates; an entity passes when all of them return true.
pub struct PredicateMap<E, C> {
    predicates: Vec<(&'static str, Predicate<E, C>)>,
}

impl<E, C> Default for PredicateMap<E, C> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<E, C> PredicateMap<E, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, predicate: Predicate<E, C>) -> Self {
        self.predicates.push((key, predicate));
        self
    }

    pub fn matches(&self, entity: &E, criteria: &C) -> bool {
        self.predicates
            .iter()
            .all(|(_, predicate)| predicate(entity, criteria))
    }
}

impl<E: Filterable> PredicateMap<E, EntityFilter> {
    /// Display name, tags and network predicates.
    pub fn standard() -> Self {
        PredicateMap::new()
            .with("displayName", |entity: &E, filter: &EntityFilter| {
                display_name_matches(entity.display_name(), filter.display_name.as_ref())
            })
            .with("tags", |entity: &E, filter: &EntityFilter| {
                tags_match(&entity.tags(), filter.tags.as_deref())
            })
            .with("network", |entity: &E, filter: &EntityFilter| {
                network_matches(entity.network_id(), filter.network)
            })
    }
}

pub fn filter_entities<E, C>(entities: Vec<E>, criteria: &C, predicates: &PredicateMap<E, C>) -> Vec<E> {
    entities
        .into_iter()
        .filter(|entity| predicates.matches(entity, criteria))
        .collect()
}

pub fn display_name_matches(display_name: Option<&str>, filter: Option<&DisplayNameFilter>) -> bool {
    let filter = match filter {
        Some(filter) if !filter.is_empty() => filter,
        _ => return true,
    };

    match display_name {
        Some(display_name) => filter
            .names()
            .iter()
            .any(|name| display_name.contains(name)),
        None => false,
    }
}

pub fn tags_match(entity_tags: &[&str], filter: Option<&[String]>) -> bool {
    match filter {
        Some(wanted) if !wanted.is_empty() => wanted
            .iter()
            .any(|tag| entity_tags.contains(&tag.as_str())),
        _ => true,
    }
}

/// The entity id is parsed as a number; an unparseable id never matches a constraint.
pub fn network_matches(network_id: &str, filter: Option<Network>) -> bool {
    match filter {
        Some(network) => network_id
            .trim()
            .parse::<u64>()
            .map(|id| id == network.id())
            .unwrap_or(false),
        None => true,
    }
}
