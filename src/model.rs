// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Story-engine model types consumed by the [`Reporter`].
//!
//! These are owned and provided by the story engine. The [`Reporter`] only
//! reads them and never mutates them.
//!
//! [`Reporter`]: crate::Reporter

use std::{collections::HashMap, path::Path};

use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

/// Name of the fixture [`Story`] executed before all other stories.
pub const BEFORE_STORIES: &str = "BeforeStories";

/// Name of the fixture [`Story`] executed after all other stories.
pub const AFTER_STORIES: &str = "AfterStories";

/// Unordered mapping of meta property names to their values.
///
/// A property may be present with an empty value (`@wip` with nothing after
/// it), which is why presence and value are queried separately.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meta {
    properties: HashMap<String, String>,
}

impl Meta {
    /// Creates an empty [`Meta`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given property to this [`Meta`], replacing any previous
    /// value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        _ = self.properties.insert(name.into(), value.into());
        self
    }

    /// Returns the value of the named property, if present.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Indicates whether the named property is present, regardless of its
    /// value.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Iterates over all property names in no particular order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Iterates over all `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Indicates whether this [`Meta`] has no properties at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Meta
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Narrative of a [`Story`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Narrative {
    /// Benefit the story delivers.
    pub in_order_to: String,

    /// Role of the story's actor.
    pub as_a: String,

    /// Feature the actor wants.
    pub i_want_to: String,

    /// Alternative phrasing of the benefit.
    pub so_that: String,
}

impl Narrative {
    /// Indicates whether every clause of this [`Narrative`] is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.in_order_to, &self.as_a, &self.i_want_to, &self.so_that]
            .iter()
            .all(|c| c.trim().is_empty())
    }

    /// Renders this [`Narrative`] with its keywords, one clause per line,
    /// skipping blank clauses.
    #[must_use]
    pub fn as_text(&self) -> String {
        [
            ("In order to", &self.in_order_to),
            ("As a", &self.as_a),
            ("I want to", &self.i_want_to),
            ("So that", &self.so_that),
        ]
        .into_iter()
        .filter(|(_, clause)| !clause.trim().is_empty())
        .map(|(keyword, clause)| format!("{keyword} {}", clause.trim()))
        .join("\n")
    }
}

/// Reference to another [`Story`] executed as a precondition.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GivenStory {
    /// Path to the referenced story.
    pub path: String,
}

impl GivenStory {
    /// Creates a new [`GivenStory`] reference to the given `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Name used to match this reference against a running [`Story`]: the
    /// last component of its path.
    #[must_use]
    pub fn name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

/// Titled sequence of steps within a [`Story`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scenario {
    /// Title, unique within its [`Story`].
    pub title: String,

    /// Meta properties of this [`Scenario`].
    pub meta: Meta,
}

impl Scenario {
    /// Creates a new [`Scenario`] with the given `title` and no meta.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), meta: Meta::default() }
    }

    /// Replaces the [`Meta`] of this [`Scenario`].
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }
}

/// Named collection of [`Scenario`]s with a narrative and metadata.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Story {
    /// Identifier assigned by the story engine.
    pub id: String,

    /// Name of this [`Story`], usually its file name.
    pub name: String,

    /// Path this [`Story`] was loaded from.
    pub path: String,

    /// [`Narrative`] of this [`Story`], if any.
    pub narrative: Option<Narrative>,

    /// Meta properties of this [`Story`].
    pub meta: Meta,

    /// [`GivenStory`] references, in declaration order.
    pub given_stories: Vec<GivenStory>,

    /// [`Scenario`]s, in declaration order.
    pub scenarios: Vec<Scenario>,
}

impl Story {
    /// Creates a new [`Story`] loaded from the given `path`, naming it after
    /// the last path component.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = GivenStory::new(path.clone()).name().to_owned();
        Self { id: name.clone(), name, path, ..Self::default() }
    }

    /// Replaces the [`Meta`] of this [`Story`].
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Replaces the [`Narrative`] of this [`Story`].
    #[must_use]
    pub fn with_narrative(mut self, narrative: Narrative) -> Self {
        self.narrative = Some(narrative);
        self
    }

    /// Appends a [`GivenStory`] reference to this [`Story`].
    #[must_use]
    pub fn with_given_story(mut self, path: impl Into<String>) -> Self {
        self.given_stories.push(GivenStory::new(path));
        self
    }

    /// Appends a [`Scenario`] to this [`Story`].
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Indicates whether this is one of the reserved [`BEFORE_STORIES`] or
    /// [`AFTER_STORIES`] fixtures.
    #[must_use]
    pub fn is_fixture(&self) -> bool {
        self.name == BEFORE_STORIES || self.name == AFTER_STORIES
    }

    /// Indicates whether this is the [`AFTER_STORIES`] fixture.
    #[must_use]
    pub fn is_after_stories(&self) -> bool {
        self.name == AFTER_STORIES
    }

    /// Indicates whether this [`Story`] declares any [`GivenStory`].
    #[must_use]
    pub fn has_given_stories(&self) -> bool {
        !self.given_stories.is_empty()
    }

    /// Rendered [`Narrative`] of this [`Story`], or an empty string.
    #[must_use]
    pub fn narrative_text(&self) -> String {
        self.narrative
            .as_ref()
            .filter(|n| !n.is_empty())
            .map(|n| n.as_text().trim().to_owned())
            .unwrap_or_default()
    }
}

/// Steps the story engine runs around every [`Scenario`] of a [`Story`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lifecycle {
    /// Steps run before each scenario.
    pub before: Vec<String>,

    /// Steps run after each scenario.
    pub after: Vec<String>,
}

/// Single row of an [`ExamplesTable`], keeping its column order.
pub type Row = LinkedHashMap<String, String>;

/// Data rows a [`Scenario`] is re-executed with, once per row.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExamplesTable {
    /// Column headers, in order.
    pub headers: Vec<String>,

    /// Data rows, in order.
    pub rows: Vec<Row>,
}

impl ExamplesTable {
    /// Creates an [`ExamplesTable`] from a header row and raw value rows.
    ///
    /// Missing trailing values are filled with empty strings, extra values
    /// are dropped.
    #[must_use]
    pub fn new<H, R, V>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let headers = headers.into_iter().map(Into::into).collect::<Vec<_>>();
        let rows = rows
            .into_iter()
            .map(|values| {
                let mut values = values.into_iter().map(Into::into);
                headers
                    .iter()
                    .map(|h| (h.clone(), values.next().unwrap_or_default()))
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Indicates whether there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
