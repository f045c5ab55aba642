// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Extraction of typed tags, issues and free metadata from [`Meta`].
//!
//! Extraction is best-effort: absent or malformed properties yield empty
//! results and never fail a run.

use std::{collections::BTreeMap, fmt};

use inflector::Inflector as _;
use itertools::Itertools as _;

use crate::model::Meta;

/// Tag attached to a test or a story by the reporting engine.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestTag {
    /// Type of this tag, like `feature` or `priority`.
    pub kind: String,

    /// Name of this tag, like `Checkout` or `high`.
    pub name: String,
}

impl TestTag {
    /// Name given to a tag declared without an explicit one.
    pub const IMPLICIT_NAME: &'static str = "true";

    /// Creates a new [`TestTag`].
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind: kind.into(), name: name.into() }
    }

    /// Parses a `type:name` tag declaration.
    ///
    /// Anything but exactly one colon makes the first segment the type, named
    /// [`TestTag::IMPLICIT_NAME`].
    #[must_use]
    pub fn parse(declaration: &str) -> Self {
        let mut parts = declaration.split(':').map(str::trim);
        let kind = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (Some(name), None) => Self::new(kind, name),
            _ => Self::new(kind, Self::IMPLICIT_NAME),
        }
    }
}

impl fmt::Display for TestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Closed set of meta lookups producing tags or issues.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TagKind {
    /// `issue` / `issues`.
    Issue,

    /// `feature` / `features`, tagged with type `feature`.
    Feature,

    /// `epic` / `epics`, tagged with type `epic`.
    Epic,

    /// `tag` / `tags`, declared as `type:name`.
    Tag,
}

impl TagKind {
    /// Singular meta property name of this [`TagKind`].
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Feature => "feature",
            Self::Epic => "epic",
            Self::Tag => "tag",
        }
    }

    /// Plural meta property name of this [`TagKind`].
    #[must_use]
    pub fn plural_property(self) -> String {
        self.property().to_plural()
    }
}

/// Reads both the singular and the plural property of the given [`TagKind`],
/// and splits their comma-separated values.
///
/// Values are trimmed, empty ones dropped and duplicates removed keeping the
/// first occurrence.
#[must_use]
pub fn property_values(meta: &Meta, kind: TagKind) -> Vec<String> {
    let plural = kind.plural_property();
    [meta.property(kind.property()), meta.property(&plural)]
        .into_iter()
        .flatten()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unique()
        .map(ToOwned::to_owned)
        .collect()
}

/// Issues declared via `issue` / `issues`.
#[must_use]
pub fn issues(meta: &Meta) -> Vec<String> {
    property_values(meta, TagKind::Issue)
}

/// Features then epics, as tags of type `feature` and `epic`.
#[must_use]
pub fn features_and_epics(meta: &Meta) -> Vec<TestTag> {
    [TagKind::Feature, TagKind::Epic]
        .into_iter()
        .flat_map(|kind| {
            property_values(meta, kind)
                .into_iter()
                .map(move |name| TestTag::new(kind.property(), name))
        })
        .collect()
}

/// Tags declared via `tag` / `tags`.
#[must_use]
pub fn tags(meta: &Meta) -> Vec<TestTag> {
    property_values(meta, TagKind::Tag)
        .iter()
        .map(|t| TestTag::parse(t))
        .collect()
}

/// All meta properties as free metadata, sorted by name.
#[must_use]
pub fn metadata(meta: &Meta) -> BTreeMap<String, String> {
    meta.iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> Meta {
        pairs.iter().copied().collect()
    }

    #[test]
    fn typed_tag() {
        let tags = tags(&meta(&[("tag", "priority:high")]));

        assert_eq!(tags, vec![TestTag::new("priority", "high")]);
    }

    #[test]
    fn untyped_tags_are_named_true() {
        let tags = tags(&meta(&[("tags", "smoke,regression")]));

        assert_eq!(
            tags,
            vec![TestTag::new("smoke", "true"), TestTag::new("regression", "true")],
        );
    }

    #[test]
    fn singular_and_plural_are_merged() {
        let issues = issues(&meta(&[
            ("issue", "ABC-1"),
            ("issues", " ABC-2, ,ABC-3,ABC-1 "),
        ]));

        assert_eq!(issues, ["ABC-1", "ABC-2", "ABC-3"]);
    }

    #[test]
    fn features_precede_epics() {
        let tags = features_and_epics(&meta(&[
            ("epic", "Payments"),
            ("features", "Checkout, Refunds"),
        ]));

        assert_eq!(
            tags,
            vec![
                TestTag::new("feature", "Checkout"),
                TestTag::new("feature", "Refunds"),
                TestTag::new("epic", "Payments"),
            ],
        );
    }

    #[test]
    fn absent_properties_yield_nothing() {
        let empty = Meta::new();

        assert!(issues(&empty).is_empty());
        assert!(tags(&empty).is_empty());
        assert!(features_and_epics(&empty).is_empty());
        assert!(metadata(&empty).is_empty());
    }

    #[test]
    fn malformed_tag_falls_back_to_type_only() {
        assert_eq!(TestTag::parse("a:b:c"), TestTag::new("a", "true"));
        assert_eq!(TestTag::parse(" smoke "), TestTag::new("smoke", "true"));
        assert_eq!(TestTag::parse("layer : web").to_string(), "layer:web");
        assert_eq!(TestTag::parse(""), TestTag::new("", "true"));
    }

    #[test]
    fn plural_property_names() {
        assert_eq!(TagKind::Issue.plural_property(), "issues");
        assert_eq!(TagKind::Feature.plural_property(), "features");
        assert_eq!(TagKind::Epic.plural_property(), "epics");
        assert_eq!(TagKind::Tag.plural_property(), "tags");
    }
}
