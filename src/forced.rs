// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Story- and scenario-scoped outcome overrides derived from [`Meta`].

use crate::{model::Meta, result::ForcedResult};

/// Closed set of meta properties forcing an outcome by their mere presence.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Directive {
    /// `pending`: every step is reported as pending.
    Pending,

    /// `skip`: every step is reported as skipped.
    Skip,

    /// `wip`: work in progress, treated as [`Directive::Skip`].
    Wip,
}

impl Directive {
    /// All [`Directive`]s, in precedence order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Skip, Self::Wip];

    /// Meta property name of this [`Directive`].
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Skip => "skip",
            Self::Wip => "wip",
        }
    }

    /// [`ForcedResult`] this [`Directive`] stands for.
    #[must_use]
    pub const fn forced_result(self) -> ForcedResult {
        match self {
            Self::Pending => ForcedResult::Pending,
            Self::Skip | Self::Wip => ForcedResult::Skipped,
        }
    }

    /// [`ForcedResult`] declared by the given [`Meta`]. `pending` wins over
    /// `skip` and `wip`.
    #[must_use]
    pub fn of(meta: &Meta) -> ForcedResult {
        Self::ALL
            .into_iter()
            .find(|d| meta.has_property(d.property()))
            .map_or(ForcedResult::None, Self::forced_result)
    }

    /// Records the directive found in `meta` into the given `slot`,
    /// returning it. Absent directives leave the `slot` untouched.
    pub fn apply(meta: &Meta, slot: &mut ForcedResult) -> ForcedResult {
        let forced = Self::of(meta);
        if forced != ForcedResult::None {
            *slot = forced;
        }
        forced
    }
}

/// Story and scenario overrides in effect for the running scenario.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ForcedResults {
    story: ForcedResult,
    scenario: ForcedResult,
}

impl ForcedResults {
    /// Combines the given `story` and `scenario` overrides.
    #[must_use]
    pub const fn new(story: ForcedResult, scenario: ForcedResult) -> Self {
        Self { story, scenario }
    }

    /// Story-scoped override.
    #[must_use]
    pub const fn story(&self) -> ForcedResult {
        self.story
    }

    /// Scenario-scoped override.
    #[must_use]
    pub const fn scenario(&self) -> ForcedResult {
        self.scenario
    }

    /// Indicates whether either scope forces pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.scenario.is_pending() || self.story.is_pending()
    }

    /// Indicates whether either scope forces skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.scenario.is_skipped() || self.story.is_skipped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_not_value_matters() {
        let pending = Meta::new().with("pending", "");
        let wip = Meta::new().with("wip", "false");
        let skip = Meta::new().with("skip", "no");

        assert_eq!(Directive::of(&pending), ForcedResult::Pending);
        assert_eq!(Directive::of(&wip), ForcedResult::Skipped);
        assert_eq!(Directive::of(&skip), ForcedResult::Skipped);
        assert_eq!(Directive::of(&Meta::new().with("tag", "x")), ForcedResult::None);
    }

    #[test]
    fn pending_wins_over_skip() {
        let meta = Meta::new().with("skip", "").with("pending", "");

        assert_eq!(Directive::of(&meta), ForcedResult::Pending);
    }

    #[test]
    fn absent_directive_keeps_slot() {
        let mut slot = ForcedResult::Pending;

        assert_eq!(Directive::apply(&Meta::new(), &mut slot), ForcedResult::None);
        assert_eq!(slot, ForcedResult::Pending);

        assert_eq!(
            Directive::apply(&Meta::new().with("wip", ""), &mut slot),
            ForcedResult::Skipped,
        );
        assert_eq!(slot, ForcedResult::Skipped);
    }

    #[test]
    fn either_scope_counts() {
        let forced = ForcedResults::new(ForcedResult::Skipped, ForcedResult::Pending);

        assert!(forced.is_skipped());
        assert!(forced.is_pending());

        let story_only = ForcedResults::new(ForcedResult::Skipped, ForcedResult::None);
        assert!(story_only.is_skipped());
        assert!(!story_only.is_pending());
        assert_eq!(ForcedResults::default().story(), ForcedResult::None);
    }
}
