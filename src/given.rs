// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tracking of whether execution currently runs inside a given-story.

/// Entry/exit depth counter of given-story blocks.
///
/// Decides whether a scenario arriving while nested should retitle the
/// already-open step instead of opening a parallel one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GivenStoryMonitor {
    depth: usize,
}

impl GivenStoryMonitor {
    /// Creates a new [`GivenStoryMonitor`] outside of any given-story.
    #[must_use]
    pub const fn new() -> Self {
        Self { depth: 0 }
    }

    /// Marks a given-story block as entered.
    pub fn entering(&mut self) {
        self.depth += 1;
    }

    /// Marks a given-story block as exited.
    ///
    /// Unbalanced exits are ignored.
    pub fn exiting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Indicates whether execution is inside at least one given-story.
    #[must_use]
    pub const fn is_in_given_story(&self) -> bool {
        self.depth > 0
    }

    /// Current nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Resets to the outside of any given-story.
    pub fn clear(&mut self) {
        self.depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_nesting() {
        let mut monitor = GivenStoryMonitor::new();
        assert!(!monitor.is_in_given_story());

        monitor.entering();
        monitor.entering();
        assert_eq!(monitor.depth(), 2);

        monitor.exiting();
        assert!(monitor.is_in_given_story());

        monitor.exiting();
        assert!(!monitor.is_in_given_story());
    }

    #[test]
    fn never_underflows() {
        let mut monitor = GivenStoryMonitor::new();
        monitor.exiting();
        assert_eq!(monitor.depth(), 0);

        monitor.entering();
        monitor.clear();
        assert!(!monitor.is_in_given_story());
    }
}
