// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sequencing of data-driven example rows.

use crate::model::{ExamplesTable, Row};

/// What the reporter has to do on the next example row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Advance<'t> {
    /// Previous example is still open and has to be finished first.
    pub finish_previous: bool,

    /// Periodic restart frequency was hit on this row.
    pub periodic_reset: bool,

    /// 1-based number of this row.
    pub number: usize,

    /// Captured row to report, or [`None`] if the story engine iterated past
    /// the captured table.
    pub row: Option<&'t Row>,
}

/// Iterator over the rows of the current [`ExamplesTable`].
#[derive(Clone, Debug, Default)]
pub struct ExampleIterator {
    rows: Vec<Row>,
    count: usize,
}

impl ExampleIterator {
    /// Creates an [`ExampleIterator`] with no captured rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the rows of the given `table` and resets the counter.
    pub fn begin(&mut self, table: &ExamplesTable) {
        self.rows.clone_from(&table.rows);
        self.count = 0;
    }

    /// Indicates whether an example is currently open.
    #[must_use]
    pub const fn is_executing(&self) -> bool {
        self.count > 0
    }

    /// Number of examples started since the last [`begin()`].
    ///
    /// [`begin()`]: ExampleIterator::begin
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Moves to the next row.
    ///
    /// `restart_frequency` of `0` disables periodic resets.
    pub fn advance(&mut self, restart_frequency: usize) -> Advance<'_> {
        let finish_previous = self.is_executing();
        self.count += 1;
        let periodic_reset =
            restart_frequency > 0 && self.count % restart_frequency == 0;
        Advance {
            finish_previous,
            periodic_reset,
            number: self.count,
            row: self.rows.get(self.count - 1),
        }
    }

    /// Closes the iteration, returning whether an example was open.
    ///
    /// Finishing before any example started is a no-op.
    pub fn finish(&mut self) -> bool {
        let was_executing = self.is_executing();
        self.count = 0;
        was_executing
    }

    /// Number of captured rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Indicates whether no rows are captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
