// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration consulted by the [`Reporter`].
//!
//! Every option can be given as a long CLI flag or via its environment
//! variable.
//!
//! [`Reporter`]: crate::Reporter

use clap::Parser as _;
use smart_default::SmartDefault;

/// Read-only configuration of a [`Reporter`].
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault, clap::Args)]
#[group(skip)]
pub struct Config {
    /// Reset the browser session before each scenario.
    #[arg(
        long,
        env = "SERENITY_RESTART_BROWSER_EACH_SCENARIO",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
    )]
    pub restart_browser_each_scenario: bool,

    /// Reset step definition instances before each scenario.
    #[arg(
        long,
        env = "SERENITY_RESET_STEPS_EACH_SCENARIO",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
    )]
    #[default(true)]
    pub reset_steps_each_scenario: bool,

    /// Reset the browser session every N example rows (`0` disables).
    #[arg(
        long,
        env = "SERENITY_RESTART_FREQUENCY",
        value_name = "N",
        default_value_t = 0
    )]
    pub restart_frequency: usize,

    /// Share a single browser session across the whole run.
    #[arg(
        long,
        env = "SERENITY_UNIQUE_BROWSER",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
    )]
    pub unique_browser: bool,

    /// Default driver type, unless a story requests one via its `driver`
    /// meta property.
    #[arg(long, env = "WEBDRIVER_DRIVER", value_name = "name")]
    pub driver: Option<String>,
}

/// Top-level parser wrapping a [`Config`].
#[derive(Debug, clap::Parser)]
#[command(name = "story-reporter", about = "Story lifecycle reporter options")]
struct Cli {
    #[command(flatten)]
    config: Config,
}

impl Config {
    /// Parses a [`Config`] from the command line of the current process and
    /// the environment, exiting on invalid input.
    #[must_use]
    pub fn parsed() -> Self {
        Cli::parse().config
    }

    /// Parses a [`Config`] from the given arguments and the environment.
    ///
    /// # Errors
    ///
    /// If the arguments are malformed.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Cli::try_parse_from(args).map(|cli| cli.config)
    }

    /// Sets [`Config::restart_browser_each_scenario`].
    #[must_use]
    pub fn restart_browser_each_scenario(mut self, restart: bool) -> Self {
        self.restart_browser_each_scenario = restart;
        self
    }

    /// Sets [`Config::reset_steps_each_scenario`].
    #[must_use]
    pub fn reset_steps_each_scenario(mut self, reset: bool) -> Self {
        self.reset_steps_each_scenario = reset;
        self
    }

    /// Sets [`Config::restart_frequency`].
    #[must_use]
    pub fn restart_frequency(mut self, every: usize) -> Self {
        self.restart_frequency = every;
        self
    }

    /// Sets [`Config::unique_browser`].
    #[must_use]
    pub fn unique_browser(mut self, unique: bool) -> Self {
        self.unique_browser = unique;
        self
    }

    /// Sets [`Config::driver`].
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert!(!config.restart_browser_each_scenario);
        assert!(config.reset_steps_each_scenario);
        assert_eq!(config.restart_frequency, 0);
        assert!(!config.unique_browser);
        assert_eq!(config.driver, None);
    }

    #[test]
    fn parses_flags() {
        let config = Config::try_parse_from([
            "reporter",
            "--restart-browser-each-scenario",
            "--reset-steps-each-scenario",
            "false",
            "--restart-frequency",
            "3",
            "--driver",
            "firefox",
        ])
        .unwrap();

        assert!(config.restart_browser_each_scenario);
        assert!(!config.reset_steps_each_scenario);
        assert_eq!(config.restart_frequency, 3);
        assert_eq!(config.driver.as_deref(), Some("firefox"));
    }

    #[test]
    fn rejects_negative_frequency() {
        assert!(Config::try_parse_from(["reporter", "--restart-frequency", "-1"]).is_err());
    }
}
