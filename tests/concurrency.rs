use std::{sync::Barrier, thread};

use story_reporter::{
    recorder::{Emitted, Recording},
    Config, ExamplesTable, Meta, Reporter, Scenario, Story, StoryReporter as _,
};

struct Script {
    story: Story,
    scenario_meta: Meta,
    table: Option<ExamplesTable>,
}

fn alpha() -> Script {
    Script {
        story: Story::new("alpha.story")
            .with_meta(Meta::new().with("skip", "").with("tag", "team:alpha"))
            .with_scenario(Scenario::new("Alpha")),
        scenario_meta: Meta::new().with("pending", "").with("issue", "A-1"),
        table: None,
    }
}

fn beta() -> Script {
    Script {
        story: Story::new("beta.story").with_scenario(Scenario::new("Beta")),
        scenario_meta: Meta::new().with("feature", "Search"),
        table: Some(ExamplesTable::new(["q"], [["rust"], ["go"]])),
    }
}

/// Runs the given `script`, calling `sync` between phases.
fn run(reporter: &Reporter<Recording>, script: &Script, sync: impl Fn()) {
    let mut session = reporter.session();
    session.before_story(&script.story, false);
    sync();

    let title = &script.story.scenarios[0].title;
    session.before_scenario(title);
    session.scenario_meta(&script.scenario_meta);
    sync();

    if let Some(table) = &script.table {
        session.before_examples(&[], table);
        for row in &table.rows {
            session.example(row);
            session.before_step("When searching");
            session.successful("When searching");
        }
        session.after_examples();
    } else {
        session.before_step("Given something");
        session.successful("Given something");
    }
    sync();

    session.after_scenario();
    sync();

    session.after_story(false);
}

fn events_by_suite(reporter: &Reporter<Recording>) -> Vec<(String, Vec<Emitted>)> {
    let mut all = reporter
        .registry()
        .listeners()
        .iter()
        .map(|l| {
            let events = l.lock().unwrap().events().to_vec();
            let suite = events
                .iter()
                .find_map(|e| match e {
                    Emitted::TestSuiteStarted(s) => Some(s.id.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            (suite, events)
        })
        .collect::<Vec<_>>();
    all.sort_by(|a, b| a.0.cmp(&b.0));
    all
}

fn isolated(script: &Script) -> Vec<Emitted> {
    let reporter = Reporter::new(Config::default(), Recording::new());
    run(&reporter, script, || {});
    events_by_suite(&reporter).remove(0).1
}

#[test]
fn concurrent_stories_match_isolated_runs() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("story_reporter=debug")
        .try_init();

    let (alpha, beta) = (alpha(), beta());
    let expected = [("alpha".to_owned(), isolated(&alpha)), ("beta".to_owned(), isolated(&beta))];

    let reporter = Reporter::new(Config::default(), Recording::new());
    let barrier = Barrier::new(2);
    thread::scope(|s| {
        for script in [&alpha, &beta] {
            let (reporter, barrier) = (&reporter, &barrier);
            _ = s.spawn(move || {
                run(reporter, script, || {
                    _ = barrier.wait();
                });
            });
        }
    });

    assert_eq!(events_by_suite(&reporter), expected);
}

#[test]
fn forced_results_stay_on_their_thread() {
    let (alpha, beta) = (alpha(), beta());
    let reporter = Reporter::new(Config::default(), Recording::new());
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        for script in [&alpha, &beta] {
            let (reporter, barrier) = (&reporter, &barrier);
            _ = s.spawn(move || {
                run(reporter, script, || {
                    _ = barrier.wait();
                });
            });
        }
    });

    let mut outcomes = reporter.all_test_outcomes();
    outcomes.sort_by(|a, b| a.title.cmp(&b.title));
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].title, "Alpha");
    assert_ne!(outcomes[0].result(), story_reporter::TestResult::Success);
    assert_eq!(outcomes[1].title, "Beta");
    assert_eq!(outcomes[1].result(), story_reporter::TestResult::Success);
    assert!(outcomes[1].issues.is_empty());
}
