use story_reporter::{
    recorder::{Emitted, Recording},
    Config, ForcedResult, Meta, Reporter, Scenario, Story, StoryReporter as _,
    TestResult,
};

fn events(reporter: &Reporter<Recording>) -> Vec<Emitted> {
    reporter
        .registry()
        .listeners()
        .iter()
        .flat_map(|l| l.lock().unwrap().events().to_vec())
        .collect()
}

#[test]
fn pending_scenario_forces_every_step_pending() {
    let reporter = Reporter::new(Config::default(), Recording::new());
    let mut session = reporter.session();
    session.before_story(&Story::new("a.story"), false);
    session.before_scenario("Not ready");
    session.scenario_meta(&Meta::new().with("pending", ""));
    for step in ["Given one", "When two", "Then three"] {
        session.before_step(step);
        session.successful(step);
    }
    session.after_scenario();

    let outcomes = reporter.all_test_outcomes();
    assert_eq!(outcomes[0].step_results(), [TestResult::Pending; 3]);
    assert_eq!(outcomes[0].result(), TestResult::Pending);
    assert!(events(&reporter).contains(&Emitted::SetAllStepsTo(TestResult::Pending)));
}

#[test]
fn forced_scenario_result_does_not_leak_into_next_scenario() {
    let reporter = Reporter::new(Config::default(), Recording::new());
    let mut session = reporter.session();
    session.before_story(&Story::new("a.story"), false);

    session.before_scenario("Work in progress");
    session.scenario_meta(&Meta::new().with("wip", ""));
    assert_eq!(session.context().forced().scenario(), ForcedResult::Skipped);
    session.after_scenario();

    session.before_scenario("Ready");
    assert_eq!(session.context().forced().scenario(), ForcedResult::None);
    session.scenario_meta(&Meta::new());
    session.before_step("Given it works");
    session.successful("Given it works");
    session.after_scenario();

    let outcomes = reporter.all_test_outcomes();
    assert_eq!(outcomes[1].title, "Ready");
    assert_eq!(outcomes[1].result(), TestResult::Success);
    assert_eq!(
        events(&reporter)
            .iter()
            .filter(|e| matches!(e, Emitted::SetAllStepsTo(_)))
            .count(),
        1,
    );
}

#[test]
fn skipped_story_suspends_and_is_cleared_before_next_story() {
    for directive in ["skip", "wip"] {
        let reporter = Reporter::new(Config::default(), Recording::new());
        let skipped = Story::new("skipped.story")
            .with_meta(Meta::new().with(directive, ""))
            .with_scenario(Scenario::new("S"));

        let mut session = reporter.session();
        session.before_story(&skipped, false);
        assert_eq!(session.context().forced().story(), ForcedResult::Skipped);
        session.before_scenario("S");
        session.before_step("Given anything");
        session.successful("Given anything");
        session.after_scenario();
        session.after_story(false);

        let outcomes = reporter.all_test_outcomes();
        assert_eq!(outcomes[0].step_results(), [TestResult::Skipped]);
        assert!(events(&reporter).contains(&Emitted::SuspendTest));

        session.before_story(&Story::new("next.story"), false);
        assert_eq!(session.context().forced().story(), ForcedResult::None);
        session.before_scenario("T");
        session.after_scenario();

        assert_eq!(
            events(&reporter)
                .iter()
                .filter(|e| matches!(e, Emitted::SetAllStepsTo(_)))
                .count(),
            1,
            "directive `{directive}` leaked into the next story",
        );
    }
}

#[test]
fn pending_story_forces_every_scenario() {
    let reporter = Reporter::new(Config::default(), Recording::new());
    let story = Story::new("a.story").with_meta(Meta::new().with("pending", "yes"));

    let mut session = reporter.session();
    session.before_story(&story, false);
    for title in ["one", "two"] {
        session.before_scenario(title);
        session.before_step("Given something");
        session.successful("Given something");
        session.after_scenario();
    }

    let results = reporter
        .all_test_outcomes()
        .iter()
        .map(|o| o.result())
        .collect::<Vec<_>>();
    assert_eq!(results, [TestResult::Pending, TestResult::Pending]);
}

#[test]
fn skipped_story_stays_skipped_after_its_given_story() {
    let reporter = Reporter::new(Config::default(), Recording::new());
    let given = Story::new("given.story").with_scenario(Scenario::new("G"));
    let parent = Story::new("parent.story")
        .with_meta(Meta::new().with("skip", ""))
        .with_given_story("given.story")
        .with_scenario(Scenario::new("P"));

    let mut session = reporter.session();
    session.before_story(&parent, false);
    session.given_stories(&parent.given_stories);

    session.before_story(&given, true);
    assert_eq!(session.context().forced().story(), ForcedResult::None);
    session.before_scenario("G");
    session.scenario_meta(&Meta::new());
    session.before_step("Given logged in");
    session.successful("Given logged in");
    session.after_scenario();
    session.after_story(true);
    assert_eq!(session.context().forced().story(), ForcedResult::Skipped);

    session.before_scenario("P");
    session.scenario_meta(&Meta::new());
    session.before_step("When paying");
    session.successful("When paying");
    session.after_scenario();
    session.after_story(false);

    let outcomes = reporter.all_test_outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].title, "P");
    assert_eq!(outcomes[0].result(), TestResult::Skipped);
    assert!(events(&reporter).contains(&Emitted::SetAllStepsTo(TestResult::Skipped)));
}
