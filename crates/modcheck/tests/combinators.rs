use modcheck::ops::{IfElse, LogWrite, Loop, ModCheck, Once, Sequence};
use modcheck::{
    EngineSettings, ExecutionContext, LogMessages, ModInfo, ModList, Operation, RecordingSink, Severity,
};
use modcheck_xml::Document;

fn mods() -> ModList {
    vec![ModInfo::new("Core", "1.0.0")].into()
}

/// Passes and logs `ran <name>` on every application.
fn pass(name: &str) -> Operation {
    Operation::new(LogWrite::message("ran {4}").once(false)).named(name)
}

/// Fails and logs `ran <name>` the first time it is evaluated.
fn fail(name: &str) -> Operation {
    let messages = LogMessages {
        message_fail: Some("ran {4}".into()),
        ..LogMessages::default()
    };
    Operation::new(ModCheck::is_mod_loaded("Missing", "Me").messages(messages)).named(name)
}

/// Applies `op` `times` times and returns the results with every diagnostic.
fn run(op: &mut Operation, times: usize) -> (Vec<bool>, RecordingSink) {
    run_with(op, times, EngineSettings::default())
}

fn run_with(op: &mut Operation, times: usize, settings: EngineSettings) -> (Vec<bool>, RecordingSink) {
    let mods = mods();
    let mut doc = Document::new("Defs");
    let mut sink = RecordingSink::new();
    let mut ctx = ExecutionContext::new(&mods, &mut sink, settings);
    let results: Vec<bool> = (0..times).map(|_| op.apply(&mut doc, &mut ctx)).collect();
    ctx.on_phase_end();
    (results, sink)
}

#[test]
fn and_short_circuits_on_first_failure() {
    let mut op = Operation::and(vec![fail("f1"), pass("t2"), pass("t3")]);
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert_eq!(sink.texts(), vec!["ran f1"]);
}

#[test]
fn or_runs_until_first_success() {
    let mut op = Operation::or(vec![fail("f1"), fail("f2"), pass("t3"), pass("t4")]);
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![true]);
    assert_eq!(sink.texts(), vec!["ran f1", "ran f2", "ran t3"]);
}

#[test]
fn empty_and_passes_and_empty_or_fails() {
    assert_eq!(run(&mut Operation::and(vec![]), 1).0, vec![true]);
    assert_eq!(run(&mut Operation::or(vec![]), 1).0, vec![false]);
}

#[test]
fn once_gates_until_reset() {
    let mut op = Operation::new(Once::new());
    assert_eq!(run(&mut op, 3).0, vec![true, false, false]);
    assert!(op.supports_reset());
    op.reset_run();
    assert_eq!(run(&mut op, 2).0, vec![true, false]);
}

#[test]
fn sequence_without_stop_on_fail_runs_everything() {
    let mut op = Operation::new(Sequence::new(vec![pass("t1"), fail("f2"), pass("t3")]).stop_on_fail(false));
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert_eq!(sink.texts(), vec!["ran t1", "ran f2", "ran t3"]);
}

#[test]
fn sequence_stops_on_first_failure_by_default() {
    let mut op = Operation::new(Sequence::new(vec![pass("t1"), fail("f2"), pass("t3")]));
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert_eq!(sink.texts(), vec!["ran t1", "ran f2"]);
}

#[test]
fn sequence_once_runs_children_a_single_time() {
    let mut op = Operation::new(Sequence::new(vec![pass("t1")]).once(true));
    let (results, sink) = run(&mut op, 3);
    assert_eq!(results, vec![true, false, false]);
    assert_eq!(sink.len(), 1);
}

#[test]
fn if_else_picks_branch_and_result() {
    let mut op = Operation::new(IfElse::new(pass("test")).passed(fail("yes")).failed(pass("no")));
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert_eq!(sink.texts(), vec!["ran test", "ran yes"]);

    let mut op = Operation::new(
        IfElse::new(fail("test"))
            .passed(pass("yes"))
            .failed(fail("no"))
            .pass_inner_test(false),
    );
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert_eq!(sink.texts(), vec!["ran test", "ran no"]);
}

#[test]
fn if_else_missing_branch_counts_as_passing() {
    let mut op = Operation::new(IfElse::new(fail("test")));
    assert_eq!(run(&mut op, 1).0, vec![true]);
    let mut op = Operation::new(IfElse::new(pass("test")).failed(fail("no")));
    assert_eq!(run(&mut op, 1).0, vec![true]);
}

#[test]
fn if_else_without_test_is_a_configuration_error() {
    let mut op = Operation::new(IfElse {
        test: None,
        passed: Some(Box::new(pass("yes"))),
        failed: None,
        pass_inner_test: true,
    })
    .named("branch");
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert_eq!(
        sink.texts(),
        vec!["[ModCheck] Mod   - branch: modCheck.ifElse used with an empty/missing test"]
    );
}

#[test]
fn loop_resets_its_operation_each_iteration() {
    let once_writer = || Operation::new(LogWrite::message("tick"));
    let mut op = Operation::new(Loop::new(once_writer()).times(3));
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![true]);
    assert_eq!(sink.len(), 3);

    let mut op = Operation::new(Loop::new(once_writer()).times(3).reset(false));
    let (_, sink) = run(&mut op, 1);
    assert_eq!(sink.len(), 1);
}

#[test]
fn loop_passes_even_when_iterations_fail() {
    let mut op = Operation::new(Loop::new(Operation::new(Sequence::new(vec![fail("f")]))).times(2));
    assert_eq!(run(&mut op, 1).0, vec![true]);
}

#[test]
fn loop_with_zero_times_still_passes() {
    let mut op = Operation::new(Loop::new(pass("never")).times(0));
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![true]);
    assert!(sink.is_empty());
}

#[test]
fn loop_without_operation_fails_with_one_error() {
    let mut op = Operation::new(Loop {
        operation: None,
        times: 5,
        reset: true,
    })
    .named("lp");
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.diagnostics[0].severity, Severity::Error);
    assert!(sink.texts()[0].ends_with("lp: modCheck.loop used without an operation"));
}

#[test]
fn reset_reaches_nested_gates() {
    let inner = Operation::new(Sequence::new(vec![Operation::new(Once::new())]).once(true));
    let mut op = Operation::new(Loop::new(Operation::and(vec![inner])).times(4));
    let (results, _) = run(&mut op, 1);
    assert_eq!(results, vec![true]);

    let mut gate = Operation::and(vec![Operation::new(Once::new())]);
    assert_eq!(run(&mut gate, 2).0, vec![true, false]);
    gate.reset_run();
    assert_eq!(run(&mut gate, 1).0, vec![true]);
}

#[test]
fn mod_checks_ignore_reset() {
    let mut op = fail("f");
    assert!(!op.supports_reset());
    let (_, sink) = run(&mut op, 2);
    assert_eq!(sink.len(), 1);
    op.reset_run();
    let (results, sink) = run(&mut op, 1);
    assert_eq!(results, vec![false]);
    assert!(sink.is_empty());
}

#[test]
fn template_errors_are_reported_once_per_node() {
    let writer = Operation::new(LogWrite::message("bad {5}").once(false)).named("lw");
    let mut op = Operation::and(vec![writer]).named("root");
    let (results, sink) = run(&mut op, 3);
    assert_eq!(results, vec![true, true, true]);
    assert_eq!(
        sink.texts(),
        vec![
            "[ModCheck] Mod  root - lw is using out of range argument IDs in the following string: (max number is 4)\nbad {5}"
        ]
    );
}

#[test]
fn log_write_once_stays_silent_but_passes() {
    let mut op = Operation::new(LogWrite::message("hello {4}")).named("greeter");
    let (results, sink) = run(&mut op, 3);
    assert_eq!(results, vec![true, true, true]);
    assert_eq!(sink.texts(), vec!["hello greeter"]);
}

#[test]
fn verbose_messages_need_verbose_settings() {
    let messages = LogMessages {
        verbose_warning_success: Some("detail".into()),
        error_success: Some("loud".into()),
        ..LogMessages::default()
    };
    let mut op = Operation::new(LogWrite::new(messages.clone()));
    let (_, sink) = run(&mut op, 1);
    assert_eq!(sink.texts(), vec!["loud"]);

    let mut op = Operation::new(LogWrite::new(messages));
    let verbose = EngineSettings {
        verbose: true,
        ..EngineSettings::default()
    };
    let (_, sink) = run_with(&mut op, 1, verbose);
    assert_eq!(sink.texts(), vec!["loud", "detail"]);
    assert_eq!(sink.diagnostics[1].severity, Severity::Warning);
}
