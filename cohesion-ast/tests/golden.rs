//! End-to-end golden tests: literal source in, literal workflow shape out.

use cohesion_ast::wir::StateKind;
use specifications::Config;

fn compile(source: &str) -> cohesion_ast::Aggregate {
    cohesion_ast::compile(source, &Config::default()).expect("compile should succeed")
}

fn find_one<'a>(agg: &'a cohesion_ast::Aggregate, workflow: &str, kind: StateKind, needle: &str) -> &'a cohesion_ast::wir::State {
    let wf = agg.workflows.iter().find(|w| w.name == workflow).expect("workflow present");
    wf.states
        .iter()
        .find(|s| std::mem::discriminant(&s.kind) == std::mem::discriminant(&kind) && (s.name.contains(needle) || s.resource.contains(needle)))
        .unwrap_or_else(|| panic!("no matching state for '{needle}'"))
}

#[test]
fn hello_activity() {
    let src = "def activityWorkflow():\n    data = cohesion.activity.getData(timeoutSeconds=120)\n    return data\n";
    let agg = compile(src);
    let wf = agg.workflows.iter().find(|w| w.name == "activityWorkflow").expect("workflow present");

    let get_data = find_one(&agg, "activityWorkflow", StateKind::Task, "getData");
    assert!(get_data.resource.contains("activity"), "resource should be an activity ARN: {}", get_data.resource);
    assert_eq!(get_data.timeout_sec, Some(120));
    assert_eq!(get_data.result_path, "$.env.data");
    assert!(!get_data.end);
    let next = get_data.next.clone().expect("getData has a successor");

    let exit = wf.states.iter().find(|s| s.name == next).expect("next state exists");
    assert_eq!(exit.input_path, "$.env.data");
    assert!(exit.end);

    // env_init precedes everything: it's the workflow's start state.
    assert_eq!(wf.start_state, "env_init");
    assert!(matches!(wf.states[0].kind, StateKind::Pass));
}

#[test]
fn retry_rule() {
    let src = "def retryDemo():\n    return cohesion.Lambda.foo(timeoutSeconds=100, heartbeatSeconds=10, retry=[{Error: \"States.ALL\", IntervalSeconds: 1, MaxAttempts: 3, BackoffRate: 2}])\n";
    let agg = compile(src);
    let foo = find_one(&agg, "retryDemo", StateKind::Lambda, "foo");

    assert_eq!(foo.timeout_sec, Some(100));
    assert_eq!(foo.heartbeat_sec, Some(10));
    assert_eq!(foo.retry.len(), 1);
    let rule = &foo.retry[0];
    assert_eq!(rule.error_equals, vec!["States.ALL".to_string()]);
    assert_eq!(rule.interval_seconds, 1);
    assert_eq!(rule.max_attempts, 3);
    assert_eq!(rule.backoff_rate, 2.0);
}

#[test]
fn two_except_clauses() {
    let src = "def tryDemo():\n    try:\n        x = cohesion.activity.hello()\n    except (LockError, DummyError):\n        y = cohesion.activity.handleLock()\n    except DBError:\n        z = cohesion.activity.handleDb()\n    return\n";
    let agg = compile(src);
    let wf = agg.workflows.iter().find(|w| w.name == "tryDemo").expect("workflow present");

    let hello = find_one(&agg, "tryDemo", StateKind::Task, "hello");
    let handle_lock = find_one(&agg, "tryDemo", StateKind::Task, "handleLock");
    let handle_db = find_one(&agg, "tryDemo", StateKind::Task, "handleDb");

    let catch_for = |ty: &str| hello.catch.iter().find(|c| c.error_equals.iter().any(|e| e == ty)).unwrap_or_else(|| panic!("no catch entry for {ty}"));
    assert_eq!(catch_for("LockError").next, handle_lock.name);
    assert_eq!(catch_for("DummyError").next, handle_lock.name);
    assert_eq!(catch_for("DBError").next, handle_db.name);

    // Every handler and the try body itself converge on the same successor,
    // and pass elimination has removed the placeholder that once sat there.
    let hello_next = hello.next.clone().expect("hello has a successor");
    assert_eq!(handle_lock.next.as_deref(), Some(hello_next.as_str()));
    assert_eq!(handle_db.next.as_deref(), Some(hello_next.as_str()));
    assert!(!wf.states.iter().any(|s| matches!(s.kind, StateKind::RemovablePass)));
}

#[test]
fn if_else_converges() {
    let src = "def ifElse(cond):\n    if cond:\n        a = cohesion.Lambda.x()\n    else:\n        b = cohesion.Lambda.y()\n    return\n";
    let agg = compile(src);
    let wf = agg.workflows.iter().find(|w| w.name == "ifElse").expect("workflow present");

    let choice = wf.states.iter().find(|s| matches!(s.kind, StateKind::Choice)).expect("a Choice state exists");
    assert_eq!(choice.choices.len(), 1);
    assert!(choice.choices[0].variable.starts_with("$.env.test_"));
    assert!(choice.choices[0].boolean_equals);

    let x = find_one(&agg, "ifElse", StateKind::Lambda, "x");
    let y = find_one(&agg, "ifElse", StateKind::Lambda, "y");
    assert_eq!(x.next, y.next, "both branches should converge on the same successor");
    assert!(!wf.states.iter().any(|s| matches!(s.kind, StateKind::RemovablePass)), "no RemovablePass should survive pass elimination");
}

#[test]
fn break_exits_the_loop() {
    // The loop's only exit is its own break -- there's nothing after the
    // `while` in the function body, so the break target is itself the
    // function's last state: a `while True: break` compiles to a workflow
    // whose control flow exits on the first iteration.
    let src = "def breakDemo():\n    while True:\n        cohesion.Lambda.step()\n        break\n";
    let agg = compile(src);
    let wf = agg.workflows.iter().find(|w| w.name == "breakDemo").expect("workflow present");

    assert!(!wf.states.iter().any(|s| matches!(s.kind, StateKind::RemovablePass)), "pass elimination should remove every placeholder");
    wf.validate().expect("post-elimination graph should still satisfy every edge/terminal invariant");

    // The user's literal `break` survives elimination as its own state (only
    // `RemovablePass` placeholders get spliced out) and must end up either
    // terminal or pointing at a real state -- never left dangling on a
    // removed placeholder.
    let break_state = wf.states.iter().find(|s| matches!(s.kind, StateKind::Break)).expect("the literal break survives as its own state");
    match &break_state.next {
        Some(next) => assert!(wf.states.iter().any(|s| &s.name == next), "break's next must resolve to a real state"),
        None => assert!(break_state.end, "a break with no successor must be terminal"),
    }
}

#[test]
fn wait_state() {
    let src = "def sleepDemo(d):\n    cohesion.sleep(d)\n";
    let agg = compile(src);
    let wf = agg.workflows.iter().find(|w| w.name == "sleepDemo").expect("workflow present");
    let wait = wf.states.iter().find(|s| matches!(s.kind, StateKind::Sleep)).expect("a Wait state exists");
    assert_eq!(wait.seconds_path, "$.env.d");
    assert!(wait.end, "the single sleep call is the workflow's last state");
}

#[test]
fn single_return_is_one_terminal_pass() {
    let src = "def justReturn(x):\n    return x\n";
    let agg = compile(src);
    let wf = agg.workflows.iter().find(|w| w.name == "justReturn").expect("workflow present");
    // env_init plus the terminal pass: nothing else.
    assert_eq!(wf.states.len(), 2);
    let exit = wf.states.iter().find(|s| s.name != "env_init").expect("a second state exists");
    assert!(matches!(exit.kind, StateKind::Pass));
    assert!(exit.end);
    assert_eq!(exit.input_path, "$.env.x");
}

#[test]
fn cohesion_task_is_rejected() {
    let src = "def taskDemo():\n    cohesion.task.fireAndForget()\n";
    let err = cohesion_ast::compile(src, &Config::default()).expect_err("cohesion.task has no Step Functions equivalent");
    assert!(matches!(err, cohesion_ast::CompileError::UnsupportedConstruct { .. }));
}

#[test]
fn discarded_result_with_two_positional_args_has_no_marshalling() {
    let src = "def voidCallDemo(a, b):\n    cohesion.activity.fireAndForget(a, b)\n";
    let err = cohesion_ast::compile(src, &Config::default()).expect_err("a discarded-result call can't marshal two positional args");
    assert!(matches!(err, cohesion_ast::CompileError::UnsupportedConstruct { .. }));
}

#[test]
fn compiling_twice_is_byte_identical() {
    let src = "def activityWorkflow():\n    data = cohesion.activity.getData(timeoutSeconds=120)\n    return data\n";
    let a = compile(src);
    let b = compile(src);
    let wf_a = serde_json::to_string(&a.workflows[0]).unwrap();
    let wf_b = serde_json::to_string(&b.workflows[0]).unwrap();
    assert_eq!(wf_a, wf_b, "compiling the same source twice must produce byte-identical workflow JSON");
}
