//! Control flow that only the cps evaluator can express: deep recursion on a bounded stack,
//! `call/cc`, `halt` and `sleep`.

mod common;

use std::{
    cell::RefCell,
    rc::Rc,
    time::{
        Duration,
        Instant,
    },
};
use common::*;
use lambda_eval::{
    Output,
    RuntimeError,
    Value,
    cps::{
        Machine,
        run_cps as run_reporting,
    },
    output::Captured,
    parse,
};


//===----------------------------------------------------------------------===//
// Trampoline
//===----------------------------------------------------------------------===//

#[test]
fn tail_recursion_far_past_the_host_stack() {
    let program = "
        countdown = λ(n) if n == 0 then \"done\" else countdown(n - 1);
        countdown(100000)
    ";
    assert_eq!(cps_value(program), Value::from("done"));
}

#[test]
fn non_tail_recursion_keeps_its_pending_work() {
    let program = "sum = λ(n) if n == 0 then 0 else n + sum(n - 1); sum(2000)";
    assert_eq!(cps_value(program), num(2001000.0));
}

#[test]
fn deep_non_tail_recursion_completes() {
    let program = "sum = λ(n) if n == 0 then 0 else n + sum(n - 1); sum(200000)";
    assert_eq!(cps_value(program), num(20000100000.0));
}

#[test]
fn halt_deep_inside_pending_work() {
    let program = "
        println(\"start\");
        sum = λ(n) if n == 0 then halt() else n + sum(n - 1);
        sum(200000);
        println(\"unreachable\")
    ";
    let (result, lines) = run_cps(program);
    assert_eq!(result, Ok(None));
    assert_eq!(lines, vec!["start"]);
}

#[test]
fn error_deep_inside_pending_work() {
    let program = "sum = λ(n) if n == 0 then nope else n + sum(n - 1); sum(200000)";
    let (result, _) = run_cps(program);
    assert_eq!(result, Err(RuntimeError::UndefinedVariable("nope".to_string())));
}

#[test]
fn escape_from_deep_inside_pending_work() {
    let program = "
        sum = λ(out, n) if n == 0 then out(7) else n + sum(out, n - 1);
        1 + call/cc(λ(out) sum(out, 200000))
    ";
    assert_eq!(cps_value(program), num(8.0));
}

#[test]
fn tiny_budget_bounces_constantly_and_agrees() {
    let program = "fib = λ(n) if n < 2 then n else fib(n - 1) + fib(n - 2); fib(12)";
    let output = Captured::new();
    let mut machine = Machine::new(1, Box::new(output.clone()));
    let value = machine.evaluate_program(parse(program).expect("parses")).expect("runs");

    assert_eq!(value, Some(num(144.0)));
    assert!(machine.bounces() > 1000, "only {} bounces", machine.bounces());
    assert_eq!(sync_value(program), num(144.0));
}

#[test]
fn default_budget_bounces_on_deep_work() {
    let output = Captured::new();
    let mut machine = Machine::new(200, Box::new(output.clone()));
    let program = parse("loop = λ(n) if n > 0 then loop(n - 1) else n; loop(5000)").expect("parses");

    assert_eq!(machine.evaluate_program(program).expect("runs"), Some(num(0.0)));
    assert!(machine.bounces() > 0);
}

#[test]
fn reports_the_final_value() {
    let output = Captured::new();
    run_reporting(parse("println(\"hi\"); 6 * 7").expect("parses"), 200, Box::new(output.clone()))
        .expect("runs");
    assert_eq!(output.lines(), vec!["hi", "*** Result: 42"]);
}

//===----------------------------------------------------------------------===//
// call/cc
//===----------------------------------------------------------------------===//

#[test]
fn call_cc_returning_normally() {
    assert_eq!(cps_value("1 + call/cc(λ(k) 10)"), num(11.0));
    assert_eq!(cps_value("1 + call/cc(λ(k) k(10))"), num(11.0));
}

#[test]
fn call_cc_escapes() {
    let (result, lines) = run_cps("1 + call/cc(λ(k) { k(10); println(\"unreachable\"); 999 })");
    assert_eq!(result, Ok(Some(num(11.0))));
    assert!(lines.is_empty(), "printed {lines:?}");
}

#[test]
fn call_cc_escapes_from_a_loop() {
    let program = "
        find_first = λ(limit, pred) call/cc(λ(return) {
            let loop (i = 0) if i < limit {
                if pred(i) then return(i);
                loop(i + 1);
            };
            false
        });
        find_first(1000, λ(n) n * n > 200)
    ";
    assert_eq!(cps_value(program), num(15.0));
    assert_eq!(cps_value("CallCC(λ(k) k(\"alias\"))"), Value::from("alias"));
}

#[test]
fn call_cc_needs_the_cps_evaluator() {
    let (result, _) = run_sync("call/cc(λ(k) k(1))");
    assert!(matches!(result, Err(RuntimeError::UnsupportedOperation(_))));
}

//===----------------------------------------------------------------------===//
// halt
//===----------------------------------------------------------------------===//

#[test]
fn halt_stops_everything_after_it() {
    let (result, lines) = run_cps("println(\"a\"); halt(); println(\"b\"); 1");
    assert_eq!(result, Ok(None));
    assert_eq!(lines, vec!["a"]);
}

#[test]
fn halt_fails_a_direct_run() {
    let (result, lines) = run_sync("println(\"a\"); halt(); println(\"b\")");
    assert_eq!(result, Err(RuntimeError::ProgramHalted));
    assert_eq!(lines, vec!["a"]);
}

//===----------------------------------------------------------------------===//
// sleep and time
//===----------------------------------------------------------------------===//

/// Records when each line was written.
#[derive(Clone, Default)]
struct Stamped(Rc<RefCell<Vec<(Instant, String)>>>);
impl Output for Stamped {
    fn write_line(&mut self, line: &str) {
        self.0.borrow_mut().push((Instant::now(), line.to_string()));
    }
}

#[test]
fn sleep_resumes_after_the_delay() {
    let output = Stamped::default();
    let mut machine = Machine::new(200, Box::new(output.clone()));
    let started = Instant::now();
    let value = machine
        .evaluate_program(parse("println(\"before\"); sleep(40); println(\"after\"); 5").expect("parses"))
        .expect("runs");

    assert_eq!(value, Some(num(5.0)));
    let lines = output.0.borrow();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].1, "before");
    assert!(lines[0].0.duration_since(started) < Duration::from_millis(40));
    assert_eq!(lines[1].1, "after");
    assert!(lines[1].0.duration_since(started) >= Duration::from_millis(40));
}

#[test]
fn sleep_keeps_the_scope_it_was_called_in() {
    assert_eq!(cps_value("let (x = 1) { sleep(5); x = x + 1; sleep(5); x * 10 }"), num(20.0));
}

#[test]
fn sleep_inside_deep_recursion() {
    let program = "
        tick = λ(n) if n > 0 { sleep(0); tick(n - 1) } else \"ticked\";
        tick(300)
    ";
    assert_eq!(cps_value(program), Value::from("ticked"));
}

#[test]
fn sleep_fails_a_direct_run() {
    let (result, _) = run_sync("sleep(10)");
    assert!(matches!(result, Err(RuntimeError::UnsupportedOperation(_))));
    let (result, _) = run_cps("sleep(\"soon\")");
    assert_eq!(result, Err(RuntimeError::TypeError {expected: "number", got: "string".to_string()}));
}

#[test]
fn sleep_rejects_delays_out_of_range() {
    let expected = RuntimeError::TypeError {expected: "delay in range", got: "number".to_string()};
    let (result, lines) = run_cps("println(\"before\"); sleep(10000000000000000000000000); println(\"after\")");
    assert_eq!(result, Err(expected));
    assert_eq!(lines, vec!["before"]);
}

#[test]
fn time_reports_and_passes_the_value_on() {
    fn check_report(lines: &[String]) {
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Time: ") && lines[0].ends_with("ms"), "got {:?}", lines[0]);
    }

    let (result, lines) = run_sync("time(λ() 2 + 3)");
    assert_eq!(result, Ok(num(5.0)));
    check_report(&lines);

    let (result, lines) = run_cps("time(λ() 2 + 3)");
    assert_eq!(result, Ok(Some(num(5.0))));
    check_report(&lines);
}

#[test]
fn time_measures_sleeps() {
    let (result, lines) = run_cps("time(λ() { sleep(20); \"slept\" })");
    assert_eq!(result, Ok(Some(Value::from("slept"))));

    let millis = lines[0]
        .trim_start_matches("Time: ")
        .trim_end_matches("ms")
        .parse::<u128>()
        .expect("a number of milliseconds");
    assert!(millis >= 20);
}
