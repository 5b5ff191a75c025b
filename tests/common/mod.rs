#![allow(dead_code)]

use lambda_eval::{
    RuntimeError,
    Value,
    cps::Machine,
    output::Captured,
    parse,
    sync::Interpreter,
};


pub fn run_sync(source: &str)->(Result<Value, RuntimeError>, Vec<String>) {
    let ast = parse(source).unwrap_or_else(|err|panic!("failed to parse `{source}`: {err}"));
    let output = Captured::new();
    let result = Interpreter::new(Box::new(output.clone())).run(&ast);

    return (result, output.lines());
}

pub fn run_cps(source: &str)->(Result<Option<Value>, RuntimeError>, Vec<String>) {
    run_cps_with_budget(source, lambda_eval::cps::DEFAULT_STACK_BUDGET)
}

pub fn run_cps_with_budget(source: &str, budget: usize)->(Result<Option<Value>, RuntimeError>, Vec<String>) {
    let ast = parse(source).unwrap_or_else(|err|panic!("failed to parse `{source}`: {err}"));
    let output = Captured::new();
    let result = Machine::new(budget, Box::new(output.clone())).evaluate_program(ast);

    return (result, output.lines());
}

/// The program's value under the direct evaluator.
pub fn sync_value(source: &str)->Value {
    match run_sync(source).0 {
        Ok(value)=>value,
        Err(err)=>panic!("`{source}` failed: {err}"),
    }
}

/// The program's value under the cps evaluator. Panics if it halted.
pub fn cps_value(source: &str)->Value {
    match run_cps(source).0 {
        Ok(Some(value))=>value,
        Ok(None)=>panic!("`{source}` never finished"),
        Err(err)=>panic!("`{source}` failed: {err}"),
    }
}

/// Both evaluators must agree on value and output.
pub fn both(source: &str)->Value {
    let (sync_result, sync_lines) = run_sync(source);
    let (cps_result, cps_lines) = run_cps(source);
    let sync_value = sync_result.unwrap_or_else(|err|panic!("sync `{source}` failed: {err}"));
    let cps_value = cps_result
        .unwrap_or_else(|err|panic!("cps `{source}` failed: {err}"))
        .unwrap_or_else(||panic!("cps `{source}` never finished"));

    assert_eq!(sync_value, cps_value, "evaluators disagree on `{source}`");
    assert_eq!(sync_lines, cps_lines, "evaluators printed different things for `{source}`");

    return sync_value;
}

pub fn num(n: f64)->Value {
    Value::Number(n)
}
