//! Functions every program starts with. Each evaluator gets its own flavor of the same names.

use std::time::{
    Duration,
    Instant,
};
use tracing::debug;
use crate::{
    cps::{
        self,
        Cont,
        Flow,
        Machine,
        Outcome,
    },
    env::Env,
    error::{
        Result,
        RuntimeError,
    },
    sync::Interpreter,
    value::{
        CpsFn,
        DirectFn,
        Native,
        NativeFn,
        Value,
    },
};


const DIRECT: &[(&str, DirectFn)] = &[
    ("print", print_direct),
    ("println", print_direct),
    ("time", time_direct),
    ("halt", halt_direct),
    ("sleep", sleep_direct),
    ("call/cc", call_cc_direct),
];

const CPS: &[(&str, CpsFn)] = &[
    ("print", print_cps),
    ("println", print_cps),
    ("time", time_cps),
    ("halt", halt_cps),
    ("sleep", sleep_cps),
    ("call/cc", call_cc_cps),
];

/// Second names bound to the very same builtin value, so they compare equal.
const ALIASES: &[(&str, &str)] = &[
    ("CallCC", "call/cc"),
];


pub fn install_direct(root: &Env) {
    for (name, func) in DIRECT {
        root.define(*name, Value::Native(Native {name: *name, func: NativeFn::Direct(*func)}));
    }
    install_aliases(root);
}

pub fn install_cps(root: &Env) {
    for (name, func) in CPS {
        root.define(*name, Value::Native(Native {name: *name, func: NativeFn::Cps(*func)}));
    }
    install_aliases(root);
}

fn install_aliases(root: &Env) {
    for (alias, name) in ALIASES {
        if let Ok(builtin) = root.get(name) {
            root.define(*alias, builtin);
        }
    }
}

fn first(args: Vec<Value>)->Value {
    args.into_iter().next().unwrap_or(Value::Bool(false))
}

fn report_time(started: Instant)->String {
    format!("Time: {}ms", started.elapsed().as_millis())
}


fn print_direct(interp: &mut Interpreter, args: Vec<Value>)->Result<Value> {
    interp.output().write_line(&first(args).to_string());
    return Ok(Value::Bool(false));
}

fn time_direct(interp: &mut Interpreter, args: Vec<Value>)->Result<Value> {
    let func = first(args);
    let started = Instant::now();
    let value = interp.apply(&func, Vec::new())?;
    interp.output().write_line(&report_time(started));

    return Ok(value);
}

fn halt_direct(_: &mut Interpreter, _: Vec<Value>)->Result<Value> {
    // nothing can stop a direct evaluation short of failing it
    Err(RuntimeError::ProgramHalted)
}

fn sleep_direct(_: &mut Interpreter, _: Vec<Value>)->Result<Value> {
    Err(RuntimeError::UnsupportedOperation("sleep does not work with the direct evaluator".to_string()))
}

fn call_cc_direct(_: &mut Interpreter, _: Vec<Value>)->Result<Value> {
    Err(RuntimeError::UnsupportedOperation("call/cc does not work with the direct evaluator".to_string()))
}


fn print_cps(machine: &mut Machine, k: Cont, args: Vec<Value>)->Outcome {
    machine.output().write_line(&first(args).to_string());
    return k.resume(machine, Value::Bool(false));
}

fn time_cps(machine: &mut Machine, k: Cont, args: Vec<Value>)->Outcome {
    let func = first(args);
    let started = Instant::now();

    return cps::apply(machine, func, Cont::new(move |m, value|{
        m.output().write_line(&report_time(started));
        let k = k.clone();
        return Ok(Flow::bounce(move |m|k.resume(m, value)));
    }), Vec::new());
}

/// Drops `k`, so nothing after the call ever runs.
fn halt_cps(_: &mut Machine, _: Cont, _: Vec<Value>)->Outcome {
    debug!("program halted");
    Ok(Flow::Done)
}

fn sleep_cps(machine: &mut Machine, k: Cont, args: Vec<Value>)->Outcome {
    let millis = match first(args) {
        Value::Number(n) if n.is_finite()=>n.max(0.0),
        Value::Number(_)=>return Err(RuntimeError::type_error("finite number", "infinite number")),
        other=>return Err(RuntimeError::type_error("number", other.kind())),
    };
    let Ok(delay) = Duration::try_from_secs_f64(millis / 1000.0) else {
        return Err(RuntimeError::type_error("delay in range", "number"));
    };
    machine.schedule(delay, k)?;

    return Ok(Flow::Done);
}

/// Calls `f` with `k` as its continuation and with an escape that resumes `k` no matter where it is
/// called from.
fn call_cc_cps(machine: &mut Machine, k: Cont, args: Vec<Value>)->Outcome {
    let func = first(args);
    let escape = Value::Continuation(k.clone());

    return cps::apply(machine, func, k, vec![escape]);
}
