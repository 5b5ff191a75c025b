//! The continuation-passing evaluator. Handlers hand results to a [`Cont`] and take one step from
//! the machine's budget first. An empty budget turns into [`Flow::Pending`], which unwinds to
//! [`Machine::execute`].

use std::{
    cell::{
        Cell,
        RefCell,
    },
    fmt,
    mem,
    rc::Rc,
    time::Duration,
};
use tracing::{
    debug,
    trace,
};
use crate::{
    ast::{
        Expr,
        Node,
        VarDef,
    },
    builtins,
    env::Env,
    error::{
        Result,
        RuntimeError,
    },
    ops::apply_operator,
    output::Output,
    timer::TimerQueue,
    value::{
        Closure,
        NativeFn,
        Value,
    },
};


pub const DEFAULT_STACK_BUDGET: usize = 200;


pub type Thunk = Box<dyn FnOnce(&mut Machine)->Outcome>;
pub type Outcome = Result<Flow>;


/// What a CPS call chain tells the driver loop once it stops.
pub enum Flow {
    /// The chain ended: the final continuation ran, the program halted, or it is waiting on a
    /// timer.
    Done,
    /// The step budget ran out. Run the thunk with a fresh budget to carry on.
    Pending(Thunk),
}
impl Flow {
    pub fn bounce(f: impl FnOnce(&mut Machine)->Outcome + 'static)->Self {
        Flow::Pending(Box::new(f))
    }
}
impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        match self {
            Flow::Done=>f.write_str("Done"),
            Flow::Pending(_)=>f.write_str("Pending"),
        }
    }
}


type ContFn = Box<dyn Fn(&mut Machine, Value)->Outcome>;

/// The rest of a computation, waiting for one value.
#[derive(Clone)]
pub struct Cont(Rc<Frame>);
impl Cont {
    pub fn new(f: impl Fn(&mut Machine, Value)->Outcome + 'static)->Self {
        Cont(Rc::new(Frame(Box::new(f))))
    }

    pub fn resume(&self, machine: &mut Machine, value: Value)->Outcome {
        if machine.guard() {
            let k = self.clone();
            return Ok(Flow::bounce(move |m|k.resume(m, value)));
        }

        return (self.0.0)(machine, value);
    }

    pub fn same(&self, other: &Self)->bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl fmt::Debug for Cont {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        f.write_str("Cont")
    }
}

/// Dropped closures go on the [`GRAVEYARD`] and the outermost drop frees them in a loop, so a chain
/// of any length is torn down without recursing.
struct Frame(ContFn);
impl Drop for Frame {
    fn drop(&mut self) {
        let f = mem::replace(&mut self.0, Box::new(|_: &mut Machine, _: Value|Ok(Flow::Done)));
        let buried = GRAVEYARD.try_with(|graveyard|graveyard.borrow_mut().push(f));
        if buried.is_err() {
            // thread is shutting down
            return;
        }

        if DRAINING.with(|draining|draining.replace(true)) {
            return;
        }
        while let Some(f) = GRAVEYARD.with(|graveyard|graveyard.borrow_mut().pop()) {
            drop(f);
        }
        DRAINING.with(|draining|draining.set(false));
    }
}

thread_local! {
    static GRAVEYARD: RefCell<Vec<ContFn>> = RefCell::new(Vec::new());
    static DRAINING: Cell<bool> = Cell::new(false);
}


pub struct Machine {
    stack_budget: usize,
    remaining: usize,
    bounces: u64,
    timers: TimerQueue,
    output: Box<dyn Output>,
}
impl Machine {
    pub fn new(stack_budget: usize, output: Box<dyn Output>)->Self {
        Machine {
            stack_budget: stack_budget.max(1),
            remaining: stack_budget.max(1),
            bounces: 0,
            timers: TimerQueue::new(),
            output,
        }
    }

    pub fn output(&mut self)->&mut dyn Output {
        &mut *self.output
    }

    pub fn bounces(&self)->u64 {
        self.bounces
    }

    /// Takes one step from the budget. `true` means the caller must bounce instead of running.
    fn guard(&mut self)->bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;

        return false;
    }

    /// The driver loop. Every entry into the evaluator from outside a CPS chain goes through here.
    pub fn execute(&mut self, thunk: Thunk)->Result<()> {
        let mut thunk = thunk;
        loop {
            self.remaining = self.stack_budget;
            match thunk(self)? {
                Flow::Done=>return Ok(()),
                Flow::Pending(next)=>{
                    self.bounces += 1;
                    trace!(bounces = self.bounces, "step budget exhausted, bouncing");
                    thunk = next;
                },
            }
        }
    }

    pub fn schedule(&mut self, delay: Duration, k: Cont)->Result<()> {
        debug!(?delay, "arming timer");
        self.timers.schedule(delay, k)
    }

    /// Fires timers in deadline order, each through the driver loop, until none are left.
    pub fn run_timers(&mut self)->Result<()> {
        while let Some(k) = self.timers.wait_next() {
            debug!("timer fired");
            self.execute(Box::new(move |m|k.resume(m, Value::Bool(false))))?;
        }

        return Ok(());
    }

    /// Evaluates `ast` in a fresh root scope, then drains the timers.
    pub fn start(&mut self, ast: Node, k: Cont)->Result<()> {
        let root = Env::root();
        builtins::install_cps(&root);

        debug!(budget = self.stack_budget, "running program with the cps evaluator");
        self.execute(Box::new(move |m|evaluate(m, ast, root, k)))?;
        self.run_timers()?;
        debug!(bounces = self.bounces, "event loop idle");

        return Ok(());
    }

    /// `None` if the program halted.
    pub fn evaluate_program(&mut self, ast: Node)->Result<Option<Value>> {
        let slot = Rc::new(RefCell::new(None));
        let result = slot.clone();
        self.start(ast, Cont::new(move |_, value|{
            *result.borrow_mut() = Some(value);
            return Ok(Flow::Done);
        }))?;

        return Ok(slot.take());
    }
}


pub fn run_cps(ast: Node, stack_budget: usize, output: Box<dyn Output>)->Result<()> {
    let mut machine = Machine::new(stack_budget, output);
    return machine.start(ast, Cont::new(|m, value|{
        m.output().write_line(&format!("*** Result: {value}"));
        return Ok(Flow::Done);
    }));
}


pub fn evaluate(machine: &mut Machine, expr: Node, env: Env, k: Cont)->Outcome {
    if machine.guard() {
        return Ok(Flow::bounce(move |m|evaluate(m, expr, env, k)));
    }

    match &*expr {
        Expr::Number(n)=>k.resume(machine, Value::Number(*n)),
        Expr::String(s)=>k.resume(machine, Value::String(s.clone())),
        Expr::Bool(b)=>k.resume(machine, Value::Bool(*b)),
        Expr::Var(name)=>{
            let value = env.get(name)?;
            return k.resume(machine, value);
        },
        Expr::Assign{target,value}=>{
            let Expr::Var(name) = &**target else {
                return Err(RuntimeError::InvalidAssignmentTarget(format!("{target:?}")));
            };
            let name = name.clone();

            return evaluate(machine, value.clone(), env.clone(), Cont::new(move |m, value|{
                let value = env.assign(&name, value)?;
                return k.resume(m, value);
            }));
        },
        Expr::Binary{op,left,right}=>{
            let op = *op;
            let right = right.clone();

            return evaluate(machine, left.clone(), env.clone(), Cont::new(move |m, lhs|{
                let k = k.clone();
                return evaluate(m, right.clone(), env.clone(), Cont::new(move |m, rhs|{
                    let value = apply_operator(op, &lhs, &rhs)?;
                    return k.resume(m, value);
                }));
            }));
        },
        Expr::Lambda(lambda)=>{
            let closure = Closure::new(lambda, &env);
            return k.resume(machine, closure);
        },
        Expr::If{cond,then,otherwise}=>{
            let then = then.clone();
            let otherwise = otherwise.clone();

            return evaluate(machine, cond.clone(), env.clone(), Cont::new(move |m, cond|{
                if cond.is_truthy() {
                    return evaluate(m, then.clone(), env.clone(), k.clone());
                }

                match &otherwise {
                    Some(otherwise)=>evaluate(m, otherwise.clone(), env.clone(), k.clone()),
                    None=>k.resume(m, Value::Bool(false)),
                }
            }));
        },
        Expr::Prog(exprs)=>sequence(machine, exprs.clone(), 0, Value::Bool(false), env, k),
        Expr::Call{func,args}=>{
            let args = args.clone();

            return evaluate(machine, func.clone(), env.clone(), Cont::new(move |m, func|{
                collect_args(m, func, args.clone(), Vec::new(), env.clone(), k.clone())
            }));
        },
        Expr::Let{vars,body}=>bind_let(machine, vars.clone(), 0, body.clone(), env, k),
    }
}

fn sequence(machine: &mut Machine, exprs: Rc<[Node]>, i: usize, last: Value, env: Env, k: Cont)->Outcome {
    if machine.guard() {
        return Ok(Flow::bounce(move |m|sequence(m, exprs, i, last, env, k)));
    }

    let Some(expr) = exprs.get(i).cloned() else {
        return k.resume(machine, last);
    };

    return evaluate(machine, expr, env.clone(), Cont::new(move |m, value|{
        sequence(m, exprs.clone(), i + 1, value, env.clone(), k.clone())
    }));
}

fn collect_args(machine: &mut Machine, func: Value, args: Rc<[Node]>, values: Vec<Value>, env: Env, k: Cont)->Outcome {
    if machine.guard() {
        return Ok(Flow::bounce(move |m|collect_args(m, func, args, values, env, k)));
    }

    let Some(arg) = args.get(values.len()).cloned() else {
        return apply(machine, func, k, values);
    };

    return evaluate(machine, arg, env.clone(), Cont::new(move |m, value|{
        let mut values = values.clone();
        values.push(value);
        return collect_args(m, func.clone(), args.clone(), values, env.clone(), k.clone());
    }));
}

/// Binds `vars[i..]` one scope at a time, then evaluates the body in the innermost scope.
fn bind_let(machine: &mut Machine, vars: Rc<[VarDef]>, i: usize, body: Node, env: Env, k: Cont)->Outcome {
    if machine.guard() {
        return Ok(Flow::bounce(move |m|bind_let(m, vars, i, body, env, k)));
    }

    let Some(VarDef{name,init}) = vars.get(i).cloned() else {
        return evaluate(machine, body, env, k);
    };

    let Some(init) = init else {
        let scope = env.extend();
        scope.define(name, Value::Bool(false));
        return bind_let(machine, vars, i + 1, body, scope, k);
    };

    return evaluate(machine, init, env.clone(), Cont::new(move |m, value|{
        let scope = env.extend();
        scope.define(name.clone(), value);
        return bind_let(m, vars.clone(), i + 1, body.clone(), scope, k.clone());
    }));
}

/// Calls `func` with `args`. Its result goes to `k`, except for continuations, which drop `k` and
/// resume themselves instead.
pub fn apply(machine: &mut Machine, func: Value, k: Cont, args: Vec<Value>)->Outcome {
    if machine.guard() {
        return Ok(Flow::bounce(move |m|apply(m, func, k, args)));
    }

    match func {
        Value::Closure(closure)=>{
            let scope = closure.bind(args);
            return evaluate(machine, closure.lambda.body.clone(), scope, k);
        },
        Value::Native(native)=>match native.func {
            NativeFn::Cps(f)=>f(machine, k, args),
            NativeFn::Direct(_)=>Err(RuntimeError::UnsupportedOperation(
                format!("`{}` needs the direct evaluator", native.name),
            )),
        },
        Value::Continuation(target)=>{
            let value = args.into_iter().next().unwrap_or(Value::Bool(false));
            return target.resume(machine, value);
        },
        other=>Err(RuntimeError::type_error("function", other.kind())),
    }
}
