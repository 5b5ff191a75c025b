//! The direct evaluator. One host call per node visited, so deep language-level recursion can
//! overflow the host stack.

use tracing::debug;
use crate::{
    ast::{
        Expr,
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
    value::{
        Closure,
        NativeFn,
        Value,
    },
};


pub struct Interpreter {
    output: Box<dyn Output>,
}
impl Interpreter {
    pub fn new(output: Box<dyn Output>)->Self {
        Interpreter {output}
    }

    pub fn output(&mut self)->&mut dyn Output {
        &mut *self.output
    }

    /// Evaluates `ast` in a fresh root scope holding the direct builtins.
    pub fn run(&mut self, ast: &Expr)->Result<Value> {
        let root = Env::root();
        builtins::install_direct(&root);

        debug!("running program with the direct evaluator");
        let value = self.evaluate(ast, &root)?;
        debug!(%value, "program finished");

        return Ok(value);
    }

    pub fn evaluate(&mut self, expr: &Expr, env: &Env)->Result<Value> {
        match expr {
            Expr::Number(n)=>Ok(Value::Number(*n)),
            Expr::String(s)=>Ok(Value::String(s.clone())),
            Expr::Bool(b)=>Ok(Value::Bool(*b)),
            Expr::Var(name)=>env.get(name),
            Expr::Assign{target,value}=>{
                let Expr::Var(name) = &**target else {
                    return Err(RuntimeError::InvalidAssignmentTarget(format!("{target:?}")));
                };
                let value = self.evaluate(value, env)?;

                return env.assign(name, value);
            },
            Expr::Binary{op,left,right}=>{
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;

                return apply_operator(*op, &left, &right);
            },
            Expr::Lambda(lambda)=>Ok(Closure::new(lambda, env)),
            Expr::If{cond,then,otherwise}=>{
                if self.evaluate(cond, env)?.is_truthy() {
                    return self.evaluate(then, env);
                }

                match otherwise {
                    Some(otherwise)=>self.evaluate(otherwise, env),
                    None=>Ok(Value::Bool(false)),
                }
            },
            Expr::Prog(exprs)=>{
                let mut last = Value::Bool(false);
                for expr in exprs.iter() {
                    last = self.evaluate(expr, env)?;
                }

                return Ok(last);
            },
            Expr::Call{func,args}=>{
                let func = self.evaluate(func, env)?;
                let args = args.iter()
                    .map(|arg|self.evaluate(arg, env))
                    .collect::<Result<Vec<_>>>()?;

                return self.apply(&func, args);
            },
            Expr::Let{vars,body}=>{
                let mut scope = env.clone();
                for VarDef{name,init} in vars.iter() {
                    let value = match init {
                        Some(init)=>self.evaluate(init, &scope)?,
                        None=>Value::Bool(false),
                    };
                    let next = scope.extend();
                    next.define(name.clone(), value);
                    scope = next;
                }

                return self.evaluate(body, &scope);
            },
        }
    }

    pub fn apply(&mut self, func: &Value, args: Vec<Value>)->Result<Value> {
        match func {
            Value::Closure(closure)=>{
                let scope = closure.bind(args);
                return self.evaluate(&closure.lambda.body, &scope);
            },
            Value::Native(native)=>match native.func {
                NativeFn::Direct(f)=>f(self, args),
                NativeFn::Cps(_)=>Err(RuntimeError::UnsupportedOperation(
                    format!("`{}` needs the cps evaluator", native.name),
                )),
            },
            Value::Continuation(_)=>Err(RuntimeError::UnsupportedOperation(
                "continuations can only be resumed by the cps evaluator".to_string(),
            )),
            other=>Err(RuntimeError::type_error("function", other.kind())),
        }
    }
}


/// Runs a parsed program to completion with the direct evaluator.
pub fn run_sync(ast: &Expr, output: Box<dyn Output>)->Result<Value> {
    Interpreter::new(output).run(ast)
}
