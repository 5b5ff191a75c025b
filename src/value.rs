use std::{
    fmt,
    rc::Rc,
};
use crate::{
    ast::Lambda,
    cps::{
        Cont,
        Machine,
        Outcome,
    },
    env::Env,
    error::Result,
    sync::Interpreter,
};


pub type DirectFn = fn(&mut Interpreter, Vec<Value>)->Result<Value>;
pub type CpsFn = fn(&mut Machine, Cont, Vec<Value>)->Outcome;


#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    Closure(Rc<Closure>),
    Native(Native),
    /// Escape-only. Resuming it after its dynamic extent has finished is not supported.
    Continuation(Cont),
}
impl Value {
    /// Only `false` is falsy. `0` and `""` are truthy.
    pub fn is_truthy(&self)->bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn kind(&self)->&'static str {
        match self {
            Value::Number(_)=>"number",
            Value::String(_)=>"string",
            Value::Bool(_)=>"boolean",
            Value::Closure(_)|Value::Native(_)=>"function",
            Value::Continuation(_)=>"continuation",
        }
    }

    pub fn strict_eq(&self, other: &Self)->bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b))=>a == b,
            (Value::String(a), Value::String(b))=>a == b,
            (Value::Bool(a), Value::Bool(b))=>a == b,
            (Value::Closure(a), Value::Closure(b))=>Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b))=>a.name == b.name,
            (Value::Continuation(a), Value::Continuation(b))=>a.same(b),
            _=>false,
        }
    }
}
impl PartialEq for Value {
    fn eq(&self, other: &Self)->bool {
        self.strict_eq(other)
    }
}
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        match self {
            Value::Number(n)=>f.write_str(&number_to_string(*n)),
            Value::String(s)=>f.write_str(s),
            Value::Bool(b)=>write!(f, "{b}"),
            Value::Closure(c)=>match &c.lambda.name {
                Some(name)=>write!(f, "<lambda {name}>"),
                None=>f.write_str("<lambda>"),
            },
            Value::Native(n)=>write!(f, "<builtin {}>", n.name),
            Value::Continuation(_)=>f.write_str("<continuation>"),
        }
    }
}

/// Formats `n` the way JavaScript's `String(n)` does.
pub fn number_to_string(n: f64)->String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        let text = if n > 0.0 {"Infinity"} else {"-Infinity"};
        return text.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let sign = if n < 0.0 {"-"} else {""};
    let sci = format!("{:e}", n.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    // decimal point sits after the first `point` digits
    let point = exp.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(-point as usize))
    } else {
        let (first, rest) = digits.split_at(1);
        let exp = point - 1;
        let exp_sign = if exp < 0 {"-"} else {"+"};
        match rest.is_empty() {
            true=>format!("{first}e{exp_sign}{}", exp.abs()),
            false=>format!("{first}.{rest}e{exp_sign}{}", exp.abs()),
        }
    };

    return format!("{sign}{body}");
}

impl From<f64> for Value {
    fn from(n: f64)->Self {Value::Number(n)}
}
impl From<bool> for Value {
    fn from(b: bool)->Self {Value::Bool(b)}
}
impl From<&str> for Value {
    fn from(s: &str)->Self {Value::String(s.into())}
}


pub struct Closure {
    pub lambda: Rc<Lambda>,
    pub env: Env,
}
impl Closure {
    /// Captures `env`. A named lambda gets its own scope holding the name, so it can call itself.
    pub fn new(lambda: &Rc<Lambda>, env: &Env)->Value {
        let Some(name) = &lambda.name else {
            return Value::Closure(Rc::new(Closure {
                lambda: lambda.clone(),
                env: env.clone(),
            }));
        };

        let scope = env.extend();
        let closure = Value::Closure(Rc::new(Closure {
            lambda: lambda.clone(),
            env: scope.clone(),
        }));
        scope.define(name.clone(), closure.clone());

        return closure;
    }

    /// Creates the call scope. Missing trailing arguments are `false`, extra ones are dropped.
    pub fn bind(&self, args: Vec<Value>)->Env {
        let scope = self.env.extend();
        let mut args = args.into_iter();
        for param in self.lambda.params.iter() {
            scope.define(param.clone(), args.next().unwrap_or(Value::Bool(false)));
        }

        return scope;
    }
}
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.lambda.name)
            .field("params", &self.lambda.params)
            .finish_non_exhaustive()
    }
}


#[derive(Copy, Clone)]
pub struct Native {
    pub name: &'static str,
    pub func: NativeFn,
}
impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        write!(f, "Native({})", self.name)
    }
}

#[derive(Copy, Clone)]
pub enum NativeFn {
    Direct(DirectFn),
    Cps(CpsFn),
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_print_like_javascript() {
        let cases = [
            (0.0, "0"),
            (-0.0, "0"),
            (123.0, "123"),
            (-2.5, "-2.5"),
            (0.1 + 0.2, "0.30000000000000004"),
            (0.000001, "0.000001"),
            (1e-7, "1e-7"),
            (1.2345e-10, "1.2345e-10"),
            (123456789012345680000.0, "123456789012345680000"),
            (1e21, "1e+21"),
            (-1.5e300, "-1.5e+300"),
            (f64::INFINITY, "Infinity"),
            (f64::NAN, "NaN"),
        ];
        for (n, expected) in cases {
            assert_eq!(Value::Number(n).to_string(), expected, "printing {n:?}");
        }
    }
}
