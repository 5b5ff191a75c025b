use std::{
    fmt,
    str::FromStr,
};
use crate::{
    error::{
        Result,
        RuntimeError,
    },
    value::Value,
};


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}
impl BinOp {
    /// Binding strength used by the parser. Assignment sits below all of these at `1`.
    pub fn precedence(self)->u8 {
        match self {
            Self::Or=>2,
            Self::And=>3,
            Self::Lt|Self::Gt|Self::Le|Self::Ge|Self::Eq|Self::Ne=>7,
            Self::Add|Self::Sub=>10,
            Self::Mul|Self::Div|Self::Rem=>20,
        }
    }

    pub fn symbol(self)->&'static str {
        match self {
            Self::Or=>"||",
            Self::And=>"&&",
            Self::Lt=>"<",
            Self::Gt=>">",
            Self::Le=>"<=",
            Self::Ge=>">=",
            Self::Eq=>"==",
            Self::Ne=>"!=",
            Self::Add=>"+",
            Self::Sub=>"-",
            Self::Mul=>"*",
            Self::Div=>"/",
            Self::Rem=>"%",
        }
    }
}
impl FromStr for BinOp {
    type Err = RuntimeError;

    fn from_str(s: &str)->Result<Self> {
        let op = match s {
            "||"=>Self::Or,
            "&&"=>Self::And,
            "<"=>Self::Lt,
            ">"=>Self::Gt,
            "<="=>Self::Le,
            ">="=>Self::Ge,
            "=="=>Self::Eq,
            "!="=>Self::Ne,
            "+"=>Self::Add,
            "-"=>Self::Sub,
            "*"=>Self::Mul,
            "/"=>Self::Div,
            "%"=>Self::Rem,
            _=>return Err(RuntimeError::InternalError(format!("Can't apply operator {s}"))),
        };

        return Ok(op);
    }
}
impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        f.write_str(self.symbol())
    }
}


/// Applies `op` to two already evaluated operands.
pub fn apply_operator(op: BinOp, a: &Value, b: &Value)->Result<Value> {
    let out = match op {
        BinOp::Add=>Value::Number(num(a)? + num(b)?),
        BinOp::Sub=>Value::Number(num(a)? - num(b)?),
        BinOp::Mul=>Value::Number(num(a)? * num(b)?),
        BinOp::Div=>{
            let lhs = num(a)?;
            Value::Number(lhs / divisor(b)?)
        },
        BinOp::Rem=>{
            let lhs = num(a)?;
            Value::Number(lhs % divisor(b)?)
        },
        BinOp::And=>if a.is_truthy() {
            b.clone()
        } else {
            Value::Bool(false)
        },
        BinOp::Or=>if a.is_truthy() {
            a.clone()
        } else {
            b.clone()
        },
        BinOp::Lt=>Value::Bool(num(a)? < num(b)?),
        BinOp::Gt=>Value::Bool(num(a)? > num(b)?),
        BinOp::Le=>Value::Bool(num(a)? <= num(b)?),
        BinOp::Ge=>Value::Bool(num(a)? >= num(b)?),
        BinOp::Eq=>Value::Bool(a.strict_eq(b)),
        BinOp::Ne=>Value::Bool(!a.strict_eq(b)),
    };

    return Ok(out);
}

fn num(value: &Value)->Result<f64> {
    match value {
        Value::Number(n)=>Ok(*n),
        other=>Err(RuntimeError::type_error("number", other.kind())),
    }
}

fn divisor(value: &Value)->Result<f64> {
    let n = num(value)?;
    if n == 0.0 {
        return Err(RuntimeError::DivideByZero);
    }

    return Ok(n);
}
