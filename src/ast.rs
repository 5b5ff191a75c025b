use std::rc::Rc;
use crate::ops::BinOp;


/// Nodes are shared so closures and suspended continuations can hold on to the code they still
/// have to run.
pub type Node = Rc<Expr>;


#[derive(Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    String(Rc<str>),
    Bool(bool),

    Var(Rc<str>),

    Lambda(Rc<Lambda>),

    Call {
        func: Node,
        args: Rc<[Node]>,
    },

    /// A missing `otherwise` evaluates to `false`.
    If {
        cond: Node,
        then: Node,
        otherwise: Option<Node>,
    },

    /// The target is only checked for being a `Var` when evaluated.
    Assign {
        target: Node,
        value: Node,
    },

    Binary {
        op: BinOp,
        left: Node,
        right: Node,
    },

    /// Evaluates to the last element, or `false` if empty.
    Prog(Rc<[Node]>),

    /// Each initializer sees the names bound before it.
    Let {
        vars: Rc<[VarDef]>,
        body: Node,
    },
}

#[derive(Debug, PartialEq)]
pub struct Lambda {
    /// Bound to the closure itself inside the body.
    pub name: Option<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub body: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: Rc<str>,
    pub init: Option<Node>,
}
