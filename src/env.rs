use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
};
use crate::{
    error::{
        Result,
        RuntimeError,
    },
    value::Value,
};


/// A handle to one scope in the scope tree. Cloning the handle shares the scope.
#[derive(Clone)]
pub struct Env(Rc<Scope>);

struct Scope {
    vars: RefCell<HashMap<Rc<str>, Value>>,
    parent: Option<Env>,
}

impl Env {
    pub fn root()->Self {
        Env(Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// A new empty child scope.
    pub fn extend(&self)->Self {
        Env(Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        }))
    }

    pub fn is_root(&self)->bool {
        self.0.parent.is_none()
    }

    /// The nearest scope, starting at `self`, that binds `name` itself.
    fn lookup(&self, name: &str)->Option<&Env> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if env.0.vars.borrow().contains_key(name) {
                return Some(env);
            }
            scope = env.0.parent.as_ref();
        }

        return None;
    }

    pub fn get(&self, name: &str)->Result<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.0.vars.borrow().get(name) {
                return Ok(value.clone());
            }
            scope = env.0.parent.as_ref();
        }

        return Err(RuntimeError::UndefinedVariable(name.to_string()));
    }

    /// Overwrites the nearest existing binding. Only the root may create a binding this way.
    pub fn assign(&self, name: &str, value: Value)->Result<Value> {
        let target = match self.lookup(name) {
            Some(env)=>env,
            None if self.is_root()=>self,
            None=>return Err(RuntimeError::UndefinedVariable(name.to_string())),
        };

        let mut vars = target.0.vars.borrow_mut();
        match vars.get_mut(name) {
            Some(slot)=>*slot = value.clone(),
            None=>{
                vars.insert(name.into(), value.clone());
            },
        }

        return Ok(value);
    }

    pub fn define(&self, name: impl Into<Rc<str>>, value: Value)->Value {
        self.0.vars.borrow_mut().insert(name.into(), value.clone());
        return value;
    }
}
impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter)->fmt::Result {
        let mut names = self.0.vars.borrow().keys().cloned().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Env")
            .field("names", &names)
            .field("root", &self.is_root())
            .finish()
    }
}
