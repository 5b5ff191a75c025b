//! An interpreter for a small λ language with two evaluators over one AST: a direct recursive one
//! and a continuation-passing one that runs on a trampoline and supports `call/cc`, `sleep` and
//! `halt`.

use anyhow::Result;

pub mod ast;
pub mod builtins;
pub mod config;
pub mod cps;
pub mod env;
pub mod error;
pub mod ops;
pub mod output;
pub mod parser;
pub mod sync;
pub mod timer;
pub mod value;

pub use config::{
    Config,
    Mode,
};
pub use error::RuntimeError;
pub use output::Output;
pub use parser::parse;
pub use value::Value;


/// Parses `source` and runs it (or dumps it) as `config` says. Output produced before a failure is kept.
pub fn exec(source: &str, config: &Config, mut output: Box<dyn Output>)->Result<()> {
    let ast = parse(source)?;
    if config.dump_ast {
        output.write_line(&format!("{ast:#?}"));
        return Ok(());
    }

    match config.mode {
        Mode::Sync=>{
            sync::run_sync(&ast, output)?;
        },
        Mode::Cps=>cps::run_cps(ast, config.stack_budget, output)?,
    }

    return Ok(());
}
