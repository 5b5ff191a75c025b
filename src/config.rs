use clap::ValueEnum;
use crate::cps::DEFAULT_STACK_BUDGET;


#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Direct recursive evaluation. Deep recursion can overflow the stack.
    Sync,
    /// Continuation-passing evaluation on a trampoline.
    #[default]
    Cps,
}


#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    /// Steps the CPS evaluator takes before unwinding to its driver loop.
    pub stack_budget: usize,
    /// Print the parsed program instead of running it.
    pub dump_ast: bool,
}
impl Default for Config {
    fn default()->Self {
        Config {
            mode: Mode::default(),
            stack_budget: DEFAULT_STACK_BUDGET,
            dump_ast: false,
        }
    }
}
