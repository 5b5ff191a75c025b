use anyhow::{
    Context,
    Result,
};
use clap::Parser as ClapParser;
use std::{
    fs::read_to_string,
    path::PathBuf,
};
use tracing::Level;
use lambda_eval::{
    Config,
    Mode,
    exec,
    output::Stdout,
};


#[derive(ClapParser, Debug)]
#[command(name = "lambda-eval", version, about = "Runs λ language programs")]
struct Cli {
    /// Program to run
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Evaluator to run the program with
    #[arg(short, long, value_enum, default_value_t = Mode::Cps)]
    mode: Mode,

    /// Steps the cps evaluator takes before unwinding its stack
    #[arg(short, long, default_value_t = lambda_eval::cps::DEFAULT_STACK_BUDGET)]
    budget: usize,

    /// Print the parsed program instead of running it
    #[arg(long)]
    dump_ast: bool,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}


fn main()->Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0=>Level::WARN,
        1=>Level::DEBUG,
        _=>Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let source = read_to_string(&cli.file)
        .with_context(||format!("Could not read `{}`", cli.file.display()))?;
    let config = Config {
        mode: cli.mode,
        stack_budget: cli.budget,
        dump_ast: cli.dump_ast,
    };

    return exec(&source, &config, Box::new(Stdout));
}
