//! The programs under `demos/`, run end to end through `exec`.

use lambda_eval::{
    Config,
    Mode,
    exec,
    output::Captured,
};


fn run(source: &str, mode: Mode)->Vec<String> {
    let output = Captured::new();
    let config = Config {mode, ..Config::default()};
    exec(source, &config, Box::new(output.clone()))
        .unwrap_or_else(|err|panic!("{mode:?} run failed: {err}"));

    return output.lines();
}

fn lines(expected: &[&str])->Vec<String> {
    expected.iter().map(|s|s.to_string()).collect()
}


#[test]
fn print_range() {
    let source = include_str!("../demos/print-range.lambda");
    let expected = lines(&["1", ", ", "2", ", ", "3", ", ", "4", ", ", "5", ", ", "6", ", ", "7", ", ", "8", ", ", "9", ", ", "10", ""]);
    assert_eq!(run(source, Mode::Sync), expected);

    let mut cps = run(source, Mode::Cps);
    assert_eq!(cps.pop().as_deref(), Some("*** Result: false"));
    assert_eq!(cps, expected);
}

#[test]
fn for_each() {
    let source = include_str!("../demos/for-each.lambda");
    assert_eq!(run(source, Mode::Sync), lines(&["1", "2", "3", "4", "5"]));
}

#[test]
fn range() {
    let source = include_str!("../demos/range.lambda");
    assert_eq!(run(source, Mode::Sync), lines(&["1", "4", "9", "16", "25", "36", "49", "64"]));
}

#[test]
fn mutable_lists() {
    let source = include_str!("../demos/mutable-lists.lambda");
    let expected = lines(&["1", "2", "10", "20"]);
    assert_eq!(run(source, Mode::Sync), expected);
    assert_eq!(run(source, Mode::Cps)[..4], expected[..]);
}

#[test]
fn let_forms() {
    let source = include_str!("../demos/let.lambda");
    assert_eq!(run(source, Mode::Sync), lines(&["5050", "10", "20", "400", "10"]));
}

#[test]
fn escape_needs_cps() {
    let source = include_str!("../demos/escape.lambda");

    let cps = run(source, Mode::Cps);
    assert_eq!(cps[0], "15");
    assert_eq!(cps[1], "done");
    assert!(cps[2].starts_with("Time: "));
    assert_eq!(cps[3..], lines(&["waiting", "woke up"])[..]);

    let output = Captured::new();
    let config = Config {mode: Mode::Sync, ..Config::default()};
    assert!(exec(source, &config, Box::new(output)).is_err());
}

#[test]
fn dump_ast_skips_running() {
    let output = Captured::new();
    let config = Config {dump_ast: true, ..Config::default()};
    exec("println(1 + 2)", &config, Box::new(output.clone())).expect("parses");

    let dumped = output.lines();
    assert_eq!(dumped.len(), 1);
    assert!(dumped[0].contains("Binary"));
    assert!(!dumped[0].contains("*** Result"));
}

#[test]
fn parse_errors_surface() {
    let config = Config::default();
    let err = exec("let (x = ) x", &config, Box::new(Captured::new())).expect_err("does not parse");
    assert_eq!(err.to_string(), "Unexpected token: Paren(End) (1:10)");

    let err = exec("println(1);\nprintln(2 +);", &config, Box::new(Captured::new())).expect_err("does not parse");
    assert!(err.to_string().ends_with("(2:12)"), "got {err}");
}
