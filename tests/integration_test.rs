// ABOUTME: End-to-end scenarios through the public runtime interface

use palisp::interp::Interp;
use palisp::port::Port;
use palisp::reader;
use palisp::value::Value;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

/// Context with a sink output port so printed output can be inspected.
fn setup() -> Interp {
    let mut interp = Interp::new();
    interp.set_output(Port::sink());
    interp
}

/// Printed form of the last value of `source`.
fn last(interp: &mut Interp, source: &str) -> String {
    let value = interp
        .eval_source(source)
        .expect("evaluation failed")
        .pop()
        .expect("no result");
    format!("{}", value)
}

/// Read one expression without evaluating it and print it back.
fn read_print(interp: &mut Interp, source: &str) -> String {
    let port = Rc::new(RefCell::new(Port::from_str(source)));
    let value = reader::read(&port, &mut interp.symbols)
        .expect("parse failure")
        .expect("no expression");
    format!("{}", value)
}

#[test]
fn test_scenario_integer_addition() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "(+ 1 2 3)"), "6");
}

#[test]
fn test_scenario_mixed_addition_is_float() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "(+ 1 2.0)"), "3.000000");
}

#[test]
fn test_scenario_function_call() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "((fn (x y) (+ x y)) 10 32)"), "42");
}

#[test]
fn test_scenario_recursive_factorial() {
    let mut interp = setup();
    let source = "(bind! 'fact (fn (n) (if (<= n 1) 1 (* n (fact (- n 1)))))) (fact 5)";
    assert_eq!(last(&mut interp, source), "120");
}

#[test]
fn test_scenario_call_cc() {
    let mut interp = setup();
    assert_eq!(
        last(&mut interp, "(+ 1 (call-cc (fn (k) (+ 10 (k 41)))))"),
        "42"
    );
}

#[test]
fn test_scenario_print_escapes() {
    let mut interp = setup();
    last(&mut interp, "(print \"he\\\"llo\")");
    assert_eq!(interp.drain_output(), "\"he\\\"llo\"");
}

#[test]
fn test_scenario_quoted_parameter() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "((fn ((eval x)) x) (+ 1 2))"), "(+ 1 2)");
}

#[test]
fn test_scenario_aref_string() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "(aref \"abc\" 1)"), "?b");
}

#[test]
fn test_round_trip_printable_values() {
    let mut interp = setup();
    for source in [
        "42",
        "-3",
        "2.500000",
        "?b",
        "?\\n",
        "\"he\\\"llo\"",
        "\"tab\\there\"",
        "foo",
        "(1 2 3)",
        "(1 (2 ?x) \"s\")",
        "(1 . 2)",
        "[1 \"x\" ?c]",
        "[]",
        "()",
    ] {
        let printed = read_print(&mut interp, source);
        let reprinted = read_print(&mut interp, &printed);
        assert_eq!(printed, reprinted, "round trip failed for {}", source);
    }
}

#[test]
fn test_symbol_interning_invariant() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "(nil? (eq? (intern \"s\") (intern \"s\")))"), "()");
    assert_eq!(last(&mut interp, "(eq? (gensym) (gensym))"), "()");
    assert_eq!(last(&mut interp, "(eq? (gensym) 'anything)"), "()");
    assert_eq!(last(&mut interp, "(nil? (eq? 'a (intern \"a\")))"), "()");
}

#[test]
fn test_under_supply_builds_partial_application() {
    let mut interp = setup();
    let printed = last(&mut interp, "(mod 7)");
    assert!(printed.starts_with("#<func:(pa/"), "got {}", printed);
    assert_eq!(last(&mut interp, "((mod 7) 3)"), "1");
    assert_eq!(last(&mut interp, "(((fn (a b c) (+ a b c)) 1 2) 39)"), "42");
}

#[test]
fn test_over_supply_is_fatal() {
    let mut interp = setup();
    let err = interp
        .eval_source("((fn (x) x) 1 2)")
        .expect_err("over-supply must fail");
    assert!(err.to_string().contains("too many arguments"));
}

#[test]
fn test_tail_calls_do_not_grow_the_stack() {
    let mut interp = setup();
    let source = "(bind! 'loop-down (fn (n) (if (<= n 0) 'ok (loop-down (- n 1))))) \
                  (loop-down 200000)";
    assert_eq!(last(&mut interp, source), "ok");
}

#[test]
fn test_environment_discipline_across_siblings() {
    let mut interp = setup();
    // the inner formal shadows across the boundary instead of mutating
    assert_eq!(
        last(&mut interp, "((fn (x) (cons ((fn (x) x) 2) x)) 1)"),
        "(2 . 1)"
    );
}

#[test]
fn test_opaque_values_print_with_arity_summary() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "(fn (x y) (+ x y))"), "#<func:2 (+ ...)>");
    assert!(last(&mut interp, "(closure (fn (x) x))").starts_with("#<closure:1 "));
    assert_eq!(last(&mut interp, "mod"), "#<subr:2 mod>");
    assert_eq!(last(&mut interp, "+"), "#<subr:0+ +>");
}

#[test]
fn test_numeric_coercion_rules() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "(* 2 3)"), "6");
    assert_eq!(last(&mut interp, "(* 2 3.0)"), "6.000000");
    assert_eq!(last(&mut interp, "(div 4 2)"), "2.000000");
    assert_eq!(last(&mut interp, "(/ 9 2)"), "4");
    assert_eq!(last(&mut interp, "(round 2.9)"), "2");
}

#[test]
fn test_error_callbacks_recover_inside_expression() {
    let mut interp = setup();
    assert_eq!(
        last(&mut interp, "(+ 1 (bound-value 'missing (fn (m) 41)))"),
        "42"
    );
}

#[test]
fn test_read_driven_evaluation() {
    let mut interp = setup();
    interp.set_input(Port::from_str("(+ 20 22)"));
    assert_eq!(last(&mut interp, "(eval (read))"), "42");
}

#[test]
fn test_quote_and_comma_sugar() {
    let mut interp = setup();
    assert_eq!(last(&mut interp, "'(a b)"), "(a b)");
    assert_eq!(last(&mut interp, "(bind! 'x 5) ',x"), "(eval x)");
    assert_eq!(last(&mut interp, "(eval ',x)"), "5");
}

#[test]
fn test_values_produced_match_value_model() {
    let mut interp = setup();
    let values = interp
        .eval_source("42 2.0 ?a \"s\" 'sym '(1) [1]")
        .unwrap();
    assert!(matches!(values[0], Value::Int(42)));
    assert!(matches!(values[1], Value::Float(_)));
    assert!(matches!(values[2], Value::Char(b'a')));
    assert!(values[3].is_string());
    assert!(matches!(values[4], Value::Symbol(_)));
    assert!(values[5].is_pair());
    assert!(values[6].is_array());
}
