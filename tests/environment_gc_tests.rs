//! Frame reclamation tests
//!
//! Closures hold frame handles, so closure/frame cycles must still be
//! reclaimed once nothing reachable from the global frame refers to them.

use schemelet::runtime::Environment;
use schemelet::{Evaluator, InterpreterConfig, Value};

fn manual_gc() -> Evaluator {
    Evaluator::with_config(InterpreterConfig {
        gc_threshold: 0,
        ..InterpreterConfig::default()
    })
}

#[test]
fn test_automatic_collection_bounds_live_frames() {
    let mut evaluator = Evaluator::with_config(InterpreterConfig {
        gc_threshold: 16,
        ..InterpreterConfig::default()
    });
    evaluator.execute_source("(define (id n) n)").unwrap();

    for _ in 0..200 {
        evaluator.execute_source("(id 1)").unwrap();
    }

    assert!(
        evaluator.environment().live_frames() <= 17,
        "{} frames still live",
        evaluator.environment().live_frames()
    );
}

#[test]
fn test_disabled_collection_keeps_frames() {
    let mut evaluator = manual_gc();
    evaluator.execute_source("(define (id n) n)").unwrap();
    for _ in 0..20 {
        evaluator.execute_source("(id 1)").unwrap();
    }
    assert_eq!(evaluator.environment().live_frames(), 21);

    assert_eq!(evaluator.collect_garbage(), 20);
    assert_eq!(evaluator.environment().live_frames(), 1);
}

#[test]
fn test_recursive_closure_cycle_is_reclaimed() {
    let mut evaluator = manual_gc();
    let closure = evaluator
        .execute_source("(letrec ((self (lambda () self))) self)")
        .unwrap();
    assert!(closure.is_procedure());

    // Still rooted as the last result
    evaluator.collect_garbage();
    assert_eq!(evaluator.environment().live_frames(), 2);

    evaluator.execute_source("'unrelated").unwrap();
    assert_eq!(evaluator.collect_garbage(), 1);
    assert_eq!(evaluator.environment().live_frames(), 1);
}

#[test]
fn test_closures_nested_in_global_data_survive() {
    let mut evaluator = manual_gc();
    evaluator
        .execute_source("(define keep (list 'tag (let ((v 5)) (lambda () v))))")
        .unwrap();
    evaluator.execute_source("0").unwrap();

    evaluator.collect_garbage();
    assert_eq!(
        evaluator.execute_source("((car (cdr keep)))").unwrap(),
        Value::Number(5)
    );
}

#[test]
fn test_chained_frames_survive_through_parents() {
    let mut evaluator = manual_gc();
    evaluator
        .execute_source(
            r#"
            (define adder
              (let ((a 1))
                (let ((b 2))
                  (lambda (c) (+ a b c)))))
            "#,
        )
        .unwrap();

    evaluator.collect_garbage();
    assert_eq!(
        evaluator.execute_source("(adder 3)").unwrap(),
        Value::Number(6)
    );
}

#[test]
fn test_stale_frame_handle_is_detected() {
    let mut env = Environment::new();
    let global = env.new_frame(None);
    let scratch = env.new_frame(Some(global));
    env.define(scratch, "x", Value::Number(1)).unwrap();

    let freed = env.collect([global], std::iter::empty::<&Value>());
    assert_eq!(freed, 1);

    let err = env.lookup(scratch, "x").unwrap_err();
    assert_eq!(err.kind_name(), "RuntimeError");

    // The slot is reused under a new generation
    let reused = env.new_frame(Some(global));
    assert_ne!(reused, scratch);
    assert!(env.lookup(scratch, "x").is_err());
    assert!(!env.is_bound(reused, "x"));
}
