use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schemelet::{Evaluator, Parser, Scanner};

const FIB: &str = r#"
    (define (fib n)
      (if (< n 2)
          n
          (+ (fib (- n 1)) (fib (- n 2)))))
    (fib 15)
"#;

const LOOP: &str = r#"
    (do ((i 0 (+ i 1))
         (acc '() (cons i acc)))
        ((= i 500) (length acc)))
"#;

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize fib program", |b| {
        b.iter(|| {
            let mut scanner = Scanner::new(black_box(FIB));
            scanner.scan_tokens().unwrap()
        })
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let tokens = Scanner::new(FIB).scan_tokens().unwrap();
    c.bench_function("parse fib program", |b| {
        b.iter(|| {
            let mut parser = Parser::new(black_box(tokens.clone()));
            parser.parse().unwrap()
        })
    });
}

fn evaluation_benchmark(c: &mut Criterion) {
    c.bench_function("evaluate recursive fib 15", |b| {
        b.iter(|| {
            let mut evaluator = Evaluator::new();
            evaluator.execute_source(black_box(FIB)).unwrap()
        })
    });

    c.bench_function("evaluate do loop building a list", |b| {
        b.iter(|| {
            let mut evaluator = Evaluator::new();
            evaluator.execute_source(black_box(LOOP)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    lexer_benchmark,
    parser_benchmark,
    evaluation_benchmark
);
criterion_main!(benches);
