use benches::synthetic_project;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine::{CallGraph, DBAccessAnalyzer, SqlExtractor, SqlStrategy};
use ir::{JavaClass, SqlExtractionResult};
use parsers::{classes_of, JavaParser, MemoryParseCache};
use std::sync::Arc;

const SIZES: &[usize] = &[10, 100];

fn parse_classes(java: &[(String, String)]) -> Vec<JavaClass> {
    let parser = JavaParser::new(Arc::new(MemoryParseCache::new()));
    let files: Vec<_> = java
        .iter()
        .filter_map(|(path, content)| parser.parse_source(path, content).ok())
        .collect();
    classes_of(&files)
}

fn extract_sql(mappers: &[(String, String)]) -> Vec<SqlExtractionResult> {
    let extractor = SqlExtractor::new(SqlStrategy::mybatis());
    mappers
        .iter()
        .map(|(path, content)| extractor.extract_str(path, content).0)
        .collect()
}

fn bench_java_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_java");
    for &size in SIZES {
        let project = synthetic_project(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &project.java, |b, java| {
            b.iter(|| parse_classes(black_box(java)))
        });
    }
    group.finish();
}

fn bench_java_parser_cached(c: &mut Criterion) {
    let project = synthetic_project(100);
    let parser = JavaParser::new(Arc::new(MemoryParseCache::new()));
    for (path, content) in &project.java {
        let _ = parser.parse_source(path, content);
    }
    c.bench_function("parse_java_cached", |b| {
        b.iter(|| {
            for (path, content) in &project.java {
                let _ = black_box(parser.parse_source(path, content));
            }
        })
    });
}

fn bench_sql_extraction(c: &mut Criterion) {
    let project = synthetic_project(100);
    c.bench_function("extract_sql", |b| {
        b.iter(|| extract_sql(black_box(&project.mappers)))
    });
}

fn bench_call_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("call_graph");
    for &size in SIZES {
        let classes = parse_classes(&synthetic_project(size).java);
        group.bench_with_input(BenchmarkId::new("build", size), &classes, |b, classes| {
            b.iter(|| CallGraph::build(black_box(classes.clone())))
        });
        let graph = CallGraph::build(classes);
        group.bench_with_input(BenchmarkId::new("trees", size), &graph, |b, graph| {
            b.iter(|| graph.call_trees(black_box(20)))
        });
    }
    group.finish();
}

fn bench_table_access(c: &mut Criterion) {
    let project = synthetic_project(100);
    let graph = CallGraph::build(parse_classes(&project.java));
    let mut results = extract_sql(&project.mappers);
    let analyzer = DBAccessAnalyzer::new(&graph, 20);
    analyzer.assign_owners(&mut results);
    c.bench_function("table_access", |b| {
        b.iter(|| analyzer.analyze(black_box(&results)))
    });
}

criterion_group!(
    benches,
    bench_java_parser,
    bench_java_parser_cached,
    bench_sql_extraction,
    bench_call_graph,
    bench_table_access
);
criterion_main!(benches);
