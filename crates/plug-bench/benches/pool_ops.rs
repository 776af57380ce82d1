//! Criterion micro-benchmarks for PooledPtrArray against Vec<Box<T>>.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use plug_array::PooledPtrArray;
use plug_bench::{churn_script, ChurnOp};
use plug_test_utils::Widget;

/// Benchmark: add 1024 widgets to an empty container.
fn bench_add_1024(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_1024");
    group.bench_function("pooled", |b| {
        b.iter(|| {
            let mut widgets: PooledPtrArray<Widget> = PooledPtrArray::new();
            for id in 0..1024 {
                widgets.add(Widget::new(id));
            }
            black_box(widgets.chunk_count());
        });
    });
    group.bench_function("pooled_reserved", |b| {
        b.iter(|| {
            let mut widgets: PooledPtrArray<Widget> = PooledPtrArray::new();
            widgets.reserve(1024);
            for id in 0..1024 {
                widgets.add(Widget::new(id));
            }
            black_box(widgets.chunk_count());
        });
    });
    group.bench_function("vec_box", |b| {
        b.iter(|| {
            let mut widgets: Vec<Box<Widget>> = Vec::new();
            for id in 0..1024 {
                widgets.push(Box::new(Widget::new(id)));
            }
            black_box(widgets.len());
        });
    });
    group.finish();
}

/// Benchmark: mixed add/remove churn, where slot reuse matters.
fn bench_churn(c: &mut Criterion) {
    let script = churn_script(4096, 9);
    let mut group = c.benchmark_group("churn_4096");
    group.bench_function("pooled", |b| {
        b.iter(|| {
            let mut widgets: PooledPtrArray<Widget> = PooledPtrArray::new();
            for op in &script {
                match *op {
                    ChurnOp::Add(id) => {
                        widgets.add(Widget::new(id));
                    }
                    ChurnOp::RemoveAt(i) if !widgets.is_empty() => {
                        widgets.erase(i % widgets.len());
                    }
                    ChurnOp::RemoveAt(_) => {}
                }
            }
            black_box(widgets.len());
        });
    });
    group.bench_function("vec_box", |b| {
        b.iter(|| {
            let mut widgets: Vec<Box<Widget>> = Vec::new();
            for op in &script {
                match *op {
                    ChurnOp::Add(id) => widgets.push(Box::new(Widget::new(id))),
                    ChurnOp::RemoveAt(i) if !widgets.is_empty() => {
                        let at = i % widgets.len();
                        widgets.remove(at);
                    }
                    ChurnOp::RemoveAt(_) => {}
                }
            }
            black_box(widgets.len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_add_1024, bench_churn);
criterion_main!(benches);
