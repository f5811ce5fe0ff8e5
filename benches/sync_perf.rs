//! Checksum and diff throughput benchmarks.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use skillsync::core::checksum::{checksum_tree, FileTree};
use skillsync::diff::{compute_hunks, diff_trees};

fn sample_tree(files: usize, lines_per_file: usize) -> FileTree {
    (0..files)
        .map(|i| {
            let content: String = (0..lines_per_file)
                .map(|l| format!("line {l} of file {i}\n"))
                .collect();
            (format!("ref/file-{i:03}.md"), content.into_bytes())
        })
        .collect()
}

fn bench_checksum(c: &mut Criterion) {
    let tree = sample_tree(64, 200);
    c.bench_function("checksum_tree_64x200", |b| {
        b.iter(|| checksum_tree(black_box(&tree)));
    });
}

fn bench_diff_trees(c: &mut Criterion) {
    let left = sample_tree(64, 200);
    let mut right = left.clone();
    for (i, content) in right.values_mut().enumerate().take(16) {
        content.extend_from_slice(format!("appended line {i}\n").as_bytes());
    }
    c.bench_function("diff_trees_64_files_16_modified", |b| {
        b.iter(|| diff_trees(black_box(&left), black_box(&right)));
    });
}

fn bench_hunks(c: &mut Criterion) {
    let old: String = (0..2000).map(|i| format!("line {i}\n")).collect();
    let new = old.replace("line 500\n", "LINE 500\n").replace("line 1500\n", "LINE 1500\n");
    c.bench_function("compute_hunks_2000_lines", |b| {
        b.iter(|| compute_hunks(black_box(&old), black_box(&new)));
    });
}

criterion_group!(benches, bench_checksum, bench_diff_trees, bench_hunks);
criterion_main!(benches);
