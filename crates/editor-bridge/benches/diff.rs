use criterion::{Criterion, black_box, criterion_group, criterion_main};
use editor_bridge::{DiffOptions, compute_line_diff};

fn large_lines(line_count: usize) -> Vec<String> {
    (0..line_count)
        .map(|i| format!("{i:06} the quick brown fox jumps over the lazy dog (editor-bridge diff line)"))
        .collect()
}

fn bench_scattered_edits(c: &mut Criterion) {
    let original = large_lines(20_000);
    let mut modified = original.clone();
    for i in (0..modified.len()).step_by(97) {
        modified[i].push_str(" // edited");
    }
    for i in (0..modified.len()).step_by(1_013).rev() {
        modified.insert(i, "inserted".to_string());
    }

    let options = DiffOptions::default();
    c.bench_function("dirty_diff/20k_lines_scattered", |b| {
        b.iter(|| {
            let result = compute_line_diff(black_box(&original), black_box(&modified), &options);
            black_box(result.changes.len());
        })
    });
}

fn bench_whitespace_sensitive(c: &mut Criterion) {
    let original = large_lines(5_000);
    let modified: Vec<String> = original
        .iter()
        .enumerate()
        .map(|(i, line)| if i % 10 == 0 { format!("  {line}") } else { line.clone() })
        .collect();

    let options = DiffOptions {
        ignore_trim_whitespace: false,
        ..DiffOptions::default()
    };
    c.bench_function("dirty_diff/5k_lines_whitespace", |b| {
        b.iter(|| {
            let result = compute_line_diff(black_box(&original), black_box(&modified), &options);
            black_box(result.changes.len());
        })
    });
}

criterion_group!(benches, bench_scattered_edits, bench_whitespace_sensitive);
criterion_main!(benches);
