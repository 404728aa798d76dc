// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::hint::black_box;

use cliphit::detector::{process, AudioChunk, DetectorConfig, DetectorState, Loudness};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use midly::num::{u4, u7};

/// A decaying burst, roughly what a knuckle on a table looks like.
fn generate_hit(chunk_size: usize, peak: f32) -> AudioChunk {
    AudioChunk::new(
        (0..chunk_size)
            .map(|i| {
                let t = i as f32 / 44100.0;
                let envelope = (-t * 200.0).exp();
                (peak * envelope * (2.0 * std::f32::consts::PI * 180.0 * t).sin()) as i16
            })
            .collect(),
    )
}

fn benchmark_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");

    // Chunk sizes for 60 chunks per second at common capture rates.
    let test_cases = vec![("44.1kHz", 735), ("48kHz", 800), ("96kHz", 1600)];

    for (name, chunk_size) in test_cases {
        let config = DetectorConfig::new(u7::new(36), u4::new(9), 5, 10, chunk_size);
        let chunk = generate_hit(chunk_size, 12000.0);

        group.bench_with_input(BenchmarkId::from_parameter(name), &chunk, |b, chunk| {
            b.iter(|| {
                let result = process(
                    black_box(chunk),
                    black_box(DetectorState::new()),
                    black_box(&config),
                );
                black_box(result)
            })
        });
    }

    group.finish();
}

fn benchmark_loudness(c: &mut Criterion) {
    let chunk = generate_hit(735, 30000.0);
    c.bench_function("loudness_735", |b| {
        b.iter(|| black_box(Loudness::of(black_box(&chunk))))
    });
}

criterion_group!(benches, benchmark_process, benchmark_loudness);
criterion_main!(benches);
