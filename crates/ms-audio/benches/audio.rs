use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use ms_audio::fft::FftPipeline;
use ms_audio::pool::BufferPool;
use ms_audio::spectral::SpectralEngine;
use ms_core::config::{AnalysisConfig, PoolConfig};
use ms_core::frame::{AudioFormat, SampleWindow};

fn signal(len: usize, rate: u32) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / rate as f32;
            0.4 * (std::f32::consts::TAU * 220.0 * t).sin()
                + 0.2 * (std::f32::consts::TAU * 3300.0 * t).sin()
        })
        .collect()
}

fn bench_fft(c: &mut Criterion) {
    let mut fft = FftPipeline::new(2048).unwrap();
    let samples = signal(2048, 44100);
    c.bench_function("fft_2048", |b| {
        b.iter(|| {
            let mags = fft.process(black_box(&samples)).unwrap();
            black_box(mags[10]);
        });
    });
}

fn bench_analyze_window(c: &mut Criterion) {
    let config = AnalysisConfig::default();
    let mut engine = SpectralEngine::new(&config, 44100).unwrap();
    let mono = signal(config.window_size, 44100);
    let stereo: Vec<f32> = mono.iter().flat_map(|s| [*s, -*s]).collect();

    c.bench_function("analyze_window_mono_2048", |b| {
        let format = AudioFormat::mono(44100);
        b.iter(|| {
            let features = engine
                .analyze_window(&SampleWindow::new(black_box(&mono), format))
                .unwrap();
            black_box(features.centroid);
        });
    });

    c.bench_function("analyze_window_stereo_2048", |b| {
        let format = AudioFormat::new(44100, 2);
        b.iter(|| {
            let features = engine
                .analyze_window(&SampleWindow::new(black_box(&stereo), format))
                .unwrap();
            black_box(features.centroid);
        });
    });
}

fn bench_pool_cycle(c: &mut Criterion) {
    let pool = Arc::new(BufferPool::new(&PoolConfig::default()));
    let format = AudioFormat::new(48000, 2);
    c.bench_function("pool_request_release", |b| {
        b.iter(|| {
            if let Some(buffer) = pool.request(format, black_box(2048)) {
                pool.release(buffer);
            }
        });
    });
}

criterion_group!(benches, bench_fft, bench_analyze_window, bench_pool_cycle);
criterion_main!(benches);
