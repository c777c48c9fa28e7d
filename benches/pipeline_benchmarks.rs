use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fusion_link::smoothing::ema_angle;
use fusion_link::{
    AngleSmoother, Euler, FusionAdapter, MagCalibration, Madgwick, OrientationFilter, RawSample,
    SensorHealth, Telemetry, TelemetryLine,
};
use nalgebra::Vector3;
use rand::prelude::*;
use rand_pcg::Pcg64;
use std::f32::consts::PI;

// Pre-generated samples so RNG cost stays out of the measurement
struct PreGeneratedSamples {
    samples: Vec<RawSample>,
    index: usize,
}

impl PreGeneratedSamples {
    fn new(count: usize, seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut samples = Vec::with_capacity(count);

        for i in 0..count {
            let phase = i as f32 * 0.01 * PI;

            let gyro = Vector3::new(
                5.0 * phase.sin() + rng.random_range(-0.2..0.2),
                5.0 * (phase * 1.3).cos() + rng.random_range(-0.2..0.2),
                30.0 + rng.random_range(-0.2..0.2),
            );
            let accel = Vector3::new(
                -0.05 * phase.sin() + rng.random_range(-0.002..0.002),
                0.05 * phase.cos() + rng.random_range(-0.002..0.002),
                1.0 + rng.random_range(-0.002..0.002),
            );
            let mag_raw = Vector3::new(
                (220.0 * phase.cos()) as i16 + rng.random_range(-3..=3),
                (-220.0 * phase.sin()) as i16 + rng.random_range(-3..=3),
                -380 + rng.random_range(-3..=3),
            );

            samples.push(RawSample {
                accel,
                gyro,
                mag_raw,
                mag_valid: true,
            });
        }

        Self { samples, index: 0 }
    }

    fn next(&mut self) -> RawSample {
        let sample = self.samples[self.index];
        self.index = (self.index + 1) % self.samples.len();
        sample
    }
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("madgwick");
    let gyro = Vector3::new(0.1, -0.2, 0.05);
    let accel = Vector3::new(0.01, -0.02, 1.0);
    let mag = Vector3::new(20.0, 2.0, -35.0);

    let mut filter = Madgwick::new(100.0, 0.1);
    group.bench_function("update6", |b| {
        b.iter(|| filter.update6(black_box(gyro), black_box(accel)))
    });

    let mut filter = Madgwick::new(100.0, 0.1);
    group.bench_function("update9", |b| {
        b.iter(|| filter.update9(black_box(gyro), black_box(accel), black_box(mag)))
    });

    group.bench_function("euler", |b| b.iter(|| black_box(filter.euler())));
    group.finish();
}

fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");

    group.bench_function("ema_angle_across_seam", |b| {
        b.iter(|| ema_angle(black_box(359.5), black_box(0.5), black_box(0.15)))
    });

    let mut smoother = AngleSmoother::new(0.15);
    let mut yaw = 0.0f32;
    group.bench_function("angle_smoother_update", |b| {
        b.iter(|| {
            yaw = (yaw + 7.0) % 360.0;
            smoother.update(black_box(Euler::new(1.0, -2.0, yaw)))
        })
    });

    group.finish();
}

fn bench_telemetry(c: &mut Criterion) {
    let mut group = c.benchmark_group("telemetry");
    let euler = Euler::new(12.345, -3.21, 271.5);

    group.bench_function("encode_euler", |b| {
        b.iter(|| Telemetry::Euler(black_box(euler)).to_string())
    });

    let line = Telemetry::Euler(euler).to_string();
    group.bench_function("decode_euler", |b| {
        b.iter(|| black_box(line.as_str()).parse::<TelemetryLine>())
    });

    group.finish();
}

/// One sampling tick: fuse, smooth, encode
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for (name, health) in [
        ("nine_axis", SensorHealth::ALL_UP),
        (
            "six_axis",
            SensorHealth {
                imu_ok: true,
                mag_ok: false,
            },
        ),
    ] {
        let mut data = PreGeneratedSamples::new(1000, 42);
        let mut fusion = FusionAdapter::new(Madgwick::new(100.0, 0.1), MagCalibration::default());
        let mut smoother = AngleSmoother::new(0.15);

        group.bench_with_input(BenchmarkId::from_parameter(name), &health, |b, &health| {
            b.iter(|| {
                let sample = data.next();
                let outcome = fusion.advance(black_box(&sample), health);
                outcome
                    .estimate()
                    .map(|euler| Telemetry::Euler(smoother.update(euler)).to_string())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter, bench_smoothing, bench_telemetry, bench_tick);
criterion_main!(benches);
