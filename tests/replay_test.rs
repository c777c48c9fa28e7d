//! Replays a recorded sensor log through fusion, smoothing and encoding

use fusion_link::math::wrap_difference;
use fusion_link::{
    AngleSmoother, Euler, FusionAdapter, FusionMode, FusionOutcome, MagCalibration, Madgwick,
    RawSample, SensorHealth, Telemetry, TelemetryLine,
};
use nalgebra::Vector3;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LogRow {
    t_ms: u64,
    ax: f32,
    ay: f32,
    az: f32,
    gx: f32,
    gy: f32,
    gz: f32,
    mx: i16,
    my: i16,
    mz: i16,
    mag_valid: u8,
}

impl LogRow {
    fn sample(&self) -> RawSample {
        RawSample {
            accel: Vector3::new(self.ax, self.ay, self.az),
            gyro: Vector3::new(self.gx, self.gy, self.gz),
            mag_raw: Vector3::new(self.mx, self.my, self.mz),
            mag_valid: self.mag_valid == 1,
        }
    }
}

struct Replay {
    t_ms: Vec<u64>,
    modes: Vec<FusionMode>,
    lines: Vec<String>,
    smoothed: Vec<Euler>,
}

fn replay() -> Replay {
    let mut reader = csv::Reader::from_path("testdata/imu_log.csv").unwrap();
    let mut fusion = FusionAdapter::new(Madgwick::new(100.0, 0.1), MagCalibration::default());
    let mut smoother = AngleSmoother::new(0.15);
    let mut out = Replay {
        t_ms: Vec::new(),
        modes: Vec::new(),
        lines: Vec::new(),
        smoothed: Vec::new(),
    };

    for row in reader.deserialize() {
        let row: LogRow = row.unwrap();
        let sample = row.sample();
        let health = SensorHealth {
            imu_ok: true,
            mag_ok: sample.mag_valid,
        };
        match fusion.advance(&sample, health) {
            FusionOutcome::Estimate(euler, mode) => {
                let smoothed = smoother.update(euler);
                out.t_ms.push(row.t_ms);
                out.modes.push(mode);
                out.lines.push(Telemetry::Euler(smoothed).to_string());
                out.smoothed.push(smoothed);
            }
            other => panic!("no estimate at {} ms: {other:?}", row.t_ms),
        }
    }
    out
}

#[test]
fn test_every_line_decodes() {
    let replay = replay();
    assert_eq!(replay.lines.len(), 600);
    for line in &replay.lines {
        match line.parse::<TelemetryLine>() {
            Ok(TelemetryLine::Euler(euler)) => assert!(euler.is_finite()),
            other => panic!("{line}: {other:?}"),
        }
    }
}

#[test]
fn test_dropout_switches_to_six_axis() {
    let replay = replay();
    for (t, mode) in replay.t_ms.iter().zip(&replay.modes) {
        let expected = if (3000..3200).contains(t) {
            FusionMode::SixAxis
        } else {
            FusionMode::NineAxis
        };
        assert_eq!(*mode, expected, "at {t} ms");
    }
}

#[test]
fn test_level_device_stays_level() {
    let replay = replay();
    for (t, e) in replay.t_ms.iter().zip(&replay.smoothed) {
        assert!(e.roll.abs() < 5.0, "roll {} at {t} ms", e.roll);
        assert!(e.pitch.abs() < 5.0, "pitch {} at {t} ms", e.pitch);
    }
}

#[test]
fn test_heading_moves_without_jumps() {
    let replay = replay();
    let mut travelled = 0.0;
    for pair in replay.smoothed.windows(2) {
        let step = wrap_difference(pair[1].yaw - pair[0].yaw);
        assert!(step.abs() < 5.0, "{:?} -> {:?}", pair[0], pair[1]);
        travelled += step;
    }
    // Four seconds at 90 deg/s, give or take magnetic correction
    assert!(travelled.abs() > 180.0, "travelled {travelled}");
}
