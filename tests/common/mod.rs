//! Shared simulated hardware for integration tests
//!
//! Every handle is a cheap clone over shared cells so a test can keep one
//! copy while the tracker owns another.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::time::Duration;

use fusion_link::config::Config;
use fusion_link::{
    Channel, ImuDriver, MagDriver, Madgwick, ManualClock, Parts, PrimaryChannel, Tracker,
};
use nalgebra::Vector3;

#[derive(Clone)]
pub struct SimImu {
    pub present: Rc<Cell<bool>>,
    pub init_fails: Rc<Cell<bool>>,
    pub accel: Rc<Cell<Vector3<f32>>>,
    pub gyro: Rc<Cell<Vector3<f32>>>,
    pub reads: Rc<Cell<u32>>,
}

impl Default for SimImu {
    fn default() -> Self {
        Self {
            present: Rc::new(Cell::new(true)),
            init_fails: Rc::new(Cell::new(false)),
            accel: Rc::new(Cell::new(Vector3::new(0.0, 0.0, 1.0))),
            gyro: Rc::new(Cell::new(Vector3::zeros())),
            reads: Rc::new(Cell::new(0)),
        }
    }
}

impl ImuDriver for SimImu {
    type Error = &'static str;

    fn probe(&mut self) -> bool {
        self.present.get()
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        if self.init_fails.get() {
            Err("WHO_AM_I mismatch")
        } else {
            Ok(())
        }
    }

    fn auto_offsets(&mut self) {}

    fn accel(&mut self) -> Vector3<f32> {
        self.reads.set(self.reads.get() + 1);
        self.accel.get()
    }

    fn gyro(&mut self) -> Vector3<f32> {
        self.gyro.get()
    }
}

#[derive(Clone)]
pub struct SimMag {
    pub present: Rc<Cell<bool>>,
    pub raw: Rc<Cell<Vector3<i16>>>,
    pub reads: Rc<Cell<u32>>,
}

impl Default for SimMag {
    fn default() -> Self {
        Self {
            present: Rc::new(Cell::new(true)),
            raw: Rc::new(Cell::new(Vector3::new(100, 100, 100))),
            reads: Rc::new(Cell::new(0)),
        }
    }
}

impl MagDriver for SimMag {
    fn probe(&mut self) -> bool {
        self.present.get()
    }

    fn init(&mut self) {}

    fn read_raw(&mut self) -> Vector3<i16> {
        self.reads.set(self.reads.get() + 1);
        self.raw.get()
    }
}

/// Records every line it is handed
#[derive(Clone, Default)]
pub struct Sink {
    pub lines: Rc<RefCell<Vec<String>>>,
}

impl Sink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn starting_with(&self, prefix: &str) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl Channel for Sink {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        assert!(text.ends_with('\n'), "unterminated line {text:?}");
        self.lines.borrow_mut().push(text.trim_end().to_string());
        Ok(())
    }
}

/// Primary link whose state the test flips by hand
#[derive(Clone, Default)]
pub struct SimLink {
    pub sink: Sink,
    pub up: Rc<Cell<bool>>,
    pub connect_succeeds: Rc<Cell<bool>>,
    pub attempts: Rc<Cell<u32>>,
}

impl SimLink {
    pub fn reachable() -> Self {
        let link = Self::default();
        link.connect_succeeds.set(true);
        link
    }
}

impl Channel for SimLink {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.up.get() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "link down"));
        }
        self.sink.send(bytes)
    }
}

impl PrimaryChannel for SimLink {
    fn is_connected(&self) -> bool {
        self.up.get()
    }

    fn connect(&mut self, _timeout: Duration) -> bool {
        self.attempts.set(self.attempts.get() + 1);
        let ok = self.connect_succeeds.get();
        self.up.set(ok);
        ok
    }
}

pub type SimTracker = Tracker<SimImu, SimMag, Madgwick, SimLink, Sink, ManualClock>;

/// Handles onto everything a test tracker owns
pub struct Rig {
    pub imu: SimImu,
    pub mag: SimMag,
    pub link: SimLink,
    pub serial: Sink,
    pub clock: ManualClock,
}

impl Rig {
    pub fn new(link: SimLink) -> Self {
        Self {
            imu: SimImu::default(),
            mag: SimMag::default(),
            link,
            serial: Sink::default(),
            clock: ManualClock::new(),
        }
    }

    pub fn start(&self, config: &Config) -> Result<SimTracker, fusion_link::Error> {
        let parts = Parts {
            imu: self.imu.clone(),
            mag: self.mag.clone(),
            filter: Madgwick::from_config(&config.filter),
            primary: self.link.clone(),
            fallback: self.serial.clone(),
        };
        Tracker::start(config, parts, self.clock.clone())
    }

    /// Advance the clock 1 ms at a time, polling after each step
    pub fn run_for(&self, tracker: &mut SimTracker, duration: Duration) {
        let steps = duration.as_millis() as u64;
        for _ in 0..steps {
            self.clock.advance(Duration::from_millis(1));
            tracker.poll();
        }
    }
}

pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
