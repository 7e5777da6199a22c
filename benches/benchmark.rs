//! Benchmarking GPX formatting & parsing
extern crate criterion;
use criterion::{criterion_group, criterion_main, Criterion};

use std::io::{BufWriter, Write};

use tracklog::prelude::*;

#[derive(Debug)]
pub struct Utf8Buffer {
    pub inner: Vec<u8>,
}

impl Write for Utf8Buffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.clear();
        Ok(())
    }
}

impl Utf8Buffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }
}

/// One hour long track, sampled every second
fn hour_long_track() -> (TrackStore, TrackId) {
    let t0 = Utc::now();
    let store = TrackStore::new(FixedClock(t0));
    let id = store.create_track();
    store.rename(id, "benchmark").unwrap();
    for i in 0..3600 {
        let location = Location::new(45.0 + i as f64 * 1.0E-5, 6.0 - i as f64 * 1.0E-5)
            .with_elevation(1000.0 + i as f64 * 0.1)
            .with_accuracy(4.0)
            .with_speed(1.5)
            .with_time(t0 + chrono::Duration::seconds(i));
        let sensors = SensorReading::default()
            .with_compass((i % 360) as f64, 3)
            .with_pressure(900.0);
        store.insert_track_point(id, Some(&location), sensors).unwrap();
    }
    (store, id)
}

fn benchmark(c: &mut Criterion) {
    let (store, id) = hour_long_track();
    let track = store.track(id).unwrap();
    let points = store.points_of(id, None).unwrap().collect::<Vec<_>>();

    let mut formatting_grp = c.benchmark_group("formatting");
    let mut buffer = BufWriter::new(Utf8Buffer::new(4096));

    for (label, options) in [
        ("default", GpxOptions::default()),
        (
            "hdop+compass",
            GpxOptions::default()
                .with_hdop(DEFAULT_HDOP_FACTOR)
                .with_compass_mode(CompassMode::Extension),
        ),
    ] {
        let writer = GpxWriter::new(options);
        formatting_grp.bench_function(label, |b| {
            b.iter(|| {
                writer
                    .format(&mut buffer, &track, points.iter().cloned(), &[])
                    .unwrap();
                buffer.flush().unwrap();
            })
        });
    }
    formatting_grp.finish();

    let mut content = Vec::<u8>::new();
    GpxWriter::new(GpxOptions::default().with_compass_mode(CompassMode::Extension))
        .format(&mut content, &track, points.iter().cloned(), &[])
        .unwrap();

    let mut parsing_grp = c.benchmark_group("parsing");
    parsing_grp.bench_function("hour-long", |b| {
        b.iter(|| {
            let count = GpxImporter::new(content.as_slice(), ImportOptions::default()).count();
            assert_eq!(count, 3600);
        })
    });
    parsing_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
