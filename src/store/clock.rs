//! Timestamps for local writes.
//!
//! Timestamps are wall-clock seconds as `f64` and are only ever compared for
//! ordering. Clocks on different nodes are not synchronized; a node whose
//! clock runs behind can lose a causally later write to an earlier one.

/// Largest timestamp a node accepts or issues (roughly the year 33658).
///
/// Keeps `next_up` on any stored timestamp finite, so a local write can
/// always be ordered after it.
pub const MAX_TIMESTAMP: f64 = 1.0e12;

/// Whether `ts` can be stored, compared and sent on the wire
pub fn is_valid_timestamp(ts: f64) -> bool {
    ts.is_finite() && ts <= MAX_TIMESTAMP
}

/// Current wall-clock reading in seconds since the Unix epoch
pub fn wall_clock_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Smallest `f64` strictly greater than `x` (for finite `x`)
pub fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Issues timestamps for one store's local writes.
///
/// Clock readings are made strictly increasing across all writes. The
/// per-key floor only affects the timestamp returned for that write and
/// never advances the clock itself, so one far-future remote entry cannot
/// drag every later write along with it.
#[derive(Clone, Debug, Default)]
pub struct WriteClock {
    last_issued: f64,
}

impl WriteClock {
    pub fn new() -> Self {
        Self { last_issued: 0.0 }
    }

    /// Next timestamp given a clock reading and the timestamp currently
    /// stored for the key being written (if any).
    ///
    /// The result is finite, at most [`MAX_TIMESTAMP`], greater than every
    /// earlier clock reading issued, and greater than `floor` unless the
    /// floor already sits at the ceiling.
    pub fn tick(&mut self, now: f64, floor: Option<f64>) -> f64 {
        let mut reading = now.min(MAX_TIMESTAMP);
        if reading <= self.last_issued {
            reading = next_up(self.last_issued).min(MAX_TIMESTAMP);
        }
        self.last_issued = reading;

        match floor.filter(|f| is_valid_timestamp(*f)) {
            Some(floor) if reading <= floor => next_up(floor).min(MAX_TIMESTAMP),
            _ => reading,
        }
    }

    pub fn last_issued(&self) -> f64 {
        self.last_issued
    }
}
