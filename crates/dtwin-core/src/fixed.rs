use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulated time. Fixed-point so that event ordering is bit-exact across
/// platforms and runs.
pub type SimTime = Fixed64;

/// Convert an f64 to simulated time. Use only when loading configuration,
/// never in the event loop. Returns `None` for NaN or out-of-range values.
#[inline]
pub fn time_from_f64(v: f64) -> Option<SimTime> {
    SimTime::checked_from_num(v)
}

/// Convert simulated time to f64. Use only for display and reporting.
#[inline]
pub fn time_to_f64(t: SimTime) -> f64 {
    t.to_num::<f64>()
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Serde adapter that reads and writes [`SimTime`] as a plain decimal
/// number, for human-edited configuration files.
pub mod time_as_f64 {
    use super::{SimTime, time_from_f64, time_to_f64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &SimTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(time_to_f64(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SimTime, D::Error> {
        let v = f64::deserialize(d)?;
        time_from_f64(v)
            .ok_or_else(|| serde::de::Error::custom(format!("time value {v} is out of range")))
    }
}
