use std::time::Duration;

/// Capped exponential reconnect delay: `min(max, base * 2^(retries-1))`.
pub fn reconnect_delay(base: Duration, max: Duration, retries: u32) -> Duration {
    if retries <= 1 {
        return base.min(max);
    }
    let exponent = (retries - 1).min(16);
    base.saturating_mul(1u32 << exponent).min(max)
}
