use std::time::Duration;

/// What a `reconcile` call asks the (external) work queue to do next. The
/// queue itself is out of scope (spec.md §1); this is only the contract a
/// harness would need to honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Reached steady state; only re-run on the next watch event or poll.
    None,
    /// Re-run after this duration (a poll interval, or a backoff).
    After(Duration),
}

/// Exponential backoff for unpack failures (spec.md §4.1): doubles per
/// attempt starting at 5s, capped at 10 minutes, with up to 20% jitter so a
/// fleet of identically-failing catalogs doesn't retry in lockstep.
pub fn unpack_backoff(attempt: u32) -> Requeue {
    const BASE: Duration = Duration::from_secs(5);
    const MAX: Duration = Duration::from_secs(600);

    let exponent = attempt.min(10);
    let scaled = BASE.saturating_mul(1u32.checked_shl(exponent).unwrap_or(u32::MAX));
    let capped = scaled.min(MAX);

    use rand::Rng;
    let jitter_mul = rand::thread_rng().gen_range(0.0..0.2);
    let jittered = capped.mul_f64(1.0 + jitter_mul);
    Requeue::After(jittered.min(MAX + MAX / 5))
}
