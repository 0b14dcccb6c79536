//! Room expiry countdown.
//!
//! A state machine over a single timestamp comparison: `Active(remaining)`
//! until the expiry instant, then `Expired`. Each tick re-derives the
//! remaining time from the absolute expiry instant and the tick's `now`, so
//! the countdown never accumulates drift across ticks. The driver is expected
//! to tick once per second; the rendered label only changes when the display
//! value does.

/// Label rendered at or past the expiry instant.
pub const EXPIRED_LABEL: &str = "Expired";

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed: no expiry is set, or the label is already current.
    Idle,
    /// The rendered label changed.
    Updated,
    /// The expiry instant was reached on this tick.
    ///
    /// Reported exactly once per expiry instant; later ticks return
    /// [`TickOutcome::Idle`].
    Expired,
}

/// Wall-clock countdown to a room's expiry instant.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    expire_at_ms: Option<u64>,
    label: Option<String>,
    notified: bool,
}

impl Countdown {
    /// Create a countdown with no expiry set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the expiry instant (Unix milliseconds, UTC).
    ///
    /// A changed instant re-arms the expired notification; re-applying the
    /// current instant is a no-op.
    pub fn set_expiry(&mut self, expire_at_ms: Option<u64>) {
        if self.expire_at_ms != expire_at_ms {
            self.expire_at_ms = expire_at_ms;
            self.label = None;
            self.notified = false;
        }
    }

    /// Recompute the countdown against the current wall-clock time.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let Some(expire_at_ms) = self.expire_at_ms else {
            return TickOutcome::Idle;
        };

        if now_ms >= expire_at_ms {
            self.label = Some(EXPIRED_LABEL.to_owned());
            if self.notified {
                return TickOutcome::Idle;
            }
            self.notified = true;
            return TickOutcome::Expired;
        }

        let next = format_remaining(expire_at_ms - now_ms);
        if self.label.as_deref() == Some(next.as_str()) {
            return TickOutcome::Idle;
        }
        self.label = Some(next);
        TickOutcome::Updated
    }

    /// Currently rendered label. `None` before the first tick or when no
    /// expiry is set.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// True once the expiry instant has been reached.
    pub fn is_expired(&self) -> bool {
        self.notified
    }
}

/// Render a remaining duration at the coarsest non-zero unit.
///
/// Hours and minutes when at least an hour remains, minutes and seconds when
/// at least a minute remains, seconds otherwise. This is a display contract,
/// not a precision contract.
pub fn format_remaining(remaining_ms: u64) -> String {
    let hours = remaining_ms / 3_600_000;
    let minutes = (remaining_ms % 3_600_000) / 60_000;
    let seconds = (remaining_ms % 60_000) / 1_000;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRE: u64 = 10_000_000_000;

    #[test]
    fn renders_minutes_and_seconds_under_an_hour() {
        let mut countdown = Countdown::new();
        countdown.set_expiry(Some(EXPIRE));

        assert_eq!(countdown.tick(EXPIRE - 90_000), TickOutcome::Updated);
        assert_eq!(countdown.label(), Some("1m 30s"));
    }

    #[test]
    fn renders_hours_and_minutes_above_an_hour() {
        let mut countdown = Countdown::new();
        countdown.set_expiry(Some(EXPIRE));

        countdown.tick(EXPIRE - 3_700_000);
        assert_eq!(countdown.label(), Some("1h 1m"));
    }

    #[test]
    fn renders_seconds_only_under_a_minute() {
        let mut countdown = Countdown::new();
        countdown.set_expiry(Some(EXPIRE));

        countdown.tick(EXPIRE - 45_000);
        assert_eq!(countdown.label(), Some("45s"));
    }

    #[test]
    fn expiry_notifies_exactly_once() {
        let mut countdown = Countdown::new();
        countdown.set_expiry(Some(EXPIRE));

        assert_eq!(countdown.tick(EXPIRE), TickOutcome::Expired);
        assert_eq!(countdown.label(), Some(EXPIRED_LABEL));
        assert_eq!(countdown.tick(EXPIRE + 1_000), TickOutcome::Idle);
        assert_eq!(countdown.tick(EXPIRE + 2_000), TickOutcome::Idle);
        assert!(countdown.is_expired());
    }

    #[test]
    fn unchanged_label_is_idle() {
        let mut countdown = Countdown::new();
        countdown.set_expiry(Some(EXPIRE));

        assert_eq!(countdown.tick(EXPIRE - 90_500), TickOutcome::Updated);
        // Within the same display second.
        assert_eq!(countdown.tick(EXPIRE - 90_200), TickOutcome::Idle);
    }

    #[test]
    fn no_expiry_means_no_label() {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.tick(123), TickOutcome::Idle);
        assert_eq!(countdown.label(), None);
    }

    #[test]
    fn changed_expiry_rearms_notification() {
        let mut countdown = Countdown::new();
        countdown.set_expiry(Some(EXPIRE));
        assert_eq!(countdown.tick(EXPIRE), TickOutcome::Expired);

        countdown.set_expiry(Some(EXPIRE + 60_000));
        assert!(!countdown.is_expired());
        assert_eq!(countdown.tick(EXPIRE + 60_000), TickOutcome::Expired);
    }

    #[test]
    fn reapplying_same_expiry_keeps_the_latch() {
        let mut countdown = Countdown::new();
        countdown.set_expiry(Some(EXPIRE));
        assert_eq!(countdown.tick(EXPIRE), TickOutcome::Expired);

        countdown.set_expiry(Some(EXPIRE));
        assert_eq!(countdown.tick(EXPIRE + 1_000), TickOutcome::Idle);
    }
}
