//! Wall-clock timestamp sources.
//!
//! Journal lines carry a human-readable timestamp prefix. The source of
//! those timestamps is injected so supervision tests can pin them.

/// Source of journal timestamps.
pub trait Timestamps: Send {
    /// Current wall-clock time, formatted for journal lines.
    fn now(&self) -> String;
}

/// Production timestamp source backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimestamps;

impl Timestamps for SystemTimestamps {
    fn now(&self) -> String {
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Fixed timestamp source for deterministic test output.
#[derive(Debug, Clone)]
pub struct FixedTimestamps(pub String);

impl Timestamps for FixedTimestamps {
    fn now(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_timestamps_look_like_dates() {
        let stamp = SystemTimestamps.now();
        // "2026-08-07 12:00:00"
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
    }

    #[test]
    fn fixed_timestamps_repeat() {
        let stamps = FixedTimestamps("T0".to_string());
        assert_eq!(stamps.now(), "T0");
        assert_eq!(stamps.now(), "T0");
    }
}
