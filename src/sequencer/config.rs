//! Sequencer configuration

/// Default minimum age before a pending entry may be sequenced
pub const DEFAULT_GUARD_WINDOW_MS: u64 = 60_000;

/// Sequencer configuration
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Pending entries younger than this are left for a later round (milliseconds)
    pub guard_window_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            guard_window_ms: DEFAULT_GUARD_WINDOW_MS,
        }
    }
}

impl SequencerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            guard_window_ms: std::env::var("CT_GUARD_WINDOW_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_GUARD_WINDOW_MS),
        }
    }

    /// Config with an explicit guard window
    pub fn with_guard_window_ms(guard_window_ms: u64) -> Self {
        Self { guard_window_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_values() {
        let config = SequencerConfig::default();
        assert_eq!(config.guard_window_ms, 60_000);
    }

    #[test]
    #[serial]
    fn test_from_env_uses_defaults_when_no_env_vars() {
        std::env::remove_var("CT_GUARD_WINDOW_MS");
        let config = SequencerConfig::from_env();
        assert_eq!(config.guard_window_ms, DEFAULT_GUARD_WINDOW_MS);
    }

    #[test]
    #[serial]
    fn test_from_env_respects_guard_window() {
        std::env::set_var("CT_GUARD_WINDOW_MS", "2500");
        let config = SequencerConfig::from_env();
        assert_eq!(config.guard_window_ms, 2500);
        std::env::remove_var("CT_GUARD_WINDOW_MS");
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_number_uses_default() {
        std::env::set_var("CT_GUARD_WINDOW_MS", "soon");
        let config = SequencerConfig::from_env();
        assert_eq!(config.guard_window_ms, DEFAULT_GUARD_WINDOW_MS);
        std::env::remove_var("CT_GUARD_WINDOW_MS");
    }

    #[test]
    fn test_with_guard_window() {
        assert_eq!(SequencerConfig::with_guard_window_ms(0).guard_window_ms, 0);
    }
}
