//! Driver timing configuration

/// Default pause between sequencing rounds
pub const DEFAULT_SEQUENCING_INTERVAL_MS: u64 = 1_000;

/// Default pause between signing rounds
pub const DEFAULT_SIGNING_INTERVAL_MS: u64 = 10_000;

/// Signer job configuration
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// How often pending entries are sequenced (milliseconds)
    pub sequencing_interval_ms: u64,

    /// How often a new tree head is signed (milliseconds)
    pub signing_interval_ms: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            sequencing_interval_ms: DEFAULT_SEQUENCING_INTERVAL_MS,
            signing_interval_ms: DEFAULT_SIGNING_INTERVAL_MS,
        }
    }
}

impl JobConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            sequencing_interval_ms: env_millis(
                "CT_SEQUENCING_INTERVAL_MS",
                DEFAULT_SEQUENCING_INTERVAL_MS,
            ),
            signing_interval_ms: env_millis("CT_SIGNING_INTERVAL_MS", DEFAULT_SIGNING_INTERVAL_MS),
        }
    }

    /// Replace zero intervals with their defaults
    ///
    /// A zero period would make the tokio interval panic.
    pub fn normalized(self) -> Self {
        Self {
            sequencing_interval_ms: nonzero_or(
                self.sequencing_interval_ms,
                DEFAULT_SEQUENCING_INTERVAL_MS,
            ),
            signing_interval_ms: nonzero_or(self.signing_interval_ms, DEFAULT_SIGNING_INTERVAL_MS),
        }
    }
}

fn nonzero_or(ms: u64, default: u64) -> u64 {
    if ms == 0 {
        default
    } else {
        ms
    }
}

/// Positive millisecond value from `var`, `default` otherwise
fn env_millis(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&ms| ms > 0)
        .unwrap_or(default)
}
