/// Fastest allowed editor liveness check
pub const MIN_LIVENESS_INTERVAL_MS: u64 = 100;

/// Slowest allowed editor liveness check (1 minute)
pub const MAX_LIVENESS_INTERVAL_MS: u64 = 60_000;

/// Upper bound for any single wait in the apply pipeline (1 minute)
pub const MAX_PIPELINE_WAIT_MS: u64 = 60_000;

/// More attempts than this only hides a lock file that keeps coming back
pub const MAX_LOCK_ATTEMPTS: u32 = 20;
