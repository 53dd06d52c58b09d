//! Log output setup for applications embedding the notebook.

use tracing_subscriber::EnvFilter;

/// Default filter when the caller passes none.
pub const DEFAULT_FILTER: &str = "jotter=info";

/// Install a global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed (the existing one
/// is kept), so calling this from several tests is harmless.
pub fn init(filter: Option<&str>) -> bool {
    let filter = EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_keeps_first() {
        let _ = init(Some("jotter=debug"));
        assert!(!init(None));
    }
}
