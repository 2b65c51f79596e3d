// Tracing subscriber setup for the binary.

use tracing::Level;

/// Install the global fmt subscriber at the given level.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing(level: &str) -> Level {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(init_tracing("nonsense"), Level::INFO);
        assert_eq!(init_tracing("debug"), Level::DEBUG);
    }
}
