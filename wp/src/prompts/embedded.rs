//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Fixed output contract for the provider
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Per-request preferences
pub const USER: &str = include_str!("../../prompts/user.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "user" => Some(USER),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_system() {
        let system = get_embedded("system").unwrap();
        assert!(system.contains("personal trainer"));
        assert!(system.contains("\"workoutPlan\""));
        assert!(system.contains("\"progressionPlan\""));
        assert!(system.contains("\"isRestDay\": true"));
        assert!(system.contains("Output JSON only."));
    }

    #[test]
    fn test_get_embedded_user() {
        let user = get_embedded("user").unwrap();
        assert!(user.contains("{{fitness_goal}}"));
        assert!(user.contains("{{available_days}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
