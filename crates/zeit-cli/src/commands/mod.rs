//! Command implementations.
//!
//! Each command is a `run`-style function taking a writer plus its
//! collaborators, so tests can drive it against an in-memory database and a
//! fixed clock.

pub mod annotate;
pub mod edit;
pub mod import_git;
pub mod status;
pub mod track;
pub mod verify;

use zeit_core::SpecialEvent;

/// Applies the naming convention: reserved names stay uppercase, everything
/// the user types becomes a lowercase project name.
pub(crate) fn normalize_name(raw: &str) -> String {
    if SpecialEvent::from_name(raw).is_some() {
        raw.to_string()
    } else {
        raw.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_names_are_lowercased() {
        assert_eq!(normalize_name("Writing"), "writing");
        assert_eq!(normalize_name("API-Review"), "api-review");
    }

    #[test]
    fn reserved_names_pass_through() {
        assert_eq!(normalize_name("STOP"), "STOP");
        assert_eq!(normalize_name("LUNCH"), "LUNCH");
        assert_eq!(normalize_name("DEFAULT"), "DEFAULT");
    }
}
