/*!
Subject enum for the `list` / `get` subcommands.

Variants:
  services / messages / modules (plural, for `list`)
  service  / message            (singular, for `get`)

Helpers:
  - variants()
  - from_str_ci()
  - is_singular()
  - plural()
*/

use std::fmt;

/// What part of the loaded manifest a command looks at.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Subject {
    /// All Msg services
    Services,
    /// A single Msg service with its methods
    Service,
    /// All message schemas
    Messages,
    /// A single message schema with its fields
    Message,
    /// Modules that contribute tx commands
    Modules,
}

impl Subject {
    pub const fn variants() -> &'static [Subject] {
        &[
            Subject::Services,
            Subject::Service,
            Subject::Messages,
            Subject::Message,
            Subject::Modules,
        ]
    }

    /// Case-insensitive parser not relying on `clap`.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "services" => Some(Subject::Services),
            "service" => Some(Subject::Service),
            "messages" => Some(Subject::Messages),
            "message" | "msg" => Some(Subject::Message),
            "modules" | "module" => Some(Subject::Modules),
            _ => None,
        }
    }

    /// Singular subjects take a NAME.
    pub fn is_singular(&self) -> bool {
        matches!(self, Subject::Service | Subject::Message)
    }

    /// The listing form of a subject (`service` -> `services`).
    pub fn plural(&self) -> Subject {
        match self {
            Subject::Service => Subject::Services,
            Subject::Message => Subject::Messages,
            other => *other,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Subject::Services => "services",
            Subject::Service => "service",
            Subject::Messages => "messages",
            Subject::Message => "message",
            Subject::Modules => "modules",
        };
        f.write_str(s)
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::Subject;

    #[test]
    fn parse_case_insensitive() {
        assert_eq!(Subject::from_str_ci("SERVICES"), Some(Subject::Services));
        assert_eq!(Subject::from_str_ci(" service "), Some(Subject::Service));
        assert_eq!(Subject::from_str_ci("msg"), Some(Subject::Message));
        assert_eq!(Subject::from_str_ci("module"), Some(Subject::Modules));
        assert_eq!(Subject::from_str_ci("tools"), None);
    }

    #[test]
    fn singular_and_plural() {
        assert!(Subject::Service.is_singular());
        assert!(!Subject::Modules.is_singular());
        assert_eq!(Subject::Message.plural(), Subject::Messages);
        assert_eq!(Subject::Modules.plural(), Subject::Modules);
    }

    #[test]
    fn display_round_trips_through_parser() {
        for s in Subject::variants() {
            assert_eq!(Subject::from_str_ci(&s.to_string()), Some(*s));
        }
    }
}
