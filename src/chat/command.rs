//! Bot command parsing for finchat.
//!
//! A command token has the shape `/<name>` or `/<name>=<value>`. Only
//! commands listed in [`AVAILABLE_COMMANDS`] are forwarded to the worker.

/// Commands the worker knows how to answer.
pub const AVAILABLE_COMMANDS: &[&str] = &["/stock"];

/// Check whether `content` names an allowed command.
///
/// Matching is case-sensitive and requires either the bare command or the
/// command immediately followed by `=`.
pub fn is_allowed_command(content: &str) -> bool {
    AVAILABLE_COMMANDS.iter().any(|cmd| {
        content == *cmd
            || content
                .strip_prefix(cmd)
                .is_some_and(|rest| rest.starts_with('='))
    })
}

/// A parsed command token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    value: String,
}

impl Command {
    /// Split a command token on its first `=`.
    pub fn parse(content: &str) -> Self {
        match content.split_once('=') {
            Some((name, value)) => Self {
                name: name.to_string(),
                value: value.to_string(),
            },
            None => Self {
                name: content.to_string(),
                value: String::new(),
            },
        }
    }

    /// Command name including the leading slash.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Everything after the first `=`, verbatim.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_allowed_command() {
        assert!(is_allowed_command("/stock=AAPL"));
        assert!(is_allowed_command("/stock"));
        assert!(is_allowed_command("/stock="));
        assert!(!is_allowed_command("/unknown=AAPL"));
    }

    #[test]
    fn test_is_allowed_command_requires_separator() {
        assert!(!is_allowed_command("/stocks"));
        assert!(!is_allowed_command("/stockAAPL"));
        assert!(!is_allowed_command(" /stock"));
        assert!(!is_allowed_command(""));
    }

    #[test]
    fn test_is_allowed_command_case_sensitive() {
        assert!(!is_allowed_command("/STOCK=AAPL"));
    }

    #[test]
    fn test_command_value() {
        assert_eq!(Command::parse("/stock=AAPL").value(), "AAPL");
        assert_eq!(Command::parse("/stock=AAPL=test").value(), "AAPL=test");
        assert_eq!(Command::parse("/stock").value(), "");
        assert_eq!(Command::parse("/stock=").value(), "");
        assert_eq!(Command::parse("").value(), "");
    }

    #[test]
    fn test_command_name() {
        assert_eq!(Command::parse("/stock=AAPL").name(), "/stock");
        assert_eq!(Command::parse("/stock").name(), "/stock");
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::parse("/stock=AAPL").to_string(), "/stock=AAPL");
        assert_eq!(Command::parse("/stock").to_string(), "/stock");
    }
}
