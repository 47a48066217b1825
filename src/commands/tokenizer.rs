//! Prefix detection and message tokenization

/// A message split into a command name and its argument tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStruct {
    /// Lower-cased command name, empty when the message held only the prefix
    pub command_name: String,
    pub args: Vec<String>,
    /// The prefix was typed twice
    pub double_invocation: bool,
}

/// Whether `content` starts with the command prefix
pub fn is_command_invocation(content: &str, prefix: &str) -> bool {
    content.trim_start().starts_with(prefix)
}

/// Strip the prefix (once, or twice for a double invocation) and split on whitespace
pub fn clean_command_message(content: &str, prefix: &str) -> CommandStruct {
    let trimmed = content.trim();
    let after_first = trimmed.strip_prefix(prefix).unwrap_or(trimmed);

    let (body, double_invocation) = match after_first.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() => (rest, true),
        _ => (after_first, false),
    };

    let mut parts = body.split_whitespace();
    let command_name = parts.next().unwrap_or_default().to_lowercase();
    let args = parts.map(String::from).collect();

    CommandStruct {
        command_name,
        args,
        double_invocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_prefix() {
        let parsed = clean_command_message("+Echo hello   world", "+");
        assert_eq!(parsed.command_name, "echo");
        assert_eq!(parsed.args, vec!["hello", "world"]);
        assert!(!parsed.double_invocation);
    }

    #[test]
    fn test_double_prefix() {
        let parsed = clean_command_message("++ping", "+");
        assert_eq!(parsed.command_name, "ping");
        assert!(parsed.double_invocation);
    }

    #[test]
    fn test_multi_character_prefix() {
        let parsed = clean_command_message("!!!!help ping", "!!");
        assert_eq!(parsed.command_name, "help");
        assert_eq!(parsed.args, vec!["ping"]);
        assert!(parsed.double_invocation);
    }

    #[test]
    fn test_prefix_only_has_empty_name() {
        assert_eq!(clean_command_message("+", "+").command_name, "");
        assert_eq!(clean_command_message("++   ", "+").command_name, "");
    }

    #[test]
    fn test_is_command_invocation() {
        assert!(is_command_invocation("+ping", "+"));
        assert!(is_command_invocation("  +ping", "+"));
        assert!(!is_command_invocation("ping", "+"));
    }
}
