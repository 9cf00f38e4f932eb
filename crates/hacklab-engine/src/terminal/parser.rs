//! Line parsing for the terminal.

/// A submitted line split into a verb and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// The trimmed line as typed.
    pub raw: String,
    /// First token, lowercased.
    pub verb: String,
    /// Remaining whitespace-separated tokens, as typed.
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Argument `index`, lowercased.
    pub fn arg_lower(&self, index: usize) -> Option<String> {
        self.args.get(index).map(|a| a.to_lowercase())
    }

    /// The raw text after the verb and the first `skip` arguments, with
    /// inner spacing preserved.
    pub fn remainder(&self, skip: usize) -> &str {
        let mut rest = self.raw.as_str();
        for _ in 0..=skip {
            rest = match rest.find(char::is_whitespace) {
                Some(i) => rest[i..].trim_start(),
                None => "",
            };
        }
        rest
    }
}

/// Parse a submitted line. Blank input yields `None`.
pub fn parse(line: &str) -> Option<ParsedCommand> {
    let raw = line.trim();
    let mut tokens = raw.split_whitespace();
    let verb = tokens.next()?.to_lowercase();
    Some(ParsedCommand {
        raw: raw.to_string(),
        verb,
        args: tokens.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_ignored() {
        assert!(parse("").is_none());
        assert!(parse("   \t ").is_none());
    }

    #[test]
    fn test_verb_is_lowercased_args_are_not() {
        let cmd = parse("  CAT Secret.TXT  ").expect("command");
        assert_eq!(cmd.raw, "CAT Secret.TXT");
        assert_eq!(cmd.verb, "cat");
        assert_eq!(cmd.args, vec!["Secret.TXT"]);
        assert_eq!(cmd.arg_lower(0).as_deref(), Some("secret.txt"));
        assert!(cmd.arg_lower(1).is_none());
    }

    #[test]
    fn test_remainder_keeps_inner_spacing() {
        let cmd = parse("submit console hello  from the   other side").expect("command");
        assert_eq!(cmd.remainder(0), "console hello  from the   other side");
        assert_eq!(cmd.remainder(1), "hello  from the   other side");
        assert_eq!(cmd.remainder(9), "");
    }
}
