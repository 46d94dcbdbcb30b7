//! Splitting a direct-mode command into pipeline stages.
//!
//! A stage boundary is a `|` outside quotes and not preceded by a backslash.
//! Each stage is then tokenized with POSIX shell-word rules (quotes and
//! backslash escapes respected, no globbing, variable expansion or comments:
//! `#` is an ordinary character).

use std::borrow::Cow;

use crate::error::ExecError;

/// Split `command` into argv vectors, one per stage.
pub fn split_stages(command: &str) -> Result<Vec<Vec<String>>, ExecError> {
    raw_stages(command)
        .into_iter()
        .enumerate()
        .map(|(stage, text)| {
            let argv = shlex::split(&escape_comments(text)).ok_or_else(|| {
                ExecError::UnbalancedQuotes {
                    stage,
                    text: text.trim().to_string(),
                }
            })?;
            if argv.is_empty() {
                return Err(ExecError::EmptyStage { stage });
            }
            Ok(argv)
        })
        .collect()
}

/// Escape every unquoted `#` that starts a word, so the tokenizer keeps it.
fn escape_comments(text: &str) -> Cow<'_, str> {
    if !text.contains('#') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    let mut single = false;
    let mut double = false;
    let mut escaped = false;
    let mut word_start = true;

    for c in text.chars() {
        if escaped {
            escaped = false;
            word_start = false;
            out.push(c);
            continue;
        }
        match c {
            '\\' if !single => escaped = true,
            '\'' if !double => single = !single,
            '"' if !single => double = !double,
            '#' if !single && !double && word_start => out.push('\\'),
            _ => {}
        }
        out.push(c);
        word_start = !single && !double && c.is_whitespace();
    }
    Cow::Owned(out)
}

fn raw_stages(command: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut single = false;
    let mut double = false;
    let mut escaped = false;

    for (i, c) in command.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !single => escaped = true,
            '\'' if !double => single = !single,
            '"' if !single => double = !double,
            '|' if !single && !double => {
                out.push(&command[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&command[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_stage() {
        let s = split_stages("echo hello world").unwrap();
        assert_eq!(s, vec![argv(&["echo", "hello", "world"])]);
    }

    #[test]
    fn three_stages() {
        let s = split_stages(r"printf 'b\na\nc\n' | sort | head -n 2").unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s[0], argv(&["printf", r"b\na\nc\n"]));
        assert_eq!(s[1], argv(&["sort"]));
        assert_eq!(s[2], argv(&["head", "-n", "2"]));
    }

    #[test]
    fn quoted_pipe_is_not_a_boundary() {
        let s = split_stages(r#"echo "a|b" 'c|d' | cat"#).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0], argv(&["echo", "a|b", "c|d"]));
    }

    #[test]
    fn escaped_pipe_is_not_a_boundary() {
        let s = split_stages(r"echo a\|b").unwrap();
        assert_eq!(s, vec![argv(&["echo", "a|b"])]);
    }

    #[test]
    fn hash_words_are_arguments_not_comments() {
        let s = split_stages("echo issue #3 done").unwrap();
        assert_eq!(s, vec![argv(&["echo", "issue", "#3", "done"])]);

        let s = split_stages("echo a#b '#q' \"#d\" | grep -c #3").unwrap();
        assert_eq!(s[0], argv(&["echo", "a#b", "#q", "#d"]));
        assert_eq!(s[1], argv(&["grep", "-c", "#3"]));
    }

    #[test]
    fn many_stages() {
        let s = split_stages("cat | cat | cat | cat | cat | wc -l").unwrap();
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn unbalanced_quotes_rejected() {
        let err = split_stages(r#"echo "oops | cat"#).unwrap_err();
        assert!(matches!(err, ExecError::UnbalancedQuotes { stage: 0, .. }));
        assert!(err.is_syntax());
    }

    #[test]
    fn empty_stage_rejected() {
        assert!(matches!(
            split_stages("echo a || cat"),
            Err(ExecError::EmptyStage { stage: 1 })
        ));
        assert!(matches!(
            split_stages("echo a |"),
            Err(ExecError::EmptyStage { stage: 1 })
        ));
        assert!(matches!(
            split_stages("   "),
            Err(ExecError::EmptyStage { stage: 0 })
        ));
    }
}
