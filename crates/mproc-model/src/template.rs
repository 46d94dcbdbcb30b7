use std::fmt;

/// Number of positional placeholder slots (`%0` … `%9`).
pub const MAX_SLOTS: usize = 10;

/// Raw command string with zero or more `%0`…`%9` placeholders.
///
/// A placeholder token is exactly `%` followed by one digit, so `%10` reads as
/// slot `1` followed by a literal `0`. Substitution scans the template once and
/// never rescans inserted text, which keeps slots from aliasing each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    raw: String,
}

impl CommandTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Distinct slots referenced by the template, ascending.
    pub fn slots(&self) -> Vec<usize> {
        let mut seen = [false; MAX_SLOTS];
        let mut chars = self.raw.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '%'
                && let Some(d) = chars.peek().and_then(|n| n.to_digit(10))
            {
                seen[d as usize] = true;
                chars.next();
            }
        }
        (0..MAX_SLOTS).filter(|i| seen[*i]).collect()
    }

    /// Replace `%i` with `values[i]` for every `i < values.len()`.
    ///
    /// Tokens for slots without a value are left untouched.
    pub fn substitute(&self, values: &[i64]) -> String {
        let mut out = String::with_capacity(self.raw.len() + values.len() * 4);
        let mut chars = self.raw.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek().and_then(|n| n.to_digit(10)) {
                Some(d) if (d as usize) < values.len() => {
                    chars.next();
                    out.push_str(&values[d as usize].to_string());
                }
                _ => out.push(c),
            }
        }
        out
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for CommandTemplate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
