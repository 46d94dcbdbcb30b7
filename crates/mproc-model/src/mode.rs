use std::{fmt, str::FromStr};

/// How a variant's command string is turned into processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Split on unescaped `|`, tokenize each stage with shell-word rules and
    /// chain the stages directly. No shell is involved.
    #[default]
    Direct,
    /// Hand the whole string to `sh -c`. Trusted input only.
    Shell,
}

impl ExecMode {
    /// Short symbolic identifier, used for logging and routing.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecMode::Direct => "direct",
            ExecMode::Shell => "shell",
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

impl FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(ExecMode::Direct),
            "shell" => Ok(ExecMode::Shell),
            other => Err(format!("unknown exec mode: {other} (expected: direct|shell)")),
        }
    }
}
