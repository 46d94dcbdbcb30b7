use std::{fmt, str::FromStr};

use crate::ModelError;

/// Ordered, inclusive arithmetic sequence of integers bound to one placeholder slot.
///
/// Parsed from the compact range syntax:
/// - `n` → `1..=n`
/// - `a:b` → `a..=b`
/// - `a:b:step` → `a, a+step, …` up to and including `b` (step may be negative)
///
/// A range whose bounds run against its step is valid and simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierRange {
    start: i64,
    end: i64,
    step: i64,
}

impl ModifierRange {
    /// Build a range directly. Fails when `step` is zero.
    pub fn new(start: i64, end: i64, step: i64) -> Result<Self, ModelError> {
        if step == 0 {
            return Err(ModelError::InvalidRange {
                spec: format!("{start}:{end}:{step}"),
                reason: "step must not be zero".into(),
            });
        }
        Ok(Self { start, end, step })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Number of values in the range.
    pub fn len(&self) -> usize {
        let (start, end, step) = (self.start as i128, self.end as i128, self.step as i128);
        let span = if step > 0 { end - start } else { start - end };
        if span < 0 {
            return 0;
        }
        let n = span / step.abs() + 1;
        usize::try_from(n).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at position `idx`, or `None` past the end.
    pub fn get(&self, idx: usize) -> Option<i64> {
        if idx >= self.len() {
            return None;
        }
        let v = self.start as i128 + idx as i128 * self.step as i128;
        i64::try_from(v).ok()
    }

    /// Iterate the values in order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

impl FromStr for ModifierRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ModelError::InvalidRange {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let parts = s
            .trim()
            .split(':')
            .map(|p| p.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(&e.to_string()))?;

        match parts.as_slice() {
            [n] => Ok(Self {
                start: 1,
                end: *n,
                step: 1,
            }),
            [a, b] => Ok(Self {
                start: *a,
                end: *b,
                step: 1,
            }),
            [a, b, step] => {
                Self::new(*a, *b, *step).map_err(|_| invalid("step must not be zero"))
            }
            _ => Err(invalid("expected n, a:b or a:b:step")),
        }
    }
}

impl fmt::Display for ModifierRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.end, self.step)
    }
}
