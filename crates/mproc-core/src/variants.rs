//! Cartesian expansion of a command template over its modifier ranges.

use std::iter::FusedIterator;

use mproc_model::{CommandTemplate, MAX_SLOTS, ModelError, ModifierRange, Variant};

/// A template plus the ranges feeding its placeholders.
///
/// The variant count is known up front; the variants themselves are produced
/// lazily, in lexicographic order with the first range outermost.
#[derive(Debug, Clone)]
pub struct VariantSet {
    template: CommandTemplate,
    ranges: Vec<ModifierRange>,
    total: usize,
}

impl VariantSet {
    pub fn new(template: CommandTemplate, ranges: Vec<ModifierRange>) -> Result<Self, ModelError> {
        if ranges.len() > MAX_SLOTS {
            return Err(ModelError::TooManyRanges {
                given: ranges.len(),
                max: MAX_SLOTS,
            });
        }
        let total = ranges
            .iter()
            .try_fold(1usize, |acc, r| acc.checked_mul(r.len()))
            .ok_or(ModelError::TooManyVariants)?;
        Ok(Self {
            template,
            ranges,
            total,
        })
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    pub fn ranges(&self) -> &[ModifierRange] {
        &self.ranges
    }

    /// Product of the range lengths; 1 when there are no ranges.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Fresh pass over every variant. Restartable.
    pub fn iter(&self) -> Variants<'_> {
        Variants {
            set: self,
            next: 0,
        }
    }

    /// Value tuple of the `idx`-th variant (last range varies fastest).
    fn values_at(&self, mut idx: usize) -> Vec<i64> {
        let mut values = vec![0; self.ranges.len()];
        for (slot, range) in self.ranges.iter().enumerate().rev() {
            let len = range.len();
            values[slot] = range.get(idx % len).unwrap_or_default();
            idx /= len;
        }
        values
    }
}

impl<'a> IntoIterator for &'a VariantSet {
    type Item = Variant;
    type IntoIter = Variants<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [`VariantSet`].
#[derive(Debug, Clone)]
pub struct Variants<'a> {
    set: &'a VariantSet,
    next: usize,
}

impl Iterator for Variants<'_> {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        if self.next >= self.set.total {
            return None;
        }
        let values = self.set.values_at(self.next);
        self.next += 1;
        let command = self.set.template.substitute(&values);
        Some(Variant::new(command, values))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.set.total - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Variants<'_> {}
impl FusedIterator for Variants<'_> {}
