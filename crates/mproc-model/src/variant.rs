/// Output file name used when a run has no modifier ranges.
pub const DEFAULT_OUTPUT_NAME: &str = "mp.out";

/// One concrete command produced from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Command string with all placeholders substituted.
    pub command: String,
    /// File name (not path) receiving the command's combined output.
    ///
    /// Unique within a run: derived from `values`, or [`DEFAULT_OUTPUT_NAME`].
    pub output_name: String,
    /// Substituted values, one per modifier range, in slot order.
    pub values: Vec<i64>,
}

impl Variant {
    /// Build a variant and derive its output name from `values`.
    pub fn new(command: impl Into<String>, values: Vec<i64>) -> Self {
        let output_name = output_name_for(&values);
        Self {
            command: command.into(),
            output_name,
            values,
        }
    }
}

/// `mp_<v0>_<v1>….out`, or [`DEFAULT_OUTPUT_NAME`] for an empty tuple.
pub fn output_name_for(values: &[i64]) -> String {
    if values.is_empty() {
        return DEFAULT_OUTPUT_NAME.to_string();
    }
    let suffix: String = values.iter().map(|v| format!("_{v}")).collect();
    format!("mp{suffix}.out")
}
