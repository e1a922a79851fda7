//! Configuration of an extraction run.

use crate::extract::stubs::{StubPolicy, StubTarget};

/// Default input cursor type of read entry points
pub const DEFAULT_READER_TYPE: &str = "System.IO.BinaryReader";
/// Default output cursor type of write entry points
pub const DEFAULT_WRITER_TYPE: &str = "System.IO.BinaryWriter";

/// Options controlling how a closure is extracted.
///
/// # Examples
///
/// ```rust
/// use dotslice::extract::{ExtractOptions, StubPolicy};
///
/// let options = ExtractOptions::default()
///     .with_stub_policy(StubPolicy::AllowList(vec!["Vendor.Trace::Emit".into()]))
///     .with_module_name("Save-schema");
/// assert!(!options.strict_types);
/// assert!(ExtractOptions::strict().strict_types);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Which unresolvable calls may be replaced by the stub target
    pub stub_policy: StubPolicy,
    /// The method replacing stubbed calls
    pub stub_target: StubTarget,
    /// Full name of the input cursor type a read entry takes first
    pub reader_type: String,
    /// Full name of the output cursor type a write entry takes first
    pub writer_type: String,
    /// Fail instead of falling back to `System.Object` for unresolvable external types
    pub strict_types: bool,
    /// Name of the produced module, `<EntryType>-schema` if unset
    pub module_name: Option<String>,
    /// Name of the generating tool, removed from the dependency table
    pub tool_name: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            stub_policy: StubPolicy::default(),
            stub_target: StubTarget::default(),
            reader_type: DEFAULT_READER_TYPE.to_string(),
            writer_type: DEFAULT_WRITER_TYPE.to_string(),
            strict_types: false,
            module_name: None,
            tool_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl ExtractOptions {
    /// No stubs, no type fallback: every unresolvable reference is an error
    #[must_use]
    pub fn strict() -> Self {
        ExtractOptions {
            stub_policy: StubPolicy::Disabled,
            strict_types: true,
            ..Self::default()
        }
    }

    /// Sets the stub policy
    #[must_use]
    pub fn with_stub_policy(mut self, policy: StubPolicy) -> Self {
        self.stub_policy = policy;
        self
    }

    /// Sets the stub target
    #[must_use]
    pub fn with_stub_target(mut self, target: StubTarget) -> Self {
        self.stub_target = target;
        self
    }

    /// Sets the cursor types required of read and write entries
    #[must_use]
    pub fn with_cursor_types(mut self, reader: &str, writer: &str) -> Self {
        self.reader_type = reader.to_string();
        self.writer_type = writer.to_string();
        self
    }

    /// Enables or disables strict type resolution
    #[must_use]
    pub fn with_strict_types(mut self, strict: bool) -> Self {
        self.strict_types = strict;
        self
    }

    /// Sets the name of the produced module
    #[must_use]
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    /// Sets the generating tool name
    #[must_use]
    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.stub_policy, StubPolicy::Heuristic);
        assert_eq!(options.stub_target.method, "WriteLine");
        assert_eq!(options.reader_type, "System.IO.BinaryReader");
        assert_eq!(options.tool_name, "dotslice");
        assert!(options.module_name.is_none());
    }

    #[test]
    fn test_strict_preset() {
        let options = ExtractOptions::strict().with_tool_name("gen");
        assert_eq!(options.stub_policy, StubPolicy::Disabled);
        assert!(options.strict_types);
        assert_eq!(options.tool_name, "gen");
    }
}
