//! Export options.

/// Switches shared by both export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Leave binary values out.
    pub skip_binary: bool,
    /// Write only the start node, without descendants.
    pub no_recurse: bool,
}

impl ExportOptions {
    pub fn new(skip_binary: bool, no_recurse: bool) -> Self {
        Self {
            skip_binary,
            no_recurse,
        }
    }
}
