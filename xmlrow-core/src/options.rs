//! Session configuration for import and export.

/// How `<tag/>` is treated by the boundary scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfClosingPolicy {
    /// Immediate open+close, zero net depth.
    #[default]
    Accept,
    /// Fail with [`ScanErrorCode::SelfClosingTag`](crate::ScanErrorCode::SelfClosingTag).
    Reject,
}

/// Options for an import session.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub self_closing: SelfClosingPolicy,
}

impl ImportOptions {
    pub fn with_self_closing(mut self, policy: SelfClosingPolicy) -> Self {
        self.self_closing = policy;
        self
    }
}

/// Options for an export session.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Tag of the element written for each row.
    pub root_tag: String,
    /// Body of the `<?xml ...?>` prolog written before each row, if any.
    pub declaration: Option<String>,
}

impl ExportOptions {
    pub fn with_root_tag(mut self, tag: impl Into<String>) -> Self {
        self.root_tag = tag.into();
        self
    }

    pub fn with_declaration(mut self, declaration: Option<String>) -> Self {
        self.declaration = declaration;
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            root_tag: "row".to_string(),
            declaration: Some("version=\"1.0\"".to_string()),
        }
    }
}
