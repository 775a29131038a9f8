/// A module request found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// `import`, `export ... from` and `require()`
    Static,
    /// `import()`
    Dynamic,
}

impl Specifier {
    pub(crate) fn new(request: impl Into<String>, kind: SpecKind) -> Self {
        Self { request: request.into(), kind }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == SpecKind::Dynamic
    }
}
