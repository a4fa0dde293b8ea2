//! Parsed selection tree.

use std::fmt;

/// A comma separated list of selected fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub fields: Vec<FieldSelection>,
}

/// One selected field, optionally with a nested `{...}` selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub name: String,
    /// `None` for a bare field, `Some` when braces follow the name (even `{}`).
    pub children: Option<Selection>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.children {
            Some(children) => write!(f, "{}{{{}}}", self.name, children),
            None => write!(f, "{}", self.name),
        }
    }
}
