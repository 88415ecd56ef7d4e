//! Verification subject
//!
//! An annotated class located under a source root. A subject can only be
//! constructed when the class is well-formed: the qualified name is a valid
//! dotted identifier path and its source file exists under the root.

use std::path::{Path, PathBuf};

use crate::error::{Result, VerifyError};

/// File extension of annotated sources
pub const SOURCE_EXTENSION: &str = "java";

/// An annotated class to verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedClass {
    source_root: PathBuf,
    class_name: String,
}

impl AnnotatedClass {
    /// Create a subject, rejecting it unless it is well-formed
    pub fn new(source_root: impl Into<PathBuf>, class_name: impl Into<String>) -> Result<Self> {
        let subject = Self {
            source_root: source_root.into(),
            class_name: class_name.into(),
        };
        subject.check()?;
        tracing::debug!(class = %subject.class_name, root = %subject.source_root.display(), "subject accepted");
        Ok(subject)
    }

    /// Fully-qualified class name, e.g. `main.util.Pair`
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Class name with packages as path segments, e.g. `main/util/Pair`
    pub fn class_name_as_path(&self) -> String {
        self.class_name.replace('.', "/")
    }

    /// Source root as given on construction
    pub fn source_folder(&self) -> String {
        self.source_root.display().to_string()
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Location of the class source file under the root
    pub fn source_file(&self) -> PathBuf {
        let mut path = self.source_root.clone();
        for segment in self.class_name.split('.') {
            path.push(segment);
        }
        path.set_extension(SOURCE_EXTENSION);
        path
    }

    /// Whether the subject is still well-formed
    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }

    fn check(&self) -> Result<()> {
        if !is_qualified_name(&self.class_name) {
            return Err(VerifyError::invalid_subject(format!(
                "'{}' is not a qualified class name",
                self.class_name
            )));
        }
        if !self.source_root.is_dir() {
            return Err(VerifyError::invalid_subject(format!(
                "source root '{}' is not a directory",
                self.source_root.display()
            )));
        }
        let file = self.source_file();
        if !file.is_file() {
            return Err(VerifyError::invalid_subject(format!(
                "class '{}' not found at '{}'",
                self.class_name,
                file.display()
            )));
        }
        Ok(())
    }
}

/// Check a single identifier: letter, `_` or `$` first, then alphanumerics, `_` or `$`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Check a dotted identifier path such as `a.b.C`
pub fn is_qualified_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_identifier)
}
