//! Verification request and engine configuration
//!
//! A [`VerificationRequest`] names what to verify. [`build_configuration`]
//! flattens it into the option set the bounded engine reads. The analysis
//! toggles are fixed constants and are not exposed for editing.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Result, VerifyError};
use crate::subject::{is_identifier, AnnotatedClass};

/// Suffix marking the canonical invocation site of a method
pub const INVOCATION_SUFFIX: &str = "_0";

/// Properties file the engine loads before applying the overrides
pub const BASE_PROPERTIES: &str = "genericTest.properties";

/// Separator for the dependency class list
pub const DEPENDENCY_SEPARATOR: &str = ",";

/// Default object-creation bound
pub const DEFAULT_OBJECT_SCOPE: i64 = 3;

/// Default loop-unrolling bound
pub const DEFAULT_LOOP_UNROLL: i64 = 3;

pub mod keys {
    pub const CLASS_TO_CHECK: &str = "classToCheck";
    pub const RELEVANT_CLASSES: &str = "relevantClasses";
    pub const METHOD_TO_CHECK: &str = "methodToCheck";
    pub const SOURCE_PATH: &str = "jmlParser.sourcePathStr";
    pub const TYPE_SCOPES: &str = "typeScopes";
    pub const RELEVANCY_ANALYSIS: &str = "relevancyAnalysis";
    pub const CHECK_NULL_DEREFERENCE: &str = "checkNullDereference";
    pub const USE_JAVA_ARITHMETIC: &str = "useJavaArithmetic";
    pub const CHECK_ARITHMETIC_EXCEPTION: &str = "checkArithmeticException";
    pub const INFER_SCOPE: &str = "inferScope";
    pub const OBJECT_SCOPE: &str = "objectScope";
    pub const LOOP_UNROLL: &str = "loopUnroll";
    pub const SKOLEMIZE_INSTANCE_INVARIANT: &str = "skolemizeInstanceInvariant";
    pub const SKOLEMIZE_INSTANCE_ABSTRACTION: &str = "skolemizeInstanceAbstraction";
    pub const GENERATE_UNIT_TEST_CASE: &str = "generateUnitTestCase";
    pub const ATTEMPT_TO_CORRECT_BUG: &str = "attemptToCorrectBug";
    pub const MAX_METHODS_PER_FILE: &str = "maxStrykerMethodsPerFile";
    pub const REMOVE_QUANTIFIERS: &str = "removeQuantifiers";
    pub const USE_JAVA_SBP: &str = "useJavaSBP";
    pub const USE_TIGHT_UPPER_BOUNDS: &str = "useTightUpperBounds";
}

/// Analysis toggles sent with every request
pub const FIXED_TOGGLES: &[(&str, OptionValue)] = &[
    (keys::RELEVANCY_ANALYSIS, OptionValue::Bool(true)),
    (keys::CHECK_NULL_DEREFERENCE, OptionValue::Bool(true)),
    (keys::USE_JAVA_ARITHMETIC, OptionValue::Bool(false)),
    (keys::CHECK_ARITHMETIC_EXCEPTION, OptionValue::Bool(false)),
    (keys::INFER_SCOPE, OptionValue::Bool(true)),
    (keys::OBJECT_SCOPE, OptionValue::Int(DEFAULT_OBJECT_SCOPE)),
    (keys::LOOP_UNROLL, OptionValue::Int(DEFAULT_LOOP_UNROLL)),
    (keys::SKOLEMIZE_INSTANCE_INVARIANT, OptionValue::Bool(true)),
    (keys::SKOLEMIZE_INSTANCE_ABSTRACTION, OptionValue::Bool(true)),
    (keys::GENERATE_UNIT_TEST_CASE, OptionValue::Bool(true)),
    (keys::ATTEMPT_TO_CORRECT_BUG, OptionValue::Bool(false)),
    (keys::MAX_METHODS_PER_FILE, OptionValue::Int(1)),
    (keys::REMOVE_QUANTIFIERS, OptionValue::Bool(true)),
    (keys::USE_JAVA_SBP, OptionValue::Bool(false)),
    (keys::USE_TIGHT_UPPER_BOUNDS, OptionValue::Bool(false)),
];

/// Engine identifier for a method: the source name plus the invocation suffix
pub fn method_identifier(method: &str) -> String {
    format!("{method}{INVOCATION_SUFFIX}")
}

/// What to verify: one method of one annotated class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    subject: AnnotatedClass,
    method: String,
    dependencies: Vec<String>,
    scope: Option<String>,
}

impl VerificationRequest {
    /// Create a request. The dependency list starts with the subject class.
    pub fn new(subject: AnnotatedClass, method: impl Into<String>) -> Result<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(VerifyError::invalid_method("method name is empty"));
        }
        if !is_identifier(&method) {
            return Err(VerifyError::invalid_method(format!(
                "'{method}' is not a method name"
            )));
        }
        let dependencies = vec![subject.class_name().to_string()];
        tracing::debug!(class = %subject.class_name(), method = %method, "request created");
        Ok(Self {
            subject,
            method,
            dependencies,
            scope: None,
        })
    }

    /// Append extra dependency classes after the ones already present.
    /// Order is kept and duplicates are passed through.
    pub fn with_dependencies<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Set an explicit scope, replacing scope inference
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn subject(&self) -> &AnnotatedClass {
        &self.subject
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Subject class first, then the extra classes in the order given
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn method_identifier(&self) -> String {
        method_identifier(&self.method)
    }

    /// Dependencies joined with the separator, without any normalization
    pub fn merged_dependencies(&self) -> String {
        self.dependencies.join(DEPENDENCY_SEPARATOR)
    }
}

/// A single engine option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Flat option mapping handed to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationConfiguration {
    base_properties: String,
    options: BTreeMap<String, OptionValue>,
}

impl VerificationConfiguration {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Options in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn base_properties(&self) -> &str {
        &self.base_properties
    }

    /// Render as `key=value` lines, sorted by key
    pub fn to_properties(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.options {
            out.push_str(key);
            out.push('=');
            out.push_str(&escape_property(&value.to_string()));
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Escape characters that carry meaning in a properties file
fn escape_property(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the engine configuration for a request.
///
/// Deterministic: the same request always yields the same configuration.
/// `typeScopes` is present only when the request carries a scope.
pub fn build_configuration(request: &VerificationRequest) -> VerificationConfiguration {
    let subject = request.subject();
    let mut options = BTreeMap::new();

    options.insert(
        keys::CLASS_TO_CHECK.to_string(),
        OptionValue::Str(subject.class_name_as_path()),
    );
    options.insert(
        keys::RELEVANT_CLASSES.to_string(),
        OptionValue::Str(request.merged_dependencies()),
    );
    options.insert(
        keys::METHOD_TO_CHECK.to_string(),
        OptionValue::Str(request.method_identifier()),
    );
    options.insert(
        keys::SOURCE_PATH.to_string(),
        OptionValue::Str(subject.source_folder()),
    );

    for (key, value) in FIXED_TOGGLES {
        options.insert((*key).to_string(), value.clone());
    }

    if let Some(scope) = request.scope() {
        options.insert(keys::TYPE_SCOPES.to_string(), OptionValue::Str(scope.to_string()));
    }

    tracing::debug!(
        method = %request.method_identifier(),
        dependencies = %request.merged_dependencies(),
        scoped = request.scope().is_some(),
        "configuration built"
    );

    VerificationConfiguration {
        base_properties: BASE_PROPERTIES.to_string(),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn subject(dir: &tempfile::TempDir) -> AnnotatedClass {
        let file = dir.path().join("main/util/Pair.java");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "class Pair {}").unwrap();
        AnnotatedClass::new(dir.path(), "main.util.Pair").unwrap()
    }

    #[test]
    fn test_empty_method_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = VerificationRequest::new(subject(&dir), "").unwrap_err();
        assert!(matches!(err, VerifyError::InvalidMethod { .. }));
    }

    #[test]
    fn test_malformed_method_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = VerificationRequest::new(subject(&dir), "add(int)").unwrap_err();
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_dependencies_prepend_subject() {
        let dir = tempfile::tempdir().unwrap();
        let request = VerificationRequest::new(subject(&dir), "add")
            .unwrap()
            .with_dependencies(["D", "E"]);
        assert_eq!(request.dependencies(), ["main.util.Pair", "D", "E"]);
        assert_eq!(request.merged_dependencies(), "main.util.Pair,D,E");
    }

    #[test]
    fn test_dependencies_stable_under_setter_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = VerificationRequest::new(subject(&dir), "add")
            .unwrap()
            .with_scope("Node:4")
            .with_dependencies(vec!["D".to_string(), "E".to_string()]);
        let b = VerificationRequest::new(subject(&dir), "add")
            .unwrap()
            .with_dependencies(["D", "E"])
            .with_scope("Node:4");
        assert_eq!(a.dependencies(), b.dependencies());
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicate_dependencies_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let request = VerificationRequest::new(subject(&dir), "add")
            .unwrap()
            .with_dependencies(["main.util.Pair", "D", "D"]);
        assert_eq!(request.merged_dependencies(), "main.util.Pair,main.util.Pair,D,D");
    }

    #[test]
    fn test_configuration_fields() {
        let dir = tempfile::tempdir().unwrap();
        let request = VerificationRequest::new(subject(&dir), "add")
            .unwrap()
            .with_dependencies(["main.util.Node"]);
        let config = build_configuration(&request);

        assert_eq!(config.get(keys::CLASS_TO_CHECK).and_then(OptionValue::as_str), Some("main/util/Pair"));
        assert_eq!(
            config.get(keys::RELEVANT_CLASSES).and_then(OptionValue::as_str),
            Some("main.util.Pair,main.util.Node")
        );
        assert_eq!(config.get(keys::METHOD_TO_CHECK).and_then(OptionValue::as_str), Some("add_0"));
        assert_eq!(
            config.get(keys::SOURCE_PATH).and_then(OptionValue::as_str),
            Some(dir.path().display().to_string().as_str())
        );
        assert_eq!(config.base_properties(), BASE_PROPERTIES);
    }

    #[test]
    fn test_fixed_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let request = VerificationRequest::new(subject(&dir), "add").unwrap();
        let config = build_configuration(&request);

        assert_eq!(config.get(keys::RELEVANCY_ANALYSIS).and_then(OptionValue::as_bool), Some(true));
        assert_eq!(config.get(keys::CHECK_NULL_DEREFERENCE).and_then(OptionValue::as_bool), Some(true));
        assert_eq!(config.get(keys::USE_JAVA_ARITHMETIC).and_then(OptionValue::as_bool), Some(false));
        assert_eq!(config.get(keys::CHECK_ARITHMETIC_EXCEPTION).and_then(OptionValue::as_bool), Some(false));
        assert_eq!(config.get(keys::INFER_SCOPE).and_then(OptionValue::as_bool), Some(true));
        assert_eq!(config.get(keys::OBJECT_SCOPE).and_then(OptionValue::as_int), Some(3));
        assert_eq!(config.get(keys::LOOP_UNROLL).and_then(OptionValue::as_int), Some(3));
        assert_eq!(config.get(keys::ATTEMPT_TO_CORRECT_BUG).and_then(OptionValue::as_bool), Some(false));
        assert_eq!(config.get(keys::MAX_METHODS_PER_FILE).and_then(OptionValue::as_int), Some(1));
        assert_eq!(config.get(keys::REMOVE_QUANTIFIERS).and_then(OptionValue::as_bool), Some(true));
        // 4 request fields + fixed toggles, no scope
        assert_eq!(config.len(), 4 + FIXED_TOGGLES.len());
    }

    #[test]
    fn test_scope_key_only_when_given() {
        let dir = tempfile::tempdir().unwrap();
        let plain = VerificationRequest::new(subject(&dir), "add").unwrap();
        assert!(!build_configuration(&plain).contains_key(keys::TYPE_SCOPES));

        let scoped = plain.clone().with_scope("main.util.Node:5");
        let config = build_configuration(&scoped);
        assert_eq!(
            config.get(keys::TYPE_SCOPES).and_then(OptionValue::as_str),
            Some("main.util.Node:5")
        );
    }

    #[test]
    fn test_configuration_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let request = VerificationRequest::new(subject(&dir), "add")
            .unwrap()
            .with_dependencies(["B", "A"])
            .with_scope("A:2");
        assert_eq!(build_configuration(&request), build_configuration(&request));
        assert_eq!(
            build_configuration(&request).to_properties(),
            build_configuration(&request).to_properties()
        );
    }

    #[test]
    fn test_properties_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let request = VerificationRequest::new(subject(&dir), "add").unwrap();
        let text = build_configuration(&request).to_properties();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines.contains(&"methodToCheck=add_0"));
        assert!(lines.contains(&"objectScope=3"));
        assert!(lines.contains(&"useJavaSBP=false"));
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
    }

    #[test]
    fn test_escape_property() {
        assert_eq!(escape_property("C:\\src"), "C:\\\\src");
        assert_eq!(escape_property("a\nb"), "a\\nb");
        assert_eq!(escape_property("plain"), "plain");
    }

    #[test]
    fn test_json_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let request = VerificationRequest::new(subject(&dir), "add").unwrap();
        let json = build_configuration(&request).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["options"]["loopUnroll"], 3);
        assert_eq!(value["options"]["inferScope"], true);
        assert_eq!(value["base_properties"], "genericTest.properties");
    }
}
