//! Validator engine
//!
//! A [`Validator`] is a composable tree of checks over [`Value`]s. Two node
//! kinds defer work until a value is actually checked:
//!
//! - [`Reference`] looks its target up by name in the owning compiled set,
//!   which makes forward and cyclic references legal;
//! - [`LazyValidator`] builds its child on first use and keeps it.
//!
//! Every validator also renders a textual description (`Display`), composed
//! from its children's descriptions. Two validators with the same shape
//! describe identically, whichever way they were built.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::registry::RegistryHandle;
use crate::value::Value;

// =============================================================================
// Paths and reports
// =============================================================================

/// A step from the validated root down to a nested value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object attribute
    Field(String),
    /// An array item
    Index(usize),
    /// A record entry
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, ".{}", name),
            Self::Index(i) => write!(f, "[{}]", i),
            Self::Key(key) => write!(f, "[{:?}]", key),
        }
    }
}

pub type ValuePath = Vec<PathSegment>;

/// Format a value path as a string
pub fn format_value_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return String::from("<root>");
    }
    path.iter().map(|s| s.to_string()).collect::<String>()
}

/// One mismatch between a value and the validator it was checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, found {}", self.path, self.expected, self.found)
    }
}

/// Outcome of one validation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    issues: Vec<Issue>,
}

impl Report {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("valid");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

// =============================================================================
// Deferred nodes
// =============================================================================

/// A by-name reference resolved through the owning compiled set
#[derive(Debug, Clone)]
pub struct Reference {
    target: String,
    from: String,
    registry: RegistryHandle,
}

impl Reference {
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Name of the set entry this reference was compiled for
    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }
}

struct LazyInner {
    cell: OnceLock<Validator>,
    /// Description of the child, known without building it
    description: Option<String>,
    init: Box<dyn Fn() -> Validator + Send + Sync>,
}

/// A validator built on first use and memoised
#[derive(Clone)]
pub struct LazyValidator {
    inner: Arc<LazyInner>,
}

impl LazyValidator {
    /// A lazy child with no known description; describing it builds it
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> Validator + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(LazyInner { cell: OnceLock::new(), description: None, init: Box::new(init) }),
        }
    }

    /// A lazy child whose description is supplied up front, so describing
    /// it never builds it
    pub fn described<F>(description: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> Validator + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(LazyInner {
                cell: OnceLock::new(),
                description: Some(description.into()),
                init: Box::new(init),
            }),
        }
    }

    pub fn is_forced(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// Build the child if needed and return it
    pub fn force(&self) -> &Validator {
        self.inner.cell.get_or_init(|| (self.inner.init)())
    }
}

impl fmt::Debug for LazyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.cell.get() {
            Some(v) => f.debug_tuple("Lazy").field(v).finish(),
            None => f.write_str("Lazy(<pending>)"),
        }
    }
}

// =============================================================================
// Validator
// =============================================================================

#[derive(Debug, Clone)]
pub enum Validator {
    /// Accepts anything, including an absent value
    Any,
    Literal(String),
    Boolean,
    String,
    Number,
    Enum(Vec<String>),
    Object {
        fields: BTreeMap<String, Validator>,
        /// Reject attributes that are not listed
        closed: bool,
    },
    Array(Box<Validator>),
    Record(Box<Validator>),
    Union(Vec<Validator>),
    /// Accepts any callable. `args` and `returns` only feed the description.
    Function {
        args: Vec<Validator>,
        returns: Option<Box<Validator>>,
    },
    Lazy(LazyValidator),
    Reference(Reference),
    /// Also accepts an absent value
    Optional(Box<Validator>),
}

impl Validator {
    // ========== Constructors ==========

    pub fn literal(value: impl Into<String>) -> Self {
        Validator::Literal(value.into())
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Validator)>,
        S: Into<String>,
    {
        Validator::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            closed: false,
        }
    }

    /// Reject unlisted attributes on an object validator; no-op otherwise
    pub fn closed(self) -> Self {
        match self {
            Validator::Object { fields, .. } => Validator::Object { fields, closed: true },
            other => other,
        }
    }

    pub fn array(item: Validator) -> Self {
        Validator::Array(Box::new(item))
    }

    pub fn record(value: Validator) -> Self {
        Validator::Record(Box::new(value))
    }

    pub fn union(branches: impl IntoIterator<Item = Validator>) -> Self {
        Validator::Union(branches.into_iter().collect())
    }

    pub fn function(args: impl IntoIterator<Item = Validator>, returns: Option<Validator>) -> Self {
        Validator::Function {
            args: args.into_iter().collect(),
            returns: returns.map(Box::new),
        }
    }

    pub fn lazy<F>(init: F) -> Self
    where
        F: Fn() -> Validator + Send + Sync + 'static,
    {
        Validator::Lazy(LazyValidator::new(init))
    }

    /// Like [`lazy`](Self::lazy), with the child's description known ahead
    pub fn lazy_described<F>(description: impl Into<String>, init: F) -> Self
    where
        F: Fn() -> Validator + Send + Sync + 'static,
    {
        Validator::Lazy(LazyValidator::described(description, init))
    }

    pub fn reference(target: impl Into<String>, from: impl Into<String>, registry: RegistryHandle) -> Self {
        Validator::Reference(Reference {
            target: target.into(),
            from: from.into(),
            registry,
        })
    }

    pub fn optional(self) -> Self {
        Validator::Optional(Box::new(self))
    }

    // ========== Validation ==========

    /// Check a present value
    pub fn validate(&self, value: &Value) -> Result<Report> {
        self.validate_slot(Some(value))
    }

    /// Check a slot that may be absent (`None` stands for "undefined")
    pub fn validate_slot(&self, slot: Option<&Value>) -> Result<Report> {
        let mut path = ValuePath::new();
        let mut issues = Vec::new();
        self.walk(slot, &mut path, &mut issues, &mut Vec::new())?;
        Ok(Report { issues })
    }

    pub fn accepts(&self, value: &Value) -> Result<bool> {
        Ok(self.validate(value)?.is_valid())
    }

    pub fn accepts_absent(&self) -> Result<bool> {
        Ok(self.validate_slot(None)?.is_valid())
    }

    /// Whether an absent value could satisfy this validator, decided from
    /// its structure alone. Reference chains are followed once per name; a
    /// name met again counts as not accepting absence, as does a reference
    /// that cannot be resolved.
    pub fn may_be_absent(&self) -> bool {
        self.absence_allowed(&mut Vec::new())
    }

    fn absence_allowed(&self, followed: &mut Vec<String>) -> bool {
        match self {
            Validator::Any | Validator::Optional(_) => true,
            Validator::Lazy(lazy) => lazy.force().absence_allowed(followed),
            Validator::Union(branches) => branches.iter().any(|b| b.absence_allowed(followed)),
            Validator::Reference(reference) => {
                if followed.contains(&reference.target) {
                    return false;
                }
                followed.push(reference.target.clone());
                reference
                    .registry
                    .with_entry(&reference.target, &reference.from, |entry| {
                        Ok(entry.validator().absence_allowed(followed))
                    })
                    .unwrap_or(false)
            }
            Validator::Literal(_)
            | Validator::Boolean
            | Validator::String
            | Validator::Number
            | Validator::Enum(_)
            | Validator::Object { .. }
            | Validator::Array(_)
            | Validator::Record(_)
            | Validator::Function { .. } => false,
        }
    }

    /// `chain` holds the references followed since the walk last descended
    /// into a child value; meeting one of them again is a cycle that would
    /// never consume any input.
    fn walk(
        &self,
        slot: Option<&Value>,
        path: &mut ValuePath,
        issues: &mut Vec<Issue>,
        chain: &mut Vec<String>,
    ) -> Result<()> {
        // Nodes that decide for themselves what absence means
        match self {
            Validator::Any => return Ok(()),
            Validator::Optional(inner) => {
                return match slot {
                    None => Ok(()),
                    Some(_) => inner.walk(slot, path, issues, chain),
                };
            }
            Validator::Lazy(lazy) => return lazy.force().walk(slot, path, issues, chain),
            Validator::Reference(reference) => {
                if chain.contains(&reference.target) {
                    issues.push(issue(path, self.to_string(), "reference cycle"));
                    return Ok(());
                }
                chain.push(reference.target.clone());
                let outcome = reference
                    .registry
                    .with_entry(&reference.target, &reference.from, |entry| {
                        entry.validator().walk(slot, path, issues, chain)
                    });
                chain.pop();
                return outcome;
            }
            Validator::Union(branches) => return self.walk_union(branches, slot, path, issues, chain),
            _ => {}
        }

        let Some(value) = slot else {
            issues.push(issue(path, self.expectation(), "undefined"));
            return Ok(());
        };

        match self {
            Validator::Literal(expected) => {
                if value.as_str() != Some(expected.as_str()) {
                    issues.push(issue(path, self.expectation(), found(value)));
                }
            }
            Validator::Boolean => {
                if !matches!(value, Value::Bool(_)) {
                    issues.push(issue(path, "boolean", found(value)));
                }
            }
            Validator::String => {
                if !matches!(value, Value::String(_)) {
                    issues.push(issue(path, "string", found(value)));
                }
            }
            Validator::Number => {
                if !matches!(value, Value::Number(n) if !n.is_nan()) {
                    issues.push(issue(path, "number", found(value)));
                }
            }
            Validator::Enum(values) => {
                let ok = value.as_str().map(|s| values.iter().any(|v| v == s)).unwrap_or(false);
                if !ok {
                    issues.push(issue(path, self.expectation(), found(value)));
                }
            }
            Validator::Object { fields, closed } => {
                let Some(map) = value.as_object() else {
                    issues.push(issue(path, "object", found(value)));
                    return Ok(());
                };
                for (name, field) in fields {
                    path.push(PathSegment::Field(name.clone()));
                    field.walk(map.get(name), path, issues, &mut Vec::new())?;
                    path.pop();
                }
                if *closed {
                    for key in map.keys().filter(|k| !fields.contains_key(*k)) {
                        path.push(PathSegment::Field(key.clone()));
                        issues.push(issue(path, "no such attribute", "unexpected attribute"));
                        path.pop();
                    }
                }
            }
            Validator::Array(item) => {
                let Value::Array(items) = value else {
                    issues.push(issue(path, "array", found(value)));
                    return Ok(());
                };
                for (i, v) in items.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    item.walk(Some(v), path, issues, &mut Vec::new())?;
                    path.pop();
                }
            }
            Validator::Record(child) => {
                let Some(map) = value.as_object() else {
                    issues.push(issue(path, "record", found(value)));
                    return Ok(());
                };
                for (key, v) in map {
                    path.push(PathSegment::Key(key.clone()));
                    child.walk(Some(v), path, issues, &mut Vec::new())?;
                    path.pop();
                }
            }
            Validator::Function { .. } => {
                if !matches!(value, Value::Function(_)) {
                    issues.push(issue(path, "function", found(value)));
                }
            }
            Validator::Any
            | Validator::Optional(_)
            | Validator::Lazy(_)
            | Validator::Reference(_)
            | Validator::Union(_) => unreachable!("handled before the presence check"),
        }
        Ok(())
    }

    /// Succeeds as soon as one branch reports no issue
    fn walk_union(
        &self,
        branches: &[Validator],
        slot: Option<&Value>,
        path: &mut ValuePath,
        issues: &mut Vec<Issue>,
        chain: &mut Vec<String>,
    ) -> Result<()> {
        for branch in branches {
            let mut scratch = Vec::new();
            branch.walk(slot, path, &mut scratch, chain)?;
            if scratch.is_empty() {
                return Ok(());
            }
        }
        let actual = slot.map(found).unwrap_or_else(|| "undefined".to_string());
        issues.push(issue(path, self.expectation(), actual));
        Ok(())
    }

    /// Short label for issue messages
    fn expectation(&self) -> String {
        match self {
            Validator::Literal(s) => format!("literal {:?}", s),
            Validator::Enum(values) => format!("one of {:?}", values),
            Validator::Union(branches) => format!("one of {} union branches", branches.len()),
            Validator::Object { .. } => "object".to_string(),
            Validator::Array(_) => "array".to_string(),
            Validator::Record(_) => "record".to_string(),
            Validator::Function { .. } => "function".to_string(),
            other => other.to_string(),
        }
    }
}

fn issue(path: &[PathSegment], expected: impl Into<String>, found: impl Into<String>) -> Issue {
    Issue {
        path: format_value_path(path),
        expected: expected.into(),
        found: found.into(),
    }
}

fn found(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string {:?}", s),
        Value::Number(n) => format!("number {}", n),
        Value::Bool(b) => format!("boolean {}", b),
        other => other.kind().to_string(),
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Any => f.write_str("any"),
            Validator::Literal(s) => write!(f, "literal({:?})", s),
            Validator::Boolean => f.write_str("boolean"),
            Validator::String => f.write_str("string"),
            Validator::Number => f.write_str("number"),
            Validator::Enum(values) => write!(f, "enum{:?}", values),
            Validator::Object { fields, closed } => {
                f.write_str(if *closed { "strictObject{" } else { "object{" })?;
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, field)?;
                }
                f.write_str("}")
            }
            Validator::Array(item) => write!(f, "array<{}>", item),
            Validator::Record(value) => write!(f, "record<string, {}>", value),
            Validator::Union(branches) => {
                f.write_str("union[")?;
                join(f, branches, " | ")?;
                f.write_str("]")
            }
            Validator::Function { args, returns } => {
                f.write_str("function(")?;
                join(f, args, ", ")?;
                f.write_str(")")?;
                match returns {
                    Some(r) => write!(f, " -> {}", r),
                    None => Ok(()),
                }
            }
            Validator::Lazy(lazy) => match &lazy.inner.description {
                Some(description) => write!(f, "lazy(() => {})", description),
                None => write!(f, "lazy(() => {})", lazy.force()),
            },
            Validator::Reference(reference) => write!(f, "ref({})", reference.target),
            Validator::Optional(inner) => write!(f, "{}?", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_primitives() {
        assert!(Validator::String.accepts(&v(json!("x"))).unwrap());
        assert!(!Validator::String.accepts(&v(json!(1))).unwrap());
        assert!(Validator::Number.accepts(&v(json!(1.5))).unwrap());
        assert!(!Validator::Number.accepts(&Value::Number(f64::NAN)).unwrap());
        assert!(Validator::Boolean.accepts(&v(json!(false))).unwrap());
        assert!(Validator::Any.accepts(&v(json!(null))).unwrap());
        assert!(Validator::Any.accepts_absent().unwrap());
    }

    #[test]
    fn test_object_reports_nested_path() {
        let validator = Validator::object([
            ("a", Validator::String),
            ("b", Validator::object([("b2", Validator::array(Validator::Boolean))])),
        ]);
        let report = validator
            .validate(&v(json!({ "a": "ok", "b": { "b2": [true, 3] } })))
            .unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.issues().len(), 1);
        assert_eq!(report.issues()[0].path, ".b.b2[1]");
        assert_eq!(report.issues()[0].expected, "boolean");
    }

    #[test]
    fn test_missing_attribute_requires_optional() {
        let required = Validator::object([("a", Validator::String)]);
        let optional = Validator::object([("a", Validator::String.optional())]);
        assert!(!required.accepts(&v(json!({}))).unwrap());
        assert!(optional.accepts(&v(json!({}))).unwrap());
        assert!(!optional.accepts(&v(json!({ "a": 1 }))).unwrap());
    }

    #[test]
    fn test_open_and_closed_objects() {
        let open = Validator::object([("a", Validator::String)]);
        let closed = open.clone().closed();
        let value = v(json!({ "a": "x", "extra": 1 }));
        assert!(open.accepts(&value).unwrap());
        let report = closed.validate(&value).unwrap();
        assert_eq!(report.issues()[0].path, ".extra");
    }

    #[test]
    fn test_record_and_enum() {
        let record = Validator::record(Validator::enumeration(["x", "y"]));
        assert!(record.accepts(&v(json!({ "k1": "x", "k2": "y" }))).unwrap());
        let report = record.validate(&v(json!({ "k1": "z" }))).unwrap();
        assert_eq!(report.issues()[0].path, "[\"k1\"]");
    }

    #[test]
    fn test_union_any_branch() {
        let union = Validator::union([
            Validator::object([("a", Validator::String)]),
            Validator::object([("b", Validator::Number)]),
        ]);
        assert!(union.accepts(&v(json!({ "a": "test" }))).unwrap());
        assert!(union.accepts(&v(json!({ "b": 1 }))).unwrap());
        assert!(!union.accepts(&v(json!({ "b": "test" }))).unwrap());
    }

    #[test]
    fn test_function_checks_callability_only() {
        let f = Validator::function([Validator::String], Some(Validator::String));
        let takes_number = Value::function("n", |_| Value::Number(1.0));
        assert!(f.accepts(&takes_number).unwrap());
        assert!(!f.accepts(&v(json!("not a function"))).unwrap());
    }

    #[test]
    fn test_lazy_builds_once_on_use() {
        let lazy = LazyValidator::new(|| Validator::function([], None));
        assert!(!lazy.is_forced());
        let validator = Validator::Lazy(lazy.clone());
        assert!(validator.accepts(&Value::function("f", |_| Value::Null)).unwrap());
        assert!(lazy.is_forced());
    }

    #[test]
    fn test_described_lazy_is_not_built_by_display() {
        let lazy = LazyValidator::described("function()", || Validator::function([], None));
        let validator = Validator::Lazy(lazy.clone());
        assert_eq!(validator.to_string(), "lazy(() => function())");
        assert!(!lazy.is_forced());
        assert!(!validator.may_be_absent());
        assert!(lazy.is_forced());
    }

    #[test]
    fn test_may_be_absent() {
        assert!(Validator::Any.may_be_absent());
        assert!(Validator::String.optional().may_be_absent());
        assert!(Validator::union([Validator::Number, Validator::Boolean.optional()]).may_be_absent());
        assert!(!Validator::object([("a", Validator::String.optional())]).may_be_absent());
        let dangling = Validator::reference("X", "Y", RegistryHandle::detached());
        assert!(dangling.clone().optional().may_be_absent());
        // Unresolvable references are treated as required
        assert!(!dangling.may_be_absent());
    }

    #[test]
    fn test_descriptions_compose() {
        let validator = Validator::object([
            ("a", Validator::String),
            ("b", Validator::union([Validator::literal("x"), Validator::Number]).optional()),
            ("c", Validator::function([Validator::String], Some(Validator::Number))),
        ]);
        assert_eq!(
            validator.to_string(),
            "object{a: string, b: union[literal(\"x\") | number]?, c: function(string) -> number}"
        );
    }

    #[test]
    fn test_report_display() {
        let report = Validator::String.validate(&v(json!(3))).unwrap();
        assert_eq!(report.to_string(), "<root>: expected string, found number 3");
    }
}
