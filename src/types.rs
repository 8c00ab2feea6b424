//! Core types describing an input validation schema.

use serde_json::{Map, Value};

/// Meta tag holding a literal OpenAPI fragment.
pub const META_SWAGGER: &str = "swagger";
/// Meta tag: when truthy, the `swagger` fragment replaces translation entirely.
pub const META_SWAGGER_OVERRIDE: &str = "swaggerOverride";
/// Meta tag promoting a node to a named component.
pub const META_CLASS_NAME: &str = "className";
/// Meta tag naming the component bucket of a promoted node.
pub const META_CLASS_TARGET: &str = "classTarget";
/// Meta tag selecting one of several candidate item or branch schemas.
pub const META_SWAGGER_INDEX: &str = "swaggerIndex";
/// Meta tag forcing a non-standard output type (only `file` is understood).
pub const META_SWAGGER_TYPE: &str = "swaggerType";

/// Bucket used when a promoted node has no `classTarget`.
pub const DEFAULT_CLASS_TARGET: &str = "schemas";

/// Character-class patterns synthesized for `alphanum` and `token` strings.
pub mod patterns {
    pub const ALPHANUM: &str = "^[a-zA-Z0-9]*$";
    pub const ALPHANUM_LOWER: &str = "^[a-z0-9]*$";
    pub const ALPHANUM_UPPER: &str = "^[A-Z0-9]*$";
    pub const TOKEN: &str = "^[a-zA-Z0-9_]*$";
    pub const TOKEN_LOWER: &str = "^[a-z0-9_]*$";
    pub const TOKEN_UPPER: &str = "^[A-Z0-9_]*$";
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Loose truthiness used for meta tag values (`false`, `0`, `""` and `null` are unset).
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// One node of a validation schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: Kind,
    /// Constraints in declaration order.
    pub rules: Vec<Rule>,
    /// Allowed literal values; may contain `null`.
    pub allow: Vec<Value>,
    pub flags: Flags,
    /// Meta tag mappings in declaration order. Later mappings win on lookup.
    pub metas: Vec<Map<String, Value>>,
    pub examples: Vec<Value>,
    /// Conditional constructs attached to the node.
    pub whens: Vec<When>,
}

/// Kind of a schema node, with kind-specific children.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Number,
    String,
    Binary,
    Date,
    Boolean,
    Array {
        /// Candidate item schemas; one is picked by `swaggerIndex`.
        items: Vec<SchemaNode>,
    },
    Object {
        keys: Vec<ObjectKey>,
    },
    Alternatives {
        matches: Vec<Match>,
        /// Fallback schema used when a conditional branch has no `otherwise`.
        base: Option<Box<SchemaNode>>,
    },
    Any,
    /// Reference back to an enclosing schema (recursive schemas).
    Link {
        reference: String,
    },
}

impl Kind {
    /// Type name as written in schema descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Binary => "binary",
            Kind::Date => "date",
            Kind::Boolean => "boolean",
            Kind::Array { .. } => "array",
            Kind::Object { .. } => "object",
            Kind::Alternatives { .. } => "alternatives",
            Kind::Any => "any",
            Kind::Link { .. } => "link",
        }
    }
}

/// A named constraint with arguments, e.g. `min` with `limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub args: Map<String, Value>,
}

impl Rule {
    /// Rule without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    /// Rule with a single argument.
    pub fn with_arg(name: impl Into<String>, key: &str, value: impl Into<Value>) -> Self {
        let mut args = Map::new();
        args.insert(key.to_string(), value.into());
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// The `limit` argument used by bound rules.
    pub fn limit(&self) -> Option<&Value> {
        self.arg("limit")
    }
}

/// Presence of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presence {
    #[default]
    Optional,
    Required,
    Forbidden,
}

impl Presence {
    /// Parse a presence value from a string.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "optional" => Some(Presence::Optional),
            "required" => Some(Presence::Required),
            "forbidden" => Some(Presence::Forbidden),
            _ => None,
        }
    }
}

/// Default value of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(Value),
    /// Computed at validation time (e.g. `now`); never emitted.
    Generator(String),
}

/// Scalar node-level properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flags {
    pub presence: Presence,
    pub description: Option<String>,
    /// Rendered as `title`.
    pub label: Option<String>,
    pub default: Option<DefaultValue>,
    /// Binary encoding hint, e.g. `base64`.
    pub encoding: Option<String>,
    /// Whether unknown object keys are allowed; `None` leaves it unspecified.
    pub unknown: Option<bool>,
    /// Non-converting mode; enables case-specific string patterns.
    pub strict: bool,
}

/// A declared object key. `schema` is `None` for keys declared without one.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectKey {
    pub key: String,
    pub schema: Option<SchemaNode>,
}

/// A conditional construct keyed on another field.
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    /// The referenced field.
    pub reference: String,
    pub is: Option<Box<SchemaNode>>,
    pub then: Option<Box<SchemaNode>>,
    pub otherwise: Option<Box<SchemaNode>>,
}

/// A candidate branch of an alternatives node.
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    Schema(SchemaNode),
    Conditional(When),
}

impl Match {
    pub fn schema(&self) -> Option<&SchemaNode> {
        match self {
            Match::Schema(schema) => Some(schema),
            Match::Conditional(_) => None,
        }
    }
}

impl SchemaNode {
    /// A bare node of the given kind.
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
            allow: Vec::new(),
            flags: Flags::default(),
            metas: Vec::new(),
            examples: Vec::new(),
            whens: Vec::new(),
        }
    }

    /// Look up a meta tag. Later mappings take precedence.
    pub fn meta_tag(&self, key: &str) -> Option<&Value> {
        self.metas.iter().rev().find_map(|m| m.get(key))
    }

    /// Last rule with the given name.
    pub fn find_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().rev().find(|r| r.name == name)
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    pub fn is_required(&self) -> bool {
        self.flags.presence == Presence::Required
    }

    pub fn is_forbidden(&self) -> bool {
        self.flags.presence == Presence::Forbidden
    }

    /// Candidate index selected by `swaggerIndex`, defaulting to 0.
    ///
    /// Integral floats such as `1.0` count; negative or fractional values
    /// fall back to 0.
    pub fn swagger_index(&self) -> usize {
        let Some(index) = self.meta_tag(META_SWAGGER_INDEX) else {
            return 0;
        };
        if let Some(i) = index.as_u64() {
            return i as usize;
        }
        index
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as usize)
            .unwrap_or(0)
    }

    /// `(bucket, name)` of the component this node is promoted to, if any.
    pub fn component_name(&self) -> Option<(&str, &str)> {
        let name = self
            .meta_tag(META_CLASS_NAME)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())?;
        let bucket = self
            .meta_tag(META_CLASS_TARGET)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CLASS_TARGET);
        Some((bucket, name))
    }
}
