//! Fluent construction of schema nodes.
//!
//! ```
//! use joi_openapi::SchemaNode;
//!
//! let point = SchemaNode::object()
//!     .key("lat", SchemaNode::number().min(-90).max(90).required())
//!     .key("lon", SchemaNode::number().min(-180).max(180).required())
//!     .unknown(false);
//! ```

use serde_json::Value;

use crate::types::{DefaultValue, Kind, Match, ObjectKey, Presence, Rule, SchemaNode, When};

impl SchemaNode {
    pub fn number() -> Self {
        Self::new(Kind::Number)
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn binary() -> Self {
        Self::new(Kind::Binary)
    }

    pub fn date() -> Self {
        Self::new(Kind::Date)
    }

    pub fn boolean() -> Self {
        Self::new(Kind::Boolean)
    }

    pub fn any() -> Self {
        Self::new(Kind::Any)
    }

    /// Reference to an enclosing schema, e.g. `#person`.
    pub fn link(reference: impl Into<String>) -> Self {
        Self::new(Kind::Link {
            reference: reference.into(),
        })
    }

    pub fn array() -> Self {
        Self::new(Kind::Array { items: Vec::new() })
    }

    pub fn object() -> Self {
        Self::new(Kind::Object { keys: Vec::new() })
    }

    /// Object node built from a plain key → schema mapping.
    pub fn from_keys<K, I>(keys: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        keys.into_iter()
            .fold(Self::object(), |node, (key, schema)| node.key(key, schema))
    }

    /// Alternatives over plain schemas.
    pub fn alternatives<I>(schemas: I) -> Self
    where
        I: IntoIterator<Item = SchemaNode>,
    {
        Self::new(Kind::Alternatives {
            matches: schemas.into_iter().map(Match::Schema).collect(),
            base: None,
        })
    }

    /// Alternatives driven by a condition on another field.
    pub fn conditional(when: When) -> Self {
        Self::new(Kind::Alternatives {
            matches: vec![Match::Conditional(when)],
            base: None,
        })
    }

    /// Base-type fallback of an alternatives node.
    pub fn base(mut self, base: SchemaNode) -> Self {
        if let Kind::Alternatives { base: slot, .. } = &mut self.kind {
            *slot = Some(Box::new(base));
        }
        self
    }

    /// Append candidate item schemas to an array node.
    pub fn items<I>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = SchemaNode>,
    {
        if let Kind::Array { items } = &mut self.kind {
            items.extend(schemas);
        }
        self
    }

    /// Declare an object key.
    pub fn key(mut self, key: impl Into<String>, schema: SchemaNode) -> Self {
        if let Kind::Object { keys } = &mut self.kind {
            keys.push(ObjectKey {
                key: key.into(),
                schema: Some(schema),
            });
        }
        self
    }

    pub fn unknown(mut self, allow: bool) -> Self {
        self.flags.unknown = Some(allow);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn min(self, limit: impl Into<Value>) -> Self {
        self.rule(Rule::with_arg("min", "limit", limit))
    }

    pub fn max(self, limit: impl Into<Value>) -> Self {
        self.rule(Rule::with_arg("max", "limit", limit))
    }

    pub fn length(self, limit: impl Into<Value>) -> Self {
        self.rule(Rule::with_arg("length", "limit", limit))
    }

    pub fn integer(self) -> Self {
        self.rule(Rule::new("integer"))
    }

    pub fn precision(self, digits: u32) -> Self {
        self.rule(Rule::with_arg("precision", "limit", digits))
    }

    pub fn positive(self) -> Self {
        self.rule(Rule::with_arg("sign", "sign", "positive"))
    }

    pub fn negative(self) -> Self {
        self.rule(Rule::with_arg("sign", "sign", "negative"))
    }

    /// Regex constraint; `/.../` delimiters are accepted.
    pub fn pattern(self, regex: impl Into<String>) -> Self {
        self.rule(Rule::with_arg("pattern", "regex", regex.into()))
    }

    pub fn alphanum(self) -> Self {
        self.rule(Rule::new("alphanum"))
    }

    pub fn token(self) -> Self {
        self.rule(Rule::new("token"))
    }

    pub fn lowercase(self) -> Self {
        self.rule(Rule::with_arg("case", "direction", "lower"))
    }

    pub fn uppercase(self) -> Self {
        self.rule(Rule::with_arg("case", "direction", "upper"))
    }

    pub fn email(self) -> Self {
        self.rule(Rule::new("email"))
    }

    pub fn iso_date(self) -> Self {
        self.rule(Rule::new("isoDate"))
    }

    pub fn unique(self) -> Self {
        self.rule(Rule::new("unique"))
    }

    /// Add allowed literal values.
    pub fn allow<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allow.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn required(mut self) -> Self {
        self.flags.presence = Presence::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.flags.presence = Presence::Optional;
        self
    }

    pub fn forbidden(mut self) -> Self {
        self.flags.presence = Presence::Forbidden;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.flags.description = Some(description.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.flags.label = Some(label.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.flags.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Default computed at validation time; not rendered.
    pub fn default_generator(mut self, name: impl Into<String>) -> Self {
        self.flags.default = Some(DefaultValue::Generator(name.into()));
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.flags.encoding = Some(encoding.into());
        self
    }

    pub fn strict(mut self) -> Self {
        self.flags.strict = true;
        self
    }

    /// Attach a meta tag mapping. Non-object values are ignored.
    pub fn meta(mut self, tags: Value) -> Self {
        if let Value::Object(map) = tags {
            self.metas.push(map);
        }
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn when(mut self, when: When) -> Self {
        self.whens.push(when);
        self
    }
}

impl When {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            is: None,
            then: None,
            otherwise: None,
        }
    }

    pub fn is(mut self, condition: SchemaNode) -> Self {
        self.is = Some(Box::new(condition));
        self
    }

    pub fn then(mut self, schema: SchemaNode) -> Self {
        self.then = Some(Box::new(schema));
        self
    }

    pub fn otherwise(mut self, schema: SchemaNode) -> Self {
        self.otherwise = Some(Box::new(schema));
        self
    }
}
