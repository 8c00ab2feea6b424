//! Schema conversion - translates validation schema nodes into OpenAPI schema objects.
//!
//! Conversion is a single depth-first walk. Components already known to the
//! caller flow down as a borrowed [`Components`]; components defined while
//! converting a node flow back up in [`Conversion::components`] and are merged
//! into the parent's delta at each level.

use serde_json::{json, Map, Value};

use crate::components::{reference, Components};
use crate::error::ConvertError;
use crate::loader::parse_schema;
use crate::types::{
    is_truthy, patterns, DefaultValue, Kind, Match, ObjectKey, Rule, SchemaNode, META_SWAGGER,
    META_SWAGGER_OVERRIDE, META_SWAGGER_TYPE,
};

/// Result of converting one schema node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    /// The OpenAPI fragment, or `None` when the node is forbidden and must be
    /// left out of its parent.
    pub fragment: Option<Value>,
    /// Components defined while converting this node, not including the
    /// ones passed in as already known.
    pub components: Components,
    /// Set when the node resolved to an alternative branch that is itself
    /// required. The enclosing object lists the key as required. Always
    /// unset when the node is replaced by a component `$ref`.
    pub required: bool,
}

impl Conversion {
    fn absent() -> Self {
        Self::default()
    }

    fn fragment(fragment: Value) -> Self {
        Self {
            fragment: Some(fragment),
            ..Self::default()
        }
    }

    pub fn is_absent(&self) -> bool {
        self.fragment.is_none()
    }

    /// The fragment as JSON, `false` when absent.
    pub fn fragment_value(&self) -> Value {
        self.fragment.clone().unwrap_or(Value::Bool(false))
    }
}

/// Convert a schema with no previously known components.
pub fn convert(schema: &SchemaNode) -> Conversion {
    convert_with(schema, &Components::new())
}

/// Convert a schema, reusing components the caller already defined.
///
/// A node promoted with `className` whose component is already present in
/// `existing` becomes a `$ref` without being converted again. `existing` is
/// never modified; the returned [`Conversion::components`] holds only new
/// definitions.
pub fn convert_with(schema: &SchemaNode, existing: &Components) -> Conversion {
    tracing::trace!(kind = schema.kind.name(), "converting schema node");

    let override_fragment = schema.meta_tag(META_SWAGGER).filter(|v| is_truthy(v));
    if let Some(fragment) = override_fragment {
        if schema.meta_tag(META_SWAGGER_OVERRIDE).is_some_and(is_truthy) {
            return Conversion::fragment(fragment.clone());
        }
    }

    let component = schema.component_name();
    if let Some((bucket, name)) = component {
        if existing.contains(bucket, name) {
            tracing::debug!(bucket, name, "reusing existing component");
            return Conversion::fragment(reference(bucket, name));
        }
    }

    if schema.is_forbidden() {
        return Conversion::absent();
    }

    let mut components = Components::new();
    let mut required = false;

    let rendered = match &schema.kind {
        Kind::Number => Some(Value::Object(number(schema))),
        Kind::String => Some(Value::Object(string(schema))),
        Kind::Binary => Some(Value::Object(binary(schema))),
        Kind::Date => Some(json!({ "type": "string", "format": "date-time" })),
        Kind::Boolean => Some(json!({ "type": "boolean" })),
        Kind::Array { items } => Some(Value::Object(array(
            schema,
            items,
            existing,
            &mut components,
        ))),
        Kind::Object { keys } => Some(Value::Object(object(
            schema,
            keys,
            existing,
            &mut components,
        ))),
        Kind::Alternatives { matches, base } => {
            alternatives(schema, matches, base.as_deref(), existing, &mut components).map(
                |(fragment, branch_required)| {
                    required = branch_required;
                    fragment
                },
            )
        }
        Kind::Any => Some(Value::Object(any(schema, existing, &mut components))),
        // Recursive schemas are not expanded.
        Kind::Link { .. } => Some(Value::Object(Map::new())),
    };

    let Some(mut fragment) = rendered else {
        return Conversion {
            fragment: None,
            components,
            required: false,
        };
    };

    if let Value::Object(map) = &mut fragment {
        annotate(schema, map);
    }

    if let Some((bucket, name)) = component {
        tracing::debug!(bucket, name, "defining component");
        components.define(bucket, name, fragment);
        // A `$ref` never carries branch presence, defined here or reused.
        return Conversion {
            fragment: Some(reference(bucket, name)),
            components,
            required: false,
        };
    }

    if let (Some(Value::Object(extra)), Value::Object(map)) = (override_fragment, &mut fragment) {
        for (key, value) in extra {
            map.insert(key.clone(), value.clone());
        }
    }

    Conversion {
        fragment: Some(fragment),
        components,
        required,
    }
}

/// Parse a JSON schema description and convert it.
///
/// # Errors
///
/// Returns `MissingSchema` for `null`, `UnrecognizedSchema` for a value that
/// is neither a schema node nor a key mapping, and `UnrecognizedKind` for a
/// node type with no conversion rule. Nothing is converted if any part of
/// the tree fails to parse.
pub fn convert_value(schema: &Value, existing: &Components) -> Result<Conversion, ConvertError> {
    let node = parse_schema(schema)?;
    Ok(convert_with(&node, existing))
}

/// Attach description, examples, title and default.
fn annotate(schema: &SchemaNode, fragment: &mut Map<String, Value>) {
    if let Some(description) = schema.flags.description.as_deref().filter(|d| !d.is_empty()) {
        fragment.insert("description".into(), json!(description));
    }

    match schema.examples.as_slice() {
        [] => {}
        [single] => {
            fragment.insert("example".into(), example_value(single).clone());
        }
        many => {
            fragment.insert(
                "examples".into(),
                Value::Array(many.iter().map(|e| example_value(e).clone()).collect()),
            );
        }
    }

    if let Some(label) = schema.flags.label.as_deref().filter(|l| !l.is_empty()) {
        fragment.insert("title".into(), json!(label));
    }

    if let Some(DefaultValue::Literal(value)) = &schema.flags.default {
        if !value.is_null() {
            fragment.insert("default".into(), value.clone());
        }
    }
}

/// Examples may be wrapped as `{ "value": ... }`.
fn example_value(example: &Value) -> &Value {
    example.get("value").unwrap_or(example)
}

/// Apply `min`, `max` and `length` rules in declaration order.
fn apply_bounds(rules: &[Rule], swagger: &mut Map<String, Value>, min_key: &str, max_key: &str) {
    for rule in rules {
        let Some(limit) = rule.limit() else {
            continue;
        };
        match rule.name.as_str() {
            "min" => {
                swagger.insert(min_key.into(), limit.clone());
            }
            "max" => {
                swagger.insert(max_key.into(), limit.clone());
            }
            "length" => {
                swagger.insert(min_key.into(), limit.clone());
                swagger.insert(max_key.into(), limit.clone());
            }
            _ => {}
        }
    }
}

fn number(schema: &SchemaNode) -> Map<String, Value> {
    let mut swagger = Map::new();

    if schema.has_rule("integer") {
        swagger.insert("type".into(), json!("integer"));
    } else {
        swagger.insert("type".into(), json!("number"));
        let format = if schema.has_rule("precision") {
            "double"
        } else {
            "float"
        };
        swagger.insert("format".into(), json!(format));
    }

    // Declaration order: the last rule touching a bound wins.
    for rule in &schema.rules {
        match rule.name.as_str() {
            "sign" => match rule.arg("sign").and_then(Value::as_str) {
                Some("positive") => {
                    swagger.insert("minimum".into(), json!(1));
                }
                Some("negative") => {
                    swagger.insert("maximum".into(), json!(-1));
                }
                _ => {}
            },
            "min" => {
                if let Some(limit) = rule.limit() {
                    swagger.insert("minimum".into(), limit.clone());
                }
            }
            "max" => {
                if let Some(limit) = rule.limit() {
                    swagger.insert("maximum".into(), limit.clone());
                }
            }
            _ => {}
        }
    }

    let valids: Vec<Value> = schema.allow.iter().filter(|v| v.is_number()).cloned().collect();
    if !valids.is_empty() {
        swagger.insert("enum".into(), Value::Array(valids));
    }

    swagger
}

fn string(schema: &SchemaNode) -> Map<String, Value> {
    let mut swagger = Map::new();
    swagger.insert("type".into(), json!("string"));

    let mut pattern = schema
        .find_rule("pattern")
        .and_then(|r| r.arg("regex"))
        .and_then(Value::as_str)
        .map(|regex| regex_source(regex).to_string());

    if schema.has_rule("alphanum") {
        pattern = Some(
            case_pattern(
                schema,
                patterns::ALPHANUM,
                patterns::ALPHANUM_LOWER,
                patterns::ALPHANUM_UPPER,
            )
            .to_string(),
        );
    }

    if schema.has_rule("token") {
        pattern = Some(
            case_pattern(
                schema,
                patterns::TOKEN,
                patterns::TOKEN_LOWER,
                patterns::TOKEN_UPPER,
            )
            .to_string(),
        );
    }

    let mut format = None;
    if schema.has_rule("email") {
        format = Some("email");
    }
    if schema.has_rule("isoDate") {
        format = Some("date-time");
    }

    // A format always displaces any pattern.
    match format {
        Some(format) => {
            swagger.insert("format".into(), json!(format));
        }
        None => {
            if let Some(pattern) = pattern {
                swagger.insert("pattern".into(), Value::String(pattern));
            }
        }
    }

    apply_bounds(&schema.rules, &mut swagger, "minLength", "maxLength");

    let valids: Vec<Value> = schema.allow.iter().filter(|v| v.is_string()).cloned().collect();
    if !valids.is_empty() {
        swagger.insert("enum".into(), Value::Array(valids));
    }

    swagger
}

/// Pick the case-specific pattern; forced case only applies in strict mode.
fn case_pattern(
    schema: &SchemaNode,
    any_case: &'static str,
    lower: &'static str,
    upper: &'static str,
) -> &'static str {
    if !schema.flags.strict {
        return any_case;
    }
    match schema
        .find_rule("case")
        .and_then(|r| r.arg("direction"))
        .and_then(Value::as_str)
    {
        Some("lower") => lower,
        Some("upper") => upper,
        _ => any_case,
    }
}

/// Strip `/.../flags` delimiters from a regex literal.
fn regex_source(regex: &str) -> &str {
    if let Some(rest) = regex.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            return &rest[..end];
        }
    }
    regex
}

fn binary(schema: &SchemaNode) -> Map<String, Value> {
    let mut swagger = Map::new();
    swagger.insert("type".into(), json!("string"));

    let format = if schema.flags.encoding.as_deref() == Some("base64") {
        "byte"
    } else {
        "binary"
    };
    swagger.insert("format".into(), json!(format));

    apply_bounds(&schema.rules, &mut swagger, "minLength", "maxLength");

    swagger
}

fn array(
    schema: &SchemaNode,
    items: &[SchemaNode],
    known: &Components,
    discovered: &mut Components,
) -> Map<String, Value> {
    let mut swagger = Map::new();
    swagger.insert("type".into(), json!("array"));

    let Some(item) = items.get(schema.swagger_index()) else {
        return swagger;
    };

    let conversion = convert_with(item, &known.merged(discovered));
    discovered.merge(conversion.components);

    apply_bounds(&schema.rules, &mut swagger, "minItems", "maxItems");

    if schema.has_rule("unique") {
        swagger.insert("uniqueItems".into(), json!(true));
    }

    // A forbidden item schema leaves `items` unset.
    if let Some(items) = conversion.fragment {
        swagger.insert("items".into(), items);
    }

    swagger
}

fn object(
    schema: &SchemaNode,
    keys: &[ObjectKey],
    known: &Components,
    discovered: &mut Components,
) -> Map<String, Value> {
    let mut combined = known.merged(discovered);
    let mut required: Vec<String> = Vec::new();
    let mut properties = Map::new();

    for ObjectKey { key, schema: child } in keys {
        let Some(child) = child else {
            continue;
        };

        let conversion = convert_with(child, &combined);
        let Some(fragment) = conversion.fragment else {
            tracing::debug!(key = key.as_str(), "omitting forbidden key");
            continue;
        };

        combined.merge(conversion.components.clone());
        discovered.merge(conversion.components);

        if (child.is_required() || conversion.required) && !required.contains(key) {
            required.push(key.clone());
        }

        properties.insert(key.clone(), fragment);
    }

    let mut swagger = Map::new();
    swagger.insert("type".into(), json!("object"));
    if !required.is_empty() {
        swagger.insert(
            "required".into(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }
    swagger.insert("properties".into(), Value::Object(properties));

    if let Some(unknown) = schema.flags.unknown {
        swagger.insert("additionalProperties".into(), json!(unknown));
    }

    swagger
}

/// Convert the branch selected by `swaggerIndex`.
///
/// Returns the fragment and whether the selected branch is required.
fn alternatives(
    schema: &SchemaNode,
    matches: &[Match],
    base: Option<&SchemaNode>,
    known: &Components,
    discovered: &mut Components,
) -> Option<(Value, bool)> {
    let index = schema.swagger_index();

    let selected = match matches.first()? {
        Match::Conditional(when) => match (base, &when.otherwise) {
            (Some(base), None) => {
                if index == 0 {
                    Some(base)
                } else {
                    when.then.as_deref()
                }
            }
            _ => {
                if index == 0 {
                    when.then.as_deref()
                } else {
                    when.otherwise.as_deref()
                }
            }
        },
        Match::Schema(_) => matches.get(index).and_then(Match::schema),
    }?;

    let conversion = convert_with(selected, &known.merged(discovered));
    discovered.merge(conversion.components);

    let fragment = conversion.fragment?;
    Some((fragment, selected.is_required() || conversion.required))
}

fn any(
    schema: &SchemaNode,
    known: &Components,
    discovered: &mut Components,
) -> Map<String, Value> {
    let mut swagger = Map::new();

    apply_bounds(&schema.rules, &mut swagger, "minLength", "maxLength");

    let branches: Vec<SchemaNode> = if !schema.allow.is_empty() {
        schema.allow.iter().filter_map(literal_node).collect()
    } else {
        schema
            .whens
            .iter()
            .filter_map(|when| when.then.as_deref().or(when.otherwise.as_deref()))
            .cloned()
            .collect()
    };

    let mut one_of = Vec::new();
    for branch in &branches {
        let conversion = convert_with(branch, &known.merged(discovered));
        discovered.merge(conversion.components);
        if let Some(fragment) = conversion.fragment {
            one_of.push(fragment);
        }
    }
    if !one_of.is_empty() {
        swagger.insert("oneOf".into(), Value::Array(one_of));
    }

    if schema.meta_tag(META_SWAGGER_TYPE).and_then(Value::as_str) == Some("file") {
        swagger.insert("type".into(), json!("file"));
        swagger.insert("in".into(), json!("formData"));
    } else {
        swagger.insert("type".into(), json!("string"));
    }

    if let Some(description) = schema.flags.description.as_deref().filter(|d| !d.is_empty()) {
        swagger.insert("description".into(), json!(description));
    }

    swagger
}

/// Single-valued node describing one allowed literal.
fn literal_node(value: &Value) -> Option<SchemaNode> {
    let mut node = match value {
        Value::String(_) => SchemaNode::new(Kind::String),
        Value::Number(n) => {
            let mut node = SchemaNode::new(Kind::Number);
            if n.is_i64() || n.is_u64() {
                node.rules.push(Rule::new("integer"));
            }
            node
        }
        Value::Bool(_) => SchemaNode::new(Kind::Boolean),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    node.allow.push(value.clone());
    Some(node)
}
