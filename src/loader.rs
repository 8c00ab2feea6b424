//! Schema description loading from various sources.
//!
//! Descriptions are JSON documents. A node is an object with a string `type`;
//! an object without one is a plain key → schema mapping and is read as an
//! implicit object node. The whole tree is parsed up front, so any input
//! error is reported before conversion starts.

use std::path::Path;

use serde_json::{Map, Value};

use crate::components::Components;
use crate::error::ConvertError;
use crate::types::{
    json_type_name, DefaultValue, Flags, Kind, Match, ObjectKey, Presence, Rule, SchemaNode, When,
};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a schema description from a file path.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound` if the file doesn't exist,
/// or `ConvertError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConvertError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "loaded schema description");
    load_schema_str(&content)
}

/// Load a schema description from a JSON string.
///
/// # Errors
///
/// Returns `ConvertError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, ConvertError> {
    serde_json::from_str(content).map_err(|source| ConvertError::InvalidJson { source })
}

/// Load a schema description from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ConvertError::NetworkError` if the request fails or the body
/// isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<Value, ConvertError> {
    let network_error = |source| ConvertError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let response = client.get(url).send().map_err(network_error)?;

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(network_error)?;

    tracing::debug!(url, "fetched schema description");
    response.json().map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a schema description from a file path or URL.
pub fn load_schema_auto(source: &str) -> Result<Value, ConvertError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_schema_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ConvertError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_schema(Path::new(source))
    }
}

/// Read a `components` object (bucket → name → fragment).
pub fn parse_components(value: &Value) -> Result<Components, ConvertError> {
    serde_json::from_value(value.clone()).map_err(|source| ConvertError::InvalidJson { source })
}

/// Parse a schema description into a [`SchemaNode`].
///
/// # Errors
///
/// - `MissingSchema` for `null`
/// - `UnrecognizedSchema` for anything that is neither a node nor a mapping
/// - `UnrecognizedKind` for a `type` with no conversion rule
/// - `InvalidNode` for malformed node fields
pub fn parse_schema(value: &Value) -> Result<SchemaNode, ConvertError> {
    if value.is_null() {
        return Err(ConvertError::MissingSchema);
    }
    parse_node(value, "")
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn invalid(path: &str, message: impl Into<String>) -> ConvertError {
    ConvertError::InvalidNode {
        path: display_path(path),
        message: message.into(),
    }
}

fn parse_node(value: &Value, path: &str) -> Result<SchemaNode, ConvertError> {
    let Value::Object(map) = value else {
        return Err(ConvertError::UnrecognizedSchema {
            path: display_path(path),
            actual: json_type_name(value).to_string(),
        });
    };

    let Some(type_name) = map.get("type").and_then(Value::as_str) else {
        // Plain mapping of key -> schema
        let keys = parse_key_entries(map, path)?;
        return Ok(SchemaNode::new(Kind::Object { keys }));
    };

    let mut node = SchemaNode::new(parse_kind(type_name, map, path)?);
    node.rules = parse_rules(map.get("rules"), &format!("{}/rules", path))?;
    node.allow = parse_list(map.get("allow"), &format!("{}/allow", path))?;
    node.flags = parse_flags(map.get("flags"), &format!("{}/flags", path))?;
    node.metas = parse_metas(map.get("metas"), &format!("{}/metas", path))?;
    node.examples = parse_list(map.get("examples"), &format!("{}/examples", path))?;
    node.whens = parse_list(map.get("whens"), &format!("{}/whens", path))?
        .iter()
        .enumerate()
        .map(|(i, when)| parse_when(when, &format!("{}/whens/{}", path, i)))
        .collect::<Result<_, _>>()?;

    Ok(node)
}

fn parse_kind(type_name: &str, map: &Map<String, Value>, path: &str) -> Result<Kind, ConvertError> {
    let kind = match type_name {
        "number" => Kind::Number,
        "string" => Kind::String,
        "binary" => Kind::Binary,
        "date" => Kind::Date,
        "boolean" => Kind::Boolean,
        "any" => Kind::Any,
        "array" => {
            let items_path = format!("{}/items", path);
            let items = parse_list(map.get("items"), &items_path)?
                .iter()
                .enumerate()
                .map(|(i, item)| parse_node(item, &format!("{}/{}", items_path, i)))
                .collect::<Result<_, _>>()?;
            Kind::Array { items }
        }
        "object" => {
            let keys_path = format!("{}/keys", path);
            let keys = match map.get("keys") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Object(keys)) => parse_key_entries(keys, &keys_path)?,
                Some(other) => {
                    return Err(invalid(
                        &keys_path,
                        format!("expected object, got {}", json_type_name(other)),
                    ))
                }
            };
            Kind::Object { keys }
        }
        "alternatives" => {
            let matches_path = format!("{}/matches", path);
            let matches = parse_list(map.get("matches"), &matches_path)?
                .iter()
                .enumerate()
                .map(|(i, m)| parse_match(m, &format!("{}/{}", matches_path, i)))
                .collect::<Result<_, _>>()?;
            let base = parse_optional_node(map.get("base"), &format!("{}/base", path))?;
            Kind::Alternatives { matches, base }
        }
        "link" => {
            let reference = match map.get("link") {
                None | Some(Value::Null) => "#".to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => {
                    return Err(invalid(
                        &format!("{}/link", path),
                        format!("expected string, got {}", json_type_name(other)),
                    ))
                }
            };
            Kind::Link { reference }
        }
        other => {
            return Err(ConvertError::UnrecognizedKind {
                path: display_path(path),
                kind: other.to_string(),
            })
        }
    };
    Ok(kind)
}

fn parse_key_entries(map: &Map<String, Value>, path: &str) -> Result<Vec<ObjectKey>, ConvertError> {
    map.iter()
        .map(|(key, schema)| {
            let schema = parse_optional_node(Some(schema), &format!("{}/{}", path, key))?;
            Ok(ObjectKey {
                key: key.clone(),
                schema: schema.map(|s| *s),
            })
        })
        .collect()
}

fn parse_optional_node(
    value: Option<&Value>,
    path: &str,
) -> Result<Option<Box<SchemaNode>>, ConvertError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_node(value, path).map(|node| Some(Box::new(node))),
    }
}

fn parse_match(value: &Value, path: &str) -> Result<Match, ConvertError> {
    match value {
        Value::Object(map) if map.contains_key("ref") => parse_when(value, path).map(Match::Conditional),
        Value::Object(map) if map.contains_key("schema") && !map.contains_key("type") => {
            parse_node(&map["schema"], &format!("{}/schema", path)).map(Match::Schema)
        }
        other => parse_node(other, path).map(Match::Schema),
    }
}

fn parse_when(value: &Value, path: &str) -> Result<When, ConvertError> {
    let Value::Object(map) = value else {
        return Err(invalid(
            path,
            format!("expected object, got {}", json_type_name(value)),
        ));
    };

    let reference = map
        .get("ref")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(path, "conditional is missing its \"ref\" string"))?;

    Ok(When {
        reference: reference.to_string(),
        is: parse_optional_node(map.get("is"), &format!("{}/is", path))?,
        then: parse_optional_node(map.get("then"), &format!("{}/then", path))?,
        otherwise: parse_optional_node(map.get("otherwise"), &format!("{}/otherwise", path))?,
    })
}

fn parse_list(value: Option<&Value>, path: &str) -> Result<Vec<Value>, ConvertError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(values)) => Ok(values.clone()),
        Some(other) => Err(invalid(
            path,
            format!("expected array, got {}", json_type_name(other)),
        )),
    }
}

fn parse_rules(value: Option<&Value>, path: &str) -> Result<Vec<Rule>, ConvertError> {
    parse_list(value, path)?
        .into_iter()
        .enumerate()
        .map(|(i, rule)| match rule {
            Value::String(name) => Ok(Rule::new(name)),
            Value::Object(mut map) => {
                let rule_path = format!("{}/{}", path, i);
                let name = match map.remove("name") {
                    Some(Value::String(name)) => name,
                    _ => return Err(invalid(&rule_path, "rule is missing its \"name\" string")),
                };
                let args = match map.remove("args") {
                    None | Some(Value::Null) => Map::new(),
                    Some(Value::Object(args)) => args,
                    Some(other) => {
                        return Err(invalid(
                            &format!("{}/args", rule_path),
                            format!("expected object, got {}", json_type_name(&other)),
                        ))
                    }
                };
                Ok(Rule { name, args })
            }
            other => Err(invalid(
                &format!("{}/{}", path, i),
                format!("expected string or object, got {}", json_type_name(&other)),
            )),
        })
        .collect()
}

fn parse_metas(value: Option<&Value>, path: &str) -> Result<Vec<Map<String, Value>>, ConvertError> {
    parse_list(value, path)?
        .into_iter()
        .enumerate()
        .map(|(i, meta)| match meta {
            Value::Object(map) => Ok(map),
            other => Err(invalid(
                &format!("{}/{}", path, i),
                format!("expected object, got {}", json_type_name(&other)),
            )),
        })
        .collect()
}

fn parse_flags(value: Option<&Value>, path: &str) -> Result<Flags, ConvertError> {
    let map = match value {
        None | Some(Value::Null) => return Ok(Flags::default()),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(invalid(
                path,
                format!("expected object, got {}", json_type_name(other)),
            ))
        }
    };

    let string_flag = |key: &str| -> Result<Option<String>, ConvertError> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid(
                &format!("{}/{}", path, key),
                format!("expected string, got {}", json_type_name(other)),
            )),
        }
    };

    let bool_flag = |key: &str| -> Result<Option<bool>, ConvertError> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(invalid(
                &format!("{}/{}", path, key),
                format!("expected boolean, got {}", json_type_name(other)),
            )),
        }
    };

    let presence = match string_flag("presence")? {
        None => Presence::default(),
        Some(value) => Presence::parse(&value).ok_or_else(|| {
            invalid(
                &format!("{}/presence", path),
                format!(
                    "unknown presence \"{}\": expected required, optional, or forbidden",
                    value
                ),
            )
        })?,
    };

    let default = match (string_flag("defaultGenerator")?, map.get("default")) {
        (Some(generator), _) => Some(DefaultValue::Generator(generator)),
        (None, None | Some(Value::Null)) => None,
        (None, Some(value)) => Some(DefaultValue::Literal(value.clone())),
    };

    Ok(Flags {
        presence,
        description: string_flag("description")?,
        label: string_flag("label")?,
        default,
        encoding: string_flag("encoding")?,
        unknown: bool_flag("unknown")?,
        strict: bool_flag("strict")?.unwrap_or(false),
    })
}
