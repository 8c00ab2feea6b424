//! joi-style validation schemas to OpenAPI
//!
//! Converts a tree of typed validation constraints (string, number, array,
//! object, alternatives, ...) into the equivalent OpenAPI schema object, and
//! collects named sub-schemas into reusable `components`.
//!
//! # Example
//!
//! ```
//! use joi_openapi::{convert, SchemaNode};
//! use serde_json::json;
//!
//! let schema = SchemaNode::object()
//!     .key("email", SchemaNode::string().email().required().meta(json!({ "className": "Email" })))
//!     .key("age", SchemaNode::number().integer().min(0));
//!
//! let result = convert(&schema);
//!
//! assert_eq!(
//!     result.fragment,
//!     Some(json!({
//!         "type": "object",
//!         "required": ["email"],
//!         "properties": {
//!             "email": { "$ref": "#/components/schemas/Email" },
//!             "age": { "type": "integer", "minimum": 0 }
//!         }
//!     }))
//! );
//! assert_eq!(
//!     result.components.get("schemas", "Email"),
//!     Some(&json!({ "type": "string", "format": "email" }))
//! );
//! ```
//!
//! # Meta tags
//!
//! | Tag | Effect |
//! |-----|--------|
//! | `swagger` | Fragment merged over the converted schema |
//! | `swaggerOverride` | With `swagger`, return the fragment verbatim |
//! | `className` | Store the schema as a component and reference it |
//! | `classTarget` | Component bucket (default `schemas`) |
//! | `swaggerIndex` | Which array item / alternative to convert (default 0) |
//! | `swaggerType` | `file` turns an `any` node into a form-data upload |

mod builder;
mod components;
mod converter;
mod error;
mod loader;
mod types;

pub use components::{reference, Components};
pub use converter::{convert, convert_value, convert_with, Conversion};
pub use error::ConvertError;
pub use loader::{
    is_url, load_schema, load_schema_auto, load_schema_str, parse_components, parse_schema,
};
pub use types::{
    json_type_name, patterns, DefaultValue, Flags, Kind, Match, ObjectKey, Presence, Rule,
    SchemaNode, When, DEFAULT_CLASS_TARGET, META_CLASS_NAME, META_CLASS_TARGET, META_SWAGGER,
    META_SWAGGER_INDEX, META_SWAGGER_OVERRIDE, META_SWAGGER_TYPE,
};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;
