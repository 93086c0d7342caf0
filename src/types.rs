//! Protobuf to Go type mapping
//!
//! Maps descriptor type tags onto the Go types protoc-gen-go uses for struct
//! fields. Message references resolve to the referenced message's simple name,
//! which assumes the message is generated into the same Go package.

use crate::schema::{FieldShape, SchemaField, WireType};
use crate::GeneratorError;
use prost_types::field_descriptor_proto::Type;
use std::fmt;

/// A Go type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoType {
    /// Built-in scalar such as `int32` or `string`
    Scalar(&'static str),
    /// `[]byte`
    Bytes,
    /// Pointer to a message struct, e.g. `*Address`
    Pointer(String),
    /// Slice of the element type
    Slice(Box<GoType>),
    /// Map from key to value type
    Map(Box<GoType>, Box<GoType>),
}

impl fmt::Display for GoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoType::Scalar(name) => f.write_str(name),
            GoType::Bytes => f.write_str("[]byte"),
            GoType::Pointer(name) => write!(f, "*{}", name),
            GoType::Slice(elem) => write!(f, "[]{}", elem),
            GoType::Map(key, value) => write!(f, "map[{}]{}", key, value),
        }
    }
}

/// Map a field to the Go type of its setter parameter
pub fn map_field(field: &SchemaField) -> Result<GoType, GeneratorError> {
    let go_type = match &field.shape {
        FieldShape::Singular(wire) => map_wire_type(&field.full_name, wire)?,
        FieldShape::Repeated(elem) => {
            GoType::Slice(Box::new(map_wire_type(&field.full_name, elem)?))
        }
        FieldShape::Map { key, value } => GoType::Map(
            Box::new(map_wire_type(&field.full_name, key)?),
            Box::new(map_wire_type(&field.full_name, value)?),
        ),
    };

    Ok(go_type)
}

/// Map a single wire type
///
/// `field` is only used to identify the field in the error when the tag has
/// no Go mapping. Enums and groups are not mapped.
pub fn map_wire_type(field: &str, wire: &WireType) -> Result<GoType, GeneratorError> {
    let unknown = || GeneratorError::UnknownFieldType {
        field: field.to_string(),
        type_tag: wire.tag,
    };

    let r#type = Type::try_from(wire.tag).map_err(|_| unknown())?;

    let go_type = match r#type {
        Type::Double => GoType::Scalar("float64"),
        Type::Float => GoType::Scalar("float32"),
        Type::Int64 | Type::Sfixed64 | Type::Sint64 => GoType::Scalar("int64"),
        Type::Uint64 | Type::Fixed64 => GoType::Scalar("uint64"),
        Type::Int32 | Type::Sfixed32 | Type::Sint32 => GoType::Scalar("int32"),
        Type::Uint32 | Type::Fixed32 => GoType::Scalar("uint32"),
        Type::Bool => GoType::Scalar("bool"),
        Type::String => GoType::Scalar("string"),
        Type::Bytes => GoType::Bytes,
        Type::Message => {
            let name = wire
                .type_name
                .as_deref()
                .map(local_name)
                .filter(|n| !n.is_empty())
                .ok_or_else(unknown)?;
            GoType::Pointer(name.to_string())
        }
        Type::Enum | Type::Group => return Err(unknown()),
    };

    Ok(go_type)
}

/// Last segment of a dotted type name: `.pkg.v1.Address` -> `Address`
pub fn local_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}
