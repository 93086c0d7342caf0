//! Read-only schema view consumed by the generator
//!
//! Flattens a `FileDescriptorProto` into the handful of facts the selection
//! and type mapping steps need: names, resolved setter options and the shape
//! of each field's wire type.

use crate::options::OptionsTable;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

/// One proto file with its messages
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFile {
    /// Path of the file as given to protoc, e.g. `api/user.proto`
    pub name: String,
    /// Proto package, possibly empty
    pub package: String,
    /// `option go_package`, if declared and non-empty
    pub go_package: Option<String>,
    /// `(setter.all_messages)`
    pub all_messages: bool,
    /// All messages, nested ones included, in declaration order
    pub messages: Vec<SchemaMessage>,
}

/// A message and its fields
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMessage {
    /// Simple name, used as the Go receiver type
    pub name: String,
    /// Fully qualified name without a leading dot
    pub full_name: String,
    /// `(setter.all_fields)`
    pub all_fields: bool,
    /// Fields in declaration order
    pub fields: Vec<SchemaField>,
}

/// A single field
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Declared name, e.g. `user_id`
    pub name: String,
    /// Fully qualified name, used in error messages
    pub full_name: String,
    /// Cardinality and element types
    pub shape: FieldShape,
    /// `(setter.include)`
    pub include: bool,
    /// `(setter.exclude)`
    pub exclude: bool,
}

/// Cardinality of a field together with its element wire types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Singular field, optional or not
    Singular(WireType),
    /// Repeated non-map field
    Repeated(WireType),
    /// Map field with independently typed key and value
    Map {
        /// Key type
        key: WireType,
        /// Value type
        value: WireType,
    },
}

/// A raw descriptor type tag plus the referenced type name for messages
///
/// The tag is kept as the raw `i32` so that values this crate does not know
/// about reach the type mapper, which rejects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireType {
    /// `FieldDescriptorProto.type`
    pub tag: i32,
    /// `FieldDescriptorProto.type_name`, e.g. `.pkg.Address`
    pub type_name: Option<String>,
}

impl WireType {
    /// A scalar wire type without a referenced type name
    pub fn scalar(r#type: Type) -> Self {
        WireType {
            tag: r#type as i32,
            type_name: None,
        }
    }

    /// A message reference to the given fully qualified type name
    pub fn message(type_name: impl Into<String>) -> Self {
        WireType {
            tag: Type::Message as i32,
            type_name: Some(type_name.into()),
        }
    }

    fn from_descriptor(field: &FieldDescriptorProto) -> Self {
        WireType {
            tag: field.r#type.unwrap_or_default(),
            type_name: field.type_name.clone().filter(|n| !n.is_empty()),
        }
    }
}

impl SchemaFile {
    /// Build the view for one file, resolving setter options through `options`
    pub fn from_descriptor(file: &FileDescriptorProto, options: &OptionsTable) -> Self {
        let go_package = file
            .options
            .as_ref()
            .and_then(|o| o.go_package.clone())
            .filter(|p| !p.is_empty());

        let mut schema = SchemaFile {
            name: file.name().to_string(),
            package: file.package().to_string(),
            go_package,
            all_messages: options.file_options(file).all_messages,
            messages: Vec::new(),
        };

        let walker = MessageWalker {
            file_name: file.name(),
            options,
        };
        walker.collect(file.package(), "", &file.message_type, &mut schema.messages);

        schema
    }
}

struct MessageWalker<'a> {
    file_name: &'a str,
    options: &'a OptionsTable,
}

impl MessageWalker<'_> {
    /// Depth-first, parents before their nested messages
    fn collect(
        &self,
        scope: &str,
        parent_path: &str,
        messages: &[DescriptorProto],
        out: &mut Vec<SchemaMessage>,
    ) {
        for message in messages {
            if is_map_entry(message) {
                continue;
            }

            let name = message.name().to_string();
            let full_name = qualify(scope, &name);
            let path = qualify(parent_path, &name);

            let fields = message
                .field
                .iter()
                .map(|field| self.field(message, &full_name, &path, field))
                .collect();

            out.push(SchemaMessage {
                all_fields: self
                    .options
                    .message_options(self.file_name, &path, message)
                    .all_fields,
                name,
                full_name: full_name.clone(),
                fields,
            });

            self.collect(&full_name, &path, &message.nested_type, out);
        }
    }

    fn field(
        &self,
        message: &DescriptorProto,
        message_full_name: &str,
        message_path: &str,
        field: &FieldDescriptorProto,
    ) -> SchemaField {
        let options = self
            .options
            .field_options(self.file_name, message_path, field);

        SchemaField {
            name: field.name().to_string(),
            full_name: qualify(message_full_name, field.name()),
            shape: field_shape(message, message_full_name, field),
            include: options.include,
            exclude: options.exclude,
        }
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

fn is_map_entry(message: &DescriptorProto) -> bool {
    message
        .options
        .as_ref()
        .and_then(|o| o.map_entry)
        .unwrap_or(false)
}

fn field_shape(
    message: &DescriptorProto,
    message_full_name: &str,
    field: &FieldDescriptorProto,
) -> FieldShape {
    if field.label() != Label::Repeated {
        return FieldShape::Singular(WireType::from_descriptor(field));
    }

    match map_entry(message, message_full_name, field) {
        Some(entry) => {
            let entry_type = |number: i32| {
                entry
                    .field
                    .iter()
                    .find(|f| f.number() == number)
                    .map(WireType::from_descriptor)
                    .unwrap_or(WireType {
                        tag: 0,
                        type_name: None,
                    })
            };

            FieldShape::Map {
                key: entry_type(1),
                value: entry_type(2),
            }
        }
        None => FieldShape::Repeated(WireType::from_descriptor(field)),
    }
}

/// Find the synthetic `<Field>Entry` message backing a map field
///
/// Map entries are always nested directly inside the message declaring the
/// map field.
fn map_entry<'a>(
    message: &'a DescriptorProto,
    message_full_name: &str,
    field: &FieldDescriptorProto,
) -> Option<&'a DescriptorProto> {
    if field.r#type != Some(Type::Message as i32) {
        return None;
    }

    let type_name = field.type_name().trim_start_matches('.');

    message
        .nested_type
        .iter()
        .filter(|nested| is_map_entry(nested))
        .find(|nested| type_name == qualify(message_full_name, nested.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_field(name: &str, number: i32, r#type: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(Label::Optional.into()),
            r#type: Some(r#type.into()),
            ..Default::default()
        }
    }

    fn map_file() -> FileDescriptorProto {
        let entry = DescriptorProto {
            name: Some("AddressesEntry".to_string()),
            field: vec![
                scalar_field("key", 1, Type::Int32),
                FieldDescriptorProto {
                    type_name: Some(".shop.Address".to_string()),
                    ..scalar_field("value", 2, Type::Message)
                },
            ],
            options: Some(prost_types::MessageOptions {
                map_entry: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        let customer = DescriptorProto {
            name: Some("Customer".to_string()),
            field: vec![
                FieldDescriptorProto {
                    label: Some(Label::Repeated.into()),
                    type_name: Some(".shop.Customer.AddressesEntry".to_string()),
                    ..scalar_field("addresses", 1, Type::Message)
                },
                FieldDescriptorProto {
                    label: Some(Label::Repeated.into()),
                    ..scalar_field("tags", 2, Type::String)
                },
            ],
            nested_type: vec![
                entry,
                DescriptorProto {
                    name: Some("Note".to_string()),
                    field: vec![scalar_field("text", 1, Type::String)],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        FileDescriptorProto {
            name: Some("shop/customer.proto".to_string()),
            package: Some("shop".to_string()),
            message_type: vec![customer],
            ..Default::default()
        }
    }

    #[test]
    fn test_map_and_repeated_shapes() {
        let schema = SchemaFile::from_descriptor(&map_file(), &OptionsTable::default());
        let customer = &schema.messages[0];

        assert_eq!(
            customer.fields[0].shape,
            FieldShape::Map {
                key: WireType::scalar(Type::Int32),
                value: WireType::message(".shop.Address"),
            }
        );
        assert_eq!(
            customer.fields[1].shape,
            FieldShape::Repeated(WireType::scalar(Type::String))
        );
    }

    #[test]
    fn test_nested_messages_without_map_entries() {
        let schema = SchemaFile::from_descriptor(&map_file(), &OptionsTable::default());

        let names: Vec<_> = schema
            .messages
            .iter()
            .map(|m| m.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["shop.Customer", "shop.Customer.Note"]);
        assert_eq!(schema.messages[1].name, "Note");
        assert_eq!(
            schema.messages[1].fields[0].full_name,
            "shop.Customer.Note.text"
        );
    }

    #[test]
    fn test_go_package_and_defaults() {
        let mut file = map_file();
        file.options = Some(prost_types::FileOptions {
            go_package: Some(String::new()),
            ..Default::default()
        });

        let schema = SchemaFile::from_descriptor(&file, &OptionsTable::default());
        assert_eq!(schema.go_package, None);
        assert!(!schema.all_messages);
        assert!(!schema.messages[0].all_fields);
        assert!(!schema.messages[0].fields[0].include);
        assert!(!schema.messages[0].fields[0].exclude);
    }
}
