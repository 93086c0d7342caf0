//! Options parsing for the setter protobuf extensions
//!
//! This module handles parsing of `(setter.all_messages)`, `(setter.all_fields)`,
//! `(setter.include)` and `(setter.exclude)` from protobuf descriptors.
//!
//! Custom protobuf extensions are stored as extension fields in the options
//! messages, which prost drops when decoding into `prost_types`. We use
//! prost-reflect to decode these extensions from the raw request bytes into an
//! [`OptionsTable`], and fall back to `uninterpreted_option` entries for
//! descriptors that were built by hand.

use crate::GeneratorError;
use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, ExtensionDescriptor, Value};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, UninterpretedOption};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Extension name for the file-wide "all fields of all messages" flag
pub const ALL_MESSAGES_EXTENSION: &str = "setter.all_messages";

/// Extension name for the message-wide "all fields" flag
pub const ALL_FIELDS_EXTENSION: &str = "setter.all_fields";

/// Extension name for the field-level include override
pub const INCLUDE_EXTENSION: &str = "setter.include";

/// Extension name for the field-level exclude override
pub const EXCLUDE_EXTENSION: &str = "setter.exclude";

/// Setter options declared on a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// `(setter.all_messages)`
    pub all_messages: bool,
}

/// Setter options declared on a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageOptions {
    /// `(setter.all_fields)`
    pub all_fields: bool,
}

/// Setter options declared on a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// `(setter.include)`
    pub include: bool,
    /// `(setter.exclude)`
    pub exclude: bool,
}

/// Only the parts of a CodeGeneratorRequest needed to build a descriptor pool.
///
/// Keeping `proto_file` as raw bytes preserves extension fields inside options.
#[derive(Clone, PartialEq, Message)]
struct RawRequest {
    #[prost(bytes = "vec", repeated, tag = "15")]
    proto_file: Vec<Vec<u8>>,
}

/// Wire-compatible `google.protobuf.FileDescriptorSet`
#[derive(Clone, PartialEq, Message)]
struct RawFileSet {
    #[prost(bytes = "vec", repeated, tag = "1")]
    file: Vec<Vec<u8>>,
}

/// The setter extensions as resolved in a descriptor pool
struct SetterExtensions {
    all_messages: Option<ExtensionDescriptor>,
    all_fields: Option<ExtensionDescriptor>,
    include: Option<ExtensionDescriptor>,
    exclude: Option<ExtensionDescriptor>,
}

impl SetterExtensions {
    fn lookup(pool: &DescriptorPool) -> Option<Self> {
        let extensions = SetterExtensions {
            all_messages: pool.get_extension_by_name(ALL_MESSAGES_EXTENSION),
            all_fields: pool.get_extension_by_name(ALL_FIELDS_EXTENSION),
            include: pool.get_extension_by_name(INCLUDE_EXTENSION),
            exclude: pool.get_extension_by_name(EXCLUDE_EXTENSION),
        };

        let any = extensions.all_messages.is_some()
            || extensions.all_fields.is_some()
            || extensions.include.is_some()
            || extensions.exclude.is_some();

        any.then_some(extensions)
    }
}

/// Setter options pre-parsed from extension data
///
/// Keys use the proto file name and the message path within that file
/// (`Outer.Inner`), so lookups never depend on the package.
#[derive(Debug, Default)]
pub struct OptionsTable {
    /// file_name -> FileOptions
    files: HashMap<String, FileOptions>,
    /// (file_name, message_path) -> MessageOptions
    messages: HashMap<(String, String), MessageOptions>,
    /// (file_name, message_path, field_number) -> FieldOptions
    fields: HashMap<(String, String, i32), FieldOptions>,
}

impl OptionsTable {
    /// Extract setter options from raw CodeGeneratorRequest bytes
    ///
    /// Returns an empty table when none of the request's files declare the
    /// setter extensions.
    pub fn from_request_bytes(bytes: &[u8]) -> Result<Self, GeneratorError> {
        let request = RawRequest::decode(bytes)
            .map_err(|e| GeneratorError::DecodeError(format!("CodeGeneratorRequest: {}", e)))?;

        let set = RawFileSet {
            file: request.proto_file,
        };
        let mut table = OptionsTable::default();

        // Hand-built descriptors may carry options the pool cannot resolve;
        // those are still read from uninterpreted_option later
        let pool = match DescriptorPool::decode(set.encode_to_vec().as_slice()) {
            Ok(pool) => pool,
            Err(e) => {
                warn!(
                    error = %e,
                    "failed to build descriptor pool, using uninterpreted options only"
                );
                return Ok(table);
            }
        };

        let Some(extensions) = SetterExtensions::lookup(&pool) else {
            debug!("setter extensions not present in request, using uninterpreted options only");
            return Ok(table);
        };

        let file_desc = pool
            .get_message_by_name("google.protobuf.FileDescriptorProto")
            .ok_or_else(|| {
                GeneratorError::OptionsParseError(
                    "google.protobuf.FileDescriptorProto not found in descriptor pool".to_string(),
                )
            })?;

        for file_bytes in &set.file {
            let file = DynamicMessage::decode(file_desc.clone(), file_bytes.as_slice())
                .map_err(|e| GeneratorError::DecodeError(format!("FileDescriptorProto: {}", e)))?;
            table.extract_file(&extensions, &file);
        }

        Ok(table)
    }

    /// Extract options from a FileDescriptorProto DynamicMessage
    fn extract_file(&mut self, extensions: &SetterExtensions, file: &DynamicMessage) {
        let file_name = string_field(file, "name");

        if let Some(opts) = options_message(file) {
            if let Some(all_messages) = extension_flag(&opts, extensions.all_messages.as_ref()) {
                trace!(file = %file_name, all_messages, "file options");
                self.files.insert(file_name.clone(), FileOptions { all_messages });
            }
        }

        for msg in repeated_messages(file, "message_type") {
            self.extract_message(extensions, &file_name, &msg, "");
        }
    }

    /// Extract options from a DescriptorProto DynamicMessage and its nested types
    fn extract_message(
        &mut self,
        extensions: &SetterExtensions,
        file_name: &str,
        msg: &DynamicMessage,
        parent_path: &str,
    ) {
        let msg_name = string_field(msg, "name");
        let path = if parent_path.is_empty() {
            msg_name
        } else {
            format!("{}.{}", parent_path, msg_name)
        };

        if let Some(opts) = options_message(msg) {
            if let Some(all_fields) = extension_flag(&opts, extensions.all_fields.as_ref()) {
                self.messages.insert(
                    (file_name.to_string(), path.clone()),
                    MessageOptions { all_fields },
                );
            }
        }

        for field in repeated_messages(msg, "field") {
            let Some(opts) = options_message(&field) else {
                continue;
            };

            let include = extension_flag(&opts, extensions.include.as_ref());
            let exclude = extension_flag(&opts, extensions.exclude.as_ref());
            if include.is_none() && exclude.is_none() {
                continue;
            }

            let number = field
                .get_field_by_name("number")
                .and_then(|v| v.as_i32())
                .unwrap_or(0);

            self.fields.insert(
                (file_name.to_string(), path.clone(), number),
                FieldOptions {
                    include: include.unwrap_or(false),
                    exclude: exclude.unwrap_or(false),
                },
            );
        }

        for nested in repeated_messages(msg, "nested_type") {
            self.extract_message(extensions, file_name, &nested, &path);
        }
    }

    /// Setter options for a file
    pub fn file_options(&self, file: &FileDescriptorProto) -> FileOptions {
        if let Some(found) = self.files.get(file.name()) {
            return *found;
        }

        let uninterpreted = file
            .options
            .as_ref()
            .map(|o| o.uninterpreted_option.as_slice())
            .unwrap_or_default();

        FileOptions {
            all_messages: uninterpreted_flag(uninterpreted, ALL_MESSAGES_EXTENSION),
        }
    }

    /// Setter options for a message at `message_path` within `file_name`
    pub fn message_options(
        &self,
        file_name: &str,
        message_path: &str,
        message: &DescriptorProto,
    ) -> MessageOptions {
        let key = (file_name.to_string(), message_path.to_string());
        if let Some(found) = self.messages.get(&key) {
            return *found;
        }

        let uninterpreted = message
            .options
            .as_ref()
            .map(|o| o.uninterpreted_option.as_slice())
            .unwrap_or_default();

        MessageOptions {
            all_fields: uninterpreted_flag(uninterpreted, ALL_FIELDS_EXTENSION),
        }
    }

    /// Setter options for a field of the message at `message_path`
    pub fn field_options(
        &self,
        file_name: &str,
        message_path: &str,
        field: &FieldDescriptorProto,
    ) -> FieldOptions {
        let key = (
            file_name.to_string(),
            message_path.to_string(),
            field.number(),
        );
        if let Some(found) = self.fields.get(&key) {
            return *found;
        }

        let uninterpreted = field
            .options
            .as_ref()
            .map(|o| o.uninterpreted_option.as_slice())
            .unwrap_or_default();

        FieldOptions {
            include: uninterpreted_flag(uninterpreted, INCLUDE_EXTENSION),
            exclude: uninterpreted_flag(uninterpreted, EXCLUDE_EXTENSION),
        }
    }
}

// =============================================================================
// DynamicMessage helpers
// =============================================================================

fn string_field(msg: &DynamicMessage, name: &str) -> String {
    msg.get_field_by_name(name)
        .and_then(|v| v.as_ref().as_str().map(|s| s.to_string()))
        .unwrap_or_default()
}

fn options_message(msg: &DynamicMessage) -> Option<DynamicMessage> {
    let cow = msg.get_field_by_name("options")?;
    cow.as_ref().as_message().cloned()
}

fn repeated_messages(msg: &DynamicMessage, name: &str) -> Vec<DynamicMessage> {
    let Some(cow) = msg.get_field_by_name(name) else {
        return Vec::new();
    };

    match cow.as_ref() {
        Value::List(values) => values
            .iter()
            .filter_map(|v| v.as_message().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Read a boolean extension if it is present on the options message
fn extension_flag(opts: &DynamicMessage, extension: Option<&ExtensionDescriptor>) -> Option<bool> {
    let extension = extension?;
    if !opts.has_extension(extension) {
        return None;
    }
    opts.get_extension(extension).as_bool()
}

// =============================================================================
// Uninterpreted option fallback
// =============================================================================

/// Read a boolean extension from uninterpreted options, defaulting to false
fn uninterpreted_flag(uninterpreted: &[UninterpretedOption], extension_name: &str) -> bool {
    uninterpreted
        .iter()
        .filter(|opt| is_extension_option(opt, extension_name))
        .last()
        .map(parse_bool_option)
        .unwrap_or(false)
}

/// Check if an uninterpreted option is exactly `(extension_name)`
fn is_extension_option(opt: &UninterpretedOption, extension_name: &str) -> bool {
    match opt.name.as_slice() {
        [only] => only.is_extension && only.name_part == extension_name,
        _ => false,
    }
}

/// Parse a boolean value from an uninterpreted option
fn parse_bool_option(opt: &UninterpretedOption) -> bool {
    if let Some(ref v) = opt.identifier_value {
        return v == "true";
    }
    if let Some(v) = opt.positive_int_value {
        return v != 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::uninterpreted_option::NamePart;

    fn flag(name: &str, value: &str) -> UninterpretedOption {
        UninterpretedOption {
            name: vec![NamePart {
                name_part: name.to_string(),
                is_extension: true,
            }],
            identifier_value: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_uninterpreted_flag() {
        let opts = vec![
            flag(INCLUDE_EXTENSION, "true"),
            flag(EXCLUDE_EXTENSION, "false"),
        ];
        assert!(uninterpreted_flag(&opts, INCLUDE_EXTENSION));
        assert!(!uninterpreted_flag(&opts, EXCLUDE_EXTENSION));
        assert!(!uninterpreted_flag(&opts, ALL_FIELDS_EXTENSION));
    }

    #[test]
    fn test_non_extension_name_is_ignored() {
        let mut opt = flag(INCLUDE_EXTENSION, "true");
        opt.name[0].is_extension = false;
        assert!(!uninterpreted_flag(&[opt], INCLUDE_EXTENSION));
    }

    #[test]
    fn test_parse_bool_from_int() {
        let opt = UninterpretedOption {
            identifier_value: None,
            positive_int_value: Some(1),
            ..flag(ALL_FIELDS_EXTENSION, "")
        };
        assert!(parse_bool_option(&opt));
    }

    #[test]
    fn test_field_options_fallback() {
        let table = OptionsTable::default();
        let field = FieldDescriptorProto {
            name: Some("secret".to_string()),
            number: Some(2),
            options: Some(prost_types::FieldOptions {
                uninterpreted_option: vec![flag(EXCLUDE_EXTENSION, "true")],
                ..Default::default()
            }),
            ..Default::default()
        };

        let opts = table.field_options("a.proto", "M", &field);
        assert_eq!(
            opts,
            FieldOptions {
                include: false,
                exclude: true
            }
        );
    }

    #[test]
    fn test_table_entry_wins_over_fallback() {
        let mut table = OptionsTable::default();
        table.messages.insert(
            ("a.proto".to_string(), "Outer.Inner".to_string()),
            MessageOptions { all_fields: true },
        );

        let message = DescriptorProto {
            name: Some("Inner".to_string()),
            ..Default::default()
        };
        assert!(table.message_options("a.proto", "Outer.Inner", &message).all_fields);
        assert!(!table.message_options("a.proto", "Inner", &message).all_fields);
    }

    #[test]
    fn test_request_without_extensions_yields_empty_table() {
        let request = prost_types::compiler::CodeGeneratorRequest {
            file_to_generate: vec!["a.proto".to_string()],
            proto_file: vec![FileDescriptorProto {
                name: Some("a.proto".to_string()),
                package: Some("a".to_string()),
                message_type: vec![DescriptorProto {
                    name: Some("M".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let table = OptionsTable::from_request_bytes(&request.encode_to_vec()).unwrap();
        assert!(table.files.is_empty());
        assert!(table.messages.is_empty());
        assert!(table.fields.is_empty());
    }
}
