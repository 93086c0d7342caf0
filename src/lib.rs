//! protoc-gen-setter library
//!
//! This crate provides the code generation logic for turning annotated
//! Protocol Buffer definitions into Go setter methods.
//!
//! A field receives a setter when its `(setter.exclude)` option is not set and
//! either `(setter.include)`, the message-wide `(setter.all_fields)` or the
//! file-wide `(setter.all_messages)` option is set.

#![deny(missing_docs)]
#![deny(warnings)]

pub mod codegen;
pub mod config;
pub mod generator;
pub mod options;
pub mod schema;
pub mod types;

use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use thiserror::Error;

/// Errors that can occur during code generation
///
/// Every variant is fatal for the whole run: no output is produced for any
/// file once one of these is returned.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Failed to parse protobuf options/extensions
    #[error("Failed to parse options: {0}")]
    OptionsParseError(String),

    /// A selected field has a wire type with no Go mapping
    #[error("Unknown field type {type_tag} for field {field}")]
    UnknownFieldType {
        /// Fully qualified name of the offending field
        field: String,
        /// Raw `FieldDescriptorProto.type` value
        type_tag: i32,
    },

    /// Invalid plugin configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to write the generated source
    #[error("Failed to render setters: {0}")]
    Render(#[from] std::fmt::Error),

    /// A file listed in `file_to_generate` is missing from `proto_file`
    #[error("File to generate not found in request: {0}")]
    MissingFile(String),

    /// Failed to decode protobuf message
    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// Generate Go setters from a protobuf CodeGeneratorRequest
///
/// Options are read from `uninterpreted_option` entries only, since extension
/// values do not survive decoding into `prost_types`.
pub fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    generator::generate(request)
}

/// Generate Go setters from raw protobuf bytes
///
/// This entry point preserves extension data by using prost-reflect for decoding.
pub fn generate_from_bytes(bytes: &[u8]) -> Result<CodeGeneratorResponse, GeneratorError> {
    generator::generate_from_bytes(bytes)
}
