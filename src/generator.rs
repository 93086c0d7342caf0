//! Request to response orchestration
//!
//! Every file in `file_to_generate` is planned and rendered independently.
//! Any error aborts the whole run, so a response either carries all generated
//! files or none.

use crate::codegen;
use crate::config::Config;
use crate::options::OptionsTable;
use crate::schema::SchemaFile;
use crate::GeneratorError;
use prost::Message;
use prost_types::compiler::code_generator_response::Feature;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use tracing::debug;

/// Generate from an already decoded request
///
/// Only `uninterpreted_option` entries are visible on this path.
pub fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    generate_with_options(&request, &OptionsTable::default())
}

/// Generate from raw request bytes, reading option extensions with prost-reflect
pub fn generate_from_bytes(bytes: &[u8]) -> Result<CodeGeneratorResponse, GeneratorError> {
    let options = OptionsTable::from_request_bytes(bytes)?;
    let request = CodeGeneratorRequest::decode(bytes)
        .map_err(|e| GeneratorError::DecodeError(format!("CodeGeneratorRequest: {}", e)))?;

    generate_with_options(&request, &options)
}

fn generate_with_options(
    request: &CodeGeneratorRequest,
    options: &OptionsTable,
) -> Result<CodeGeneratorResponse, GeneratorError> {
    let config = Config::from_parameter(request.parameter.as_deref())?;
    debug!(?config, files = request.file_to_generate.len(), "starting generation");

    let mut files = Vec::new();

    for name in &request.file_to_generate {
        let descriptor = request
            .proto_file
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| GeneratorError::MissingFile(name.clone()))?;

        let schema = SchemaFile::from_descriptor(descriptor, options);
        if let Some(file) = codegen::generate_file(&schema, &config)? {
            files.push(file);
        }
    }

    Ok(CodeGeneratorResponse {
        file: files,
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    })
}
