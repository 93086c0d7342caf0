//! Code generation modules for Go setters
//!
//! This module contains the code generation logic for creating Go setter
//! methods from Protocol Buffer messages.

pub mod package;
pub mod selection;
pub mod setter;

use crate::config::Config;
use crate::schema::SchemaFile;
use crate::GeneratorError;
use prost_types::compiler::code_generator_response::File;
use tracing::{debug, info};

/// Generate the setter file for one proto file
///
/// Returns None if no field in the file is selected.
pub fn generate_file(file: &SchemaFile, config: &Config) -> Result<Option<File>, GeneratorError> {
    let package = package::derive(file, config)?;
    let plan = selection::plan_file(file, package)?;

    if plan.is_empty() {
        debug!(file = %file.name, "no fields selected, skipping");
        return Ok(None);
    }

    let content = setter::render(&plan)?;
    info!(
        file = %file.name,
        output = %plan.output_path,
        setters = plan.setter_count(),
        "generated setters"
    );

    Ok(Some(File {
        name: Some(plan.output_path),
        content: Some(content),
        ..Default::default()
    }))
}
