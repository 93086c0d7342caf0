//! Field selection and generation plans
//!
//! Decides which fields receive a setter and collects them, with their Go
//! names and types, into a [`GenerationPlan`] for one proto file.

use super::package::GoPackage;
use crate::schema::{SchemaField, SchemaFile};
use crate::types::{map_field, GoType};
use crate::GeneratorError;
use heck::{ToLowerCamelCase, ToUpperCamelCase};
use tracing::{debug, trace};

/// Field-level override derived from `(setter.include)` and `(setter.exclude)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// `(setter.exclude)` is set; wins over include
    Excluded,
    /// `(setter.include)` is set
    Included,
    /// No override; the message and file flags decide
    DefaultFromScope,
}

impl Selection {
    /// Combine the two override flags, exclude first
    pub fn from_overrides(include: bool, exclude: bool) -> Self {
        if exclude {
            Selection::Excluded
        } else if include {
            Selection::Included
        } else {
            Selection::DefaultFromScope
        }
    }

    /// Whether the field is selected given the enclosing scope flags
    pub fn is_selected(self, message_all: bool, file_all: bool) -> bool {
        match self {
            Selection::Excluded => false,
            Selection::Included => true,
            Selection::DefaultFromScope => message_all || file_all,
        }
    }
}

/// Decide whether a setter is generated for one field
///
/// An unset all-flag reads as `false`, so a message cannot opt out of a
/// file-wide `all_messages`; only per-field excludes can.
pub fn resolve(file_all: bool, message_all: bool, include: bool, exclude: bool) -> bool {
    Selection::from_overrides(include, exclude).is_selected(message_all, file_all)
}

/// Everything needed to render one output file
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPlan {
    /// Proto file the plan was built from
    pub source: String,
    /// Go package clause
    pub package: String,
    /// Output path relative to the plugin output directory
    pub output_path: String,
    /// Messages with at least one selected field
    pub messages: Vec<PlannedMessage>,
}

impl GenerationPlan {
    /// True when no field in the file was selected
    pub fn is_empty(&self) -> bool {
        self.messages.iter().all(|m| m.setters.is_empty())
    }

    /// Total number of setters in the plan
    pub fn setter_count(&self) -> usize {
        self.messages.iter().map(|m| m.setters.len()).sum()
    }
}

/// A message receiving setters
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMessage {
    /// Go receiver type name
    pub name: String,
    /// Setters in field declaration order
    pub setters: Vec<PlannedSetter>,
}

/// One setter method
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSetter {
    /// Go struct field name, e.g. `UserId`
    pub field_name: String,
    /// Parameter name, e.g. `userId`
    pub var_name: String,
    /// Parameter type
    pub go_type: GoType,
}

impl PlannedSetter {
    fn new(field: &SchemaField) -> Result<Self, GeneratorError> {
        Ok(PlannedSetter {
            field_name: field.name.to_upper_camel_case(),
            var_name: parameter_name(&field.name),
            go_type: map_field(field)?,
        })
    }
}

/// Build the plan for one file
///
/// Fails on the first selected field whose type cannot be mapped.
/// Unselected fields are never type-checked.
pub fn plan_file(file: &SchemaFile, package: GoPackage) -> Result<GenerationPlan, GeneratorError> {
    let mut messages = Vec::new();

    for message in &file.messages {
        let mut setters = Vec::new();

        for field in &message.fields {
            if !resolve(
                file.all_messages,
                message.all_fields,
                field.include,
                field.exclude,
            ) {
                trace!(field = %field.full_name, "field not selected");
                continue;
            }

            let setter = PlannedSetter::new(field)?;
            debug!(field = %field.full_name, go_type = %setter.go_type, "selected field");
            setters.push(setter);
        }

        if !setters.is_empty() {
            messages.push(PlannedMessage {
                name: message.name.clone(),
                setters,
            });
        }
    }

    Ok(GenerationPlan {
        source: file.name.clone(),
        package: package.name,
        output_path: package.output_path,
        messages,
    })
}

/// Go keywords plus the receiver name used by generated setters
const RESERVED: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "t",
    "type",
    "var",
];

/// Lower camel case parameter name that is a valid Go identifier
fn parameter_name(field_name: &str) -> String {
    let name = field_name.to_lower_camel_case();
    if RESERVED.contains(&name.as_str()) {
        format!("{}_", name)
    } else {
        name
    }
}
