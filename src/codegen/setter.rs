//! Go source rendering for setter methods

use super::selection::GenerationPlan;
use crate::GeneratorError;
use std::fmt::Write;

/// Render a plan into a complete Go source file
///
/// Every setter has the shape
///
/// ```go
/// func (t *User) SetUserId(userId int64) {
/// 	t.UserId = userId
/// }
/// ```
pub fn render(plan: &GenerationPlan) -> Result<String, GeneratorError> {
    let mut out = String::new();

    writeln!(out, "// Code generated by protoc-gen-setter. DO NOT EDIT.")?;
    writeln!(out, "// source: {}", plan.source)?;
    writeln!(out)?;
    writeln!(out, "package {}", plan.package)?;

    for message in &plan.messages {
        for setter in &message.setters {
            writeln!(out)?;
            writeln!(
                out,
                "func (t *{}) Set{}({} {}) {{",
                message.name, setter.field_name, setter.var_name, setter.go_type
            )?;
            writeln!(out, "\tt.{} = {}", setter.field_name, setter.var_name)?;
            writeln!(out, "}}")?;
        }
    }

    Ok(out)
}
