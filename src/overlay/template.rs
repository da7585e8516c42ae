//! `${NAME}` placeholder substitution for overlay doc templates.
//!
//! Each member kind resolves a fixed set of placeholders. The template is
//! scanned once; substituted text is never scanned again, so a doc line
//! containing `${LINES}` cannot recurse.

use crate::error::Diagnostic;
use crate::model::MemberKind;
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

pub const DEFAULT_MODULE_TEMPLATE: &str = "${LINES}";
pub const DEFAULT_FIELD_TEMPLATE: &str = "${LINES}";
pub const DEFAULT_FUNCTION_TEMPLATE: &str = "${LINES}";

/// Values a template may refer to.
pub struct TemplateVars<'a> {
    pub kind: MemberKind,
    pub identity: &'a str,
    pub name: &'a str,
    pub lines: &'a [String],
    /// Parameter names (functions only).
    pub params: &'a [String],
}

impl TemplateVars<'_> {
    fn resolve(&self, placeholder: &str) -> Option<String> {
        match (self.kind, placeholder) {
            (_, "LINES") => Some(self.lines.join("\n")),
            (MemberKind::Module, "MODULE_NAME") => Some(self.name.to_string()),
            (MemberKind::Field, "FIELD_NAME") => Some(self.name.to_string()),
            (MemberKind::Function, "FUNCTION_NAME") => Some(self.name.to_string()),
            (MemberKind::Function, "PARAMS") => Some(self.params.join(", ")),
            _ => None,
        }
    }
}

/// Substitute every placeholder in `template`.
///
/// An unknown placeholder makes the whole rendering fail; the caller emits
/// an empty fragment and reports the diagnostic.
pub fn render(vars: &TemplateVars, template: &str) -> Result<String, Diagnostic> {
    let mut unknown: Option<String> = None;
    let rendered = RE_PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        match vars.resolve(name) {
            Some(value) => value,
            None => {
                unknown.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match unknown {
        Some(placeholder) => Err(Diagnostic::TemplateResolution {
            member: vars.identity.to_string(),
            kind: vars.kind.label(),
            placeholder,
        }),
        None => Ok(rendered.into_owned()),
    }
}

/// Doc templates per member kind.
#[derive(Debug, Clone)]
pub struct Templates {
    pub module: String,
    pub field: String,
    pub function: String,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            module: DEFAULT_MODULE_TEMPLATE.to_string(),
            field: DEFAULT_FIELD_TEMPLATE.to_string(),
            function: DEFAULT_FUNCTION_TEMPLATE.to_string(),
        }
    }
}

impl Templates {
    /// Load overrides from `dir` (`module.tpl`, `field.tpl`, `function.tpl`).
    /// Missing files keep the built-in default.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("templates directory not found: {}", dir.display());
        }
        let mut templates = Templates::default();
        for (file, slot) in [
            ("module.tpl", &mut templates.module),
            ("field.tpl", &mut templates.field),
            ("function.tpl", &mut templates.function),
        ] {
            let path = dir.join(file);
            if path.is_file() {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template: {}", path.display()))?;
                *slot = content.trim_end_matches('\n').to_string();
            }
        }
        Ok(templates)
    }

    pub fn for_kind(&self, kind: MemberKind) -> &str {
        match kind {
            MemberKind::Module => &self.module,
            MemberKind::Field => &self.field,
            MemberKind::Function => &self.function,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn field_vars<'a>(lines: &'a [String]) -> TemplateVars<'a> {
        TemplateVars {
            kind: MemberKind::Field,
            identity: "m.lua#speed",
            name: "speed",
            lines,
            params: &[],
        }
    }

    #[test]
    fn joins_lines_and_name() {
        let lines = vec!["Units per tick.".to_string(), "Never negative.".to_string()];
        let out = render(&field_vars(&lines), "${FIELD_NAME}: ${LINES}").unwrap();
        assert_eq!(out, "speed: Units per tick.\nNever negative.");
    }

    #[test]
    fn replaces_every_occurrence() {
        let out = render(&field_vars(&[]), "${FIELD_NAME}/${FIELD_NAME}").unwrap();
        assert_eq!(out, "speed/speed");
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let lines = vec!["literal ${FIELD_NAME}".to_string()];
        let out = render(&field_vars(&lines), "${LINES}").unwrap();
        assert_eq!(out, "literal ${FIELD_NAME}");
    }

    #[test]
    fn placeholder_of_other_kind_is_unknown() {
        let err = render(&field_vars(&[]), "${FUNCTION_NAME}").unwrap_err();
        assert_eq!(
            err,
            Diagnostic::TemplateResolution {
                member: "m.lua#speed".to_string(),
                kind: "field",
                placeholder: "FUNCTION_NAME".to_string(),
            }
        );
    }

    #[test]
    fn function_params_are_comma_joined() {
        let params = vec!["x".to_string(), "y".to_string()];
        let vars = TemplateVars {
            kind: MemberKind::Function,
            identity: "m.lua#move(x,y)",
            name: "move",
            lines: &[],
            params: &params,
        };
        assert_eq!(render(&vars, "${FUNCTION_NAME}(${PARAMS})").unwrap(), "move(x, y)");
    }

    #[test]
    fn load_overrides_only_present_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("field.tpl"), "${FIELD_NAME}\n").unwrap();
        let templates = Templates::load(dir.path()).unwrap();
        assert_eq!(templates.field, "${FIELD_NAME}");
        assert_eq!(templates.module, DEFAULT_MODULE_TEMPLATE);
    }

    #[test]
    fn load_missing_dir_fails() {
        assert!(Templates::load(Path::new("/nonexistent/templates")).is_err());
    }
}
