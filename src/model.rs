//! Structural model handed over by the native API parser.
//!
//! Read-only for the whole run. Units are keyed by id in a `BTreeMap` so
//! every pass walks them in the same lexicographic order.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The complete parse result: unit id → unit.
#[derive(Debug, Default, Deserialize)]
pub struct StructuralModel {
    #[serde(default)]
    pub units: BTreeMap<String, StructuralUnit>,
}

/// One parsed native source module.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StructuralUnit {
    /// Logical path below the native root, e.g. `client/ISUI/ISButton.lua`.
    pub path: String,
    /// Comment lines the parser found at the top of the module.
    #[serde(default)]
    pub doc: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldSig>,
    #[serde(default)]
    pub functions: Vec<FunctionSig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSig {
    pub name: String,
    /// `None` when the parser could not resolve the type.
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionSig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamSig>,
    #[serde(default)]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamSig {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
}

/// Declaration kinds sharing one merge/render contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Module,
    Field,
    Function,
}

impl MemberKind {
    pub fn label(self) -> &'static str {
        match self {
            MemberKind::Module => "module",
            MemberKind::Field => "field",
            MemberKind::Function => "function",
        }
    }
}

/// A single thing the generator emits, borrowed from its unit.
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Module { id: &'a str, unit: &'a StructuralUnit },
    Field { unit_id: &'a str, field: &'a FieldSig },
    Function { unit_id: &'a str, function: &'a FunctionSig },
}

impl Member<'_> {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Module { .. } => MemberKind::Module,
            Member::Field { .. } => MemberKind::Field,
            Member::Function { .. } => MemberKind::Function,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Member::Module { unit, .. } => &unit.path,
            Member::Field { field, .. } => &field.name,
            Member::Function { function, .. } => &function.name,
        }
    }

    /// Overlay key: name plus signature shape.
    pub fn identity(&self) -> String {
        match self {
            Member::Module { id, .. } => id.to_string(),
            Member::Field { unit_id, field } => format!("{}#{}", unit_id, field.name),
            Member::Function { unit_id, function } => {
                let params: Vec<&str> = function.params.iter().map(|p| p.name.as_str()).collect();
                format!("{}#{}({})", unit_id, function.name, params.join(","))
            }
        }
    }
}

impl StructuralUnit {
    /// Fields and functions of this unit, sorted by identity.
    pub fn members<'a>(&'a self, unit_id: &'a str) -> Vec<Member<'a>> {
        let mut members: Vec<Member<'a>> = self
            .fields
            .iter()
            .map(|field| Member::Field { unit_id, field })
            .chain(
                self.functions
                    .iter()
                    .map(|function| Member::Function { unit_id, function }),
            )
            .collect();
        members.sort_by_cached_key(|m| m.identity());
        members
    }

    /// Identifier used for the unit's ambient namespace.
    /// "client/ISUI/ISButton.lua" → "ISButton", "shared/my-util.lua" → "my_util"
    pub fn ident(&self) -> String {
        let filename = self.path.rsplit('/').next().unwrap_or(&self.path);
        let stem = filename.strip_suffix(".lua").unwrap_or(filename);
        let mut ident: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        ident
    }
}

/// Read and decode the parser's JSON output.
pub fn load(path: &Path) -> Result<StructuralModel> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read structural model: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to decode structural model: {}", path.display()))
}

/// Empty or missing types count as unresolved.
pub fn resolved(ty: &Option<String>) -> Option<&str> {
    ty.as_deref().map(str::trim).filter(|t| !t.is_empty())
}
