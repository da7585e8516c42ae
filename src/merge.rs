//! Overlay merge: parsed structural facts + persisted overlay → declaration.
//!
//! `merge` is pure. Whether a synthesized default gets remembered for the
//! run is up to the caller (see [`crate::context::GenContext::merge`]).

use crate::error::Diagnostic;
use crate::model::{self, Member, MemberKind};
use crate::overlay::DocOverlay;

/// Permissive fallback for types the parser could not resolve.
pub const WILDCARD_TYPE: &str = "any";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedParam {
    pub name: String,
    pub types: Vec<String>,
}

/// Final typed, documented declaration. Recomputed every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedMember {
    pub kind: MemberKind,
    pub identity: String,
    pub name: String,
    /// Field type union, or function return type union. Empty for modules.
    pub types: Vec<String>,
    pub doc_lines: Vec<String>,
    pub params: Vec<MergedParam>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub member: MergedMember,
    /// Set when no overlay existed and a default one was synthesized.
    pub synthesized: Option<DocOverlay>,
}

/// Combine one structural member with its overlay, if any.
pub fn merge(member: &Member, overlay: Option<&DocOverlay>) -> Result<Merged, Diagnostic> {
    let (overlay, synthesized) = match overlay {
        Some(o) => (o.clone(), None),
        None => {
            let default = DocOverlay::default();
            (default.clone(), Some(default))
        }
    };
    let identity = member.identity();
    let policy = overlay.apply_unknown_type;

    let unresolved = |detail: String| Diagnostic::UnresolvedType {
        member: identity.clone(),
        detail,
    };

    let (types, params) = match member {
        Member::Module { .. } => (Vec::new(), Vec::new()),
        Member::Field { field, .. } => {
            let types = if overlay.types.is_empty() {
                vec![resolve_type(&field.ty, policy).ok_or_else(|| unresolved("field type".to_string()))?]
            } else {
                overlay.types.clone()
            };
            (types, Vec::new())
        }
        Member::Function { function, .. } => {
            let mut params = Vec::with_capacity(function.params.len());
            for param in &function.params {
                let ty = resolve_type(&param.ty, policy)
                    .ok_or_else(|| unresolved(format!("parameter `{}`", param.name)))?;
                params.push(MergedParam {
                    name: param.name.clone(),
                    types: vec![ty],
                });
            }
            let types = if overlay.types.is_empty() {
                vec![resolve_type(&function.returns, policy)
                    .ok_or_else(|| unresolved("return type".to_string()))?]
            } else {
                overlay.types.clone()
            };
            (types, params)
        }
    };

    let doc_lines = match member {
        // Parser-found module comments fill in until someone writes real docs.
        Member::Module { unit, .. } if overlay.doc.lines.is_empty() => unit.doc.clone(),
        _ => overlay.doc.lines.clone(),
    };

    Ok(Merged {
        member: MergedMember {
            kind: member.kind(),
            name: member.name().to_string(),
            identity,
            types,
            doc_lines,
            params,
        },
        synthesized,
    })
}

fn resolve_type(ty: &Option<String>, apply_unknown_type: bool) -> Option<String> {
    match model::resolved(ty) {
        Some(t) => Some(t.to_string()),
        None if apply_unknown_type => Some(WILDCARD_TYPE.to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSig, FunctionSig, ParamSig, StructuralUnit};
    use crate::overlay::DocLines;

    fn field(name: &str, ty: Option<&str>) -> FieldSig {
        FieldSig {
            name: name.to_string(),
            ty: ty.map(str::to_string),
        }
    }

    fn strict(types: &[&str]) -> DocOverlay {
        DocOverlay {
            doc: DocLines::default(),
            types: types.iter().map(|t| t.to_string()).collect(),
            apply_unknown_type: false,
        }
    }

    #[test]
    fn absent_overlay_synthesizes_default() {
        let f = field("speed", Some("number"));
        let merged = merge(&Member::Field { unit_id: "m.lua", field: &f }, None).unwrap();
        assert_eq!(merged.synthesized, Some(DocOverlay::default()));
        assert!(merged.synthesized.as_ref().unwrap().apply_unknown_type);
        assert!(merged.member.doc_lines.is_empty());
        assert_eq!(merged.member.types, ["number"]);
    }

    #[test]
    fn overlay_docs_and_types_copied_verbatim() {
        let f = field("speed", Some("number"));
        let overlay = DocOverlay {
            doc: DocLines {
                lines: vec!["  Indented line.".to_string(), String::new()],
            },
            types: vec!["number".to_string(), "nil".to_string()],
            apply_unknown_type: true,
        };
        let merged = merge(&Member::Field { unit_id: "m.lua", field: &f }, Some(&overlay)).unwrap();
        assert!(merged.synthesized.is_none());
        assert_eq!(merged.member.doc_lines, overlay.doc.lines);
        assert_eq!(merged.member.types, ["number", "nil"]);
    }

    #[test]
    fn unresolved_field_uses_wildcard_when_allowed() {
        let f = field("x", None);
        let merged = merge(&Member::Field { unit_id: "m.lua", field: &f }, None).unwrap();
        assert_eq!(merged.member.types, [WILDCARD_TYPE]);
    }

    #[test]
    fn unresolved_field_fails_when_forbidden() {
        let f = field("x", None);
        let err = merge(&Member::Field { unit_id: "m.lua", field: &f }, Some(&strict(&[]))).unwrap_err();
        assert!(matches!(err, Diagnostic::UnresolvedType { ref member, .. } if member == "m.lua#x"));
    }

    #[test]
    fn overlay_types_cover_unresolved_field() {
        let f = field("x", None);
        let merged = merge(&Member::Field { unit_id: "m.lua", field: &f }, Some(&strict(&["string"]))).unwrap();
        assert_eq!(merged.member.types, ["string"]);
    }

    #[test]
    fn function_params_follow_policy() {
        let func = FunctionSig {
            name: "move".to_string(),
            params: vec![
                ParamSig { name: "x".to_string(), ty: Some("number".to_string()) },
                ParamSig { name: "who".to_string(), ty: None },
            ],
            returns: Some("void".to_string()),
        };
        let member = Member::Function { unit_id: "m.lua", function: &func };

        let merged = merge(&member, None).unwrap();
        assert_eq!(merged.member.params[1].types, [WILDCARD_TYPE]);
        assert_eq!(merged.member.types, ["void"]);

        let err = merge(&member, Some(&strict(&["boolean"]))).unwrap_err();
        assert!(matches!(err, Diagnostic::UnresolvedType { ref detail, .. } if detail == "parameter `who`"));
    }

    #[test]
    fn module_falls_back_to_parsed_doc() {
        let unit = StructuralUnit {
            path: "m.lua".to_string(),
            doc: vec!["Parsed header.".to_string()],
            ..Default::default()
        };
        let member = Member::Module { id: "m.lua", unit: &unit };
        let merged = merge(&member, None).unwrap();
        assert_eq!(merged.member.doc_lines, ["Parsed header."]);

        let overlay = DocOverlay {
            doc: DocLines { lines: vec!["Curated.".to_string()] },
            ..Default::default()
        };
        let merged = merge(&member, Some(&overlay)).unwrap();
        assert_eq!(merged.member.doc_lines, ["Curated."]);
    }

    #[test]
    fn merge_is_repeatable() {
        let f = field("x", None);
        let member = Member::Field { unit_id: "m.lua", field: &f };
        assert_eq!(merge(&member, None), merge(&member, None));
    }
}
