//! Per-run generation state, passed explicitly through every pass.

use crate::error::Diagnostics;
use crate::merge::{self, MergedMember};
use crate::model::{Member, StructuralUnit};
use crate::overlay::template::{self, TemplateVars, Templates};
use crate::overlay::OverlayStore;
use std::collections::HashSet;

/// Which flat output a cached signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Api,
    Interface,
}

/// Signatures already emitted during this run.
///
/// Identical overloads declared by several units would clash in the flat
/// API module and the interface export table; only the first one is kept.
#[derive(Debug, Default)]
pub struct EmitCache {
    seen: HashSet<(CacheScope, String)>,
}

impl EmitCache {
    /// Returns true the first time `signature` is seen in `scope`.
    pub fn first_emission(&mut self, scope: CacheScope, signature: &str) -> bool {
        self.seen.insert((scope, signature.to_string()))
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// A unit with all of its members merged, ready to render.
#[derive(Debug, Clone)]
pub struct MergedUnit {
    pub path: String,
    pub ident: String,
    pub module: MergedMember,
    /// Sorted by identity; members that failed to merge are absent.
    pub members: Vec<MergedMember>,
}

pub struct GenContext {
    pub overlays: OverlayStore,
    pub templates: Templates,
    pub cache: EmitCache,
    pub diagnostics: Diagnostics,
}

impl GenContext {
    pub fn new(overlays: OverlayStore, templates: Templates) -> Self {
        GenContext {
            overlays,
            templates,
            cache: EmitCache::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Reset run-scoped state.
    pub fn begin_run(&mut self) {
        self.cache.clear();
        self.overlays.reset_created();
    }

    /// Merge one member against the store.
    ///
    /// A synthesized default is adopted by the store so later passes see the
    /// same overlay. A failed merge is recorded and yields `None`.
    pub fn merge(&mut self, member: &Member) -> Option<MergedMember> {
        let identity = member.identity();
        match merge::merge(member, self.overlays.get(&identity)) {
            Ok(merged) => {
                if let Some(default) = merged.synthesized {
                    tracing::debug!(%identity, "synthesized default overlay");
                    self.overlays.adopt(identity, default);
                }
                Some(merged.member)
            }
            Err(diagnostic) => {
                self.diagnostics.push(diagnostic);
                None
            }
        }
    }

    pub fn merge_unit(&mut self, id: &str, unit: &StructuralUnit) -> MergedUnit {
        let module_member = Member::Module { id, unit };
        // Module overlays never fail to merge: they carry no types.
        let module = self.merge(&module_member).unwrap_or_else(|| MergedMember {
            kind: module_member.kind(),
            identity: id.to_string(),
            name: unit.path.clone(),
            types: Vec::new(),
            doc_lines: unit.doc.clone(),
            params: Vec::new(),
        });
        let members = unit
            .members(id)
            .iter()
            .filter_map(|m| self.merge(m))
            .collect();
        MergedUnit {
            path: unit.path.clone(),
            ident: unit.ident(),
            module,
            members,
        }
    }

    /// Render a member's doc text through its kind's template.
    /// Returns an empty string (and records why) if the template is broken.
    pub fn render_doc(&mut self, member: &MergedMember) -> String {
        let params: Vec<String> = member.params.iter().map(|p| p.name.clone()).collect();
        let vars = TemplateVars {
            kind: member.kind,
            identity: &member.identity,
            name: &member.name,
            lines: &member.doc_lines,
            params: &params,
        };
        match template::render(&vars, self.templates.for_kind(member.kind)) {
            Ok(text) => text,
            Err(diagnostic) => {
                self.diagnostics.push(diagnostic);
                String::new()
            }
        }
    }
}
