//! TypeScript declaration output: per-unit definition files and the
//! flattened API partial fragments.

use crate::context::{CacheScope, GenContext, MergedUnit};
use crate::render::{declaration, doc_comment, Renderer};

/// Extension written for a native `.lua` source.
pub const DECLARATION_EXTENSION: &str = ".d.ts";

/// `client/ISUI/ISButton.lua` → `client/ISUI/ISButton.d.ts`
pub fn declaration_path(native_path: &str) -> String {
    match native_path.strip_suffix(".lua") {
        Some(stem) => format!("{stem}{DECLARATION_EXTENSION}"),
        None => format!("{native_path}{DECLARATION_EXTENSION}"),
    }
}

/// Full declaration file for one unit, members inside an ambient namespace.
pub struct DefinitionRenderer;

impl Renderer for DefinitionRenderer {
    fn render(&self, ctx: &mut GenContext, unit: &MergedUnit) -> String {
        let mut out = String::from("/** @noSelfInFile */\n\n");

        let module_doc = ctx.render_doc(&unit.module);
        out.push_str(&doc_comment(&module_doc, ""));
        out.push_str(&format!("declare namespace {} {{\n", unit.ident));
        for (i, member) in unit.members.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let doc = ctx.render_doc(member);
            out.push_str(&doc_comment(&doc, "  "));
            out.push_str(&format!("  {}\n", declaration(member)));
        }
        out.push_str("}\n");
        out
    }
}

/// API partial fragment: every member of the unit as a module export.
///
/// A declaration already exported by an earlier unit is skipped.
pub struct ApiRenderer;

impl Renderer for ApiRenderer {
    fn render(&self, ctx: &mut GenContext, unit: &MergedUnit) -> String {
        let mut body = String::new();
        for member in &unit.members {
            let decl = format!("export {}", declaration(member));
            if !ctx.cache.first_emission(CacheScope::Api, &decl) {
                tracing::debug!(identity = %member.identity, "duplicate API declaration suppressed");
                continue;
            }
            let doc = ctx.render_doc(member);
            body.push_str(&doc_comment(&doc, "  "));
            body.push_str(&format!("  {decl}\n"));
        }
        if body.is_empty() {
            return body;
        }
        format!("  // {}\n{}", unit.path, body)
    }
}
