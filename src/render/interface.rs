//! Lua bootstrap glue: registers every emitted member on the export table.

use crate::context::{CacheScope, GenContext, MergedUnit};
use crate::render::Renderer;

pub struct InterfaceRenderer;

impl Renderer for InterfaceRenderer {
    fn render(&self, ctx: &mut GenContext, unit: &MergedUnit) -> String {
        let mut out = String::new();
        for member in &unit.members {
            if !ctx.cache.first_emission(CacheScope::Interface, &member.name) {
                continue;
            }
            out.push_str(&format!("  Exports.{0} = {0}\n", member.name));
        }
        out
    }
}
