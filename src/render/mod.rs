//! Renderers turning merged units into output text.

pub mod declaration;
pub mod interface;

use crate::context::{GenContext, MergedUnit};
use crate::merge::MergedMember;
use crate::model::MemberKind;

/// Renders one merged unit into a piece of output.
pub trait Renderer {
    fn render(&self, ctx: &mut GenContext, unit: &MergedUnit) -> String;
}

/// Wrap rendered doc text as a `/** ... */` block at `indent`.
/// Empty text produces no comment at all.
pub fn doc_comment(text: &str, indent: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let mut out = format!("{indent}/**\n");
    for line in text.lines() {
        // A doc line must not close the comment early.
        let line = line.replace("*/", "*\\/");
        if line.is_empty() {
            out.push_str(&format!("{indent} *\n"));
        } else {
            out.push_str(&format!("{indent} * {line}\n"));
        }
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

/// `number | nil`
pub fn type_union(types: &[String]) -> String {
    types.join(" | ")
}

/// TypeScript signature without keyword or terminator:
/// `speed: number` or `move(x: number, y: number): void`.
pub fn signature(member: &MergedMember) -> String {
    match member.kind {
        MemberKind::Function => {
            let params: Vec<String> = member
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, type_union(&p.types)))
                .collect();
            format!("{}({}): {}", member.name, params.join(", "), type_union(&member.types))
        }
        MemberKind::Field | MemberKind::Module => {
            format!("{}: {}", member.name, type_union(&member.types))
        }
    }
}

/// Declaration statement for a field or function.
pub fn declaration(member: &MergedMember) -> String {
    let keyword = match member.kind {
        MemberKind::Function => "function",
        MemberKind::Field | MemberKind::Module => "let",
    };
    format!("{} {};", keyword, signature(member))
}
