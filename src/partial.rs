//! Marker-delimited partial assembly.
//!
//! Only the text between the START and STOP markers belongs to the
//! generator; whatever a human keeps around a partial is left alone by the
//! writer that splices it in.

pub const START_MARKER: &str = "[PARTIAL:START]";
pub const STOP_MARKER: &str = "[PARTIAL:STOP]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialKind {
    /// Type declarations for the whole API, one module.
    Api,
    /// `/// <reference>` lines for every generated declaration file.
    Reference,
    /// Native bootstrap glue run once at game boot.
    Interface,
}

/// Fixed text around the markers and around the fragment body.
#[derive(Debug, Clone, Copy)]
pub struct Boilerplate {
    pub prefix: &'static str,
    /// Inside the markers, before the fragments.
    pub head: &'static str,
    /// Inside the markers, after the fragments.
    pub tail: &'static str,
    pub suffix: &'static str,
}

const INTERFACE_HEAD: &str = concat!(
    "_G.PIPEWRENCH_READY = false\n",
    "triggerEvent('OnPipeWrenchBoot', false)\n",
    "Events.OnGameBoot.Add(function()\n",
    "\n",
);

const INTERFACE_TAIL: &str = concat!(
    "  _G.PIPEWRENCH_READY = true\n",
    "  -- Trigger reimport blocks for all compiled PipeWrench TypeScript file(s).\n",
    "  triggerEvent('OnPipeWrenchBoot', true)\n",
    "end)\n",
);

impl PartialKind {
    pub fn comment(self) -> &'static str {
        match self {
            PartialKind::Interface => "--",
            PartialKind::Api | PartialKind::Reference => "//",
        }
    }

    /// Output file name below `generated/partials/`.
    pub fn file_name(self) -> &'static str {
        match self {
            PartialKind::Api => "Lua.api.partial.d.ts",
            PartialKind::Reference => "Lua.reference.partial.d.ts",
            PartialKind::Interface => "Lua.interface.partial.lua",
        }
    }

    /// Boilerplate for this kind. The API prefix embeds `module_name`, so
    /// it is built by [`api_prefix`] and passed separately.
    pub fn boilerplate(self) -> Boilerplate {
        match self {
            PartialKind::Api => Boilerplate {
                prefix: "",
                head: "",
                tail: "",
                suffix: "}\n",
            },
            PartialKind::Reference => Boilerplate {
                prefix: "",
                head: "",
                tail: "",
                suffix: "",
            },
            PartialKind::Interface => Boilerplate {
                prefix: "local Exports = {}\n",
                head: INTERFACE_HEAD,
                tail: INTERFACE_TAIL,
                suffix: "\nreturn Exports\n",
            },
        }
    }
}

/// Header of the API partial, declaring the module all fragments live in.
pub fn api_prefix(module_name: &str) -> String {
    format!(
        "/** @noResolution @noSelfInFile */\n\
         /// <reference path=\"reference.d.ts\" />\n\n\
         declare module '{}' {{\n",
        module_name
    )
}

/// Assemble one partial.
///
/// Fragments are joined in the given order, each on its own line(s),
/// between exactly one START and one STOP marker. Empty fragments are
/// dropped. `extra_prefix` is written before the kind's own prefix.
pub fn assemble_partial(kind: PartialKind, fragments: &[String], extra_prefix: &str) -> String {
    let bp = kind.boilerplate();
    let comment = kind.comment();

    let mut out = String::new();
    out.push_str(&defang(extra_prefix));
    out.push_str(bp.prefix);
    out.push_str(&format!("{} {}\n", comment, START_MARKER));
    out.push_str(bp.head);
    for fragment in fragments.iter().filter(|f| !f.is_empty()) {
        let fragment = defang(fragment);
        out.push_str(&fragment);
        if !fragment.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str(bp.tail);
    out.push_str(&format!("{} {}\n", comment, STOP_MARKER));
    out.push_str(bp.suffix);
    debug_assert!(body(&out).is_some(), "partial must hold exactly one marker pair");
    out
}

/// Marker text quoted in caller-supplied text must not open a second region.
fn defang(text: &str) -> String {
    text.replace(START_MARKER, "[PARTIAL START]")
        .replace(STOP_MARKER, "[PARTIAL STOP]")
}

/// Text strictly between the markers, if both appear exactly once in order.
pub fn body(text: &str) -> Option<&str> {
    if text.matches(START_MARKER).count() != 1 || text.matches(STOP_MARKER).count() != 1 {
        return None;
    }
    let start = text.find(START_MARKER)?;
    let after_start = start + START_MARKER.len();
    let start_line_end = text[after_start..].find('\n').map(|i| after_start + i + 1)?;
    let stop = text.find(STOP_MARKER)?;
    let stop_line_start = text[..stop].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if stop_line_start < start_line_end {
        return None;
    }
    Some(&text[start_line_end..stop_line_start])
}
