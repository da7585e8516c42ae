//! Generation run: directory setup, per-unit declarations, then the three
//! partials, always in that order.

use crate::context::GenContext;
use crate::fsio::{prettify, Filesystem};
use crate::model::{Member, StructuralModel, StructuralUnit};
use crate::partial::{self, PartialKind};
use crate::render::declaration::{self, ApiRenderer, DefinitionRenderer};
use crate::render::interface::InterfaceRenderer;
use crate::render::Renderer;
use crate::tree;
use anyhow::{bail, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

/// Fixed output layout below the generator root.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    /// `<root>/output`
    pub output_dir: PathBuf,
    /// `<root>/output/lua`
    pub native_dir: PathBuf,
    /// `<root>/generated`
    pub generated_dir: PathBuf,
    /// `<root>/generated/partials`
    pub partials_dir: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let output_dir = root.join("output");
        let native_dir = output_dir.join("lua");
        let generated_dir = root.join("generated");
        let partials_dir = generated_dir.join("partials");
        Layout {
            root,
            output_dir,
            native_dir,
            generated_dir,
            partials_dir,
        }
    }

    pub fn partial_path(&self, kind: PartialKind) -> PathBuf {
        self.partials_dir.join(kind.file_name())
    }

    /// Declaration file for a unit at logical `path`.
    ///
    /// The result always lies below `native_dir`: `..`, root and prefix
    /// components are rejected.
    pub fn declaration_path(&self, path: &str) -> Result<PathBuf> {
        let relative = declaration::declaration_path(path.trim_start_matches('/'));
        let mut out = self.native_dir.clone();
        for component in Path::new(&relative).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    bail!("unit path escapes the output tree: {path}")
                }
            }
        }
        Ok(out)
    }
}

/// What a run produced, for the final report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub declarations: usize,
    pub references: usize,
    pub created_overlays: usize,
    pub orphan_overlays: usize,
}

pub struct Generator<'a> {
    pub layout: &'a Layout,
    pub module_name: &'a str,
}

impl Generator<'_> {
    pub fn run(
        &self,
        fs: &mut dyn Filesystem,
        ctx: &mut GenContext,
        model: &StructuralModel,
    ) -> Result<RunSummary> {
        ctx.begin_run();
        let mut summary = RunSummary::default();
        let planned = self.plan_declarations(model)?;

        println!("- setupDirectories...");
        self.setup_directories(fs)?;

        println!("- generateDefinitions...");
        summary.declarations = self.generate_definitions(fs, ctx, &planned)?;

        println!("- generateReferencePartial...");
        summary.references = self.generate_reference_partial(fs)?;

        println!("- generateLuaInterfacePartial...");
        self.generate_interface_partial(fs, ctx, model)?;

        println!("- generateAPIPartial...");
        self.generate_api_partial(fs, ctx, model)?;

        summary.created_overlays = ctx.overlays.created().len();
        let live = live_identities(model);
        summary.orphan_overlays = ctx.overlays.orphans(&live).count();
        if summary.orphan_overlays > 0 {
            tracing::debug!(count = summary.orphan_overlays, "orphan overlays kept");
        }
        Ok(summary)
    }

    /// Create the fixed directories and empty the native output subtree.
    pub fn setup_directories(&self, fs: &mut dyn Filesystem) -> Result<()> {
        let layout = self.layout;
        for dir in [
            &layout.root,
            &layout.generated_dir,
            &layout.partials_dir,
            &layout.output_dir,
            &layout.native_dir,
        ] {
            fs.mkdirs(dir)?;
        }
        fs.clear_dir(&layout.native_dir)
    }

    /// Resolve every unit's declaration file before anything is written.
    ///
    /// Fails on a path outside the output tree, or on two units sharing one
    /// declaration file.
    fn plan_declarations<'m>(
        &self,
        model: &'m StructuralModel,
    ) -> Result<Vec<(&'m str, &'m StructuralUnit, PathBuf)>> {
        let mut owners: HashMap<PathBuf, &str> = HashMap::new();
        let mut planned = Vec::with_capacity(model.units.len());
        for (id, unit) in &model.units {
            let path = self.layout.declaration_path(&unit.path)?;
            if let Some(previous) = owners.insert(path.clone(), id.as_str()) {
                bail!(
                    "units {previous} and {id} both map to {}",
                    display_relative(&path, &self.layout.output_dir)
                );
            }
            planned.push((id.as_str(), unit, path));
        }
        Ok(planned)
    }

    fn generate_definitions(
        &self,
        fs: &mut dyn Filesystem,
        ctx: &mut GenContext,
        planned: &[(&str, &StructuralUnit, PathBuf)],
    ) -> Result<usize> {
        for (id, unit, path) in planned {
            let merged = ctx.merge_unit(id, unit);
            tracing::info!("Generating: {}..", display_relative(path, &self.layout.output_dir));

            let code = DefinitionRenderer.render(ctx, &merged);
            if let Some(parent) = path.parent() {
                fs.mkdirs(parent)?;
            }
            fs.write_declaration(path, &prettify(&code))?;
        }
        Ok(planned.len())
    }

    fn generate_reference_partial(&self, fs: &mut dyn Filesystem) -> Result<usize> {
        let layout = self.layout;
        let tree = fs.scan_dirs(&layout.native_dir)?;
        if tree.is_empty() {
            tracing::debug!("no declaration files, reference partial will be empty");
        }
        let references = tree::build_reference_list(&tree, tree::EXCLUDED_DIR, &layout.output_dir);
        let code = partial::assemble_partial(PartialKind::Reference, &references, "");
        fs.write_declaration(&layout.partial_path(PartialKind::Reference), &prettify(&code))?;
        Ok(references.len())
    }

    fn generate_interface_partial(
        &self,
        fs: &mut dyn Filesystem,
        ctx: &mut GenContext,
        model: &StructuralModel,
    ) -> Result<()> {
        let fragments = render_units(&InterfaceRenderer, ctx, model);
        let code = partial::assemble_partial(PartialKind::Interface, &fragments, "");
        fs.write_native(&self.layout.partial_path(PartialKind::Interface), &code)
    }

    fn generate_api_partial(
        &self,
        fs: &mut dyn Filesystem,
        ctx: &mut GenContext,
        model: &StructuralModel,
    ) -> Result<()> {
        let fragments = render_units(&ApiRenderer, ctx, model);
        let prefix = partial::api_prefix(self.module_name);
        let code = partial::assemble_partial(PartialKind::Api, &fragments, &prefix);
        fs.write_declaration(&self.layout.partial_path(PartialKind::Api), &prettify(&code))
    }
}

/// One fragment per unit, in unit-id order.
fn render_units(renderer: &dyn Renderer, ctx: &mut GenContext, model: &StructuralModel) -> Vec<String> {
    model
        .units
        .iter()
        .map(|(id, unit)| {
            let merged = ctx.merge_unit(id, unit);
            renderer.render(ctx, &merged)
        })
        .collect()
}

/// Every identity an overlay could legitimately be keyed by.
fn live_identities(model: &StructuralModel) -> BTreeSet<String> {
    let mut live = BTreeSet::new();
    for (id, unit) in &model.units {
        live.insert(Member::Module { id, unit }.identity());
        live.extend(unit.members(id).iter().map(Member::identity));
    }
    live
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsio::DiskFs;
    use crate::model::{FieldSig, FunctionSig, ParamSig, StructuralUnit};
    use crate::overlay::template::Templates;
    use crate::overlay::{DocLines, DocOverlay, OverlayStore};
    use std::fs;
    use tempfile::TempDir;

    fn model() -> StructuralModel {
        let mut model = StructuralModel::default();
        model.units.insert(
            "shared/b/2.lua".to_string(),
            StructuralUnit {
                path: "shared/b/2.lua".to_string(),
                fields: vec![FieldSig { name: "loose".to_string(), ty: None }],
                ..Default::default()
            },
        );
        model.units.insert(
            "shared/a/1.lua".to_string(),
            StructuralUnit {
                path: "shared/a/1.lua".to_string(),
                functions: vec![FunctionSig {
                    name: "hello".to_string(),
                    params: vec![ParamSig { name: "who".to_string(), ty: Some("string".to_string()) }],
                    returns: Some("void".to_string()),
                }],
                ..Default::default()
            },
        );
        model.units.insert(
            "shared/a/10.lua".to_string(),
            StructuralUnit {
                path: "shared/a/10.lua".to_string(),
                ..Default::default()
            },
        );
        model
    }

    fn run(root: &Path, store: OverlayStore, model: &StructuralModel) -> (RunSummary, GenContext) {
        let layout = Layout::new(root);
        let generator = Generator {
            layout: &layout,
            module_name: "PipeWrench",
        };
        let mut ctx = GenContext::new(store, Templates::default());
        let summary = generator.run(&mut DiskFs, &mut ctx, model).unwrap();
        (summary, ctx)
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn writes_declarations_and_partials() {
        let dir = TempDir::new().unwrap();
        let (summary, ctx) = run(dir.path(), OverlayStore::default(), &model());

        assert_eq!(summary.declarations, 3);
        assert_eq!(summary.references, 3);
        assert!(ctx.diagnostics.is_empty());
        assert!(dir.path().join("output/lua/shared/a/1.d.ts").is_file());

        let reference = read(dir.path(), "generated/partials/Lua.reference.partial.d.ts");
        assert_eq!(
            reference,
            concat!(
                "// [PARTIAL:START]\n",
                "/// <reference path=\"lua/shared/a/1.d.ts\" />\n",
                "/// <reference path=\"lua/shared/a/10.d.ts\" />\n",
                "/// <reference path=\"lua/shared/b/2.d.ts\" />\n",
                "// [PARTIAL:STOP]\n",
            )
        );

        let api = read(dir.path(), "generated/partials/Lua.api.partial.d.ts");
        assert!(api.contains("  export function hello(who: string): void;\n"));
        assert!(api.contains("  export let loose: any;\n"));

        let lua = read(dir.path(), "generated/partials/Lua.interface.partial.lua");
        assert!(lua.contains("  Exports.hello = hello\n"));
    }

    #[test]
    fn unknown_type_member_excluded_and_reported_once() {
        let dir = TempDir::new().unwrap();
        let mut store = OverlayStore::default();
        store.insert(
            "shared/b/2.lua#loose".to_string(),
            DocOverlay {
                apply_unknown_type: false,
                ..Default::default()
            },
        );
        let (_, ctx) = run(dir.path(), store, &model());

        assert_eq!(ctx.diagnostics.len(), 1);
        let api = read(dir.path(), "generated/partials/Lua.api.partial.d.ts");
        assert!(!api.contains("loose"));
        let lua = read(dir.path(), "generated/partials/Lua.interface.partial.lua");
        assert!(!lua.contains("loose"));
    }

    #[test]
    fn overlay_docs_reach_the_declaration() {
        let dir = TempDir::new().unwrap();
        let mut store = OverlayStore::default();
        store.insert(
            "shared/a/1.lua#hello(who)".to_string(),
            DocOverlay {
                doc: DocLines { lines: vec!["Greets someone.".to_string()] },
                ..Default::default()
            },
        );
        let (summary, _) = run(dir.path(), store, &model());
        let decl = read(dir.path(), "output/lua/shared/a/1.d.ts");
        assert!(decl.contains("  /**\n   * Greets someone.\n   */\n  function hello(who: string): void;\n"));
        // hello already had an overlay; the other members and all modules did not.
        assert_eq!(summary.created_overlays, 4);
    }

    #[test]
    fn rerun_is_byte_identical_and_clears_stale_output() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), OverlayStore::default(), &model());
        let first_api = read(dir.path(), "generated/partials/Lua.api.partial.d.ts");
        let first_decl = read(dir.path(), "output/lua/shared/a/1.d.ts");

        fs::write(dir.path().join("output/lua/stale.d.ts"), "").unwrap();
        run(dir.path(), OverlayStore::default(), &model());

        assert_eq!(read(dir.path(), "generated/partials/Lua.api.partial.d.ts"), first_api);
        assert_eq!(read(dir.path(), "output/lua/shared/a/1.d.ts"), first_decl);
        assert!(!dir.path().join("output/lua/stale.d.ts").exists());
    }

    #[test]
    fn empty_model_yields_empty_partials() {
        let dir = TempDir::new().unwrap();
        let (summary, ctx) = run(dir.path(), OverlayStore::default(), &StructuralModel::default());
        assert_eq!(summary, RunSummary::default());
        assert!(ctx.diagnostics.is_empty());

        for kind in [PartialKind::Api, PartialKind::Reference, PartialKind::Interface] {
            let text = fs::read_to_string(Layout::new(dir.path()).partial_path(kind)).unwrap();
            let body = partial::body(&text).unwrap();
            assert!(!body.contains("export") && !body.contains("Exports.") && !body.contains("reference"));
        }
        assert_eq!(fs::read_dir(dir.path().join("output/lua")).unwrap().count(), 0);
    }

    #[test]
    fn orphan_overlays_are_counted_not_dropped() {
        let dir = TempDir::new().unwrap();
        let mut store = OverlayStore::default();
        store.insert("gone.lua#old".to_string(), DocOverlay::default());
        let (summary, ctx) = run(dir.path(), store, &model());
        assert_eq!(summary.orphan_overlays, 1);
        assert!(ctx.overlays.get("gone.lua#old").is_some());
    }

    fn single_unit_model(units: &[(&str, &str)]) -> StructuralModel {
        let mut model = StructuralModel::default();
        for (id, path) in units {
            model.units.insert(
                id.to_string(),
                StructuralUnit {
                    path: path.to_string(),
                    fields: vec![FieldSig { name: id.replace('.', "_"), ty: Some("number".to_string()) }],
                    ..Default::default()
                },
            );
        }
        model
    }

    fn try_run(root: &Path, model: &StructuralModel) -> Result<RunSummary> {
        let layout = Layout::new(root);
        let generator = Generator {
            layout: &layout,
            module_name: "PipeWrench",
        };
        let mut ctx = GenContext::new(OverlayStore::default(), Templates::default());
        generator.run(&mut DiskFs, &mut ctx, model)
    }

    #[test]
    fn declaration_path_stays_below_native_dir() {
        let layout = Layout::new("/gen");
        assert_eq!(
            layout.declaration_path("/shared/./X.lua").unwrap(),
            PathBuf::from("/gen/output/lua/shared/X.d.ts")
        );
        assert!(layout.declaration_path("../../escaped.lua").is_err());
        assert!(layout.declaration_path("shared/../../x.lua").is_err());
    }

    #[test]
    fn escaping_unit_path_is_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("gen");
        let model = single_unit_model(&[("escaped.lua", "../../escaped.lua")]);

        let err = try_run(&root, &model).unwrap_err();
        assert!(err.to_string().contains("escapes the output tree"));
        assert!(!root.join("escaped.d.ts").exists());
        assert!(!dir.path().join("escaped.d.ts").exists());
        assert!(!root.join("output").exists());
    }

    #[test]
    fn units_sharing_a_declaration_file_are_rejected() {
        let dir = TempDir::new().unwrap();
        let model = single_unit_model(&[("alpha", "shared/X.lua"), ("beta", "/shared/X.lua")]);

        let err = try_run(dir.path(), &model).unwrap_err();
        assert!(err.to_string().contains("units alpha and beta both map to lua/shared/X.d.ts"));
        assert!(!dir.path().join("output/lua/shared/X.d.ts").exists());
    }

    #[test]
    fn doc_lines_keep_their_whitespace() {
        let dir = TempDir::new().unwrap();
        let mut store = OverlayStore::default();
        store.insert(
            "shared/a/1.lua#hello(who)".to_string(),
            DocOverlay {
                doc: DocLines {
                    lines: vec!["a  ".to_string(), "   ".to_string(), "b".to_string()],
                },
                ..Default::default()
            },
        );
        run(dir.path(), store, &model());
        let decl = read(dir.path(), "output/lua/shared/a/1.d.ts");
        assert!(decl.contains("  /**\n   * a  \n   *    \n   * b\n   */\n"));
    }

    #[test]
    fn setup_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let layout = Layout::new(blocker.join("root"));
        let generator = Generator {
            layout: &layout,
            module_name: "PipeWrench",
        };
        let mut ctx = GenContext::new(OverlayStore::default(), Templates::default());
        assert!(generator.run(&mut DiskFs, &mut ctx, &model()).is_err());
        assert!(!blocker.join("root").exists());
    }
}
