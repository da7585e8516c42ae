//! declgen: generate TypeScript declarations and Lua bootstrap glue from a
//! parsed Lua API model, merged with hand-written documentation overlays.
//!
//! A bare `declgen` runs one full generation:
//!
//! 1. **setupDirectories**: create the layout, clear `output/lua`
//! 2. **generateDefinitions**: one `.d.ts` per parsed module
//! 3. **generateReferencePartial**: `/// <reference>` index of step 2
//! 4. **generateLuaInterfacePartial**: boot-time export registration
//! 5. **generateAPIPartial**: every member inside one `declare module`

mod context;
mod error;
mod fsio;
mod generator;
mod merge;
mod model;
mod overlay;
mod partial;
mod render;
mod tree;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "declgen",
    about = "Generate typed declarations and interop glue from a parsed Lua API"
)]
struct Cli {
    /// Generator root. Defaults to ~/Zomboid/PipeWrench.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Structural model written by the parser. Defaults to <root>/model.json.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Documentation overlay store. Defaults to <root>/overlays.json.
    #[arg(long)]
    overlays: Option<PathBuf>,

    /// Module name declared by the API partial.
    #[arg(long, default_value = "PipeWrench")]
    module_name: String,

    /// Directory with module.tpl / field.tpl / function.tpl doc templates.
    /// Supports ${NAME}-style placeholders.
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Do not write newly created default overlays back to the store.
    #[arg(long)]
    no_persist: bool,

    /// Log progress details to stderr.
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = match cli.root.clone() {
        Some(root) => root,
        None => default_root()?,
    };
    let model_path = cli.model.clone().unwrap_or_else(|| root.join("model.json"));
    let overlay_path = cli.overlays.clone().unwrap_or_else(|| root.join("overlays.json"));

    let model = model::load(&model_path)?;
    tracing::info!(units = model.units.len(), path = %model_path.display(), "loaded structural model");

    let (store, load_diagnostics) = overlay::OverlayStore::load(&overlay_path)?;
    tracing::info!(records = store.len(), path = %overlay_path.display(), "loaded overlays");

    let templates = match cli.templates.as_deref() {
        Some(dir) => overlay::template::Templates::load(dir)?,
        None => overlay::template::Templates::default(),
    };

    let mut ctx = context::GenContext::new(store, templates);
    ctx.diagnostics.extend(load_diagnostics);

    let layout = generator::Layout::new(&root);
    let generator = generator::Generator {
        layout: &layout,
        module_name: &cli.module_name,
    };
    let summary = generator.run(&mut fsio::DiskFs, &mut ctx, &model)?;

    if summary.created_overlays > 0 && !cli.no_persist {
        ctx.overlays
            .save(&overlay_path)
            .context("failed to persist new default overlays")?;
        tracing::info!(created = summary.created_overlays, "persisted default overlays");
    }

    for diagnostic in ctx.diagnostics.iter() {
        eprintln!("warning: {}", diagnostic);
    }
    if !ctx.diagnostics.is_empty() {
        eprintln!("{} warning(s) reported", ctx.diagnostics.len());
    }
    tracing::info!(
        declarations = summary.declarations,
        references = summary.references,
        orphans = summary.orphan_overlays,
        "generation finished"
    );
    Ok(())
}

/// `RUST_LOG` wins; otherwise warnings only, or info with `-v`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "declgen=info" } else { "declgen=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory; pass --root")?;
    Ok(home.join("Zomboid").join("PipeWrench"))
}
