use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use laminate::{Compositor, CompositorOpts, CpuEngine, CpuEngineOpts, Layer, LayerContent, Stack};

#[derive(Parser, Debug)]
#[command(name = "laminate", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a stack document to a PNG.
    Render(RenderArgs),
    /// Validate a stack document and print its layers.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input stack JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory relative image URLs resolve against (defaults to the input's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Font file to register for text layers; repeatable.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Exit with an error if any layer produced a warning.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input stack JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let stack = Stack::from_path(&args.in_path)?;
    let assets_root = args.assets.clone().unwrap_or_else(|| {
        args.in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    });

    let mut opts = CpuEngineOpts::default().with_asset_root(assets_root);
    for font in &args.fonts {
        opts = opts.with_font(font);
    }
    let engine = CpuEngine::new(opts)?;
    let compositor = Compositor::new(engine).with_opts(CompositorOpts::from_env());

    let rendered = pollster::block_on(compositor.render(&stack))?;
    for warning in &rendered.warnings {
        eprintln!("warning: {warning}");
    }
    if args.strict && !rendered.warnings.is_empty() {
        anyhow::bail!("{} layer(s) produced warnings", rendered.warnings.len());
    }

    let image = rendered.surface.to_rgba_image()?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let stack = Stack::from_path(&args.in_path)?;
    println!(
        "{}x{}, {} layer(s)",
        stack.width,
        stack.height,
        stack.layer_count()
    );
    print_layers(&stack.layers, 1);
    Ok(())
}

fn print_layers(layers: &[Layer], depth: usize) {
    for (i, layer) in layers.iter().enumerate() {
        let name = layer.name.as_deref().unwrap_or("-");
        let disabled = if layer.disabled { " (disabled)" } else { "" };
        println!(
            "{:indent$}[{i}] {} {name}{disabled}",
            "",
            layer.content.kind(),
            indent = depth * 2
        );
        for (key, raw) in layer.invalid_fields() {
            println!("{:indent$}  invalid {key}: {raw}", "", indent = depth * 2);
        }
        if let LayerContent::Group(children) = &layer.content {
            print_layers(children, depth + 1);
        }
    }
}
