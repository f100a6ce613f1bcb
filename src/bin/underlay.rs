use std::cell::RefCell;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use underlay::export::FileSaveTarget;
use underlay::{
    CommandSegmenter, CommitStatus, Compositor, CompositorOpts, ExportOpts, ExportPipeline,
    FontBook, ImageRef, SceneDocument, SceneStore, SegmentationAdapter, ShapeType, UploadOpts,
};

#[derive(Parser, Debug)]
#[command(name = "underlay", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a photo with overlays and write the flattened PNG.
    Compose(ComposeArgs),
    /// List the shape catalog.
    Shapes,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Background photo (JPG, PNG or WEBP).
    photo: PathBuf,

    /// Precomputed foreground cutout (PNG with alpha).
    #[arg(long, conflicts_with = "segment_cmd")]
    cutout: Option<PathBuf>,

    /// Program that reads the photo on stdin and prints a cutout PNG on stdout.
    #[arg(long)]
    segment_cmd: Option<String>,

    /// Extra argument for the segmentation program (repeatable).
    #[arg(long = "segment-arg", requires = "segment_cmd")]
    segment_args: Vec<String>,

    /// Scene document JSON with layers, strokes and enhancements.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Font to register, as FAMILY=PATH (repeatable).
    #[arg(long = "font", value_parser = parse_font)]
    fonts: Vec<(String, PathBuf)>,

    /// Family used for text layers whose own family is not registered.
    #[arg(long)]
    fallback_font: Option<String>,

    /// Longest edge of the working image; 0 keeps the source resolution.
    #[arg(long)]
    max_dim: Option<u32>,

    /// Output PNG path.
    #[arg(long, default_value = underlay::export::DEFAULT_EXPORT_FILENAME)]
    out: PathBuf,
}

fn parse_font(s: &str) -> Result<(String, PathBuf), String> {
    let (family, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FAMILY=PATH, got '{s}'"))?;
    if family.trim().is_empty() || path.is_empty() {
        return Err(format!("expected FAMILY=PATH, got '{s}'"));
    }
    Ok((family.trim().to_owned(), PathBuf::from(path)))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Shapes => {
            for shape in ShapeType::CATALOG {
                println!("{}", shape.name());
            }
            Ok(())
        }
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let mut upload = UploadOpts::default();
    if let Some(max) = args.max_dim {
        upload = upload.with_max_dimension((max > 0).then_some(max));
    }
    let bytes = std::fs::read(&args.photo)
        .with_context(|| format!("read photo '{}'", args.photo.display()))?;
    let photo = underlay::accept_upload(&bytes, &upload)?;

    let mut store = SceneStore::new();
    store.set_original_image(photo);

    if let Some(path) = &args.cutout {
        let cutout = std::fs::read(path)
            .with_context(|| format!("read cutout '{}'", path.display()))?;
        store.set_foreground_cutout(ImageRef::from_encoded(cutout));
    } else if let Some(program) = &args.segment_cmd {
        let adapter =
            SegmentationAdapter::new(CommandSegmenter::new(program).args(&args.segment_args));
        let cell = RefCell::new(store);
        match pollster::block_on(adapter.segment(&cell)) {
            Some(CommitStatus::Failed(e)) => {
                eprintln!("segmentation failed, exporting without foreground: {e}");
            }
            Some(status) => tracing::debug!(?status, "segmentation finished"),
            None => {}
        }
        store = cell.into_inner();
    }

    if let Some(path) = &args.scene {
        let doc = SceneDocument::load(path)?;
        let ids = doc.apply_to(&mut store)?;
        tracing::info!(layers = ids.len(), strokes = doc.strokes.len(), "applied scene document");
    }

    let mut fonts = FontBook::new();
    for (family, path) in &args.fonts {
        fonts.register_file(family.as_str(), path)?;
    }
    let mut opts = CompositorOpts::default();
    if let Some(family) = &args.fallback_font {
        opts = opts.with_fallback_font_family(family.as_str());
    }
    let mut compositor = Compositor::new(opts).with_fonts(fonts);

    let mut target = FileSaveTarget::at_path(&args.out);
    let pipeline = ExportPipeline::new(ExportOpts::default());
    let (w, h) = pipeline.export_and_save(&mut compositor, &store.snapshot(), &mut target)?;

    eprintln!("wrote {} ({w}x{h})", target.resolve(&pipeline.opts().filename).display());
    Ok(())
}
