use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "twibbon", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a photo under a frame and write the PNG.
    Compose(ComposeArgs),
    /// List the preset frames in a catalog manifest.
    Frames(FramesArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Photo image path.
    #[arg(long)]
    photo: PathBuf,

    /// Frame overlay image path (transparency-capable PNG recommended).
    #[arg(long, conflicts_with = "preset")]
    frame: Option<PathBuf>,

    /// Preset frame name, resolved through --catalog.
    #[arg(long, requires = "catalog")]
    preset: Option<String>,

    /// Catalog manifest JSON.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Photo center x in canvas space.
    #[arg(long, default_value_t = 400.0)]
    x: f64,

    /// Photo center y in canvas space.
    #[arg(long, default_value_t = 400.0)]
    y: f64,

    /// Uniform photo scale, clamped into [0.1, 3.0].
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Clockwise photo rotation in degrees, normalized into [0, 360).
    #[arg(long, default_value_t = 0.0)]
    rotation: f64,

    /// Output PNG path. Defaults to the timestamped download name.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Catalog manifest JSON.
    #[arg(long)]
    catalog: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Frames(args) => cmd_frames(args),
    }
}

fn read_catalog(path: &Path) -> anyhow::Result<twibbon::FrameCatalog> {
    let f = File::open(path).with_context(|| format!("open catalog '{}'", path.display()))?;
    let catalog = twibbon::FrameCatalog::from_reader(BufReader::new(f))?;
    Ok(catalog)
}

fn decode_file(path: &Path) -> anyhow::Result<twibbon::PreparedImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let img = twibbon::decode_image(&bytes)
        .with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let frame_path = match (&args.frame, &args.preset) {
        (Some(path), None) => path.clone(),
        (None, Some(name)) => {
            let catalog_path = args
                .catalog
                .as_deref()
                .context("--preset requires --catalog")?;
            let catalog = read_catalog(catalog_path)?;
            let rel = catalog.resolve(name)?;
            catalog_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(rel)
        }
        _ => anyhow::bail!("exactly one of --frame or --preset is required"),
    };

    let mut session = twibbon::EditorSession::new(twibbon::Canvas::DEFAULT);

    let token = session.begin_photo_upload();
    if !session.install_photo(token, Ok(decode_file(&args.photo)?)) {
        anyhow::bail!("photo install was superseded (bug)");
    }

    let token = match &args.preset {
        Some(name) => session.select_preset_frame(name.clone()),
        None => session.begin_frame_upload(),
    };
    if !session.install_frame(token, Ok(decode_file(&frame_path)?)) {
        anyhow::bail!("frame install was superseded (bug)");
    }

    session.set_translation(args.x, args.y);
    session.set_scale(args.scale);
    session.set_rotation(args.rotation);

    let mut compositor = twibbon::Compositor::new();
    let artifact = session
        .export(&mut compositor, SystemTime::now())?
        .context("export requires both a photo and a frame")?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out, &artifact.png)
        .with_context(|| format!("write png '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let catalog = read_catalog(&args.catalog)?;
    for name in catalog.names() {
        println!("{name}");
    }
    Ok(())
}
