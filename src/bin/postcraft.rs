use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "postcraft", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a postcard preview and write it as a PNG (or JPEG).
    Compose(ComposeArgs),
    /// List layout presets and their output dimensions.
    Presets,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input postcard spec JSON.
    #[arg(long = "spec")]
    spec_path: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Write the half-size JPEG variant instead of PNG.
    #[arg(long)]
    jpeg: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Presets => cmd_presets(),
    }
}

fn read_spec_json(path: &Path) -> anyhow::Result<postcraft::PostcardSpec> {
    let f = File::open(path).with_context(|| format!("open spec '{}'", path.display()))?;
    let r = BufReader::new(f);
    let spec: postcraft::PostcardSpec =
        serde_json::from_reader(r).with_context(|| "parse spec JSON")?;
    Ok(spec)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let spec = read_spec_json(&args.spec_path)?;
    spec.validate()?;

    let root = args.spec_path.parent().unwrap_or_else(|| Path::new("."));

    let photo = postcraft::fetch_image_file(root.join(&spec.photo));
    let background = spec
        .background
        .as_ref()
        .map(|p| postcraft::fetch_image_file(root.join(p)));
    let font = match &spec.font {
        Some(p) => {
            let path = root.join(p);
            let bytes =
                std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;
            Some(postcraft::FontFace::from_bytes(bytes))
        }
        None => None,
    };

    let ink = postcraft::Surface::new(postcraft::CARD_WIDTH as u32, postcraft::CARD_HEIGHT as u32)?;
    let mut template =
        postcraft::Surface::new(postcraft::CARD_WIDTH as u32, postcraft::CARD_HEIGHT as u32)?;
    postcraft::draw_back_template(&mut template);

    let previewer = postcraft::Previewer::new();
    let request = postcraft::PreviewRequest {
        preset: spec.preset(),
        photo,
        background,
        ink,
        template,
        message: spec.message.clone(),
        font,
        text_color: spec.text_color()?,
    };
    let preview = futures::executor::block_on(previewer.compose(request))?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    if args.jpeg {
        let bytes = postcraft::export::jpeg_bytes(&preview)?;
        std::fs::write(&args.out, bytes)
            .with_context(|| format!("write jpeg '{}'", args.out.display()))?;
    } else {
        postcraft::export::write_png(&preview, &args.out)?;
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    for preset in postcraft::LayoutPreset::ALL {
        let geo = postcraft::compose::geometry(preset);
        println!(
            "{:<26} {}x{}  ({})",
            preset.name(),
            geo.canvas_width,
            geo.canvas_height,
            postcraft::export::suggested_filename(Some(preset)),
        );
    }
    Ok(())
}
