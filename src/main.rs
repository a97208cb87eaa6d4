//! fontsheet - bitmap font atlas builder
//!
//! Thin command line front end over the library: builds `.qfont` atlases
//! from font files or system families and lays out text with them.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};

use fontsheet::atlas::Builder;
use fontsheet::config::{Config, FontStyle};
use fontsheet::drawing::{DrawingPrimitive, RenderContext};
use fontsheet::font::{open_font, Font};
use fontsheet::layout::{Alignment, Size, TextLayout};

/// Print help message
fn print_help() {
    println!(
        r#"fontsheet {} - bitmap font atlas builder and text layout engine

USAGE:
    fontsheet build <FONT> --size <PX> --out <NAME> [--style <STYLE>] [--config <TOML>]
    fontsheet layout <FILE.qfont> --width <PX> [--align <ALIGN>] [--glyphs] <TEXT>
    fontsheet --init-config [PATH]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --init-config [PATH]    Generate a config file template
    -f, --force             Overwrite config file without confirmation

BUILD:
    FONT                    Font file path or family name
    --size <PX>             Pixel size (default: [font] size from config)
    --out <NAME>            Output name; writes NAME.qfont and NAME.png
    --style <STYLE>         regular, bold, italic, bold_italic
    --config <TOML>         Use this config file instead of the default lookup

LAYOUT:
    --width <PX>            Maximum line width (0 = unbounded)
    --align <ALIGN>         left, right, centre, justify
    --glyphs                Print every glyph position

CONFIG FILE:
    ~/.config/fontsheet/config.toml (or $FONTSHEET_CONFIG)
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Value following `name`, e.g. `--size 16`
fn option_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Arguments that are neither options nor option values
fn positional(args: &[String], with_value: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if with_value.contains(&arg.as_str()) {
            skip = true;
            continue;
        }
        if arg.starts_with('-') && arg.len() > 1 {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn load_config(args: &[String]) -> Result<Config> {
    match option_value(args, "--config") {
        Some(path) => Config::load_from_file(Path::new(path)),
        None => Ok(Config::load()),
    }
}

/// `fontsheet build`
fn run_build(args: &[String]) -> Result<()> {
    let cfg = load_config(args)?;
    let positional = positional(args, &["--size", "--out", "--style", "--config"]);

    let font = positional
        .first()
        .cloned()
        .or_else(|| (!cfg.font.font.is_empty()).then(|| cfg.font.font.clone()))
        .ok_or_else(|| anyhow!("No font given (pass a path or family name)"))?;
    let size = match option_value(args, "--size") {
        Some(s) => s
            .parse::<f32>()
            .with_context(|| format!("Invalid --size: {}", s))?,
        None => cfg.font.size,
    };
    if size <= 0.0 {
        bail!("Font size must be positive, got {}", size);
    }
    let style = match option_value(args, "--style") {
        Some(s) => s.parse::<FontStyle>().map_err(|e| anyhow!(e))?,
        None => cfg.font.style,
    };
    let out = option_value(args, "--out")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Missing --out <NAME>"))?;

    info!("Building {} at {}px ({})", font, size, style);
    cfg.build.validate()?;
    let rasterizer = open_font(&font, size * cfg.build.super_sample_levels as f32, style)
        .with_context(|| format!("Failed to open font: {}", font))?;
    let (table, path) = Builder::new(&cfg.build)
        .build_and_save(&rasterizer, &out)
        .context("Failed to build glyph atlas")?;

    println!("Font saved: {}", path.display());
    println!("  Glyphs:  {}", table.glyphs.len());
    for (i, page) in table.pages.iter().enumerate() {
        println!("  Page {}:  {}x{}", i, page.width(), page.height());
    }
    if table.drop_shadow.is_some() {
        println!("  Drop shadow: yes");
    }
    if table.naturally_monospaced {
        println!("  Monospaced");
    }
    Ok(())
}

/// `fontsheet layout`
fn run_layout(args: &[String]) -> Result<()> {
    let cfg = load_config(args)?;
    let positional = positional(args, &["--width", "--align", "--config"]);
    let (file, text) = match positional.as_slice() {
        [file, rest @ ..] if !rest.is_empty() => (PathBuf::from(file), rest.join(" ")),
        _ => bail!("Usage: fontsheet layout <FILE.qfont> --width <PX> <TEXT>"),
    };
    let width = match option_value(args, "--width") {
        Some(w) => w
            .parse::<f32>()
            .with_context(|| format!("Invalid --width: {}", w))?,
        None => 0.0,
    };
    let alignment = match option_value(args, "--align") {
        Some(a) => a.parse::<Alignment>().map_err(|e| anyhow!(e))?,
        None => Alignment::Left,
    };

    let mut font = Font::load(&file, &cfg.loader)
        .with_context(|| format!("Failed to load font: {}", file.display()))?;
    let options = cfg.render.to_options();

    let max_size = (width > 0.0).then(|| Size::new(width, 0.0));
    let size = font.measure(&text, &options, max_size, alignment);
    println!("Size: {}x{}", size.width, size.height);

    if args.iter().any(|a| a == "--glyphs") {
        let layout = TextLayout::new(font.data(), &options);
        let mut sink = |x: f32, y: f32, c: char| println!("  {:?} at ({}, {})", c, x, y);
        match max_size {
            Some(max_size) => {
                let mut processed = layout.process_text(&text, max_size, alignment);
                layout.layout(&mut processed, Some(&mut sink));
            }
            None => {
                layout.layout_unbounded(&text, alignment, Some(&mut sink));
            }
        }
    }

    let mut ctx = RenderContext::new();
    font.upload(&mut ctx)?;
    let mut primitive = DrawingPrimitive::new(&font, options);
    primitive.print(&text, (0.0, 0.0), max_size, alignment);
    primitive.draw(&mut ctx)?;
    for batch in ctx.batches() {
        debug!("Batch: texture {}, {} vertices", batch.texture.raw(), batch.vertices.len());
    }
    println!(
        "Quads: {} ({} shadow)",
        primitive.vertices().len() / 6,
        primitive.shadow_vertices().len() / 6
    );
    Ok(())
}

/// `fontsheet --init-config [PATH]`
fn run_init_config(args: &[String]) -> Result<()> {
    let path = positional(args, &[]).first().map(PathBuf::from);
    let force = args.iter().any(|a| a == "--force" || a == "-f");

    let target = match &path {
        Some(p) => Some(p.clone()),
        None => Config::default_path(),
    };
    if let Some(target) = &target {
        if target.exists() && !force {
            println!("Config file already exists: {}", target.display());
            print!("Overwrite? [y/N]: ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Aborted.");
                return Ok(());
            }
        }
    }

    let written = Config::write_default(path.as_deref())?;
    println!("Config file generated: {}", written.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // --help
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("fontsheet {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--init-config") {
        return run_init_config(&args);
    }

    match args[0].as_str() {
        "build" => run_build(&args[1..]),
        "layout" => run_layout(&args[1..]),
        other => {
            print_help();
            bail!("Unknown command: {}", other)
        }
    }
}
