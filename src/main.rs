use asset_forge::config;
use asset_forge::dev;
use asset_forge::pipeline::PipelineName;
use asset_forge::task::BuildContext;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

fn version_string() -> &'static str {
    let on_tag = env!("ASSET_FORGE_ON_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("ASSET_FORGE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "asset-forge")]
#[command(about = "Front-end asset pipeline for static sites")]
#[command(long_about = "\
Front-end asset pipeline for static sites

Run from the project root. Sources are read from src/, development output
goes to build/ and release output to dist/.

Project structure:

  assets.toml                      # Optional config (asset-forge gen-config)
  src/
  ├── templates/*.html             # Pages; _*.html are partials
  ├── styles/style.scss            # Stylesheet entry point
  │   ├── global/_sprite.scss      # Generated by the sprite task
  │   └── templates/_sprite_template.scss   # Optional partial template
  ├── js/*.js                      # Scripts → js/*.min.js
  ├── img/
  │   ├── background_img/          # JPEG/PNG, re-encoded
  │   ├── content_img/             # JPEG/PNG (+ AVIF sibling), WebP/AVIF copied
  │   ├── background_svg/          # SVG, optimized
  │   ├── content_svg/             # SVG, optimized
  │   └── sprite/                  # SVG icons → img/sprite/sprite.svg
  └── fonts/**/*.ttf               # → .woff + .woff2; .woff/.woff2 copied

Without a subcommand, builds the development tree, serves it with live
reload and rebuilds templates, styles and scripts on change.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build, serve with live reload and rebuild on change (default)
    Dev,
    /// Optimize raster and vector images into the development tree
    Img,
    /// Build the SVG symbol sprite and its stylesheet partial
    Sprite,
    /// Convert TTF fonts to WOFF/WOFF2 and copy web fonts
    Font,
    /// Build scripts into the development tree
    Js,
    /// Release build: every task, minified and cache-busted, into dist/
    Dist,
    /// Print a stock assets.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Dev);

    let name = match command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Dev => PipelineName::Dev,
        Command::Img => PipelineName::Img,
        Command::Sprite => PipelineName::Sprite,
        Command::Font => PipelineName::Font,
        Command::Js => PipelineName::Js,
        Command::Dist => PipelineName::Dist,
    };

    let root = std::env::current_dir()?.canonicalize()?;
    let project = config::load_config(&root)?;
    init_thread_pool(&project.processing);
    let ctx = BuildContext::new(&root, project, name.mode());

    if name == PipelineName::Dev {
        dev::serve(ctx)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("==> {name}: {}", ctx.registry.tree().display());
    let report = dev::run_with_printer(name, &ctx)?;
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the config can constrain
/// down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
