use clap::{Parser, Subcommand};
use pixelchain::config::{self, RecipeConfig};
use pixelchain::imaging::ImageFactory;
use pixelchain::pipeline::apply_steps;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixelchain")]
#[command(about = "Chainable image transformations for JPEG, PNG and GIF")]
#[command(long_about = "\
Chainable image transformations for JPEG, PNG and GIF

Open an image, run a recipe of transformations over it, and write the
result to a file or to stdout.

Recipe file (TOML, every key optional):

  [output]
  quality = 75         # JPEG quality, 0-100
  format = \"png\"       # image type for `dump`

  [[steps]]
  op = \"grayscale\"

  [[steps]]
  op = \"scale\"
  width = 800
  height = 800

Input type is taken from the file extension (jpg, jpeg, jpe, png, gif;
any case). Output type for `apply` and `create` is taken from the output
extension, which must be lower case.

Logs go to stderr; set RUST_LOG=debug for details.

Run 'pixelchain gen-config' to generate a documented recipe.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Recipe selection shared by commands that transform an image.
#[derive(clap::Args, Clone)]
struct RecipeArgs {
    /// Recipe file with output settings and steps (defaults: no steps)
    #[arg(long)]
    recipe: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a recipe to an image and save the result
    Apply {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        recipe: RecipeArgs,
        /// Override the recipe's output quality
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        quality: Option<u32>,
    },
    /// Apply a recipe and write the encoded image to stdout
    Dump {
        input: PathBuf,
        #[command(flatten)]
        recipe: RecipeArgs,
        /// Override the recipe's output format (jpg, png, gif)
        #[arg(long)]
        format: Option<String>,
    },
    /// Write a blank black image of the given size
    Create {
        width: u32,
        height: u32,
        output: PathBuf,
    },
    /// Show backend version and supported formats
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock recipe with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let factory = ImageFactory::new();

    match cli.command {
        Command::Apply {
            input,
            output,
            recipe,
            quality,
        } => {
            let recipe = load_recipe(&recipe)?;
            let mut img = factory.open(&input)?;
            apply_steps(&mut img, &recipe.steps)?;
            img.set_quality(quality.unwrap_or(recipe.output.quality));
            let dims = img.dimensions();
            img.save(&output)?;
            match dims {
                Some(d) => println!(
                    "{} → {} ({}x{})",
                    input.display(),
                    output.display(),
                    d.width,
                    d.height
                ),
                None => println!("{} → {}", input.display(), output.display()),
            }
        }
        Command::Dump {
            input,
            recipe,
            format,
        } => {
            let recipe = load_recipe(&recipe)?;
            let kind = format.unwrap_or(recipe.output.format);
            let mut img = factory.open(&input)?;
            apply_steps(&mut img, &recipe.steps)?;
            img.set_quality(recipe.output.quality);
            img.dump(&kind)?;
        }
        Command::Create {
            width,
            height,
            output,
        } => {
            let mut img = factory.create(width, height)?;
            img.save(&output)?;
            println!("{} ({}x{})", output.display(), width, height);
        }
        Command::Info { json } => {
            let info = factory.info();
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Backend: {}", info.version);
                println!("Formats: {}", info.formats.join(", "));
                println!("Types:   {}", info.mime_types.join(", "));
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so `dump` keeps stdout a clean image stream.
///
/// Defaults to warnings only; `RUST_LOG` overrides.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_recipe(args: &RecipeArgs) -> Result<RecipeConfig, config::ConfigError> {
    config::load_recipe(args.recipe.as_deref())
}
