use clap::{Parser, Subcommand};
use optimg::capability::{CapabilitySet, CodecProbe, ProbeCache};
use optimg::imaging::CodecBackend;
use optimg::{annotate, check, config, convert, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "optimg")]
#[command(about = "Image variant tooling: AVIF/WebP conversion with graceful fallback")]
#[command(long_about = "\
Image variant tooling: AVIF/WebP conversion with graceful fallback

Variants live in sibling folders named after their format:

  img/
  ├── photo.jpg            # original
  ├── webp/photo.webp      # generated by `optimg convert`
  └── avif/photo.avif

Typical flow:

  optimg convert assets/           # generate variants (incremental)
  optimg annotate pages/ --root assets/
                                   # rewrite markup to the lightest variant
                                   # and inject candidate attributes
  optimg check assets/             # verify what would actually display

Run 'optimg gen-config' to generate a documented optimg.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print this binary's format capabilities
    Probe,
    /// Generate webp/ and avif/ sibling variants for a directory tree
    Convert {
        /// Directory to scan for source images
        dir: PathBuf,
        /// AVIF quality 1-100 (overrides config)
        #[arg(long)]
        quality: Option<u32>,
        /// Formats to generate (overrides config)
        #[arg(long, value_delimiter = ',')]
        formats: Option<Vec<String>>,
        /// Disable the conversion cache — force re-encoding of all images
        #[arg(long)]
        no_cache: bool,
    },
    /// Rewrite HTML/CSS image references to the lightest variant
    Annotate {
        /// Directory of markup files to process
        dir: PathBuf,
        /// Asset root image references resolve against (default: DIR)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Verify which path each image would display, variant or fallback
    Check {
        /// Directory to scan for source images
        dir: PathBuf,
    },
    /// Print a stock optimg.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Probe => {
            let caps = probe_capabilities();
            output::print_probe_output(&caps);
        }
        Command::Convert {
            dir,
            quality,
            formats,
            no_cache,
        } => {
            let mut tool_config = config::ToolConfig::load(&dir)?;
            if let Some(quality) = quality {
                tool_config.convert.quality = quality;
            }
            if let Some(formats) = formats {
                tool_config.convert.formats = formats;
            }
            tool_config.validate()?;

            let convert_config = convert::ConvertConfig {
                formats: tool_config.variant_formats(),
                quality: tool_config.convert.quality,
                use_cache: !no_cache,
            };
            let backend = CodecBackend::new();
            let report = convert::convert_tree(&backend, &dir, &convert_config)?;
            output::print_convert_output(&report);
            if !report.all_succeeded() {
                std::process::exit(1);
            }
        }
        Command::Annotate { dir, root } => {
            let asset_root = root.unwrap_or_else(|| dir.clone());
            let report =
                annotate::annotate_tree(&dir, &asset_root, &annotate::AnnotateConfig::default())?;
            output::print_annotate_output(&report);
        }
        Command::Check { dir } => {
            let caps = probe_capabilities();
            let backend = CodecBackend::new();
            let report = check::check_tree(&backend, &dir, caps)?;
            output::print_check_output(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Probe once at startup; the immutable snapshot is passed down by reference.
fn probe_capabilities() -> CapabilitySet {
    ProbeCache::new().detect(&CodecProbe)
}
