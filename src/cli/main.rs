use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use shutterpost::config::Config;
use shutterpost::pipeline::{self, RunError, RunOutcome, RunRequest};
use shutterpost::template;
use shutterpost::uploader::HttpUploader;

#[derive(Parser, Debug)]
#[command(
    name = "shutterpost",
    version,
    about = "Hands-off photo posting — pick the next pending image, build an EXIF-driven caption, upload, archive"
)]
struct Cli {
    /// Path to a specific image to post (default: next pending image)
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Caption text, used verbatim (skips sidecar and default captions)
    #[arg(long, value_name = "TEXT")]
    caption: Option<String>,

    /// List all caption template variables and exit
    #[arg(long = "list-vars")]
    list_vars: bool,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Resolve the caption and report it without uploading or moving files
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --list-vars
    if cli.list_vars {
        print_variables();
        return Ok(());
    }

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;

    if !cli.dry_run && config.service.endpoint.is_empty() {
        anyhow::bail!(
            "No upload endpoint configured. Run `shutterpost --init` to create a config file, then set service.endpoint and service.access_token."
        );
    }

    let uploader = HttpUploader::new(
        config.service.endpoint.clone(),
        config.service.access_token.clone(),
    );
    let request = RunRequest {
        image: cli.image,
        caption: cli.caption,
        dry_run: cli.dry_run,
    };

    match pipeline::run(&request, &uploader, &config).await {
        Ok(RunOutcome::Posted {
            image,
            post_id,
            caption,
        }) => {
            log::info!("Posted {} as {post_id}", image.file_name());
            log::debug!("Caption: {caption:?}");
        }
        Ok(RunOutcome::DryRun { image, caption }) => {
            println!("Would post: {}", image.file_name());
            println!("Caption:\n{caption}");
        }
        Ok(RunOutcome::NothingToUpload) => {
            log::info!(
                "No pending images in {}",
                config.directories.pending_dir.display()
            );
        }
        Err(RunError::ArchiveFailed {
            post_id,
            path,
            source,
        }) => {
            // The post is live but the file is still in the pending set.
            log::error!("Uploaded as post {post_id}, but archiving {} failed: {source}", path.display());
            log::error!(
                "Move the file out of {} manually or the next run will post it again",
                config.directories.pending_dir.display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Print the caption variable registry, sorted by name.
fn print_variables() {
    println!();
    println!("Caption template variables — use {{VARIABLE_NAME}} in caption files");
    println!();
    println!("Example caption file:");
    println!("  {{FILE_NAME}}.");
    println!(
        "  {{IMAGE_MAKE}} {{IMAGE_MODEL}} | {{IMAGE_F_NUMBER}} | {{IMAGE_EXPOSURE_TIME}} | ISO {{IMAGE_PHOTOGRAPHIC_SENSITIVITY}}"
    );
    println!("  #landscape #nature");
    println!();

    let vars = template::variables();
    for var in &vars {
        println!("  {{{:<32}}} - {}", var.name, var.description);
    }
    println!();
    println!("Total: {} variables available", vars.len());
}
