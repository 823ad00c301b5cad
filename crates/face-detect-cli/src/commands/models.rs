//! Models command - manage ML models.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use face_detect_adapters::models::{fetch_model, find_model, list_models, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{AppConfig, PROJECT_CONFIG_FILE};
use crate::detector::resolve_models_dir;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download the BlazeFace weights
    Fetch {
        /// Download URL (overrides [models] blazeface_url)
        #[arg(long)]
        url: Option<String>,
        /// Expected SHA-256 of the file, in hex
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

impl ModelsArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if self.models_dir.is_none() {
            self.models_dir.clone_from(&config.models.dir);
        }
        if let ModelsCommand::Fetch { url, .. } = &mut self.command {
            if url.is_none() {
                url.clone_from(&config.models.blazeface_url);
            }
        }
        self
    }

    fn dir(&self) -> PathBuf {
        resolve_models_dir(self.models_dir.as_deref())
    }
}

/// Run the models command.
pub fn run(args: &ModelsArgs) -> Result<()> {
    match &args.command {
        ModelsCommand::Fetch { url, sha256 } => {
            fetch(args, url.as_deref(), sha256.as_deref())
        }
        ModelsCommand::List => {
            print_list(args);
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", args.dir().display());
            Ok(())
        }
    }
}

fn fetch(args: &ModelsArgs, url: Option<&str>, sha256: Option<&str>) -> Result<()> {
    let model = find_model("blazeface")
        .ok_or_else(|| anyhow::anyhow!("blazeface is not a known model"))?;
    let Some(url) = url else {
        anyhow::bail!(
            "No download URL for {}. Pass --url or set [models] blazeface_url in {PROJECT_CONFIG_FILE}.",
            model.name
        );
    };

    let pb = Arc::new(ProgressBar::new(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );
    pb.set_message(model.name);

    let pb_clone = Arc::clone(&pb);
    let progress: ProgressCallback =
        Box::new(move |_name: &str, downloaded: u64, total: Option<u64>| {
            if let Some(t) = total {
                pb_clone.set_length(t);
            }
            pb_clone.set_position(downloaded);
        });

    let path = fetch_model(model, url, sha256, &args.dir(), Some(&progress))?;

    pb.finish_with_message(format!("Installed {}", path.display()));
    Ok(())
}

fn print_list(args: &ModelsArgs) {
    let dir = args.dir();
    let models = list_models(&dir);

    println!("Models directory: {}", dir.display());
    println!();

    for (info, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        println!(
            "  {status} {} ({}) - {}",
            info.name, info.filename, info.description
        );
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());
}
