use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use memeswap::{config, template};
use memeswap_vision::{MeshDetector, SwapEngine, SwapError};

#[derive(Parser)]
#[command(name = "memeswap")]
#[command(
    version,
    about = "Swap a face onto a meme template with landmark alignment and soft-mask blending"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Swap a face onto a meme template
    Swap {
        /// Photo containing the face to swap in
        #[arg(short, long)]
        user: PathBuf,
        /// Template id (resolved in the template directory) or image path
        #[arg(short, long)]
        template: String,
        /// Output PNG path
        #[arg(short, long, default_value = "meme.png")]
        output: PathBuf,
        /// Face-mesh model path (defaults to the configured one)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// List built-in meme templates
    Templates {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?;

    match cli.command {
        Commands::Swap {
            user,
            template,
            output,
            model,
        } => swap(&cfg, &user, &template, &output, model.as_deref()),
        Commands::Templates { json } => list_templates(json),
        Commands::Config => open_config(),
    }
}

fn swap(
    cfg: &config::Config,
    user: &Path,
    template_arg: &str,
    output: &Path,
    model: Option<&Path>,
) -> Result<()> {
    let template_path = resolve_template(cfg, template_arg)?;
    info!("Using template image: {}", template_path.display());

    let model_path = model.unwrap_or(&cfg.model);
    let detector =
        MeshDetector::from_file(model_path).context("Failed to load face mesh model")?;
    let mut engine = SwapEngine::new(detector);

    let user_bytes =
        std::fs::read(user).with_context(|| format!("reading {}", user.display()))?;
    let template_bytes = std::fs::read(&template_path)
        .with_context(|| format!("reading {}", template_path.display()))?;

    let result = match engine.swap_bytes(&user_bytes, &template_bytes) {
        Ok(bytes) => bytes,
        Err(SwapError::NoFaceDetected(role)) => {
            anyhow::bail!(
                "No face detected in the {} image. Use a clear photo with a visible face.",
                role
            );
        }
        Err(SwapError::InsufficientLandmarks(role)) => {
            anyhow::bail!(
                "Couldn't detect facial features clearly in the {} image. \
                 Use a well-lit photo with the face looking at the camera.",
                role
            );
        }
        Err(e) => return Err(e.into()),
    };

    std::fs::write(output, result)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("✓ Wrote {}", output.display());
    Ok(())
}

fn resolve_template(cfg: &config::Config, arg: &str) -> Result<PathBuf> {
    let direct = Path::new(arg);
    if direct.exists() {
        return Ok(direct.to_path_buf());
    }

    let t = template::find(arg).with_context(|| {
        format!("Unknown template '{arg}'. Run 'memeswap templates' to list built-ins.")
    })?;

    for ext in ["png", "jpg", "jpeg", "webp"] {
        let candidate = cfg.template_dir.join(format!("{}.{ext}", t.id));
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    anyhow::bail!(
        "No local image for template '{}' in {}. Download {} and place it there.",
        t.id,
        cfg.template_dir.display(),
        t.image_ref
    )
}

fn list_templates(json: bool) -> Result<()> {
    let templates = &*template::BUILTIN_TEMPLATES;
    if json {
        println!("{}", serde_json::to_string_pretty(templates)?);
        return Ok(());
    }
    for t in templates {
        println!("{:<16} {}", t.id, t.name);
        println!("{:<16} {}", "", t.description);
    }
    Ok(())
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
