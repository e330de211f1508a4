use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use trade_journal::bootstrap::installer;
use trade_journal::config::recipe::Recipe;
use trade_journal::utils::{logger, validation::Validate};
use trade_journal::{Bootstrap, ImageConfig, JournalError, Launcher, Manifest};

#[derive(Parser)]
#[command(name = "bootstrap")]
#[command(about = "Build a runnable image of the journal service and launch it")]
struct Args {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the recipe steps and write the image
    Build {
        #[arg(short, long, default_value = "Bootstrap.toml")]
        recipe: PathBuf,

        /// Application source tree
        #[arg(short, long, default_value = ".")]
        source: PathBuf,

        /// Image output directory
        #[arg(short, long, default_value = "image")]
        image: PathBuf,

        /// Parse the recipe and manifest without building
        #[arg(long)]
        dry_run: bool,
    },
    /// Launch the image command in the foreground
    Run {
        #[arg(short, long, default_value = "image")]
        image: PathBuf,
    },
    /// Print the image metadata
    Inspect {
        #[arg(short, long, default_value = "image")]
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let outcome = match args.command {
        Commands::Build {
            recipe,
            source,
            image,
            dry_run,
        } => build(&recipe, &source, &image, dry_run).await,
        Commands::Run { image } => run(&image),
        Commands::Inspect { image } => inspect(&image),
    };

    match outcome {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ Bootstrap failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

async fn build(recipe_path: &Path, source: &Path, image: &Path, dry_run: bool) -> Result<i32, JournalError> {
    tracing::info!("📁 Loading recipe from: {}", recipe_path.display());
    let recipe = Recipe::from_file(recipe_path)?;
    recipe.validate()?;
    tracing::info!("✅ Recipe loaded and validated");

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        let manifest = Manifest::from_file(source.join(&recipe.image.manifest))?;
        println!("Image:    {}", recipe.image.name);
        println!("Workdir:  {}", recipe.image.workdir);
        println!("Port:     {}", recipe.expose.port);
        println!("Command:  {}", recipe.launch.command.join(" "));
        println!("Packages: {}", manifest.len());
        for package in &manifest.packages {
            println!("  - {}", package);
        }
        return Ok(0);
    }

    let installer = installer::from_config(&recipe.installer)?;
    let engine = Bootstrap::new(installer, recipe);
    let config = engine.build(source, image).await?;

    println!("✅ Image '{}' built", config.name);
    println!("📁 Metadata: {}", ImageConfig::metadata_path(image).display());
    Ok(0)
}

fn run(image: &Path) -> Result<i32, JournalError> {
    let launcher = Launcher::prepare(image)?;
    launcher.launch()
}

fn inspect(image: &Path) -> Result<i32, JournalError> {
    let config = ImageConfig::load(image)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(0)
}
