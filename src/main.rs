use clap::{Parser, Subcommand};
use lightbox::config::{self, PipelineConfig};
use lightbox::imaging::{self, ImageBackend, Quality, RustBackend};
use lightbox::intake::{self, IntakeError};
use lightbox::output;
use lightbox::paths::PathResolver;
use lightbox::pipeline::{Pipeline, PipelineStats};
use lightbox::store::{JsonFileStore, MetadataStore};
use lightbox::types::{MediaClass, MediaId, MediaItem, ProcessingStatus};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lightbox")]
#[command(about = "Generate thumbnails and fitted sizes for uploaded photos and avatars")]
#[command(long_about = "\
Generate thumbnails and fitted sizes for uploaded photos and avatars

Originals and derivatives live under the storage root:

  static/
  ├── media.json                   # Records and their status
  ├── photos/
  │   ├── 42_<token>_o.jpg         # Original
  │   ├── 42_<token>_t50.jpg       # 50x50 thumbnail (cropped)
  │   └── 42_<token>_f300.jpg      # Fits in 300x300 (not cropped)
  └── avatars/
      ├── default_25.jpg           # Placeholder family (render-defaults)
      ├── 7_o.jpg
      └── 7_25.jpg

Status moves from pending to ready once every size is written, or to failed
on the first error. Failed items are not retried; use 'reprocess'.

Run 'lightbox gen-config' to generate a documented lightbox.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults apply when it is absent)
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Storage root, overriding `storage_root` from the config
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record new uploads, store their originals, and process them
    Ingest {
        /// Media class: photo or avatar
        #[arg(long)]
        class: MediaClass,
        /// Image files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Process existing records again from their stored originals
    Reprocess {
        /// Media class the ids belong to
        #[arg(long)]
        class: MediaClass,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Give an account the placeholder avatar family
    SeedAvatar { id: i64 },
    /// Render the placeholder avatar family from an image
    RenderDefaults { file: PathBuf },
    /// List records and their processing status
    Status,
    /// Print a stock lightbox.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = config::load_config(&cli.config)?;
    if let Some(root) = cli.root {
        config.storage_root = root;
    }
    config.validate()?;
    let resolver = PathResolver::new(config.storage_root.clone());
    let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());

    match cli.command {
        Command::Ingest { class, files } => {
            let store = Arc::new(JsonFileStore::open(resolver.root())?);
            let mut items = Vec::with_capacity(files.len());

            for file in &files {
                let item = store.create(class)?;
                let stored = std::fs::read(file)
                    .map_err(|source| IntakeError::Io {
                        path: file.clone(),
                        source,
                    })
                    .and_then(|bytes| intake::store_original(&resolver, &item, &bytes));
                match stored {
                    Ok(path) => {
                        match imaging::get_dimensions(&*backend, &path) {
                            Ok((w, h)) => debug!(%class, id = %item.id, w, h, "original accepted"),
                            Err(err) => warn!(%class, id = %item.id, error = %err, "original is not a readable image"),
                        }
                        println!("{} {} ← {}", class, item.id, file.display());
                        items.push(item);
                    }
                    Err(err) => {
                        error!(%class, id = %item.id, file = %file.display(), error = %err, "cannot store original");
                        store.update_status(item.id, ProcessingStatus::Failed)?;
                    }
                }
            }

            let stats = run_pipeline(&config, backend, store, items).await?;
            output::print_stats(&stats);
        }
        Command::Reprocess { class, ids } => {
            let store = Arc::new(JsonFileStore::open(resolver.root())?);
            let mut items = Vec::with_capacity(ids.len());
            for id in ids {
                let item = store.get(MediaId(id))?;
                if item.class != class {
                    return Err(format!("media {} is a {}, not a {}", item.id, item.class, class).into());
                }
                items.push(item);
            }

            let stats = run_pipeline(&config, backend, store, items).await?;
            output::print_stats(&stats);
        }
        Command::SeedAvatar { id } => {
            let written = intake::seed_default_avatar(&resolver, &config.sizes.avatar, MediaId(id))?;
            output::print_written_files(&format!("Avatar {id}"), &written, resolver.root());
        }
        Command::RenderDefaults { file } => {
            let written = intake::render_default_avatars(
                &*backend,
                &resolver,
                &config.sizes.avatar,
                &file,
                Quality::new(config.output.quality),
            )?;
            output::print_written_files("Default avatars", &written, resolver.root());
        }
        Command::Status => {
            let store = JsonFileStore::open(resolver.root())?;
            output::print_status_output(&store.list()?, &resolver);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Start the pipeline, admit `items` in order, and wait for all of them.
async fn run_pipeline(
    config: &PipelineConfig,
    backend: Arc<dyn ImageBackend>,
    store: Arc<JsonFileStore>,
    items: Vec<MediaItem>,
) -> Result<PipelineStats, Box<dyn Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event);
        }
    });

    let pipeline = Pipeline::start_with_events(config, backend, store, tx)?;
    for item in items {
        pipeline.enqueue(item).await?;
    }
    let stats = pipeline.shutdown().await;

    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    Ok(stats)
}
