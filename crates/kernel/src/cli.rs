//! Command-line interface.
//!
//! Each subcommand wires the services from [`Config`] and prints a plain
//! text result to stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::content::{
    Draft, MemoryReviewStore, PgReviewStore, RatingBounds, ReviewService, ReviewStore,
    render_html, search_by_title, top_ranked,
};
use crate::content::editor::default_author;
use crate::content::rating::format_rating;
use crate::db;
use crate::file::{AssetService, FileStorage, LocalFileStorage, RawImage};
use crate::identity::{SessionIdentity, resolve_actor};
use crate::models::{Actor, Review, Role};

/// Folio review manager.
#[derive(Debug, Parser)]
#[command(name = "folio", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List reviews, newest first.
    List {
        /// Only reviews whose title contains this text (case-insensitive).
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a review as HTML.
    Show { id: Uuid },
    /// Print the top-rated leaderboard.
    Ranking {
        #[arg(long, default_value_t = crate::content::query::DEFAULT_MIN_RATING)]
        min: f64,
        #[arg(long, default_value_t = crate::content::query::DEFAULT_MAX_RATING)]
        max: f64,
    },
    /// Commit a review from a JSON file.
    Import {
        file: PathBuf,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Delete a review.
    Delete {
        id: Uuid,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Compress and upload an image, printing its public address.
    Upload { path: PathBuf },
    /// Apply database migrations.
    Migrate,
}

/// Who the command runs as.
#[derive(Debug, clap::Args)]
pub struct ActorArgs {
    #[arg(long)]
    pub actor: Uuid,
    /// viewer, author or administrator.
    #[arg(long, default_value = "author")]
    pub role: String,
}

impl ActorArgs {
    fn to_actor(&self) -> Result<Actor> {
        let role: Role = self.role.parse()?;
        Ok(Actor::new(self.actor, role))
    }
}

/// Run a parsed command.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Command::List { search, limit } => cmd_list(config, search.as_deref(), limit).await,
        Command::Show { id } => cmd_show(config, id).await,
        Command::Ranking { min, max } => cmd_ranking(config, min, max).await,
        Command::Import { file, actor } => cmd_import(config, &file, &actor).await,
        Command::Delete { id, actor } => cmd_delete(config, id, &actor).await,
        Command::Upload { path } => cmd_upload(config, &path).await,
        Command::Migrate => cmd_migrate(config).await,
    }
}

async fn connect(config: &Config) -> Result<Option<PgPool>> {
    match &config.database_url {
        Some(url) => Ok(Some(
            db::create_pool(url, config.database_max_connections).await?,
        )),
        None => Ok(None),
    }
}

async fn review_service(config: &Config) -> Result<ReviewService> {
    let store: Arc<dyn ReviewStore> = match connect(config).await? {
        Some(pool) => Arc::new(PgReviewStore::new(pool)),
        None => {
            warn!("DATABASE_URL not set; reviews are kept in memory for this run only");
            Arc::new(MemoryReviewStore::new())
        }
    };
    Ok(ReviewService::new(store))
}

async fn asset_service(config: &Config) -> Result<AssetService> {
    let storage: Arc<dyn FileStorage> = match &config.s3_bucket {
        #[cfg(feature = "s3")]
        Some(bucket) => Arc::new(
            crate::file::S3FileStorage::new(
                bucket.clone(),
                config.s3_prefix.clone(),
                config.files_url.clone(),
                config.s3_endpoint.as_deref(),
            )
            .await?,
        ),
        #[cfg(not(feature = "s3"))]
        Some(_) => {
            warn!("S3_BUCKET is set but S3 support is not compiled in; using local uploads");
            Arc::new(LocalFileStorage::new(&config.uploads_dir, &config.files_url))
        }
        None => Arc::new(LocalFileStorage::new(&config.uploads_dir, &config.files_url)),
    };
    Ok(AssetService::new(storage, config.compression()))
}

/// Resolve the actor given on the command line through the identity gate.
async fn session_actor(config: &Config, args: &ActorArgs) -> Result<Actor> {
    let session = SessionIdentity::logged_in(args.to_actor()?);
    Ok(resolve_actor(&session, config.auth_timeout).await)
}

async fn cmd_list(config: &Config, search: Option<&str>, limit: Option<usize>) -> Result<()> {
    let reviews = review_service(config).await?.list(limit).await?;
    let shown: Vec<&Review> = match search {
        Some(term) => search_by_title(&reviews, term),
        None => reviews.iter().collect(),
    };

    if shown.is_empty() {
        println!("No reviews found.");
        return Ok(());
    }
    for review in shown {
        println!(
            "{}  {:>5}  {}",
            review.id.map(|id| id.to_string()).unwrap_or_default(),
            format_rating(review.rating),
            review.title
        );
    }
    Ok(())
}

async fn cmd_show(config: &Config, id: Uuid) -> Result<()> {
    let review = review_service(config).await?.get(id).await?;
    println!("{}", render_html(&review));
    Ok(())
}

async fn cmd_ranking(config: &Config, min: f64, max: f64) -> Result<()> {
    if min > max {
        bail!("--min ({min}) must not exceed --max ({max})");
    }
    let reviews = review_service(config).await?.list(None).await?;
    let ranked = top_ranked(&reviews, &RatingBounds::new(min, max));

    if ranked.is_empty() {
        println!("No reviews rated between {min} and {max}.");
        return Ok(());
    }
    for entry in ranked {
        let medal = entry.medal.map(|m| m.label()).unwrap_or("");
        println!(
            "{:>3}. {:<3} {:>5}  {}",
            entry.position,
            medal,
            format_rating(entry.review.rating),
            entry.review.title
        );
    }
    Ok(())
}

async fn cmd_import(config: &Config, file: &Path, args: &ActorArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let review: Review = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a review document", file.display()))?;

    let actor = session_actor(config, args).await?;
    let mut draft = Draft::from_review(review);
    if draft.review().author.is_none() {
        draft.set_author(Some(
            default_author(config.site_author.as_deref()).to_string(),
        ));
    }
    let committed = review_service(config).await?.commit(&actor, &mut draft).await?;

    let id = committed.id.context("committed review has no id")?;
    info!(review_id = %id, "review imported");
    println!("{id}");
    Ok(())
}

async fn cmd_delete(config: &Config, id: Uuid, args: &ActorArgs) -> Result<()> {
    let actor = session_actor(config, args).await?;
    review_service(config).await?.delete(&actor, id).await?;
    println!("Review {id} deleted.");
    Ok(())
}

async fn cmd_upload(config: &Config, path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    let address = asset_service(config)
        .await?
        .attach_image(RawImage::new(filename, data))
        .await?;
    println!("{address}");
    Ok(())
}

async fn cmd_migrate(config: &Config) -> Result<()> {
    let Some(pool) = connect(config).await? else {
        bail!("DATABASE_URL is required to run migrations");
    };
    db::run_migrations(&pool).await?;
    println!("Migrations applied.");
    Ok(())
}
