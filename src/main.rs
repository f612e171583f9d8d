use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use cinematch::{
    models::RecommendationResponse,
    presenter,
    services::{
        backend::{CatalogSource, RecommendationBackend},
        capture::{ImagePayload, StillImageDevice, WebcamCapture},
        catalog, HttpBackend, IgnoreReason, RecommendationPipeline, Submission,
    },
    session::{BackendStatus, SessionContext},
    storage::{FileStore, ProfileStore},
    telemetry, Config,
};

#[derive(Parser)]
#[command(name = "cinematch")]
#[command(about = "Emotion-aware movie recommendations from a photo", long_about = None)]
struct Cli {
    /// Recommendation backend base URL (overrides CINEMATCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the recommendation backend is reachable
    Health,

    /// Upload a photo and print movie recommendations
    Recommend {
        /// Image file to analyze
        path: PathBuf,

        /// Profile the run belongs to
        #[arg(short, long)]
        user: Option<String>,

        /// Add every recommendation to the user's watchlist
        #[arg(long, requires = "user")]
        save_to_watchlist: bool,

        /// Print the normalized result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Take a mirrored camera snapshot and run it through the pipeline
    Capture {
        /// Still image served as the camera frame
        #[arg(short, long)]
        frame: PathBuf,

        #[arg(short, long)]
        user: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Run facial analysis only
    Analyze {
        path: PathBuf,
    },

    /// Search the movie catalog by title
    Search {
        query: String,
    },

    /// Trending movies this week
    Trending,

    /// Popular movies
    Popular,

    /// Inspect and edit stored profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Print the user's preferences
    Show {
        #[arg(short, long)]
        user: String,
    },

    /// Move a watchlist entry into the watch history
    Watch {
        #[arg(short, long)]
        user: String,

        /// Id of the watchlist entry
        movie_id: u64,
    },

    /// List the user's watchlist
    Watchlist {
        #[arg(short, long)]
        user: String,
    },

    /// List the user's watch history
    History {
        #[arg(short, long)]
        user: String,

        /// Remove all history entries instead of listing them
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let args = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }

    let backend = HttpBackend::from_config(&config)?;
    info!(api_url = %backend.api_url(), "Using recommendation backend");

    match args.command {
        Commands::Health => {
            let pipeline = RecommendationPipeline::new(Arc::new(backend));
            let mut session = SessionContext::anonymous();
            pipeline.check_backend(&mut session).await;
            println!("{}", session.status_text());
            if session.backend_status() != BackendStatus::Connected {
                bail!("backend at {} is not healthy", config.api_url);
            }
        }

        Commands::Recommend {
            path,
            user,
            save_to_watchlist,
            json,
        } => {
            let image = ImagePayload::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let response = recommend(Arc::new(backend), user.clone(), image).await?;
            print_response(&response, json)?;

            if save_to_watchlist {
                if let Some(user) = user {
                    let profiles = profiles(&config);
                    let mut added = 0;
                    for movie in response.recommendations {
                        if profiles.add_to_watchlist(&user, movie)? {
                            added += 1;
                        }
                    }
                    println!("\nAdded {} movies to {}'s watchlist", added, user);
                }
            }
        }

        Commands::Capture { frame, user, json } => {
            let image = {
                let mut camera = WebcamCapture::new(StillImageDevice::new(frame));
                camera.start()?;
                camera
                    .capture()?
                    .context("Camera did not produce a snapshot")?
            };
            let response = recommend(Arc::new(backend), user, image).await?;
            print_response(&response, json)?;
        }

        Commands::Analyze { path } => {
            let image = ImagePayload::from_path(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            image.validate()?;
            let analysis = backend.analyze_image(&image).await?;
            println!("{}", presenter::render_analysis(&analysis));
        }

        Commands::Search { query } => {
            let movies = catalog::search_movies(catalog_source(backend), &query).await?;
            print_movies(&movies, &format!("No movies found for \"{}\"", query.trim()));
        }

        Commands::Trending => {
            let movies = catalog::trending_movies(catalog_source(backend)).await;
            print_movies(&movies, "No trending movies available");
        }

        Commands::Popular => {
            let movies = catalog::popular_movies(catalog_source(backend)).await;
            print_movies(&movies, "No popular movies available");
        }

        Commands::Profile { command } => run_profile(&profiles(&config), command)?,
    }

    Ok(())
}

/// Health check, then one pipeline run with a live progress bar on stderr
async fn recommend(
    backend: Arc<dyn RecommendationBackend>,
    user: Option<String>,
    image: ImagePayload,
) -> anyhow::Result<RecommendationResponse> {
    let pipeline = RecommendationPipeline::new(backend);
    let mut session = SessionContext::new(user);

    if pipeline.check_backend(&mut session).await != BackendStatus::Connected {
        bail!("{}", session.status_text());
    }

    let watcher = tokio::spawn(presenter::follow_progress(
        pipeline.subscribe(),
        |line| eprintln!("{}", line),
    ));

    let submission = pipeline.submit(&session, image).await;
    // Dropping the pipeline closes the progress channel; the watcher drains it and exits
    drop(pipeline);
    if let Err(e) = watcher.await {
        tracing::debug!(error = %e, "Progress watcher stopped");
    }

    match submission? {
        Submission::Completed(response) => Ok(response),
        Submission::Ignored(IgnoreReason::Busy) => bail!("A run is already in progress"),
        Submission::Ignored(IgnoreReason::BackendUnavailable) => {
            bail!("{}", session.status_text())
        }
    }
}

fn print_response(response: &RecommendationResponse, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        println!("{}", presenter::render_results(response));
    }
    Ok(())
}

fn print_movies(movies: &[cinematch::models::Movie], empty: &str) {
    if movies.is_empty() {
        println!("{}", empty);
    } else {
        println!("{}", presenter::render_movies(movies));
    }
}

fn catalog_source(backend: HttpBackend) -> Arc<dyn CatalogSource> {
    Arc::new(backend)
}

fn profiles(config: &Config) -> ProfileStore<FileStore> {
    ProfileStore::new(FileStore::new(profile_dir(&config.data_dir)))
}

fn profile_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("profiles")
}

fn run_profile(profiles: &ProfileStore<FileStore>, command: ProfileCommands) -> anyhow::Result<()> {
    match command {
        ProfileCommands::Show { user } => {
            let preferences = profiles.preferences(&user)?;
            println!("{}", serde_json::to_string_pretty(&preferences)?);
        }

        ProfileCommands::Watch { user, movie_id } => {
            let movie = profiles
                .watchlist(&user)?
                .into_iter()
                .find(|m| m.id == movie_id)
                .with_context(|| format!("Movie {} is not on {}'s watchlist", movie_id, user))?;
            let title = movie.title.clone();
            profiles.record_watch(&user, movie)?;
            profiles.remove_from_watchlist(&user, movie_id)?;
            println!("Marked \"{}\" as watched", title);
        }

        ProfileCommands::Watchlist { user } => {
            let watchlist = profiles.watchlist(&user)?;
            print_movies(&watchlist, "Watchlist is empty");
        }

        ProfileCommands::History { user, clear } => {
            if clear {
                profiles.clear_history(&user)?;
                println!("Cleared watch history for {}", user);
                return Ok(());
            }

            let history = profiles.history(&user)?;
            if history.is_empty() {
                println!("No watch history");
            }
            for entry in history {
                println!(
                    "{}  {}",
                    entry.watched_at.format("%Y-%m-%d %H:%M"),
                    presenter::render_movie(&entry.movie)
                );
            }
        }
    }
    Ok(())
}
