//! canopy CLI entry point

use canopy::{
    commands::{
        cmd_clear_all_sessions, cmd_clear_session, cmd_delete_collection, cmd_ingest_file,
        cmd_ingest_text, cmd_init, cmd_list_collections, cmd_list_sessions, cmd_pitch, cmd_query,
        cmd_seed_project, cmd_show_collection, cmd_show_session, cmd_status, print_collection_view,
        print_collections, print_init, print_ingest_stats, print_pitch_result, print_query_result,
        print_session, print_sessions, print_status, PitchOptions, QueryOptions, TextItem,
    },
    config::Config,
    embed::create_embedder,
    error::Result,
    llm::create_completion_backend,
    models::Confirmation,
    progress::LogWriterFactory,
    rag::Project,
    session::SessionStore,
    store::VectorStore,
};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(version, about = "RAG CLI for conservation knowledge bases with grant-pitch support", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize canopy configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Ingest documents into a collection
    Ingest {
        #[command(subcommand)]
        source: IngestSource,
    },

    /// Ask a question against the knowledge base
    Query {
        /// The question
        query: String,

        /// Collection to search
        #[arg(long)]
        collection: Option<String>,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Session ID for conversation memory
        #[arg(long)]
        session: Option<String>,

        /// Website context scoping the session
        #[arg(long)]
        website: Option<String>,
    },

    /// Grant-pitch workflow
    Pitch {
        #[command(subcommand)]
        action: PitchAction,
    },

    /// Manage collections
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },

    /// Manage conversation sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },

    /// Show system status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum IngestSource {
    /// Ingest a file (PDF or plain text)
    File {
        /// Path to the file
        path: PathBuf,

        /// Target collection (defaults to the configured collection)
        #[arg(long)]
        collection: Option<String>,
    },

    /// Ingest text content directly
    Text {
        /// The text content
        content: String,

        /// Target collection
        #[arg(long)]
        collection: String,

        /// Title or label for this content
        #[arg(long)]
        title: Option<String>,

        /// Store as a single chunk without splitting
        #[arg(long)]
        no_chunk: bool,
    },
}

#[derive(Subcommand)]
enum PitchAction {
    /// Compose a pitch for a grant focus
    Run {
        /// Main focus of the grant (e.g. "raptor conservation")
        grant_focus: String,

        /// Detailed grant requirements
        #[arg(long, default_value = "")]
        requirements: String,

        /// Knowledge collection for supporting context
        #[arg(long)]
        collection: Option<String>,

        /// Number of supporting chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Session ID for conversation memory
        #[arg(long)]
        session: Option<String>,

        /// Website context scoping the session
        #[arg(long)]
        website: Option<String>,
    },

    /// Seed a project into the project catalog
    Seed {
        /// Project name
        #[arg(long)]
        name: String,

        /// Project description
        #[arg(long)]
        description: String,

        /// Focus areas (repeatable)
        #[arg(long = "focus")]
        focus_areas: Vec<String>,

        /// Target species (repeatable)
        #[arg(long = "species")]
        target_species: Vec<String>,

        /// Project location
        #[arg(long, default_value = "")]
        location: String,

        /// Methodology summary
        #[arg(long, default_value = "")]
        methodology: String,

        /// Expected outcomes (repeatable)
        #[arg(long = "outcome")]
        expected_outcomes: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CollectionsAction {
    /// List collections with chunk counts
    List,

    /// Inspect chunks stored in a collection
    Show {
        /// Collection name
        name: String,

        /// Maximum chunks to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Delete a collection and everything in it
    Delete {
        /// Collection name
        name: String,

        /// Confirm the deletion
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List active sessions
    List {
        /// Filter by website context
        #[arg(long)]
        website: Option<String>,
    },

    /// Show a session transcript
    Show {
        /// Session ID
        session_id: String,

        /// Website context
        #[arg(long)]
        website: Option<String>,
    },

    /// Clear one session
    Clear {
        /// Session ID
        session_id: String,

        /// Website context
        #[arg(long)]
        website: Option<String>,

        /// Confirm the deletion
        #[arg(long)]
        confirm: bool,
    },

    /// Clear all sessions
    ClearAll {
        /// Only clear sessions for this website context
        #[arg(long)]
        website: Option<String>,

        /// Confirm the deletion
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Init doesn't need an existing config
    if let Commands::Init { force } = cli.command {
        let config = cmd_init(None, force)?;
        print_init(&config);
        return Ok(());
    }

    // Completions don't need config or backends
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "canopy", &mut std::io::stdout());
        return Ok(());
    }

    let config = match cli.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::load_from(None)?,
    };

    let store = VectorStore::connect(
        &config.qdrant_url,
        config.qdrant_api_key(),
        config.embedding.resolved_dimension(),
    )?;
    let sessions = SessionStore::new(
        config.session.history_window,
        config.session.max_sessions_per_context,
    );

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Ingest { source } => {
            let embedder = create_embedder(&config.embedding)?;
            let stats = match source {
                IngestSource::File { path, collection } => {
                    cmd_ingest_file(
                        &config,
                        &store,
                        embedder.as_ref(),
                        &path,
                        collection.as_deref(),
                    )
                    .await?
                }
                IngestSource::Text {
                    content,
                    collection,
                    title,
                    no_chunk,
                } => {
                    let items = vec![TextItem { content, title }];
                    cmd_ingest_text(
                        &config,
                        &store,
                        embedder.as_ref(),
                        &collection,
                        items,
                        !no_chunk,
                    )
                    .await?
                }
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_ingest_stats(&stats);
            }
        }

        Commands::Query {
            query,
            collection,
            top_k,
            session,
            website,
        } => {
            let embedder = create_embedder(&config.embedding)?;
            let llm = create_completion_backend(&config.llm)?;

            let options = QueryOptions {
                collection,
                top_k,
                session_id: session,
                website_context: website,
            };

            let response = cmd_query(
                &config,
                &store,
                embedder.as_ref(),
                llm.as_ref(),
                &sessions,
                &query,
                options,
            )
            .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_query_result(&response);
            }
        }

        Commands::Pitch { action } => match action {
            PitchAction::Run {
                grant_focus,
                requirements,
                collection,
                top_k,
                session,
                website,
            } => {
                let embedder = create_embedder(&config.embedding)?;
                let llm = create_completion_backend(&config.llm)?;

                let options = PitchOptions {
                    requirements,
                    collection,
                    top_k,
                    session_id: session,
                    website_context: website,
                };

                let response = cmd_pitch(
                    &config,
                    &store,
                    embedder.as_ref(),
                    llm.as_ref(),
                    &sessions,
                    &grant_focus,
                    options,
                )
                .await?;

                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                } else {
                    print_pitch_result(&response);
                }
            }

            PitchAction::Seed {
                name,
                description,
                focus_areas,
                target_species,
                location,
                methodology,
                expected_outcomes,
            } => {
                let embedder = create_embedder(&config.embedding)?;
                let project = Project {
                    name,
                    focus_areas,
                    target_species,
                    location,
                    description,
                    methodology,
                    expected_outcomes,
                    relevance_score: 0.0,
                    source_chunk_id: None,
                };

                let doc_id =
                    cmd_seed_project(&config, &store, embedder.as_ref(), project).await?;

                if cli.json {
                    println!("{}", serde_json::json!({ "document_id": doc_id }));
                } else {
                    println!("Seeded project ({})", doc_id);
                }
            }
        },

        Commands::Collections { action } => match action {
            CollectionsAction::List => {
                let stats = cmd_list_collections(&store).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    print_collections(&stats);
                }
            }

            CollectionsAction::Show { name, limit } => {
                let view = cmd_show_collection(&store, &name, limit).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&view)?);
                } else {
                    print_collection_view(&view);
                }
            }

            CollectionsAction::Delete { name, confirm } => {
                let deleted =
                    cmd_delete_collection(&store, &name, Confirmation::from_flag(confirm))
                        .await?;
                println!("Deleted collection '{}'", deleted);
            }
        },

        Commands::Sessions { action } => match action {
            SessionsAction::List { website } => {
                let summaries = cmd_list_sessions(&sessions, website.as_deref()).await;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                } else {
                    print_sessions(&summaries);
                }
            }

            SessionsAction::Show {
                session_id,
                website,
            } => {
                let session =
                    cmd_show_session(&sessions, &session_id, website.as_deref()).await?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&session)?);
                } else {
                    print_session(&session);
                }
            }

            SessionsAction::Clear {
                session_id,
                website,
                confirm,
            } => {
                cmd_clear_session(
                    &sessions,
                    &session_id,
                    website.as_deref(),
                    Confirmation::from_flag(confirm),
                )
                .await?;
                println!("Cleared session '{}'", session_id);
            }

            SessionsAction::ClearAll { website, confirm } => {
                let removed = cmd_clear_all_sessions(
                    &sessions,
                    website.as_deref(),
                    Confirmation::from_flag(confirm),
                )
                .await?;
                println!("Cleared {} sessions", removed);
            }
        },

        Commands::Status => {
            let status = cmd_status(&config, &store).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}
