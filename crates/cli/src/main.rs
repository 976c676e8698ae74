mod output;
mod stats;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::seq::IndexedRandom;
use recommender::orchestrator::build_encoder;
use recommender::{RecommendationOrchestrator, RecommenderConfig};
use retrieval::{DurationPreference, QuizAnswer, RetrievalContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::info;

use crate::output::{print_recommendation, RecommendationView};
use crate::stats::LatencyStats;

const EMBED_BATCH_SIZE: usize = 32;

/// CineMood - a movie for your mood
#[derive(Parser)]
#[command(name = "cinemood")]
#[command(about = "Mood quiz to movie recommendation", long_about = None)]
struct Cli {
    /// Movie catalog (JSON lines); overrides CINEMOOD_CATALOG_PATH
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend one movie for a set of quiz answers
    Recommend {
        /// Quiz answer as question=option; repeat in quiz order
        #[arg(short, long = "answer", value_name = "QUESTION=OPTION")]
        answers: Vec<QuizAnswer>,

        /// JSON file with an array of answers, read before --answer
        #[arg(long, value_name = "FILE")]
        answers_file: Option<PathBuf>,

        /// Number of candidates the model chooses from
        #[arg(short, long)]
        k: Option<usize>,

        /// Skip the generative model
        #[arg(long)]
        no_llm: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Only movies with one of these genres ("surprise" for any)
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Never movies with these genres
        #[arg(long = "exclude-genre")]
        excluded_genres: Vec<String>,

        /// <90, 90-120, >120 or any
        #[arg(long, default_value = "any")]
        duration: DurationPreference,

        /// Streaming platforms the user has
        #[arg(long = "platform")]
        platforms: Vec<String>,

        /// Catalog ids the user has already seen
        #[arg(long = "seen")]
        seen: Vec<u32>,
    },

    /// Compute embeddings for a raw movie file
    Embed {
        /// Movies without (or with stale) embeddings
        #[arg(long)]
        input: PathBuf,

        /// Where to write the embedded catalog
        #[arg(long)]
        output: PathBuf,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = RecommenderConfig::from_env().context("Failed to load configuration")?;
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }

    match cli.command {
        Commands::Recommend {
            answers,
            answers_file,
            k,
            no_llm,
            json,
            genres,
            excluded_genres,
            duration,
            platforms,
            seen,
        } => {
            if let Some(k) = k {
                config.candidate_count = k;
            }
            config.llm_mock_mode |= no_llm;

            let mut all_answers = match answers_file {
                Some(path) => read_answers(&path)?,
                None => Vec::new(),
            };
            all_answers.extend(answers);

            let context = RetrievalContext {
                seen_movies: seen.into_iter().collect(),
                wanted_genres: genres,
                excluded_genres,
                duration,
                platforms,
            };
            handle_recommend(&config, &all_answers, &context, json).await?
        }
        Commands::Embed { input, output } => handle_embed(&config, &input, &output).await?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(&config, requests, concurrent).await?,
    }

    Ok(())
}

fn read_answers(path: &Path) -> Result<Vec<QuizAnswer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse answers in {}", path.display()))
}

fn load_orchestrator(config: &RecommenderConfig) -> Result<RecommendationOrchestrator> {
    let start = Instant::now();
    let orchestrator = RecommendationOrchestrator::from_config(config).with_context(|| {
        format!(
            "Failed to load catalog from {}",
            config.catalog_path.display()
        )
    })?;
    println!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        orchestrator.index().len(),
        start.elapsed()
    );
    Ok(orchestrator)
}

/// Handle the 'recommend' command
async fn handle_recommend(
    config: &RecommenderConfig,
    answers: &[QuizAnswer],
    context: &RetrievalContext,
    json: bool,
) -> Result<()> {
    if answers.is_empty() {
        bail!("Provide at least one --answer question=option (or --answers-file)");
    }

    let orchestrator = if json {
        RecommendationOrchestrator::from_config(config)?
    } else {
        load_orchestrator(config)?
    };

    let recommendation = orchestrator
        .recommend_with_context(answers, context)
        .await
        .context("Recommendation failed")?;

    if json {
        let view = RecommendationView::from(&recommendation);
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_recommendation(&recommendation);
    }
    Ok(())
}

/// Handle the 'embed' command
async fn handle_embed(config: &RecommenderConfig, input: &Path, output: &Path) -> Result<()> {
    let mut movies = catalog::parser::parse_catalog(input)
        .with_context(|| format!("Failed to read movies from {}", input.display()))?;
    let encoder = build_encoder(config)?;

    let start = Instant::now();
    for chunk in movies.chunks_mut(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|movie| movie.embedding_text()).collect();
        let embeddings = encoder
            .encode_batch(&texts)
            .await
            .context("Failed to embed movies")?;
        for (movie, embedding) in chunk.iter_mut().zip(embeddings) {
            movie.embedding = embedding;
        }
        info!("Embedded {} movies", chunk.len());
    }

    // fail here rather than when the catalog is next loaded
    catalog::MovieIndex::build(movies.clone()).context("Embedded catalog is invalid")?;
    catalog::parser::write_catalog(output, &movies)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Embedded {} movies with {} ({} dimensions) in {:?} -> {}",
        "✓".green(),
        movies.len(),
        encoder.name(),
        encoder.dimension(),
        start.elapsed(),
        output.display()
    );
    Ok(())
}

const MOODS: &[&str] = &[
    "joyful",
    "melancholic",
    "stressed",
    "curious",
    "romantic",
    "adventurous",
    "nostalgic",
];
const PACES: &[&str] = &["slow", "steady", "fast"];
const COMPANY: &[&str] = &["alone", "partner", "friends", "family"];

fn random_answers() -> Vec<QuizAnswer> {
    let mut rng = rand::rng();
    [("mood", MOODS), ("pace", PACES), ("company", COMPANY)]
        .into_iter()
        .filter_map(|(question, options)| {
            options
                .choose(&mut rng)
                .map(|option| QuizAnswer::new(question, *option))
        })
        .collect()
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    config: &RecommenderConfig,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("--requests must be at least 1");
    }
    let orchestrator = load_orchestrator(config)?;
    println!(
        "Running {} requests ({} concurrent, generative model {})",
        requests,
        concurrent.max(1),
        if orchestrator.uses_generator() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let request_answers: Vec<Vec<QuizAnswer>> = (0..requests).map(|_| random_answers()).collect();

    let start = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for answers in request_answers {
        let orchestrator = orchestrator.clone();
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let request_start = Instant::now();
            let recommendation = orchestrator.recommend(&answers).await?;
            Ok::<_, anyhow::Error>((request_start.elapsed(), recommendation.confidence))
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    let mut model_selected = 0usize;
    for handle in handles {
        let (elapsed, confidence) = handle.await??;
        if confidence == recommender::Confidence::LlmSelected {
            model_selected += 1;
        }
        timings.push(elapsed);
    }
    let wall_time = start.elapsed();

    let Some(stats) = LatencyStats::from_timings(timings) else {
        bail!("No request completed");
    };
    let throughput = stats.count as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", stats.average);
    println!("P50 latency: {:?}", stats.p50);
    println!("P95 latency: {:?}", stats.p95);
    println!("P99 latency: {:?}", stats.p99);
    println!("Max latency: {:?}", stats.max);
    println!("Throughput: {:.2} requests/second", throughput);
    println!(
        "Model-selected: {} of {} ({} similarity fallback)",
        model_selected,
        stats.count,
        stats.count - model_selected
    );

    Ok(())
}
