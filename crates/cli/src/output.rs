//! Terminal and JSON rendering of recommendations.

use colored::Colorize;
use recommender::Recommendation;
use serde::Serialize;

/// What `--json` prints: the recommendation without embeddings
#[derive(Debug, Serialize)]
pub struct RecommendationView<'a> {
    pub id: u32,
    pub title: &'a str,
    pub year: Option<u16>,
    pub genres: &'a [String],
    pub runtime: Option<u16>,
    pub similarity_score: f32,
    pub confidence: recommender::Confidence,
    pub justification: &'a str,
    pub alternatives: Vec<AlternativeView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct AlternativeView<'a> {
    pub id: u32,
    pub title: &'a str,
    pub similarity_score: f32,
    pub tagline: &'a str,
}

impl<'a> From<&'a Recommendation> for RecommendationView<'a> {
    fn from(rec: &'a Recommendation) -> Self {
        Self {
            id: rec.movie.id,
            title: &rec.movie.title,
            year: rec.movie.year(),
            genres: &rec.movie.genres,
            runtime: rec.movie.runtime,
            similarity_score: rec.similarity_score,
            confidence: rec.confidence,
            justification: &rec.justification,
            alternatives: rec
                .alternatives
                .iter()
                .map(|alt| AlternativeView {
                    id: alt.movie.id,
                    title: &alt.movie.title,
                    similarity_score: alt.similarity_score,
                    tagline: &alt.tagline,
                })
                .collect(),
        }
    }
}

pub fn print_recommendation(rec: &Recommendation) {
    let movie = &rec.movie;
    let year = movie
        .year()
        .map(|y| format!(" ({y})"))
        .unwrap_or_default();

    println!("{}", "Tonight's pick:".bold().blue());
    println!(
        "  {}{} [{}] - similarity {:.2}",
        movie.title.bold(),
        year,
        movie.genres.join(", "),
        rec.similarity_score
    );
    if let Some(runtime) = movie.runtime {
        println!("  {} min", runtime);
    }
    println!("  {}", rec.justification.italic());
    println!("  {} {}", "confidence:".dimmed(), rec.confidence);

    if rec.alternatives.is_empty() {
        return;
    }
    println!();
    println!("{}", "Also worth a look:".bold().blue());
    for (rank, alt) in rec.alternatives.iter().enumerate() {
        println!(
            "{}. {} - {} ({:.2})",
            (rank + 1).to_string().green(),
            alt.movie.title,
            alt.tagline,
            alt.similarity_score
        );
    }
}
