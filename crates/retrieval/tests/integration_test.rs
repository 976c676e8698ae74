//! Quiz answers through the real encoder and index.

use catalog::{Movie, MovieIndex};
use embeddings::{Encoder, HashingEncoder};
use retrieval::filters::AlreadySeenFilter;
use retrieval::{
    CandidateRetriever, FilterPipeline, MoodProfileBuilder, QuizAnswer, RetrievalContext,
};
use std::sync::Arc;

async fn embedded(encoder: &HashingEncoder, movies: Vec<Movie>) -> Vec<Movie> {
    let mut out = Vec::with_capacity(movies.len());
    for mut movie in movies {
        movie.embedding = encoder.encode(&movie.embedding_text()).await.unwrap();
        out.push(movie);
    }
    out
}

async fn setup() -> (MoodProfileBuilder, CandidateRetriever) {
    let encoder = HashingEncoder::new(256).unwrap();
    let movies = vec![
        Movie::new(1, "Quiet Rain", vec![])
            .with_overview("A melancholic slow story about grief and quiet healing")
            .with_genres(["Drama"]),
        Movie::new(2, "Turbo Chase", vec![])
            .with_overview("Explosive car chases and nonstop action")
            .with_genres(["Action"]),
        Movie::new(3, "Laugh Riot", vec![])
            .with_overview("A goofy comedy of errors at a wedding")
            .with_genres(["Comedy"]),
    ];
    let index = MovieIndex::build(embedded(&encoder, movies).await).unwrap();

    (
        MoodProfileBuilder::new(Arc::new(encoder)),
        CandidateRetriever::standard(Arc::new(index)),
    )
}

#[tokio::test]
async fn test_melancholic_answers_retrieve_the_drama_first() {
    let (builder, retriever) = setup().await;
    let answers = vec![
        QuizAnswer::new("mood", "melancholic"),
        QuizAnswer::new("pace", "slow"),
    ];

    let profile = builder.build(&answers).await.unwrap();
    let candidates = retriever.retrieve(&profile, 5).unwrap();

    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].movie_id(), 1);
    assert!(candidates
        .windows(2)
        .all(|w| w[0].similarity_score >= w[1].similarity_score));
}

#[tokio::test]
async fn test_seen_movie_is_excluded() {
    let (builder, retriever) = setup().await;
    let profile = builder
        .build(&[QuizAnswer::new("mood", "melancholic slow grief")])
        .await
        .unwrap();

    let mut context = RetrievalContext::new();
    context.seen_movies.insert(1);
    let candidates = retriever
        .retrieve_with_context(&profile, 2, &context)
        .unwrap();

    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| c.movie_id() != 1));
}

#[tokio::test]
async fn test_custom_pipeline() {
    let (builder, retriever) = setup().await;
    let retriever = retriever.with_filters(FilterPipeline::new().add_filter(AlreadySeenFilter));
    let profile = builder
        .build(&[QuizAnswer::new("energy", "explosive action")])
        .await
        .unwrap();

    let mut context = RetrievalContext::new();
    context.seen_movies.extend([1, 2, 3]);
    // every movie is filtered out, so the unfiltered ranking comes back
    let candidates = retriever
        .retrieve_with_context(&profile, 1, &context)
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].movie_id(), 2);
}
