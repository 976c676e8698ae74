//! Canned justifications for recommendations made without the model.

use catalog::Movie;

/// Mood keywords and the justification templates used for them.
///
/// `{genre}` is replaced with the movie's first genre, lower-cased.
const MOOD_TEMPLATES: &[(&[&str], &[&str])] = &[
    (
        &["joyful", "happy", "cheerful"],
        &[
            "You're in a great mood, and this {genre} will keep that energy going. \
             A perfect way to stretch the good moment.",
            "With your bright state of mind, this luminous {genre} should land just right. \
             The chemistry on screen matches your joy.",
        ],
    ),
    (
        &["melancholic", "melancholy", "sad", "unhappy"],
        &[
            "Sometimes a good film helps you through the harder moments. \
             This touching {genre} will keep you gentle company.",
            "This film has a rare way of understanding you when things aren't great. \
             Its sensitive {genre} will resonate with what you feel.",
        ],
    ),
    (
        &["stressed", "anxious", "tired"],
        &[
            "You need to decompress. \
             This {genre} lets you escape completely and forget your worries for a while.",
            "Nothing like a good {genre} to release the pressure. \
             This one will carry you far from the daily grind.",
        ],
    ),
    (
        &["curious"],
        &[
            "Your curious mind will love this {genre} and the fascinating questions it asks. \
             Expect to be surprised.",
            "This clever {genre} will feed your curiosity. \
             Every scene brings its share of discoveries and twists.",
        ],
    ),
    (
        &["romantic"],
        &[
            "Love is in the air. \
             This {genre} will make your heart beat faster with its tender story.",
            "Perfect for a romantic mood, \
             this film captures the beauty of feelings through its moving {genre}.",
        ],
    ),
    (
        &["adventurous", "adventure"],
        &[
            "Looking for thrills? \
             This gripping {genre} will keep you on the edge of your seat from start to finish.",
            "Your adventurous side will be spoiled by this epic {genre}. \
             Grand landscapes and brave heroes await.",
        ],
    ),
    (
        &["nostalgic"],
        &[
            "This {genre} has the magic of films that stay with us forever. \
             It will echo your most precious memories.",
            "Perfect for a nostalgic mood, this {genre} classic takes you back to a simpler time.",
        ],
    ),
];

const DEFAULT_TEMPLATES: &[&str] = &[
    "This {genre} fits what you're looking for tonight. \
     Its atmosphere will draw you in from the first minutes.",
    "A great match for your current mood. \
     This {genre} has everything it takes for a memorable evening.",
];

const TAGLINES: &[&str] = &[
    "A hidden gem that will surprise you",
    "A must-see classic",
    "For thrill seekers",
    "An emotional journey, guaranteed",
    "Pure entertainment",
    "A story that stays with you",
    "One to watch tonight",
    "The perfect pick for your mood",
];

/// Justification for `movie` given the mood description.
///
/// The first word of `mood_text` that is a mood keyword picks the template family;
/// the movie id picks the template, so the output is deterministic.
pub fn fallback_justification(mood_text: &str, movie: &Movie) -> String {
    let templates = templates_for(mood_text);
    let template = templates[movie.id as usize % templates.len()];
    let genre = movie
        .genres
        .first()
        .map(|g| g.to_lowercase())
        .unwrap_or_else(|| "film".to_string());
    template.replace("{genre}", &genre)
}

/// Generic tagline for the alternative at `position`.
///
/// Consecutive positions never repeat a tagline for the same `seed`.
pub fn fallback_tagline(seed: u32, position: usize) -> &'static str {
    TAGLINES[(seed as usize + position) % TAGLINES.len()]
}

/// Templates for the earliest whole word in `mood_text` that is a mood keyword
fn templates_for(mood_text: &str) -> &'static [&'static str] {
    let lowered = mood_text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .find_map(|word| {
            MOOD_TEMPLATES
                .iter()
                .find(|(keywords, _)| keywords.contains(&word))
                .map(|(_, templates)| *templates)
        })
        .unwrap_or(DEFAULT_TEMPLATES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: u32, genres: &[&str]) -> Movie {
        Movie::new(id, "Test", vec![1.0]).with_genres(genres.iter().copied())
    }

    #[test]
    fn test_mood_keyword_selects_templates() {
        let text = fallback_justification("mood: melancholic\npace: slow", &movie(2, &["Drama"]));

        assert!(
            MOOD_TEMPLATES[1]
                .1
                .iter()
                .any(|t| t.replace("{genre}", "drama") == text)
        );
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let text = fallback_justification("mood: unhappy", &movie(2, &["Drama"]));

        assert_eq!(text, MOOD_TEMPLATES[1].1[0].replace("{genre}", "drama"));
        assert_ne!(templates_for("mood: unhappy"), MOOD_TEMPLATES[0].1);
    }

    #[test]
    fn test_earliest_keyword_wins() {
        let text = fallback_justification("mood: romantic\nfeeling: happy", &movie(2, &["Drama"]));

        assert_eq!(text, MOOD_TEMPLATES[4].1[0].replace("{genre}", "drama"));
        assert_eq!(templates_for("feeling: happy\nmood: romantic"), MOOD_TEMPLATES[0].1);
    }

    #[test]
    fn test_keyword_inside_another_word_is_ignored() {
        assert_eq!(templates_for("wish: a crusade at sea"), DEFAULT_TEMPLATES);
    }

    #[test]
    fn test_unknown_mood_uses_default() {
        let text = fallback_justification("mood: hungry", &movie(1, &["Comedy"]));

        assert_eq!(text, DEFAULT_TEMPLATES[1].replace("{genre}", "comedy"));
    }

    #[test]
    fn test_missing_genre() {
        let text = fallback_justification("", &movie(0, &[]));

        assert!(text.contains("film"));
        assert!(!text.contains("{genre}"));
    }

    #[test]
    fn test_deterministic() {
        let m = movie(7, &["Horror"]);

        assert_eq!(
            fallback_justification("stressed", &m),
            fallback_justification("stressed", &m)
        );
    }

    #[test]
    fn test_taglines_do_not_repeat() {
        let taglines: Vec<_> = (0..4).map(|i| fallback_tagline(42, i)).collect();

        for (i, a) in taglines.iter().enumerate() {
            assert!(taglines[i + 1..].iter().all(|b| a != b));
        }
    }
}
