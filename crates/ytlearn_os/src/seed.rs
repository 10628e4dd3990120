#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde_json::Value;
use ytlearn_contracts::content::{Flashcard, Flashcards, Quiz, QuizQuestion};
use ytlearn_contracts::creation::{
    ContentFormat, Creation, CreationSource, GameType, METADATA_QUESTIONS_KEY,
};
use ytlearn_contracts::UnixTimeMs;
use ytlearn_engines::thumbnail::placeholder_thumbnail;

pub const SEED_ID_PREFIX: &str = "example-";
const SEED_CREATED_AT: UnixTimeMs = UnixTimeMs(1_704_067_200_000);

fn question(text: &str, options: [&str; 4], correct: usize, why: &str) -> QuizQuestion {
    QuizQuestion {
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_index: correct,
        explanation: why.to_string(),
    }
}

fn card(front: &str, back: &str) -> Flashcard {
    Flashcard {
        front: front.to_string(),
        back: back.to_string(),
    }
}

fn seed(
    slug: &str,
    title: &str,
    source: CreationSource,
    game_type: GameType,
    content: String,
    format: ContentFormat,
    items: usize,
) -> Creation {
    let mut metadata = BTreeMap::new();
    metadata.insert(METADATA_QUESTIONS_KEY.to_string(), Value::from(items));
    Creation {
        id: format!("{SEED_ID_PREFIX}{slug}"),
        title: title.to_string(),
        source,
        thumbnail: placeholder_thumbnail(game_type),
        game_type,
        content,
        content_format: Some(format),
        difficulty: "facile".to_string(),
        metadata,
        created_at: SEED_CREATED_AT,
        updated_at: SEED_CREATED_AT,
    }
}

/// Built-in creations listed next to the user's own. A stored creation with the
/// same id replaces its seed.
pub fn seed_examples() -> Vec<Creation> {
    let quiz = Quiz {
        title: "La photosynthèse".to_string(),
        questions: vec![
            question(
                "Quel gaz les plantes absorbent-elles pendant la photosynthèse ?",
                ["L'oxygène", "Le dioxyde de carbone", "L'azote", "L'hélium"],
                1,
                "Le CO2 est fixé pour produire du glucose.",
            ),
            question(
                "Dans quel organite se déroule la photosynthèse ?",
                ["La mitochondrie", "Le noyau", "Le chloroplaste", "Le ribosome"],
                2,
                "Les chloroplastes contiennent la chlorophylle.",
            ),
            question(
                "Quelle énergie alimente la photosynthèse ?",
                ["Thermique", "Lumineuse", "Chimique", "Électrique"],
                1,
                "La lumière est captée par les pigments.",
            ),
        ],
    };
    let deck = Flashcards {
        title: "Capitales européennes".to_string(),
        cards: vec![
            card("Capitale du Portugal", "Lisbonne"),
            card("Capitale de la Pologne", "Varsovie"),
            card("Capitale de la Hongrie", "Budapest"),
            card("Capitale de l'Irlande", "Dublin"),
            card("Capitale de la Finlande", "Helsinki"),
        ],
    };
    let quiz_items = quiz.questions.len();
    let deck_items = deck.cards.len();

    vec![
        seed(
            "quiz-photosynthese",
            &quiz.title,
            CreationSource::Youtube {
                source_url: "https://www.youtube.com/watch?v=UPBMG5EYydo".to_string(),
            },
            GameType::Quiz,
            serde_json::to_string(&quiz).unwrap_or_default(),
            ContentFormat::QuizJson,
            quiz_items,
        ),
        seed(
            "flashcards-capitales",
            &deck.title,
            CreationSource::Pdf {
                source_file_name: "capitales-europe.pdf".to_string(),
            },
            GameType::Flashcards,
            serde_json::to_string(&deck).unwrap_or_default(),
            ContentFormat::FlashcardsJson,
            deck_items,
        ),
    ]
}
