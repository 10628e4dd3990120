#![forbid(unsafe_code)]

use serde_json::Value;
use tracing::debug;
use ytlearn_contracts::content::{Flashcards, Quiz};

use crate::render_assets::{
    BASE_CSS, ERROR_TEMPLATE, FLASHCARDS_TEMPLATE, FONT_LINKS, QUIZ_TEMPLATE,
};

pub const CARDS_PER_PAGE: usize = 4;

const DEFAULT_QUIZ_TITLE: &str = "Quiz";
const DEFAULT_FLASHCARDS_TITLE: &str = "Cartes de révision";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    accent: &'static str,
    accent_soft: &'static str,
}

const QUIZ_PALETTE: Palette = Palette {
    accent: "#4f46e5",
    accent_soft: "#eef2ff",
};
const FLASHCARDS_PALETTE: Palette = Palette {
    accent: "#0d9488",
    accent_soft: "#ccfbf1",
};
const ERROR_PALETTE: Palette = Palette {
    accent: "#dc2626",
    accent_soft: "#fee2e2",
};

impl Palette {
    fn css_vars(self) -> String {
        format!(
            "--accent:{};--accent-soft:{};--bg:#f8fafc;--surface:#ffffff;--text:#0f172a;\
--muted:#64748b;--ok:#16a34a;--ko:#dc2626;--radius:14px",
            self.accent, self.accent_soft
        )
    }
}

/// Self-contained quiz page. Output depends only on the input; question text
/// is rendered escaped so the page reads without JavaScript. Invalid questions
/// are skipped, and only a quiz with none left becomes the error page.
pub fn render_quiz_html(quiz: &Quiz) -> String {
    let mut quiz = quiz.clone();
    let skipped = quiz.retain_valid();
    if skipped > 0 {
        debug!(skipped, "invalid quiz questions skipped");
    }
    if quiz.questions.is_empty() {
        return render_error_html("Ce quiz ne contient aucune question exploitable.");
    }
    let title = display_title(&quiz.title, DEFAULT_QUIZ_TITLE);
    let mut questions = String::new();
    for (index, q) in quiz.questions.iter().enumerate() {
        let hidden = if index == 0 { "" } else { " hidden" };
        questions.push_str(&format!(
            "<section class=\"question\" data-question-index=\"{index}\"{hidden}>\n\
<h2 class=\"question-text\">{}</h2>\n<ol class=\"options\">\n",
            escape_html(&q.question)
        ));
        for (option_index, option) in q.options.iter().enumerate() {
            questions.push_str(&format!(
                "<li><button type=\"button\" class=\"option\" data-option=\"{option_index}\">{}</button></li>\n",
                escape_html(option)
            ));
        }
        questions.push_str(&format!(
            "</ol>\n<p class=\"explanation\" hidden>{}</p>\n</section>\n",
            escape_html(&q.explanation)
        ));
    }
    let data_json = embed_json(&serde_json::to_string(&quiz).unwrap_or_default());
    let count = quiz.questions.len().to_string();
    let css_vars = QUIZ_PALETTE.css_vars();
    fill_template(
        QUIZ_TEMPLATE,
        &[
            ("TITLE", &escape_html(title)),
            ("FONT_LINKS", FONT_LINKS),
            ("CSS_VARS", &css_vars),
            ("BASE_CSS", BASE_CSS),
            ("COUNT", &count),
            ("QUESTIONS", questions.trim_end()),
            ("DATA_JSON", &data_json),
        ],
    )
}

/// Paged flip-card grid; blank cards are skipped like invalid quiz questions.
pub fn render_flashcards_html(deck: &Flashcards) -> String {
    let mut deck = deck.clone();
    let skipped = deck.retain_valid();
    if skipped > 0 {
        debug!(skipped, "blank flashcards skipped");
    }
    if deck.cards.is_empty() {
        return render_error_html("Ce paquet ne contient aucune carte exploitable.");
    }
    let title = display_title(&deck.title, DEFAULT_FLASHCARDS_TITLE);
    let mut cards = String::new();
    for (index, card) in deck.cards.iter().enumerate() {
        let page = index / CARDS_PER_PAGE;
        let hidden = if page == 0 { "" } else { " hidden" };
        cards.push_str(&format!(
            "<div class=\"card\" data-card-index=\"{index}\" data-page=\"{page}\" tabindex=\"0\"{hidden}>\n\
<div class=\"card-inner\">\n\
<div class=\"card-face card-front\">{}</div>\n\
<div class=\"card-face card-back\">{}</div>\n\
</div>\n</div>\n",
            escape_html(&card.front),
            escape_html(&card.back)
        ));
    }
    let pages = page_count(deck.cards.len()).to_string();
    let per_page = CARDS_PER_PAGE.to_string();
    let css_vars = FLASHCARDS_PALETTE.css_vars();
    fill_template(
        FLASHCARDS_TEMPLATE,
        &[
            ("TITLE", &escape_html(title)),
            ("FONT_LINKS", FONT_LINKS),
            ("CSS_VARS", &css_vars),
            ("BASE_CSS", BASE_CSS),
            ("PAGES", &pages),
            ("PER_PAGE", &per_page),
            ("CARDS", cards.trim_end()),
        ],
    )
}

pub fn render_error_html(message: &str) -> String {
    let css_vars = ERROR_PALETTE.css_vars();
    fill_template(
        ERROR_TEMPLATE,
        &[
            ("FONT_LINKS", FONT_LINKS),
            ("CSS_VARS", &css_vars),
            ("BASE_CSS", BASE_CSS),
            ("MESSAGE", &escape_html(message)),
        ],
    )
}

/// Renders stored or freshly parsed quiz JSON question by question; only a
/// value that is not an object at all reads as unreadable content.
pub fn render_quiz_value(value: &Value) -> String {
    match Quiz::from_value_lossy(value) {
        Some((quiz, _)) => render_quiz_html(&quiz),
        None => {
            debug!("quiz json is not an object");
            render_error_html("Le contenu du quiz est illisible.")
        }
    }
}

pub fn render_flashcards_value(value: &Value) -> String {
    match Flashcards::from_value_lossy(value) {
        Some((deck, _)) => render_flashcards_html(&deck),
        None => {
            debug!("flashcards json is not an object");
            render_error_html("Le contenu des cartes est illisible.")
        }
    }
}

pub fn page_count(cards: usize) -> usize {
    cards.div_ceil(CARDS_PER_PAGE).max(1)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn display_title<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

// Keeps serialized JSON from closing the surrounding <script> element.
fn embed_json(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\u0021--")
}

/// Single left-to-right pass: substituted text is never rescanned, and
/// `{{NAME}}` markers without a slot are emitted unchanged.
fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let extra: usize = slots.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_uppercase() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        if !name.is_empty() && after[name_len..].starts_with("}}") {
            if let Some((_, value)) = slots.iter().find(|(slot, _)| *slot == name) {
                out.push_str(value);
                rest = &after[name_len + 2..];
                continue;
            }
        }
        out.push('{');
        rest = &rest[open + 1..];
    }
    out.push_str(rest);
    out
}
