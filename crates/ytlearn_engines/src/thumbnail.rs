#![forbid(unsafe_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ytlearn_contracts::creation::GameType;

pub const THUMBNAIL_MIME: &str = "image/svg+xml";

struct ThumbnailStyle {
    from: &'static str,
    to: &'static str,
    glyph: &'static str,
    label: &'static str,
}

fn style_for(game_type: GameType) -> ThumbnailStyle {
    match game_type {
        GameType::Quiz => ThumbnailStyle {
            from: "#6366f1",
            to: "#4338ca",
            glyph: "?",
            label: "Quiz",
        },
        GameType::Flashcards => ThumbnailStyle {
            from: "#14b8a6",
            to: "#0f766e",
            glyph: "\u{21c4}",
            label: "Flashcards",
        },
        GameType::Interactive => ThumbnailStyle {
            from: "#f59e0b",
            to: "#c2410c",
            glyph: "\u{25b6}",
            label: "Jeu interactif",
        },
    }
}

pub fn placeholder_svg(game_type: GameType) -> String {
    let s = style_for(game_type);
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"320\" height=\"180\" viewBox=\"0 0 320 180\">\
<defs><linearGradient id=\"g\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\">\
<stop offset=\"0\" stop-color=\"{from}\"/><stop offset=\"1\" stop-color=\"{to}\"/></linearGradient></defs>\
<rect width=\"320\" height=\"180\" rx=\"16\" fill=\"url(#g)\"/>\
<text x=\"160\" y=\"100\" font-family=\"Inter,sans-serif\" font-size=\"64\" font-weight=\"700\" fill=\"#ffffff\" text-anchor=\"middle\">{glyph}</text>\
<text x=\"160\" y=\"150\" font-family=\"Inter,sans-serif\" font-size=\"20\" fill=\"#ffffff\" fill-opacity=\"0.85\" text-anchor=\"middle\">{label}</text>\
</svg>",
        from = s.from,
        to = s.to,
        glyph = s.glyph,
        label = s.label,
    )
}

/// `data:` URI usable directly as an `<img src>`.
pub fn placeholder_thumbnail(game_type: GameType) -> String {
    format!(
        "data:{THUMBNAIL_MIME};base64,{}",
        BASE64.encode(placeholder_svg(game_type))
    )
}
