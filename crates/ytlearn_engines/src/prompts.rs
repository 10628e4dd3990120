#![forbid(unsafe_code)]

use ytlearn_contracts::content::GameSpec;

/// Technical constraints attached to a game spec before code generation.
pub const GAME_SPEC_ADDENDUM: &str = "\
Contraintes techniques : produis un unique document HTML5 complet et autonome \
(CSS dans <style>, JavaScript dans <script>), sans dépendance à un serveur ni à \
des fichiers locaux. Seules des bibliothèques publiées sur un CDN public \
(https://cdn.jsdelivr.net ou https://cdnjs.cloudflare.com) sont autorisées. \
L'interface doit être responsive, jouable à la souris, au clavier et au tactile, \
afficher un score ou une progression, et proposer de recommencer. Aucune \
requête réseau à l'exécution, aucun stockage persistant, aucun appel à alert().";

const LANGUAGE_RULE: &str = "\
Rédige tout le contenu en français, sauf si les instructions de l'utilisateur \
demandent explicitement ou impliquent une autre langue ; dans ce cas utilise cette langue.";

const JSON_ONLY_RULE: &str = "\
Réponds uniquement avec un objet JSON valide, sans texte avant ou après, sans \
bloc de code Markdown et sans virgule finale.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptParams<'a> {
    pub difficulty: &'a str,
    pub item_count: u8,
    pub instructions: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceWording {
    Video,
    Pdf,
}

impl SourceWording {
    fn subject(self) -> &'static str {
        match self {
            Self::Video => "la vidéo YouTube fournie",
            Self::Pdf => "le document PDF fourni",
        }
    }

    fn grounding(self) -> &'static str {
        match self {
            Self::Video => "Appuie-toi exclusivement sur ce qui est dit et montré dans la vidéo.",
            Self::Pdf => {
                "Appuie-toi exclusivement sur le texte, les tableaux et les figures du document."
            }
        }
    }
}

fn push_instructions(out: &mut String, instructions: Option<&str>) {
    if let Some(text) = instructions.map(str::trim).filter(|t| !t.is_empty()) {
        out.push_str("\n\nInstructions supplémentaires de l'utilisateur :\n");
        out.push_str(text);
    }
}

fn game_spec_prompt(source: SourceWording, params: PromptParams<'_>) -> String {
    let mut out = format!(
        "Tu es un concepteur de jeux éducatifs. Analyse {subject} et conçois un jeu \
interactif qui aide à mémoriser et comprendre ses notions clés.\n\
{grounding}\n\
Niveau de difficulté visé : {difficulty}.\n\
{language}\n\n\
Format attendu :\n\
{{\"spec\": {{\n\
  \"title\": \"titre court du jeu\",\n\
  \"description\": \"résumé du jeu en 2 ou 3 phrases\",\n\
  \"type\": \"genre de jeu (association, chronologie, simulation, énigme, ...)\",\n\
  \"mechanics\": [\"règle ou mécanique de jeu\"],\n\
  \"educationalGoals\": [\"notion que le joueur doit retenir\"],\n\
  \"difficulty\": \"{difficulty}\",\n\
  \"targetAudience\": \"public visé\",\n\
  \"additionalDetails\": \"contenu pédagogique précis à intégrer (faits, dates, définitions)\"\n\
}}}}\n\
{json_only}",
        subject = source.subject(),
        grounding = source.grounding(),
        difficulty = params.difficulty,
        language = LANGUAGE_RULE,
        json_only = JSON_ONLY_RULE,
    );
    push_instructions(&mut out, params.instructions);
    out
}

fn quiz_prompt(source: SourceWording, params: PromptParams<'_>) -> String {
    let mut out = format!(
        "Tu es un enseignant expert. Crée un quiz de {count} questions à choix multiple \
à partir de {subject}.\n\
{grounding}\n\
Niveau de difficulté : {difficulty}.\n\
Chaque question propose exactement 4 options, une seule est correcte ; \
\"reponseCorrecte\" est l'index (0 à 3) de la bonne option et \"explication\" justifie \
la réponse en une ou deux phrases.\n\
{language}\n\n\
Format attendu :\n\
{{\"quiz\": {{\n\
  \"title\": \"titre du quiz\",\n\
  \"questions\": [\n\
    {{\"question\": \"...\", \"options\": [\"...\", \"...\", \"...\", \"...\"], \"reponseCorrecte\": 0, \"explication\": \"...\"}}\n\
  ]\n\
}}}}\n\
{json_only}",
        count = params.item_count,
        subject = source.subject(),
        grounding = source.grounding(),
        difficulty = params.difficulty,
        language = LANGUAGE_RULE,
        json_only = JSON_ONLY_RULE,
    );
    push_instructions(&mut out, params.instructions);
    out
}

fn flashcards_prompt(source: SourceWording, params: PromptParams<'_>) -> String {
    let mut out = format!(
        "Tu es un enseignant expert. Crée {count} cartes de révision (flashcards) \
à partir de {subject}.\n\
{grounding}\n\
Niveau de difficulté : {difficulty}.\n\
Le recto (\"front\") pose une question ou un terme, le verso (\"back\") donne une \
réponse concise et exacte. Évite les doublons.\n\
{language}\n\n\
Format attendu :\n\
{{\"flashcards\": {{\n\
  \"title\": \"titre du paquet\",\n\
  \"cards\": [\n\
    {{\"front\": \"...\", \"back\": \"...\"}}\n\
  ]\n\
}}}}\n\
{json_only}",
        count = params.item_count,
        subject = source.subject(),
        grounding = source.grounding(),
        difficulty = params.difficulty,
        language = LANGUAGE_RULE,
        json_only = JSON_ONLY_RULE,
    );
    push_instructions(&mut out, params.instructions);
    out
}

pub fn game_spec_from_video_prompt(params: PromptParams<'_>) -> String {
    game_spec_prompt(SourceWording::Video, params)
}

pub fn game_spec_from_pdf_prompt(params: PromptParams<'_>) -> String {
    game_spec_prompt(SourceWording::Pdf, params)
}

/// Second stage of the interactive flow: the whole spec, addendum included, is
/// the body of the prompt.
pub fn game_code_from_spec_prompt(spec: &GameSpec) -> String {
    let mut spec = spec.clone();
    if spec.addendum.trim().is_empty() {
        spec.addendum = GAME_SPEC_ADDENDUM.to_string();
    }
    let spec_json = serde_json::to_string_pretty(&spec).unwrap_or_default();
    format!(
        "Tu es un développeur web senior spécialisé dans les jeux éducatifs. \
Implémente le jeu décrit par la spécification JSON ci-dessous.\n\
Respecte strictement le champ \"addendum\" qui liste les contraintes techniques.\n\
Les textes affichés doivent être dans la langue de la spécification.\n\
Réponds uniquement avec le document HTML complet, en commençant par <!DOCTYPE html>, \
sans explication ni bloc de code Markdown.\n\n\
Spécification :\n{spec_json}"
    )
}

pub fn quiz_from_video_prompt(params: PromptParams<'_>) -> String {
    quiz_prompt(SourceWording::Video, params)
}

pub fn quiz_from_pdf_prompt(params: PromptParams<'_>) -> String {
    quiz_prompt(SourceWording::Pdf, params)
}

pub fn flashcards_from_video_prompt(params: PromptParams<'_>) -> String {
    flashcards_prompt(SourceWording::Video, params)
}

pub fn flashcards_from_pdf_prompt(params: PromptParams<'_>) -> String {
    flashcards_prompt(SourceWording::Pdf, params)
}
