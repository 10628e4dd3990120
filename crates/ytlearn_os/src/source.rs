#![forbid(unsafe_code)]

use url::Url;
use ytlearn_contracts::creation::CreationSource;
use ytlearn_contracts::generation::GenerationSource;
use ytlearn_engines::ai_client::MediaInput;

/// Inline payload ceiling of the provider.
pub const MAX_PDF_BYTES: usize = 20 * 1024 * 1024;
pub const PDF_MAGIC: &[u8] = b"%PDF-";
const VIDEO_ID_LEN: usize = 11;
const YOUTUBE_HOSTS: [&str; 3] = ["youtube.com", "www.youtube.com", "m.youtube.com"];
const SHORT_HOST: &str = "youtu.be";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("Veuillez fournir une URL YouTube.")]
    MissingUrl,
    #[error("URL invalide : {0}")]
    InvalidUrl(String),
    #[error("Cette URL ne pointe pas vers YouTube.")]
    NotYoutube,
    #[error("Identifiant de vidéo YouTube introuvable dans l'URL.")]
    MissingVideoId,
    #[error("Veuillez fournir un fichier PDF.")]
    MissingPdf,
    #[error("Le fichier doit porter l'extension .pdf.")]
    NotPdfName,
    #[error("Le fichier n'est pas un PDF valide.")]
    NotPdfContent,
    #[error("PDF trop volumineux ({size} octets, maximum {max}).")]
    PdfTooLarge { size: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeVideo {
    pub video_id: String,
    canonical_url: String,
}

impl YoutubeVideo {
    fn new(video_id: String) -> Self {
        let canonical_url = format!("https://www.youtube.com/watch?v={video_id}");
        Self {
            video_id,
            canonical_url,
        }
    }

    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    pub fn default_title(&self) -> String {
        format!("Vidéo YouTube {}", self.video_id)
    }
}

pub fn parse_youtube_url(raw: &str) -> Result<YoutubeVideo, SourceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SourceError::MissingUrl);
    }
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{raw}"))
            .map_err(|err| SourceError::InvalidUrl(err.to_string()))?,
        Err(err) => return Err(SourceError::InvalidUrl(err.to_string())),
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::NotYoutube);
    }
    let host = url
        .host_str()
        .map(str::to_ascii_lowercase)
        .ok_or(SourceError::NotYoutube)?;

    let candidate = if host == SHORT_HOST {
        url.path_segments().and_then(|mut s| s.next()).map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
        match segments.as_slice() {
            ["watch", ..] => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            ["shorts" | "embed" | "live", id, ..] => Some((*id).to_string()),
            _ => None,
        }
    } else {
        return Err(SourceError::NotYoutube);
    };

    match candidate {
        Some(id) if is_video_id(&id) => Ok(YoutubeVideo::new(id)),
        _ => Err(SourceError::MissingVideoId),
    }
}

fn is_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn validate_pdf(file_name: &str, bytes: &[u8]) -> Result<(), SourceError> {
    if bytes.is_empty() {
        return Err(SourceError::MissingPdf);
    }
    if !file_name.trim().to_ascii_lowercase().ends_with(".pdf") {
        return Err(SourceError::NotPdfName);
    }
    if bytes.len() > MAX_PDF_BYTES {
        return Err(SourceError::PdfTooLarge {
            size: bytes.len(),
            max: MAX_PDF_BYTES,
        });
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(SourceError::NotPdfContent);
    }
    Ok(())
}

/// A source that passed validation, borrowed from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource<'a> {
    Video(YoutubeVideo),
    Pdf { file_name: &'a str, bytes: &'a [u8] },
}

impl<'a> ResolvedSource<'a> {
    pub fn resolve(source: &'a GenerationSource) -> Result<Self, SourceError> {
        match source {
            GenerationSource::YoutubeUrl(raw) => parse_youtube_url(raw).map(Self::Video),
            GenerationSource::Pdf { file_name, bytes } => {
                validate_pdf(file_name, bytes)?;
                Ok(Self::Pdf {
                    file_name: file_name.trim(),
                    bytes,
                })
            }
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }

    pub fn media(&self) -> MediaInput<'_> {
        match self {
            Self::Video(video) => MediaInput::Video {
                url: video.canonical_url(),
            },
            Self::Pdf { bytes, .. } => MediaInput::Pdf { bytes },
        }
    }

    pub fn canonical_url(&self) -> Option<&str> {
        match self {
            Self::Video(video) => Some(video.canonical_url()),
            Self::Pdf { .. } => None,
        }
    }

    pub fn creation_source(&self) -> CreationSource {
        match self {
            Self::Video(video) => CreationSource::Youtube {
                source_url: video.canonical_url().to_string(),
            },
            Self::Pdf { file_name, .. } => CreationSource::Pdf {
                source_file_name: (*file_name).to_string(),
            },
        }
    }

    pub fn fallback_title(&self) -> String {
        match self {
            Self::Video(video) => video.default_title(),
            Self::Pdf { file_name, .. } => {
                let stem = file_name
                    .len()
                    .checked_sub(4)
                    .and_then(|cut| file_name.get(..cut))
                    .unwrap_or(file_name)
                    .trim();
                if stem.is_empty() {
                    "Document PDF".to_string()
                } else {
                    stem.to_string()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_source_01_accepts_every_youtube_url_shape() {
        for raw in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "http://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ",
            "  www.youtube.com/watch?v=dQw4w9WgXcQ  ",
        ] {
            let video = parse_youtube_url(raw).unwrap_or_else(|e| panic!("{raw}: {e}"));
            assert_eq!(
                video.canonical_url(),
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
            );
        }
    }

    #[test]
    fn at_source_02_rejects_foreign_or_idless_urls() {
        assert_eq!(parse_youtube_url("  "), Err(SourceError::MissingUrl));
        assert_eq!(
            parse_youtube_url("https://vimeo.com/123"),
            Err(SourceError::NotYoutube)
        );
        assert_eq!(
            parse_youtube_url("https://www.youtube.com/channel/UCabc"),
            Err(SourceError::MissingVideoId)
        );
        assert_eq!(
            parse_youtube_url("https://www.youtube.com/watch?v=short"),
            Err(SourceError::MissingVideoId)
        );
        assert_eq!(
            parse_youtube_url("ftp://youtube.com/watch?v=dQw4w9WgXcQ"),
            Err(SourceError::NotYoutube)
        );
    }

    #[test]
    fn at_source_03_pdf_checks_name_size_and_magic() {
        assert_eq!(validate_pdf("cours.pdf", b""), Err(SourceError::MissingPdf));
        assert_eq!(
            validate_pdf("cours.txt", b"%PDF-1.7"),
            Err(SourceError::NotPdfName)
        );
        assert_eq!(
            validate_pdf("cours.PDF", b"<html>"),
            Err(SourceError::NotPdfContent)
        );
        assert!(validate_pdf("Cours.PDF", b"%PDF-1.7\n...").is_ok());
        let mut big = PDF_MAGIC.to_vec();
        big.resize(MAX_PDF_BYTES + 1, b' ');
        assert!(matches!(
            validate_pdf("big.pdf", &big),
            Err(SourceError::PdfTooLarge { .. })
        ));
    }

    #[test]
    fn at_source_04_fallback_titles() {
        let pdf = GenerationSource::Pdf {
            file_name: "Chapitre 3.pdf".to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        };
        let resolved = ResolvedSource::resolve(&pdf).unwrap();
        assert_eq!(resolved.fallback_title(), "Chapitre 3");
        assert_eq!(resolved.canonical_url(), None);

        let video = GenerationSource::YoutubeUrl("https://youtu.be/dQw4w9WgXcQ".to_string());
        let resolved = ResolvedSource::resolve(&video).unwrap();
        assert_eq!(resolved.fallback_title(), "Vidéo YouTube dQw4w9WgXcQ");
        assert!(resolved.is_video());
    }
}
