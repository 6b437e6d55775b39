//! HTTP surface: `POST /translate` with a multipart upload.

use crate::oracle::OllamaOracle;
use crate::pipeline::{run_blocking, translate_bytes};
use crate::prelude::{eprintln, *};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use doctranslate_core::kind::{detect_kind, translated_file_name, DocumentKind};
use doctranslate_core::translate::{LanguagePair, Translator};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

const INVALID_FILE: &str = "Invalid file.";
const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type.";
const TRANSLATION_FAILED: &str = "Failed to translate the file.";

#[derive(Debug, clap::Parser)]
#[command(name = "serve")]
#[command(about = "Serve the translation endpoint over HTTP")]
pub struct App {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value = "25")]
    pub max_upload_mb: usize,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let addr = format!("{}:{}", app.host, app.port);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let shared_global = Arc::new(global.clone());

    let router = Router::new()
        .route("/translate", post(translate_handler))
        .layer(DefaultBodyLimit::max(app.max_upload_mb * 1024 * 1024))
        .layer(cors)
        .with_state(shared_global);

    if global.verbose {
        eprintln!("Translation server listening on http://{}", addr);
        eprintln!("Translate endpoint: http://{}/translate", addr);
        eprintln!("Model: {} at {}", global.ollama.model, global.ollama.ollama_url);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

/// The `file` form field.
#[derive(Debug, Default)]
struct FilePart {
    name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Everything read from the multipart body, before validation.
#[derive(Debug, Default)]
struct Upload {
    file: Option<FilePart>,
    source_language: Option<String>,
    target_language: Option<String>,
}

/// A validated translation request.
#[derive(Debug)]
struct Job {
    kind: DocumentKind,
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
    languages: LanguagePair,
}

#[derive(Debug, PartialEq)]
enum Rejection {
    InvalidFile,
    UnsupportedFileType,
    MissingField(&'static str),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let message = match self {
            Rejection::InvalidFile => INVALID_FILE.to_string(),
            Rejection::UnsupportedFileType => UNSUPPORTED_FILE_TYPE.to_string(),
            Rejection::MissingField(field) => f!("Missing form field: {}", field),
        };
        (StatusCode::BAD_REQUEST, message).into_response()
    }
}

impl Upload {
    async fn read(multipart: &mut Multipart) -> Result<Self, Rejection> {
        let mut upload = Upload::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| Rejection::InvalidFile)?
        {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("file") => {
                    let name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|_| Rejection::InvalidFile)?;
                    upload.file = Some(FilePart {
                        name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                Some("sourceLanguage") => {
                    upload.source_language =
                        Some(field.text().await.map_err(|_| Rejection::InvalidFile)?);
                }
                Some("targetLanguage") => {
                    upload.target_language =
                        Some(field.text().await.map_err(|_| Rejection::InvalidFile)?);
                }
                _ => {}
            }
        }

        Ok(upload)
    }

    fn validate(self) -> Result<Job, Rejection> {
        let file = self.file.ok_or(Rejection::InvalidFile)?;
        let file_name = file
            .name
            .filter(|n| !n.is_empty())
            .ok_or(Rejection::InvalidFile)?;
        let content_type = file.content_type.ok_or(Rejection::InvalidFile)?;
        if file.bytes.is_empty() {
            return Err(Rejection::InvalidFile);
        }

        let kind = detect_kind(Some(&content_type), &file_name)
            .ok_or(Rejection::UnsupportedFileType)?;

        let source = self
            .source_language
            .ok_or(Rejection::MissingField("sourceLanguage"))?;
        let target = self
            .target_language
            .ok_or(Rejection::MissingField("targetLanguage"))?;

        Ok(Job {
            kind,
            file_name,
            content_type,
            bytes: file.bytes,
            languages: LanguagePair::new(source, target),
        })
    }
}

/// `attachment; filename="translated-<name>"`
fn content_disposition(file_name: &str) -> String {
    let name = translated_file_name(file_name).replace(['"', '\r', '\n'], "");
    f!("attachment; filename=\"{}\"", name)
}

fn translated_response(job_content_type: String, file_name: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, job_content_type),
            (header::CONTENT_DISPOSITION, content_disposition(file_name)),
        ],
        bytes,
    )
        .into_response()
}

async fn translate_handler(
    State(global): State<Arc<crate::Global>>,
    mut multipart: Multipart,
) -> Response {
    let job = match Upload::read(&mut multipart).await.and_then(Upload::validate) {
        Ok(job) => job,
        Err(rejection) => return rejection.into_response(),
    };

    if global.verbose {
        eprintln!(
            "Translating {} ({:?}, {} bytes) from {} to {}",
            job.file_name,
            job.kind,
            job.bytes.len(),
            job.languages.source,
            job.languages.target
        );
    }

    let Job {
        kind,
        file_name,
        content_type,
        bytes,
        languages,
    } = job;

    let result = match OllamaOracle::new(&global.ollama) {
        Ok(oracle) => {
            run_blocking(move || {
                let translator = Translator::new(&oracle, languages);
                translate_bytes(kind, &bytes, &translator)
            })
            .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(translated) => translated_response(content_type, &file_name, translated),
        Err(e) => {
            log::error!("Failed to translate {}: {:?}", file_name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, TRANSLATION_FAILED).into_response()
        }
    }
}
