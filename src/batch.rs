//! Batch translation of text files through the gateway.
//!
//! Files are translated line by line, in order, and written to a mirrored
//! directory tree. Up to [`MAX_CONCURRENT_FILES`] files are in flight at once.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use encoding_rs::{Encoding, GB18030, GBK, UTF_8};
use futures::stream::{self, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::client::GatewayClient;

pub const MAX_CONCURRENT_FILES: usize = 5;

/// Candidate encodings tried in order when the file has no BOM
fn fallback_encodings() -> [&'static Encoding; 3] {
    [UTF_8, GBK, GB18030]
}

/// How each translated line is written to the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    TranslationOnly,
    OriginalAboveTranslation,
    TranslationAboveOriginal,
}

impl OutputLayout {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(OutputLayout::TranslationOnly),
            2 => Ok(OutputLayout::OriginalAboveTranslation),
            3 => Ok(OutputLayout::TranslationAboveOriginal),
            other => bail!(
                "Unsupported output format code '{}'. Supported codes: 1, 2, 3",
                other
            ),
        }
    }

    pub fn render(self, original: &str, translated: &str) -> String {
        match self {
            OutputLayout::TranslationOnly => translated.to_string(),
            OutputLayout::OriginalAboveTranslation => {
                format!("{}\n{}\n\n", original.trim(), translated.trim())
            }
            OutputLayout::TranslationAboveOriginal => {
                format!("{}\n{}\n\n", translated.trim(), original.trim())
            }
        }
    }
}

/// Language pair and layout shared by every file in a batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub source_lang: String,
    pub target_lang: String,
    pub layout: OutputLayout,
}

/// Outcome of a `translate_tree` run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Decode a file, honouring a BOM, otherwise trying UTF-8, GBK and GB18030
/// strictly. Lines keep their terminators.
pub fn read_lines_with_fallback(path: &Path) -> Result<Vec<String>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let content = decode_with_fallback(&bytes)
        .with_context(|| format!("Could not decode {} with any known encoding", path.display()))?;

    Ok(content.split_inclusive('\n').map(str::to_string).collect())
}

fn decode_with_fallback(bytes: &[u8]) -> Option<String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        debug!("Detected {} byte order mark", encoding.name());
        return encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .map(|text| text.into_owned());
    }

    fallback_encodings().into_iter().find_map(|encoding| {
        let decoded = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
        debug!("Decoded input as {}", encoding.name());
        Some(decoded.into_owned())
    })
}

/// Lines made only of `=` (or nothing) are section rules and are copied through
pub fn is_separator_line(line: &str) -> bool {
    line.trim().chars().all(|c| c == '=')
}

/// Translate one file line by line, appending to `output_path`
pub async fn process_file(
    client: &GatewayClient,
    input_path: &Path,
    output_path: &Path,
    options: &BatchOptions,
) -> Result<()> {
    let lines = read_lines_with_fallback(input_path)?;
    info!("Translating {} ({} lines)", input_path.display(), lines.len());

    let mut output = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_path)
        .await
        .with_context(|| format!("Failed to open {}", output_path.display()))?;

    for (index, line) in lines.iter().enumerate() {
        debug!("Line {} of {}", index + 1, input_path.display());

        let translated = if is_separator_line(line) {
            line.clone()
        } else {
            client
                .translate_segment(line, &options.source_lang, &options.target_lang)
                .await
                .unwrap_or_else(|| line.clone())
        };

        output
            .write_all(options.layout.render(line, &translated).as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        output.flush().await?;
    }

    Ok(())
}

/// Every `.txt` file under `dir`, recursively, in a stable order
pub fn find_txt_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".txt"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Translate every `.txt` file under `input_root` into the same relative
/// location under `output_root`.
pub async fn translate_tree(
    client: &GatewayClient,
    input_root: &Path,
    output_root: &Path,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let files = find_txt_files(input_root);
    if files.is_empty() {
        warn!("No .txt files found under {}", input_root.display());
        return Ok(BatchReport::default());
    }

    let mut jobs = Vec::with_capacity(files.len());
    for input_path in files {
        let output_path = mirrored_path(input_root, output_root, &input_path)?;
        if let Some(parent) = output_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
                info!("Created output directory {}", parent.display());
            }
        }
        jobs.push((input_path, output_path));
    }

    let results: Vec<(PathBuf, PathBuf, Result<()>)> = stream::iter(jobs)
        .map(|(input_path, output_path)| async move {
            let result = process_file(client, &input_path, &output_path, options).await;
            (input_path, output_path, result)
        })
        .buffer_unordered(MAX_CONCURRENT_FILES)
        .collect()
        .await;

    let mut report = BatchReport::default();
    for (input_path, output_path, result) in results {
        match result {
            Ok(()) => {
                info!(
                    "Finished {} -> {}",
                    input_path.display(),
                    output_path.display()
                );
                report.completed.push(input_path);
            }
            Err(e) => {
                error!("Failed to translate {}: {:#}", input_path.display(), e);
                report.failed.push(input_path);
            }
        }
    }

    report.completed.sort();
    report.failed.sort();
    Ok(report)
}

fn mirrored_path(input_root: &Path, output_root: &Path, input_path: &Path) -> Result<PathBuf> {
    let relative = input_path
        .strip_prefix(input_root)
        .with_context(|| format!("{} is outside {}", input_path.display(), input_root.display()))?;
    Ok(output_root.join(relative))
}
