use crate::chunking::{split_documents, ChunkingConfig};
use crate::{IngestError, IngestionOptions, SourceDocument, TextChunk};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub fn discover_csv_files(folder: &Path, pattern: &str) -> Result<Vec<PathBuf>, IngestError> {
    let pattern = Pattern::new(pattern)?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(folder).unwrap_or(entry.path());
        if pattern.matches_path_with(relative, options) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    Ok(files)
}

/// Reads one CSV file, producing a document per record.
pub fn load_csv_file(path: &Path) -> Result<Vec<SourceDocument>, IngestError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
        .to_string();
    let source_path = path.to_string_lossy().to_string();

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        documents.push(SourceDocument {
            source_path: source_path.clone(),
            filename: filename.clone(),
            row: row as u64,
            content: render_record(&headers, &record),
        });
    }

    debug!(path = %path.display(), rows = documents.len(), "loaded csv file");
    Ok(documents)
}

/// Short rows render missing values as `None`; surplus values are joined
/// with `,` under a trailing `None` key.
fn render_record(headers: &csv::StringRecord, record: &csv::StringRecord) -> String {
    let mut lines: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let value = record.get(index).map_or("None", str::trim);
            format!("{}: {value}", header.trim())
        })
        .collect();

    if record.len() > headers.len() {
        let extra = record
            .iter()
            .skip(headers.len())
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(",");
        lines.push(format!("None: {extra}"));
    }

    lines.join("\n")
}

pub fn load_csv_documents(folder: &Path, pattern: &str) -> Result<Vec<SourceDocument>, IngestError> {
    let files = discover_csv_files(folder, pattern)?;

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no csv files matching {pattern} found in {}",
            folder.display()
        )));
    }

    let mut documents = Vec::new();
    for path in files {
        documents.extend(load_csv_file(&path)?);
    }
    Ok(documents)
}

/// Loads every matching file and splits it with the configured splitter.
pub fn ingest_folder_chunks(
    folder: &Path,
    options: IngestionOptions,
) -> Result<Vec<TextChunk>, IngestError> {
    let documents = load_csv_documents(folder, &options.glob_pattern)?;
    let config = ChunkingConfig::from(options);
    config.validate()?;
    Ok(split_documents(&documents, &config))
}
