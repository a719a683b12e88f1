//! Folder path parsing — turns `MyDrive>JobApplication>Resume` into ordered segments.

use crate::errors::AppError;

/// Alias for the account root, compared after lowercasing and dropping whitespace.
const ROOT_ALIAS: &str = "mydrive";

/// Ordered, non-empty list of trimmed folder names below the account root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    /// Splits on `>` when present, otherwise on `/`. Empty segments are dropped and a
    /// leading root alias ("My Drive", "mydrive", ...) is removed.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let separator = if raw.contains('>') { '>' } else { '/' };

        let mut segments: Vec<String> = raw
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if segments.first().is_some_and(|first| is_root_alias(first)) {
            segments.remove(0);
        }

        if segments.is_empty() {
            return Err(AppError::InvalidFolderPath(format!(
                "\"{raw}\" does not name any folder below the drive root \
                 (e.g. \"MyDrive>JobApplication>Resume\")"
            )));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

fn is_root_alias(segment: &str) -> bool {
    let squashed: String = segment
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    squashed == ROOT_ALIAS
}
