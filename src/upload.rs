//! Drop zone: accepting a PDF from a pasted path or the path prompt

use std::path::{Path, PathBuf};

use log::{info, warn};

pub const INVALID_FILE_ALERT: &str = "Please upload a valid PDF file.";
pub const DROP_HINT: &str = "Drop a PDF file here (paste its path) or press Enter to upload";

/// A file that passed validation and is ready to be sent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpload {
    pub path: PathBuf,
    pub file_name: String,
}

/// Turn pasted text into a path.
///
/// Terminals paste dropped files in a few shapes: quoted, as `file://` URLs,
/// or with spaces escaped by a backslash. Only the first line is used.
#[must_use]
pub fn normalize_dropped_path(text: &str) -> Option<PathBuf> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;

    let unquoted = line
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .or_else(|| line.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
        .unwrap_or(line);

    let without_scheme = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    let unescaped = without_scheme.replace("\\ ", " ");
    let decoded = percent_decode_spaces(&unescaped);

    if decoded.is_empty() {
        None
    } else {
        Some(PathBuf::from(decoded))
    }
}

// file:// URLs carry spaces as %20
fn percent_decode_spaces(text: &str) -> String {
    text.replace("%20", " ")
}

/// Media type check on the declared type, as derived from the file name
#[must_use]
pub fn is_pdf(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime == mime_guess::mime::APPLICATION_PDF)
}

#[must_use]
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Path prompt that stands in for a file picker
#[derive(Debug, Default)]
pub struct PathPrompt {
    pub input: String,
}

#[derive(Debug, Default)]
pub struct DropZone {
    /// Name of the last file accepted for upload
    file_name: Option<String>,
    prompt: Option<PathPrompt>,
}

impl DropZone {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a candidate file, remembering its name when accepted
    pub fn accept(&mut self, path: &Path) -> Result<PendingUpload, &'static str> {
        if !is_pdf(path) {
            warn!("Rejected non-PDF file {}", path.display());
            return Err(INVALID_FILE_ALERT);
        }
        let file_name = file_name_of(path);
        info!("Uploading file: {file_name}");
        self.file_name = Some(file_name.clone());
        Ok(PendingUpload {
            path: path.to_path_buf(),
            file_name,
        })
    }

    /// Handle pasted text as a dropped file
    pub fn accept_paste(&mut self, text: &str) -> Result<PendingUpload, &'static str> {
        let path = normalize_dropped_path(text).ok_or(INVALID_FILE_ALERT)?;
        self.accept(&path)
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Line shown under the hint once a file was accepted
    #[must_use]
    pub fn status_line(&self) -> Option<String> {
        self.file_name
            .as_ref()
            .map(|name| format!("Uploaded file: {name}"))
    }

    pub fn open_prompt(&mut self) {
        self.prompt = Some(PathPrompt::default());
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    #[must_use]
    pub fn prompt(&self) -> Option<&PathPrompt> {
        self.prompt.as_ref()
    }

    #[must_use]
    pub fn is_prompting(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn prompt_insert(&mut self, text: &str) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.push_str(text);
        }
    }

    pub fn prompt_backspace(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.pop();
        }
    }

    /// Close the prompt and validate what was typed
    pub fn submit_prompt(&mut self) -> Option<Result<PendingUpload, &'static str>> {
        let prompt = self.prompt.take()?;
        Some(self.accept_paste(&prompt.input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasted_paths_are_normalized() {
        assert_eq!(
            normalize_dropped_path("  '/home/me/My Paper.pdf'  \n"),
            Some(PathBuf::from("/home/me/My Paper.pdf"))
        );
        assert_eq!(
            normalize_dropped_path("file:///tmp/a%20b.pdf"),
            Some(PathBuf::from("/tmp/a b.pdf"))
        );
        assert_eq!(
            normalize_dropped_path("/tmp/with\\ space.pdf"),
            Some(PathBuf::from("/tmp/with space.pdf"))
        );
        assert_eq!(
            normalize_dropped_path("/tmp/first.pdf\n/tmp/second.pdf"),
            Some(PathBuf::from("/tmp/first.pdf"))
        );
        assert_eq!(normalize_dropped_path("   \n "), None);
    }

    #[test]
    fn only_pdf_media_type_is_accepted() {
        assert!(is_pdf(Path::new("report.pdf")));
        assert!(is_pdf(Path::new("REPORT.PDF")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("scan.png")));
        assert!(!is_pdf(Path::new("no_extension")));
    }

    #[test]
    fn rejected_file_leaves_state_alone() {
        let mut zone = DropZone::new();
        assert_eq!(zone.accept_paste("/tmp/notes.txt"), Err(INVALID_FILE_ALERT));
        assert_eq!(zone.file_name(), None);
        assert_eq!(zone.status_line(), None);
    }

    #[test]
    fn accepted_file_name_is_displayed() {
        let mut zone = DropZone::new();
        let pending = zone.accept_paste("\"/tmp/paper.pdf\"").unwrap();
        assert_eq!(pending.file_name, "paper.pdf");
        assert_eq!(pending.path, PathBuf::from("/tmp/paper.pdf"));
        assert_eq!(zone.status_line().as_deref(), Some("Uploaded file: paper.pdf"));
    }

    #[test]
    fn prompt_submits_typed_path() {
        let mut zone = DropZone::new();
        assert!(zone.submit_prompt().is_none());

        zone.open_prompt();
        zone.prompt_insert("/tmp/x.pdff");
        zone.prompt_backspace();
        let pending = zone.submit_prompt().unwrap().unwrap();
        assert_eq!(pending.file_name, "x.pdf");
        assert!(!zone.is_prompting());
    }
}
