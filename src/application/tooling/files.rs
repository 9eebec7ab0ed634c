//! File tools
//!
//! Every function reports its outcome as a plain string; failures are folded
//! into the string instead of propagating, so the loop can hand them straight
//! back to the model as observer feedback.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub fn create_file(path: &str, content: Option<&str>) -> String {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = fs::create_dir_all(parent) {
                return format!("Error creating file: {err}");
            }
        }
    }

    match fs::write(path, content.unwrap_or_default()) {
        Ok(()) => format!("File created successfully: {path}"),
        Err(err) => format!("Error creating file: {err}"),
    }
}

pub fn read_file(path: &str) -> String {
    if !Path::new(path).exists() {
        return format!("File not found: {path}");
    }

    match fs::read_to_string(path) {
        Ok(content) => format!("File content of {path}:\n{content}"),
        Err(err) => format!("Error reading file: {err}"),
    }
}

pub fn write_file(path: &str, content: Option<&str>) -> String {
    let Some(content) = content else {
        return format!("Error writing to file: no content provided for {path}");
    };

    debug!(path, bytes = content.len(), "Writing file content");
    match fs::write(path, content) {
        Ok(()) => format!(
            "Content written to file: {path} ({} characters)",
            content.chars().count()
        ),
        Err(err) => {
            warn!(path, %err, "File write failed");
            format!("Error writing to file: {err}")
        }
    }
}

pub fn append_file(path: &str, content: Option<&str>) -> String {
    let Some(content) = content else {
        return format!("Error appending to file: no content provided for {path}");
    };

    use std::io::Write;
    let result = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(content.as_bytes()));

    match result {
        Ok(()) => format!("Content appended to file: {path}"),
        Err(err) => format!("Error appending to file: {err}"),
    }
}

pub fn list_directory(path: &str) -> String {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => return format!("Error listing directory: {err}"),
    };

    let mut lines = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                let kind = match entry.file_type() {
                    Ok(file_type) if file_type.is_dir() => "DIR",
                    Ok(_) => "FILE",
                    Err(err) => return format!("Error listing directory: {err}"),
                };
                lines.push(format!("{kind}: {}", entry.file_name().to_string_lossy()));
            }
            Err(err) => return format!("Error listing directory: {err}"),
        }
    }
    lines.sort();

    format!("Directory listing for {path}:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_builds_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/deep/app.js");
        let path = path.to_string_lossy().to_string();

        let result = create_file(&path, Some("console.log(1);"));
        assert!(result.starts_with("File created successfully"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "console.log(1);");
    }

    #[test]
    fn create_without_content_writes_empty_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.html").to_string_lossy().to_string();

        create_file(&path, None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn read_reports_missing_file() {
        let result = read_file("definitely/not/here.txt");
        assert_eq!(result, "File not found: definitely/not/here.txt");
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt").to_string_lossy().to_string();

        let written = write_file(&path, Some("alpha"));
        assert!(written.contains("(5 characters)"), "got: {written}");

        let read = read_file(&path);
        assert!(read.ends_with("alpha"));
    }

    #[test]
    fn write_without_content_is_an_error_string() {
        let result = write_file("somewhere.txt", None);
        assert!(result.starts_with("Error writing to file"));
    }

    #[test]
    fn append_accumulates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("log.txt").to_string_lossy().to_string();

        append_file(&path, Some("one"));
        append_file(&path, Some("two"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "onetwo");
    }

    #[test]
    fn listing_marks_files_and_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let listing = list_directory(&dir.path().to_string_lossy());
        assert!(listing.contains("DIR: src"));
        assert!(listing.contains("FILE: index.html"));
    }

    #[test]
    fn listing_unknown_directory_is_an_error_string() {
        let listing = list_directory("no/such/dir");
        assert!(listing.starts_with("Error listing directory"));
    }
}
