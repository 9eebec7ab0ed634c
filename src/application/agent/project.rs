//! Web-project request classification and completion validation.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const REQUIRED_FILES: [&str; 3] = ["index.html", "styles.css", "script.js"];

const GENERIC_KEYWORDS: [&str; 19] = [
    "html",
    "css",
    "js",
    "javascript",
    "web",
    "website",
    "app",
    "application",
    "frontend",
    "front-end",
    "ui",
    "interface",
    "page",
    "site",
    "project",
    "create",
    "build",
    "make",
    "develop",
];

const WEB_KEYWORDS: [&str; 6] = ["html", "css", "js", "web", "app", "site"];

/// True iff the request mentions both a generic build keyword and a
/// web-specific one. Co-occurrence, not union: "build an express api" has a
/// build word but nothing web-facing and stays unclassified.
pub fn is_web_request(query: &str) -> bool {
    let lowered = query.to_lowercase();
    GENERIC_KEYWORDS.iter().any(|kw| lowered.contains(kw))
        && WEB_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

static FOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:folder|directory|dir)\s+(?:(?:called|named)\s+)?([A-Za-z0-9_-]+)")
        .expect("folder pattern")
});

static CREATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)create\s+(?:an?\s+)?(?:folder\s+)?([A-Za-z0-9_-]+)").expect("create pattern")
});

static SUFFIXED_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z0-9_-]+-(?:app|application|project|site|website))\b")
        .expect("suffixed name pattern")
});

static SPACED_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z0-9_-]+)\s+(?:app|application|project|site|website)\b")
        .expect("spaced name pattern")
});

/// Where the requested project is expected to land.
///
/// Patterns are tried in order and the first capture wins; a hyphenated name
/// keeps its suffix (`todo-app` stays `todo-app`). Defaults to the current
/// directory when nothing matches.
pub fn detect_project_directory(query: &str) -> String {
    if let Some(captures) = FOLDER_PATTERN.captures(query) {
        return captures[1].to_string();
    }

    if let Some(captures) = CREATE_PATTERN.captures(query) {
        let name = &captures[1];
        if !name.eq_ignore_ascii_case("a") && !name.eq_ignore_ascii_case("an") {
            return name.to_string();
        }
    }

    if let Some(captures) = SUFFIXED_NAME_PATTERN.captures(query) {
        return captures[1].to_string();
    }

    if let Some(captures) = SPACED_NAME_PATTERN.captures(query) {
        return captures[1].to_string();
    }

    ".".to_string()
}

#[derive(Debug, Clone)]
pub struct ProjectValidation {
    pub complete: bool,
    pub existing: Vec<String>,
    pub missing: Vec<String>,
    pub feedback: String,
}

/// Check that the required artifact set exists under `project_dir`.
///
/// A required file that exists but is zero bytes counts as missing: an empty
/// index.html satisfies no one, and the model gets corrective feedback either
/// way.
pub fn validate_project(project_dir: &str) -> ProjectValidation {
    debug!(project_dir, "Validating web project completeness");

    if project_dir != "." && !Path::new(project_dir).exists() {
        let missing: Vec<String> = REQUIRED_FILES
            .iter()
            .map(|file| format!("{project_dir}/{file}"))
            .collect();
        let feedback = format!(
            "Project directory {project_dir} does not exist. Create the directory and all required files: {}.",
            REQUIRED_FILES.join(", ")
        );
        return ProjectValidation {
            complete: false,
            existing: Vec::new(),
            missing,
            feedback,
        };
    }

    let mut existing = Vec::new();
    let mut missing = Vec::new();

    for file in REQUIRED_FILES {
        let path = if project_dir == "." {
            file.to_string()
        } else {
            format!("{project_dir}/{file}")
        };

        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.len() > 0 => existing.push(path),
            Ok(_) => {
                warn!(path, "Required project file is empty");
                missing.push(path);
            }
            Err(_) => missing.push(path),
        }
    }

    let complete = missing.is_empty();
    let feedback = if complete {
        "Project is complete with all required files.".to_string()
    } else {
        format!(
            "Project is incomplete. Missing files: {}. A complete web project needs index.html, styles.css, and script.js with full functionality. Continue creating the missing files and ensure they contain complete working code.",
            missing.join(", ")
        )
    };

    ProjectValidation {
        complete,
        existing,
        missing,
        feedback,
    }
}
