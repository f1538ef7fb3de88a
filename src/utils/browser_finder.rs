//! Locating a Chromium-family executable for Playwright to drive.

use std::path::{Path, PathBuf};

/// Environment variable overriding browser executable discovery.
pub const BROWSER_PATH_VAR: &str = "PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH";

const PATH_CANDIDATES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

const WELL_KNOWN_PATHS: [&str; 6] = [
    // macOS - prioritize Google Chrome first
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
];

/// Resolve the browser executable to launch.
///
/// Precedence: explicit env override, then PATH lookup, then well-known
/// install locations. The override wins even if the path does not exist,
/// so a bad value fails loudly at launch instead of being silently ignored.
pub fn find_browser_executable() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(BROWSER_PATH_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    for name in PATH_CANDIDATES {
        if let Ok(found) = which::which(name) {
            return Some(found);
        }
    }

    for candidate in WELL_KNOWN_PATHS {
        let p = Path::new(candidate);
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }

    None
}
