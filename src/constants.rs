//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers and fixed user-facing strings live here.

/// Directory tree constants
pub mod tree {
    /// Directories pruned from the tree listing (version control, caches, build output)
    pub const NOISE_DIRS: &[&str] = &[
        ".git",
        "__pycache__",
        "node_modules",
        "venv",
        ".venv",
        ".env",
        "dist",
        "build",
        "target",
    ];

    /// File extensions dropped from the tree listing (images, compiled artifacts)
    pub const BINARY_EXTENSIONS: &[&str] = &[
        "png", "jpg", "jpeg", "gif", "ico", "svg", "webp", "bmp", "pyc", "pyo", "class", "o",
        "so", "dll", "exe", "bin", "jar",
    ];

    /// Indentation per depth level
    pub const INDENT: &str = "    ";
}

/// Stage node names as seen by progress listeners
pub mod nodes {
    pub const CLONER: &str = "cloner";
    pub const MANAGER: &str = "manager";
    pub const SUMMARIZER: &str = "summarizer";
    pub const WRITER: &str = "writer";
}

/// Fixed documents and messages
pub mod messages {
    /// Document produced when there is nothing to synthesize
    pub const NO_ANALYSIS_DATA: &str = "Error: No analysis data available.";

    /// Document produced when the synthesis call fails
    pub const SYNTHESIS_FAILED: &str = "Failed to generate documentation.";

    /// Reply to an inbound message without a repository URL
    pub const MISSING_REPO_URL: &str = "No repository URL provided.";

    /// Health check payload
    pub const API_RUNNING: &str = "Agent API is running";
}

/// Pipeline defaults
pub mod pipeline {
    /// Base directory for run workspaces
    pub const DEFAULT_DATA_DIR: &str = "data";

    /// Shallow clone depth
    pub const DEFAULT_CLONE_DEPTH: u32 = 1;

    /// Clone timeout (seconds)
    pub const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 300;

    /// Maximum files summarized at once
    pub const DEFAULT_SUMMARIZE_CONCURRENCY: usize = 4;

    /// File content beyond this many characters is truncated before prompting
    pub const DEFAULT_MAX_FILE_CHARS: usize = 60_000;

    /// Name of the persisted artifact inside the run directory
    pub const DEFAULT_README_FILENAME: &str = "README.md";

    /// Capacity of the progress event channel
    pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

    /// Fallback slug when a repository name cannot be derived from its URL
    pub const FALLBACK_REPO_SLUG: &str = "repo";
}

/// LLM defaults
pub mod llm {
    pub const DEFAULT_PROVIDER: &str = "openai";
    pub const DEFAULT_MODEL: &str = "gpt-4o";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_MAX_RETRIES: u32 = 2;
    pub const DEFAULT_MAX_TOKENS: usize = 4096;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;
}

/// HTTP/Network constants
pub mod network {
    pub const DEFAULT_HOST: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8000;

    /// Connection timeout for outbound HTTP (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
