//! Prompt texts for the three model calls of a run

use crate::ai::Prompt;

const SELECTION_SYSTEM: &str = "You are a helpful assistant that outputs only raw JSON lists.";
const SYNTHESIS_SYSTEM: &str = "You are an expert technical documentarian.";

/// Ask which files of `file_tree` matter for understanding the project
pub fn file_selection(file_tree: &str) -> Prompt {
    Prompt::user(format!(
        r#"You are a Technical Lead. Below is the file structure of a software repository.

### File Tree:
{file_tree}

### Task:
Identify the core logic files, entry points, and configuration files required to understand how this project works.

### Constraints:
- Return ONLY a raw JSON list of relative file paths.
- Exclude images, lockfiles (package-lock.json, poetry.lock, Cargo.lock), and documentation like README unless it's critical.
- No conversational filler.

Example Output: ["src/main.py", "config/settings.yaml", "api/routes.py"]"#
    ))
    .with_system(SELECTION_SYSTEM)
}

/// Ask for a structured summary of one file
pub fn file_summary(file_name: &str, content: &str) -> Prompt {
    Prompt::user(format!(
        r#"You are an expert software engineer. Analyze this source code file: {file_name}

### Code:
{content}

### Task:
Provide a concise summary:
1. Purpose of the file.
2. Key functions/classes defined.
3. Major dependencies.

Return the result as a JSON object:
{{ "file": "filename", "summary": "...", "exports": [...], "deps": [...] }}"#
    ))
}

/// Ask for the final document built from the per-file blocks
pub fn synthesis(repo_url: &str, combined_summaries: &str) -> Prompt {
    Prompt::user(format!(
        r#"You are a Senior Technical Writer. Using the following file-level analyses from {repo_url}, create a professional, comprehensive README.md file.

### Data Source (File Summaries):
{combined_summaries}

### README Requirements:
- **Title**: A clear name for the project.
- **Overview**: A high-level explanation of what this tool does.
- **Architecture**: Explain how the analyzed files (entry points and core logic) work together.
- **Key Features**: List the main functionalities discovered.
- **Usage/Setup**: Based on the configuration and logic files, infer how to run this.

Use clean Markdown formatting with H1, H2, and code blocks."#
    ))
    .with_system(SYNTHESIS_SYSTEM)
}
