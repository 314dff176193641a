use crate::classify::Category;
use crate::github::RepoInfo;

/// Placeholder emitted when no repository made it into any table.
pub const EMPTY_FALLBACK: &str = "Currently building my contribution portfolio! Check back soon.\n";

/// Default character budget for table descriptions.
pub const DEFAULT_MAX_DESCRIPTION: usize = 65;

/// Render the grouped repositories as one markdown table per non-empty
/// category, each sorted by descending stars. Blocks end with a blank
/// line, so the output carries a trailing newline.
pub fn contributions_markdown(
    grouped: &[(Category, Vec<RepoInfo>)],
    max_description: usize,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    for (category, repos) in grouped {
        if repos.is_empty() {
            continue;
        }

        // Stable sort keeps encounter order for equal star counts.
        let mut repos: Vec<&RepoInfo> = repos.iter().collect();
        repos.sort_by(|a, b| b.stars.cmp(&a.stars));

        parts.push(category.header().to_string());
        parts.push(String::new());
        parts.push("| Project | Stars | PRs | Description |".to_string());
        parts.push("|---------|-------|-----|-------------|".to_string());

        for repo in repos {
            parts.push(format!(
                "| [{}]({}) | {} | {} | {} |",
                repo.full_name,
                repo.url,
                format_stars(repo.stars),
                repo.pr_count,
                truncate_description(repo.description.as_deref(), max_description),
            ));
        }

        parts.push(String::new());
    }

    parts.join("\n")
}

/// `1.0k`-style formatting from a thousand stars up, plain integer below.
pub fn format_stars(count: u64) -> String {
    if count >= 1000 {
        format!("{:.1}k", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}

/// Sanitize a description for a table cell: pipes become dashes, newlines
/// become spaces, and anything over `max_len` characters is cut back to
/// the last word boundary and ellipsized.
pub fn truncate_description(description: Option<&str>, max_len: usize) -> String {
    let Some(raw) = description.filter(|text| !text.is_empty()) else {
        return "No description".to_string();
    };

    let sanitized = raw.replace('|', "-").replace('\n', " ");
    let sanitized = sanitized.trim();
    if sanitized.chars().count() <= max_len {
        return sanitized.to_string();
    }

    let mut cut: String = sanitized.chars().take(max_len.saturating_sub(3)).collect();
    if let Some(space) = cut.rfind(' ') {
        cut.truncate(space);
    }
    format!("{cut}...")
}
