pub mod rules;

pub use rules::ClassifyRules;

use tracing::debug;

use crate::github::RepoInfo;

/// Topical bucket a repository lands in. Variants are in display (and
/// tie-break) order; `Other` is the zero-score fallback and is never scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    DataEcosystem,
    RustTooling,
    AiMl,
    Infrastructure,
    Other,
}

impl Category {
    /// Display order for the console summary and the rendered markdown.
    pub const ORDERED: [Category; 5] = [
        Category::DataEcosystem,
        Category::RustTooling,
        Category::AiMl,
        Category::Infrastructure,
        Category::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::DataEcosystem => "Data Ecosystem",
            Category::RustTooling => "Rust Tooling",
            Category::AiMl => "AI/ML",
            Category::Infrastructure => "Infrastructure",
            Category::Other => "Other",
        }
    }

    /// Markdown section header, icon included.
    pub fn header(self) -> &'static str {
        match self {
            Category::DataEcosystem => "### 🔬 Data Ecosystem",
            Category::RustTooling => "### 🦀 Rust Tooling",
            Category::AiMl => "### 🤖 AI/ML",
            Category::Infrastructure => "### 🛠️ Infrastructure",
            Category::Other => "### 📦 Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Assign `repo` to exactly one category.
///
/// Three signals accumulate per-category scores: owner-assigned topics
/// (weight 3 each), name/description patterns (weight 1 each), and a +1
/// when the rule names the repository's primary language. The highest
/// score wins, earlier categories win ties, and a zero score falls back
/// to `Category::Other`.
pub fn categorize(repo: &RepoInfo, rules: &ClassifyRules) -> Category {
    let text = format!(
        "{} {}",
        repo.full_name,
        repo.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    let mut best = Category::Other;
    let mut best_score = 0u32;

    for rule in rules.iter() {
        let mut score = 0u32;

        for topic in &repo.topics {
            let topic = topic.to_lowercase();
            if rule.topics.contains(&topic.as_str()) {
                score += rules::TOPIC_WEIGHT;
            }
        }

        for pattern in &rule.patterns {
            if pattern.is_match(&text) {
                score += rules::KEYWORD_WEIGHT;
            }
        }

        if let Some(language) = rule.language {
            if repo.language.as_deref() == Some(language) {
                score += rules::LANGUAGE_BONUS;
            }
        }

        if score > best_score {
            best_score = score;
            best = rule.category;
        }
    }

    debug!(
        repo = repo.full_name.as_str(),
        category = best.name(),
        score = best_score,
        "categorized repository"
    );
    best
}

/// Bucket repositories by category, in display order, preserving encounter
/// order inside each bucket.
pub fn group_repositories(
    repos: Vec<RepoInfo>,
    rules: &ClassifyRules,
) -> Vec<(Category, Vec<RepoInfo>)> {
    let mut grouped: Vec<(Category, Vec<RepoInfo>)> = Category::ORDERED
        .iter()
        .map(|&category| (category, Vec::new()))
        .collect();

    for repo in repos {
        let category = categorize(&repo, rules);
        if let Some((_, bucket)) = grouped.iter_mut().find(|(c, _)| *c == category) {
            bucket.push(repo);
        }
    }

    grouped
}
