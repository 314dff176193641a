use regex::{Regex, RegexBuilder};

use super::Category;

/// Weight of one matching repository topic.
pub const TOPIC_WEIGHT: u32 = 3;
/// Weight of one matching name/description pattern.
pub const KEYWORD_WEIGHT: u32 = 1;
/// Bonus when the primary language matches the rule's language.
pub const LANGUAGE_BONUS: u32 = 1;

const DATA_TOPICS: &[&str] = &[
    "dataframe",
    "data",
    "analytics",
    "etl",
    "cdc",
    "streaming",
    "database",
    "sql",
    "postgresql",
    "postgres",
    "arrow",
    "parquet",
    "iceberg",
    "delta-lake",
    "lakehouse",
    "olap",
    "query-engine",
    "data-engineering",
    "data-pipeline",
    "polars",
    "duckdb",
    "kafka",
    "flink",
    "spark",
    "bigdata",
    "data-science",
    "timeseries",
];

const RUST_TOPICS: &[&str] = &[
    "rust",
    "rustlang",
    "cargo",
    "crate",
    "cli",
    "command-line",
    "developer-tools",
    "devtools",
    "parser",
    "compiler",
    "tokio",
    "async-rust",
    "rust-library",
];

const AI_TOPICS: &[&str] = &[
    "ai",
    "ml",
    "machine-learning",
    "deep-learning",
    "llm",
    "gpt",
    "neural-network",
    "nlp",
    "computer-vision",
    "generative-ai",
    "artificial-intelligence",
    "robotics",
    "chatbot",
    "transformers",
    "langchain",
    "openai",
    "rag",
];

const INFRA_TOPICS: &[&str] = &[
    "infrastructure",
    "devops",
    "kubernetes",
    "docker",
    "cloud",
    "monitoring",
    "security",
    "honeypot",
    "networking",
    "ci-cd",
    "terraform",
    "ansible",
    "aws",
    "azure",
    "gcp",
];

const DATA_PATTERNS: &[&str] = &[
    r"\bdata\b",
    r"query",
    r"\bsql\b",
    r"\betl\b",
    r"\bcdc\b",
    r"stream",
    r"postgres",
    r"iceberg",
    r"lakehouse",
    r"arrow",
    r"parquet",
    r"polars",
    r"duckdb",
    r"analytics",
];

const RUST_PATTERNS: &[&str] = &[r"-rs$", r"\.rs\b", r"\brust\b"];

const AI_PATTERNS: &[&str] = &[
    r"\bai\b",
    r"\bml\b",
    r"\bllm\b",
    r"\bgpt\b",
    r"robot",
    r"neural",
    r"machine.?learning",
];

const INFRA_PATTERNS: &[&str] = &[
    r"deploy",
    r"infra",
    r"docker",
    r"kube",
    r"security",
    r"honeypot",
    r"devops",
];

/// Matching rules for one category: topics identify it outright, the
/// weaker name/description patterns and optional language nudge it.
pub struct CategoryRule {
    pub category: Category,
    pub topics: &'static [&'static str],
    pub patterns: Vec<Regex>,
    pub language: Option<&'static str>,
}

/// The fixed rule tables, compiled once and passed by reference wherever
/// classification happens.
pub struct ClassifyRules {
    rules: Vec<CategoryRule>,
}

impl ClassifyRules {
    pub fn new() -> Self {
        Self {
            rules: vec![
                rule(Category::DataEcosystem, DATA_TOPICS, DATA_PATTERNS, None),
                rule(Category::RustTooling, RUST_TOPICS, RUST_PATTERNS, Some("Rust")),
                rule(Category::AiMl, AI_TOPICS, AI_PATTERNS, None),
                rule(Category::Infrastructure, INFRA_TOPICS, INFRA_PATTERNS, None),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }
}

fn rule(
    category: Category,
    topics: &'static [&'static str],
    patterns: &[&str],
    language: Option<&'static str>,
) -> CategoryRule {
    let patterns = patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .unwrap()
        })
        .collect();
    CategoryRule {
        category,
        topics,
        patterns,
        language,
    }
}
