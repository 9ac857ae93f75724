//! Identifier conventions for code generated from a table.

use convert_case::{Case, Casing};
use serde::Serialize;

const UNCOUNTABLE: &[&str] = &[
    "audio",
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "metadata",
    "money",
    "news",
    "series",
    "sheep",
    "species",
    "staff",
];

// Whole-word matches only.
const IRREGULAR: &[(&str, &str)] = &[
    ("caches", "cache"),
    ("children", "child"),
    ("cookies", "cookie"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("lives", "life"),
    ("men", "man"),
    ("mice", "mouse"),
    ("movies", "movie"),
    ("people", "person"),
    ("teeth", "tooth"),
    ("women", "woman"),
    ("zombies", "zombie"),
];

// Longest suffix first.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("quizzes", "quiz"),
    ("statuses", "status"),
    ("aliases", "alias"),
    ("buses", "bus"),
    ("movies", "movie"),
    ("heroes", "hero"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("echoes", "echo"),
    ("matrices", "matrix"),
    ("indices", "index"),
    ("analyses", "analysis"),
    ("theses", "thesis"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("zzes", "zz"),
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("xes", "x"),
    ("lves", "lf"),
    ("ies", "y"),
];

const SINGULAR_ENDINGS: &[&str] = &["ss", "us", "is"];

/// Singular form of an English noun; only the last `_` segment changes.
pub fn singular(word: &str) -> String {
    let (prefix, last) = match word.rfind('_') {
        Some(at) => word.split_at(at + 1),
        None => ("", word),
    };
    format!("{prefix}{}", singular_word(last))
}

fn singular_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, single)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return (*single).to_string();
    }
    if SINGULAR_ENDINGS.iter().any(|end| lower.ends_with(end)) {
        return word.to_string();
    }
    for (plural, single) in SUFFIX_RULES {
        if lower.ends_with(plural) {
            return format!("{}{single}", &word[..word.len() - plural.len()]);
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

/// `blog_posts` -> `BlogPost`
pub fn model_name(table: &str) -> String {
    singular(table).to_case(Case::Pascal)
}

pub fn controller_name(table: &str) -> String {
    format!("{}Controller", model_name(table))
}

pub fn request_name(table: &str) -> String {
    format!("{}FormRequest", model_name(table))
}

pub fn policy_name(table: &str) -> String {
    format!("{}Policy", model_name(table))
}

pub fn view_composer_name(table: &str) -> String {
    format!("{}Composer", model_name(table))
}

/// Relation accessor for a foreign-key column: `parent_category_id` -> `parentCategory`.
pub fn relation_name(column: &str) -> String {
    column
        .strip_suffix("_id")
        .filter(|stem| !stem.is_empty())
        .unwrap_or(column)
        .to_case(Case::Camel)
}

/// Every generated artifact name for one table.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub model: String,
    pub controller: String,
    pub request: String,
    pub policy: String,
    pub view_composer: String,
}

impl ArtifactNames {
    pub fn for_table(table: &str) -> Self {
        Self {
            model: model_name(table),
            controller: controller_name(table),
            request: request_name(table),
            policy: policy_name(table),
            view_composer: view_composer_name(table),
        }
    }
}
