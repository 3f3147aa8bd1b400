use std::collections::HashSet;

/// The five-way intent ladder a question is classified into. No general NL understanding: this
/// is a keyword ladder, checked in order, same as the stopword-and-capitalization heuristic it's
/// paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Price,
    Leadership,
    About,
    Changed,
    Default,
}

pub fn classify_intent(question: &str) -> Intent {
    let q = question.to_lowercase();
    if q.contains("how much") || q.contains("cost") || q.contains("price") {
        Intent::Price
    } else if q.contains("who") && (q.contains("ceo") || q.contains("founder") || q.contains("founded")) {
        Intent::Leadership
    } else if q.contains("what") && q.contains("changed") {
        Intent::Changed
    } else if q.contains("what") || q.contains("tell") || q.contains("about") {
        Intent::About
    } else {
        Intent::Default
    }
}

fn stopwords() -> &'static HashSet<&'static str> {
    static WORDS: std::sync::OnceLock<HashSet<&'static str>> = std::sync::OnceLock::new();
    WORDS.get_or_init(|| {
        [
            "what", "who", "when", "where", "why", "how", "is", "are", "was", "were", "the", "a",
            "an", "in", "on", "at", "to", "for", "of", "with", "about", "does", "do", "did", "can",
            "could", "would", "should", "founded", "created", "made", "built", "developed",
            "invented",
        ]
        .into_iter()
        .collect()
    })
}

/// Maximal capitalized phrases, minus the stopword set. Mirrors the prior Python engine's
/// heuristic: consecutive capitalized words glue into one candidate entity name.
pub fn extract_entities(question: &str) -> Vec<String> {
    let stop = stopwords();
    let mut entities = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for word in question.split_whitespace() {
        let clean: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if clean.is_empty() {
            continue;
        }

        let is_capitalized = clean.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        if is_capitalized && !stop.contains(clean.to_lowercase().as_str()) {
            current.push(clean);
        } else if !current.is_empty() {
            entities.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        entities.push(current.join(" "));
    }
    entities
}
