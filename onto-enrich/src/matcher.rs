//! Disambiguation matcher
//!
//! Scores Wikipedia search results against the queried entity name with a
//! tiered lexical heuristic. The first rule that applies decides the score:
//!
//! | Rule                                                    | Score |
//! |---------------------------------------------------------|-------|
//! | Exact (case-insensitive, trimmed)                       | 100   |
//! | Title starts with `query + " "` / `query + " ("`, or equals `query + ")"` | 80 |
//! | Query starts with `title + " "`                         | 60    |
//! | Single-word query equal to the title's first token      | 75    |
//! | Multi-word token overlap (tokens longer than 2 chars)   | 50/30 |
//!
//! Candidates scoring below [`MIN_MATCH_SCORE`] are rejected so that loose
//! overlaps ("Influencer" for "Search Influence") never become links.

/// Minimum winning score for a candidate to be accepted
pub const MIN_MATCH_SCORE: u8 = 50;

const EXACT_SCORE: u8 = 100;
const TITLE_EXTENDS_QUERY_SCORE: u8 = 80;
const SINGLE_WORD_FIRST_TOKEN_SCORE: u8 = 75;
const QUERY_EXTENDS_TITLE_SCORE: u8 = 60;
const STRONG_OVERLAP_SCORE: u8 = 50;
const WEAK_OVERLAP_SCORE: u8 = 30;

/// Normalize a name for comparison and cache keys
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Winning candidate selected from a search result list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestMatch {
    /// Index into the candidate list
    pub index: usize,
    pub score: u8,
}

/// Score one candidate title against the query (0-100)
pub fn similarity_score(query: &str, title: &str) -> u8 {
    let query = normalize(query);
    let title = normalize(title);
    score_normalized(&query, &title)
}

fn score_normalized(query: &str, title: &str) -> u8 {
    if title == query {
        return EXACT_SCORE;
    }

    if title.starts_with(&format!("{} ", query))
        || title.starts_with(&format!("{} (", query))
        || title == format!("{})", query)
    {
        return TITLE_EXTENDS_QUERY_SCORE;
    }

    if query.starts_with(&format!("{} ", title)) {
        return QUERY_EXTENDS_TITLE_SCORE;
    }

    if !query.contains(' ') {
        let first_token = title
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("");
        return if first_token == query {
            SINGLE_WORD_FIRST_TOKEN_SCORE
        } else {
            0
        };
    }

    overlap_score(query, title)
}

fn significant_tokens(value: &str) -> Vec<&str> {
    value
        .split_whitespace()
        .filter(|token| token.chars().count() > 2)
        .collect()
}

fn overlap_score(query: &str, title: &str) -> u8 {
    let query_tokens = significant_tokens(query);
    let title_tokens = significant_tokens(title);

    if query_tokens.is_empty() || title_tokens.is_empty() {
        return 0;
    }

    let query_in_title = query_tokens
        .iter()
        .filter(|token| title_tokens.contains(*token))
        .count();
    let title_in_query = title_tokens
        .iter()
        .filter(|token| query_tokens.contains(*token))
        .count();

    let query_ratio = query_in_title as f64 / query_tokens.len() as f64;
    let title_ratio = title_in_query as f64 / title_tokens.len() as f64;

    if query_ratio >= 0.8 && title_ratio >= 0.6 {
        STRONG_OVERLAP_SCORE
    } else if query_ratio >= 0.6 && title_ratio >= 0.4 {
        WEAK_OVERLAP_SCORE
    } else {
        0
    }
}

/// Pick the highest-scoring title, regardless of threshold
///
/// Ties keep the first-seen candidate. An exact match stops the scan.
/// Returns `None` when every candidate scores zero.
pub fn best_candidate<'a, I>(query: &str, titles: I) -> Option<BestMatch>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = normalize(query);
    let mut best: Option<BestMatch> = None;

    for (index, title) in titles.into_iter().enumerate() {
        let score = score_normalized(&query, &normalize(title));

        if score == EXACT_SCORE {
            return Some(BestMatch { index, score });
        }

        if score > best.map(|b| b.score).unwrap_or(0) {
            best = Some(BestMatch { index, score });
        }
    }

    best
}

/// Pick the best title and apply [`MIN_MATCH_SCORE`]
pub fn select_match<'a, I>(query: &str, titles: I) -> Option<BestMatch>
where
    I: IntoIterator<Item = &'a str>,
{
    best_candidate(query, titles).filter(|m| m.score >= MIN_MATCH_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_ignores_case_and_whitespace() {
        assert_eq!(similarity_score("  OpenAI ", "openai"), 100);
    }

    #[test]
    fn test_title_with_disambiguation_suffix() {
        assert_eq!(similarity_score("ChatGPT", "ChatGPT (chatbot)"), 80);
        assert_eq!(similarity_score("ChatGPT", "ChatGPT Plus"), 80);
        assert_eq!(similarity_score("acme", "acme)"), 80);
    }

    #[test]
    fn test_query_extends_title() {
        assert_eq!(similarity_score("Tesla Model 3 Performance", "Tesla Model"), 60);
    }

    #[test]
    fn test_single_word_first_token() {
        assert_eq!(similarity_score("python", "Python(programming language)"), 75);
        assert_eq!(similarity_score("python", "Monty Python"), 0);
    }

    #[test]
    fn test_single_word_never_uses_overlap() {
        assert_eq!(similarity_score("influence", "social influence"), 0);
    }

    #[test]
    fn test_overlap_tiers() {
        // 2/2 query tokens, 2/3 title tokens
        assert_eq!(
            similarity_score("machine learning", "learning machine theory"),
            50
        );
        // 2/3 query tokens, 2/4 title tokens
        assert_eq!(
            similarity_score("search engine marketing", "marketing for search professionals"),
            30
        );
        assert_eq!(similarity_score("Search Influence", "Search Engine"), 0);
    }

    #[test]
    fn test_short_tokens_are_ignored() {
        // "of" and "an" are dropped, leaving nothing to compare on one side
        assert_eq!(similarity_score("of an", "an of the"), 0);
    }

    #[test]
    fn test_select_prefers_prefix_paren_rule() {
        let titles = ["Influencer", "Search Engine", "Search Influence (company)"];
        let best = select_match("Search Influence", titles.iter().copied()).unwrap();
        assert_eq!(best, BestMatch { index: 2, score: 80 });
    }

    #[test]
    fn test_select_rejects_weak_candidates() {
        let titles = ["Influencer"];
        assert_eq!(select_match("Search Influence", titles.iter().copied()), None);

        let titles = ["marketing for search professionals", "Marketing"];
        let best = best_candidate("search engine marketing", titles.iter().copied());
        assert!(best.is_some());
        assert_eq!(select_match("search engine marketing", titles.iter().copied()), None);
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let titles = ["Acme Corp (brand)", "Acme Corp Holdings"];
        let best = select_match("Acme Corp", titles.iter().copied()).unwrap();
        assert_eq!(best.index, 0);
        assert_eq!(best.score, 80);
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let titles = ["OpenAI Five", "OpenAI", "OpenAI (company)"];
        let best = select_match("OpenAI", titles.iter().copied()).unwrap();
        assert_eq!(best, BestMatch { index: 1, score: 100 });
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(select_match("anything", std::iter::empty()), None);
    }
}
