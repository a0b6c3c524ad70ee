use std::collections::{BTreeSet, HashMap};

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use rmcp::schemars;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::search::config::{
    CATEGORIES_WEIGHT, COVERAGE_PENALTY, DEFAULT_MIN_MATCH_CHAR_LENGTH, DEFAULT_SEARCH_LIMIT,
    DEFAULT_THRESHOLD, LOCATION_DISTANCE, NAME_WEIGHT, TAGS_WEIGHT,
};
use crate::types::{Icon, MatchSpan, ScoredMatch};

/// Icon field a query can be matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Tags,
    Categories,
    Style,
    Path,
}

impl SearchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Tags => "tags",
            SearchField::Categories => "categories",
            SearchField::Style => "style",
            SearchField::Path => "path",
        }
    }

    fn values<'a>(&self, icon: &'a Icon) -> Vec<&'a str> {
        match self {
            SearchField::Name => vec![icon.name.as_str()],
            SearchField::Tags => icon.tags.iter().map(String::as_str).collect(),
            SearchField::Categories => icon.categories().iter().map(String::as_str).collect(),
            SearchField::Style => icon.style.as_deref().into_iter().collect(),
            SearchField::Path => vec![icon.path.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchKey {
    #[schemars(description = "Icon field to match against")]
    pub name: SearchField,
    #[schemars(description = "Relative weight of this field")]
    pub weight: f64,
}

impl SearchKey {
    pub fn new(name: SearchField, weight: f64) -> Self {
        Self { name, weight }
    }
}

pub fn default_keys() -> Vec<SearchKey> {
    vec![
        SearchKey::new(SearchField::Name, NAME_WEIGHT),
        SearchKey::new(SearchField::Tags, TAGS_WEIGHT),
        SearchKey::new(SearchField::Categories, CATEGORIES_WEIGHT),
    ]
}

/// Options for a fuzzy icon search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzySearchOptions {
    /// Fuzzy matching when true, substring matching when false
    pub fuzzy: bool,
    /// Maximum accepted per-field score (0 = perfect only)
    pub threshold: f64,
    pub limit: usize,
    pub include_score: bool,
    pub include_matches: bool,
    pub keys: Vec<SearchKey>,
    /// Parse the query with `'exact`, `^prefix`, `suffix$` and `!negate` operators
    pub use_extended_search: bool,
    pub ignore_location: bool,
    pub min_match_char_length: usize,
    pub is_case_sensitive: bool,
}

impl Default for FuzzySearchOptions {
    fn default() -> Self {
        Self {
            fuzzy: true,
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_SEARCH_LIMIT,
            include_score: true,
            include_matches: false,
            keys: default_keys(),
            use_extended_search: false,
            ignore_location: true,
            min_match_char_length: DEFAULT_MIN_MATCH_CHAR_LENGTH,
            is_case_sensitive: false,
        }
    }
}

/// One independently scored piece of a query
struct QueryTerm {
    pattern: Pattern,
    /// Score of the term against itself, the best any haystack can do
    reference: Option<u32>,
    /// Shortest consecutive run of matched characters that counts as a hit
    min_run: usize,
}

struct TermHit<'a> {
    score: f64,
    value: &'a str,
    indices: Vec<u32>,
}

/// Reusable buffers for matching
struct Scratch {
    matcher: Matcher,
    haystack: Vec<char>,
    indices: Vec<u32>,
}

impl Scratch {
    fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
            haystack: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn score(&mut self, pattern: &Pattern, text: &str) -> Option<u32> {
        pattern.score(Utf32Str::new(text, &mut self.haystack), &mut self.matcher)
    }
}

/// In-memory fuzzy index over one provider's icons.
///
/// Built from a complete icon set; providers rebuild it whenever their set changes.
#[derive(Debug, Clone, Default)]
pub struct FuzzyIndex {
    icons: Vec<Icon>,
    by_name: HashMap<String, usize>,
}

impl FuzzyIndex {
    pub fn new(icons: Vec<Icon>) -> Self {
        let by_name = icons
            .iter()
            .enumerate()
            .map(|(i, icon)| (icon.name.clone(), i))
            .collect();
        Self { icons, by_name }
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Icon> {
        self.by_name.get(name).map(|&i| &self.icons[i])
    }

    /// Sorted, de-duplicated categories across all icons
    pub fn categories(&self) -> Vec<String> {
        self.icons
            .iter()
            .flat_map(|icon| icon.categories().iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted, de-duplicated styles across all icons
    pub fn styles(&self) -> Vec<String> {
        self.icons
            .iter()
            .filter_map(|icon| icon.style.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Perform fuzzy search with the given query and options
    pub fn search(&self, query: &str, options: &FuzzySearchOptions) -> Vec<ScoredMatch<Icon>> {
        let query = query.trim();
        if query.is_empty() || options.limit == 0 {
            return Vec::new();
        }

        let keys = if options.keys.is_empty() {
            default_keys()
        } else {
            options.keys.clone()
        };
        let total_weight: f64 = keys.iter().map(|k| k.weight.max(0.0)).sum();
        if total_weight <= 0.0 {
            return Vec::new();
        }

        let mut scratch = Scratch::new();
        let terms = build_terms(query, options, &mut scratch);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(f64, usize, Vec<MatchSpan>)> = Vec::new();
        for (index, icon) in self.icons.iter().enumerate() {
            let mut total = 1.0;
            let mut matched = false;
            let mut spans = Vec::new();

            for key in &keys {
                let Some((score, key_hits)) =
                    score_field(icon, key.name, &terms, options, &mut scratch)
                else {
                    continue;
                };
                matched = true;
                total *= score.max(f64::EPSILON).powf(key.weight.max(0.0) / total_weight);
                if options.include_matches {
                    spans.extend(build_spans(key.name, key_hits));
                }
            }

            if matched {
                hits.push((total.clamp(0.0, 1.0), index, spans));
            }
        }

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.truncate(options.limit);

        hits.into_iter()
            .map(|(score, index, spans)| ScoredMatch {
                item: self.icons[index].clone(),
                score: options.include_score.then_some(score),
                match_spans: options.include_matches.then_some(spans),
                original_index: Some(index),
            })
            .collect()
    }

    /// Icons with a category containing `category` (case-insensitive)
    pub fn filter_by_category(&self, category: &str) -> Vec<ScoredMatch<Icon>> {
        let needle = category.to_lowercase();
        self.filter(|icon| {
            icon.categories()
                .iter()
                .any(|c| c.to_lowercase().contains(&needle))
        })
    }

    /// Icons whose style equals `style` (case-insensitive)
    pub fn filter_by_style(&self, style: &str) -> Vec<ScoredMatch<Icon>> {
        self.filter(|icon| {
            icon.style
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(style))
        })
    }

    /// Icons carrying any of `tags` (case-insensitive)
    pub fn filter_by_tags(&self, tags: &[String]) -> Vec<ScoredMatch<Icon>> {
        let wanted: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        self.filter(|icon| icon.tags.iter().any(|t| wanted.contains(&t.to_lowercase())))
    }

    fn filter<F>(&self, predicate: F) -> Vec<ScoredMatch<Icon>>
    where
        F: Fn(&Icon) -> bool,
    {
        self.icons
            .iter()
            .filter(|icon| predicate(icon))
            .enumerate()
            .map(|(position, icon)| ScoredMatch::exact(icon.clone(), position))
            .collect()
    }
}

fn build_terms(query: &str, options: &FuzzySearchOptions, scratch: &mut Scratch) -> Vec<QueryTerm> {
    let case = if options.is_case_sensitive {
        CaseMatching::Respect
    } else {
        CaseMatching::Ignore
    };

    if options.use_extended_search {
        let pattern = Pattern::parse(query, case, Normalization::Smart);
        let positive: Vec<&str> = query
            .split_whitespace()
            .filter(|word| !word.starts_with('!'))
            .map(|word| word.trim_start_matches(['^', '\'']).trim_end_matches('$'))
            .filter(|word| !word.is_empty())
            .collect();
        let reference_text = positive.join(" ");
        let reference = if reference_text.is_empty() {
            None
        } else {
            let reference_pattern =
                Pattern::new(&reference_text, case, Normalization::Smart, AtomKind::Fuzzy);
            scratch.score(&reference_pattern, &reference_text)
        };
        let min_run = positive
            .iter()
            .map(|word| word.chars().count())
            .min()
            .unwrap_or(0)
            .min(options.min_match_char_length);

        return vec![QueryTerm {
            pattern,
            reference,
            min_run,
        }];
    }

    query
        .split_whitespace()
        .map(|word| {
            let pattern = Pattern::new(word, case, Normalization::Smart, AtomKind::Fuzzy);
            let reference = scratch.score(&pattern, word);
            QueryTerm {
                pattern,
                reference,
                min_run: word.chars().count().min(options.min_match_char_length),
            }
        })
        .collect()
}

/// Score one field: the mean over terms of each term's best value score.
///
/// Returns `None` when no term matches or the mean is above the threshold.
fn score_field<'a>(
    icon: &'a Icon,
    field: SearchField,
    terms: &[QueryTerm],
    options: &FuzzySearchOptions,
    scratch: &mut Scratch,
) -> Option<(f64, Vec<TermHit<'a>>)> {
    let values = field.values(icon);
    if values.is_empty() {
        return None;
    }

    let mut sum = 0.0;
    let mut hits = Vec::new();
    for term in terms {
        let best = values
            .iter()
            .filter_map(|&value| match_value(term, value, options, scratch))
            .min_by(|a, b| a.score.total_cmp(&b.score));
        match best {
            Some(hit) => {
                sum += hit.score;
                hits.push(hit);
            }
            None => sum += 1.0,
        }
    }

    let score = sum / terms.len() as f64;
    if hits.is_empty() || score > options.threshold {
        return None;
    }
    Some((score, hits))
}

fn match_value<'a>(
    term: &QueryTerm,
    value: &'a str,
    options: &FuzzySearchOptions,
    scratch: &mut Scratch,
) -> Option<TermHit<'a>> {
    scratch.indices.clear();
    let raw = term.pattern.indices(
        Utf32Str::new(value, &mut scratch.haystack),
        &mut scratch.matcher,
        &mut scratch.indices,
    )?;

    let mut indices = std::mem::take(&mut scratch.indices);
    indices.sort_unstable();
    indices.dedup();
    if longest_run(&indices) < term.min_run {
        return None;
    }

    let quality = match term.reference {
        Some(reference) if reference > 0 => (raw as f64 / reference as f64).min(1.0),
        _ => 1.0,
    };
    let mut score = 1.0 - quality;

    let length = value.chars().count();
    if length > 0 {
        let unmatched = length.saturating_sub(indices.len()) as f64 / length as f64;
        score += unmatched * COVERAGE_PENALTY;
    }
    if !options.ignore_location {
        if let Some(&first) = indices.first() {
            score += first as f64 / LOCATION_DISTANCE;
        }
    }

    Some(TermHit {
        score: score.clamp(0.0, 1.0),
        value,
        indices,
    })
}

fn longest_run(indices: &[u32]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<u32> = None;
    for &index in indices {
        current = match previous {
            Some(p) if p + 1 == index => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(index);
    }
    longest
}

/// Collapse sorted indices into inclusive ranges
fn to_ranges(indices: &[u32]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &index in indices {
        let index = index as usize;
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == index => *end = index,
            _ => ranges.push((index, index)),
        }
    }
    ranges
}

fn build_spans(field: SearchField, hits: Vec<TermHit<'_>>) -> Vec<MatchSpan> {
    let mut by_value: Vec<(&str, Vec<u32>)> = Vec::new();
    for hit in hits {
        match by_value.iter_mut().find(|(value, _)| *value == hit.value) {
            Some((_, indices)) => indices.extend(hit.indices),
            None => by_value.push((hit.value, hit.indices)),
        }
    }

    by_value
        .into_iter()
        .map(|(value, mut indices)| {
            indices.sort_unstable();
            indices.dedup();
            MatchSpan {
                key: field.as_str().to_string(),
                value: Some(value.to_string()),
                indices: to_ranges(&indices),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icon(name: &str, tags: &[&str], categories: &[&str]) -> Icon {
        Icon::new(name, "test", format!("icons/{name}.svg"), "<svg/>")
            .with_tags(tags.iter().copied())
            .with_categories(categories.iter().copied())
    }

    fn index() -> FuzzyIndex {
        FuzzyIndex::new(vec![
            icon("arrow-left", &["arrow", "left", "back"], &["arrows"]),
            icon("home", &["house", "building"], &["navigation"]),
            icon("home-fill", &["house", "building"], &["navigation"]),
            icon("trash", &["delete", "remove"], &["actions"]),
            icon("heart", &["love", "like"], &["social"]),
        ])
    }

    #[test]
    fn test_exact_name_is_perfect() {
        let results = index().search("home", &FuzzySearchOptions::default());
        assert!(!results.is_empty());
        assert_eq!(results[0].item.name, "home");
        assert!(results[0].score.unwrap() < 1e-6);
        assert_eq!(results[0].original_index, Some(1));
    }

    #[test]
    fn test_scores_are_bounded_and_sorted() {
        let results = index().search("hom", &FuzzySearchOptions::default());
        assert!(results.len() >= 2);
        for pair in results.windows(2) {
            assert!(pair[0].score.unwrap() <= pair[1].score.unwrap());
        }
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score.unwrap())));
    }

    #[test]
    fn test_tag_match() {
        let results = index().search("delete", &FuzzySearchOptions::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.name, "trash");
    }

    #[test]
    fn test_threshold_rejects_weak_matches() {
        let strict = FuzzySearchOptions {
            threshold: 0.0,
            ..Default::default()
        };
        let results = index().search("hme", &strict);
        assert!(results.is_empty());
    }

    #[test]
    fn test_limit_and_score_toggle() {
        let options = FuzzySearchOptions {
            limit: 1,
            include_score: false,
            ..Default::default()
        };
        let results = index().search("home", &options);
        assert_eq!(results.len(), 1);
        assert!(results[0].score.is_none());
    }

    #[test]
    fn test_match_spans() {
        let options = FuzzySearchOptions {
            include_matches: true,
            ..Default::default()
        };
        let results = index().search("heart", &options);
        let spans = results[0].match_spans.as_ref().unwrap();
        let name_span = spans.iter().find(|s| s.key == "name").unwrap();
        assert_eq!(name_span.indices, vec![(0, 4)]);
    }

    #[test]
    fn test_case_sensitivity() {
        let options = FuzzySearchOptions {
            is_case_sensitive: true,
            ..Default::default()
        };
        assert!(index().search("HOME", &options).is_empty());
        assert!(!index().search("HOME", &FuzzySearchOptions::default()).is_empty());
    }

    #[test]
    fn test_extended_search_negation() {
        let options = FuzzySearchOptions {
            use_extended_search: true,
            keys: vec![SearchKey::new(SearchField::Name, 1.0)],
            ..Default::default()
        };
        let results = index().search("^home !fill", &options);
        let names: Vec<_> = results.iter().map(|r| r.item.name.as_str()).collect();
        assert_eq!(names, vec!["home"]);
    }

    #[test]
    fn test_filters() {
        let index = index();
        let by_category = index.filter_by_category("NAV");
        assert_eq!(by_category.len(), 2);
        assert!(by_category.iter().all(|m| m.score == Some(0.0)));
        assert_eq!(by_category[1].original_index, Some(1));

        let by_tags = index.filter_by_tags(&["LOVE".to_string()]);
        assert_eq!(by_tags.len(), 1);
        assert_eq!(by_tags[0].item.name, "heart");

        assert!(index.filter_by_style("solid").is_empty());
    }

    #[test]
    fn test_lookup_and_facets() {
        let index = index();
        assert_eq!(index.get("trash").map(|i| i.name.as_str()), Some("trash"));
        assert!(index.get("missing").is_none());
        assert_eq!(
            index.categories(),
            vec!["actions", "arrows", "navigation", "social"]
        );
    }

    #[test]
    fn test_ranges() {
        assert_eq!(to_ranges(&[0, 1, 2, 5, 7, 8]), vec![(0, 2), (5, 5), (7, 8)]);
        assert_eq!(longest_run(&[0, 1, 2, 5, 7, 8]), 3);
        assert_eq!(longest_run(&[]), 0);
    }
}
