//! Named-entity capture.
//!
//! A lightweight span pass over the raw text: consecutive capitalized
//! tokens (with common connectors between them) form candidate entities,
//! typed by marker tables. Both the original surface form and a
//! lowercased form are kept so phrases can be restored to their original
//! casing after normalization.

use crate::text::split_sentences;

/// Entity types retained by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Product,
    Facility,
    Geopolitical,
}

/// A captured multi-word entity.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Original surface form, e.g. "Goldman Sachs".
    pub surface: String,
    /// Lowercased form used for matching, e.g. "goldman sachs".
    pub lowercase: String,
    pub kind: EntityKind,
}

const CONNECTORS: [&str; 2] = ["of", "de"];

const LEADING_ARTICLES: [&str; 3] = ["The", "A", "An"];

const ORG_MARKERS: [&str; 20] = [
    "Inc", "Corp", "Corporation", "Co", "Ltd", "LLC", "Plc", "Group", "Holdings", "Bank",
    "Capital", "Partners", "Securities", "Airlines", "Motors", "Technologies", "Industries",
    "Exchange", "Fund", "Sachs",
];

const FACILITY_MARKERS: [&str; 8] = [
    "Airport", "Tower", "Plant", "Center", "Centre", "Stadium", "Bridge", "Terminal",
];

const PERSON_TITLES: [&str; 12] = [
    "Mr", "Mrs", "Ms", "Dr", "Sir", "President", "Chairman", "CEO", "Secretary", "Governor",
    "Senator", "Minister",
];

const GEO_MARKERS: [&str; 10] = [
    "Republic", "Kingdom", "States", "Union", "City", "County", "Province", "North", "South",
    "New",
];

const LOCATION_MARKERS: [&str; 6] = ["River", "Valley", "Island", "Mountain", "Coast", "Bay"];

const PRODUCT_MARKERS: [&str; 5] = ["Series", "Model", "Edition", "Pro", "Max"];

/// Extracts multi-word entities from the text.
#[must_use]
pub fn extract_entities(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for sentence in split_sentences(text) {
        let tokens: Vec<&str> = sentence.split_whitespace().collect();
        let mut span: Vec<String> = Vec::new();

        for raw in tokens.iter().chain(std::iter::once(&"")) {
            let token = trim_token(raw);
            if is_span_member(&token, &span) {
                span.push(token);
            } else {
                flush_span(&mut span, &mut entities);
                // A capitalized token can start the next span immediately.
                if is_capitalized(&token) {
                    span.push(token);
                }
            }
        }
        flush_span(&mut span, &mut entities);
    }

    dedup_entities(entities)
}

/// Maps each lowercase entity token to its surface form.
///
/// Used at restoration time to put original casing back into extracted
/// phrases.
#[must_use]
pub fn surface_map(entities: &[Entity]) -> std::collections::HashMap<String, String> {
    let mut map = std::collections::HashMap::new();
    for entity in entities {
        for (lower, surface) in entity
            .lowercase
            .split_whitespace()
            .zip(entity.surface.split_whitespace())
        {
            map.entry(lower.to_string())
                .or_insert_with(|| surface.to_string());
        }
    }
    map
}

fn trim_token(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '&')
        .to_string()
}

fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

fn is_span_member(token: &str, span: &[String]) -> bool {
    if token.is_empty() {
        return false;
    }
    if is_capitalized(token) {
        return true;
    }
    // Connectors only continue an already-open span.
    !span.is_empty() && CONNECTORS.contains(&token.to_lowercase().as_str())
}

fn flush_span(span: &mut Vec<String>, entities: &mut Vec<Entity>) {
    // Trailing connectors belong to the following text, not the span;
    // leading articles are not part of the name.
    while span
        .last()
        .is_some_and(|t| CONNECTORS.contains(&t.to_lowercase().as_str()))
    {
        span.pop();
    }
    while span
        .first()
        .is_some_and(|t| LEADING_ARTICLES.contains(&t.as_str()))
    {
        span.remove(0);
    }

    let capitalized = span.iter().filter(|t| is_capitalized(t)).count();
    if capitalized >= 2 {
        let surface = span.join(" ");
        entities.push(Entity {
            lowercase: surface.to_lowercase(),
            kind: classify(span),
            surface,
        });
    }
    span.clear();
}

fn classify(tokens: &[String]) -> EntityKind {
    let first = tokens.first().map(String::as_str).unwrap_or("");
    let last = tokens.last().map(String::as_str).unwrap_or("");

    if ORG_MARKERS.contains(&last) {
        EntityKind::Organization
    } else if FACILITY_MARKERS.contains(&last) {
        EntityKind::Facility
    } else if PERSON_TITLES.contains(&first) {
        EntityKind::Person
    } else if LOCATION_MARKERS.contains(&last) {
        EntityKind::Location
    } else if PRODUCT_MARKERS.contains(&last) {
        EntityKind::Product
    } else if GEO_MARKERS.contains(&first) || GEO_MARKERS.contains(&last) {
        EntityKind::Geopolitical
    } else {
        EntityKind::Organization
    }
}

fn dedup_entities(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = std::collections::HashSet::new();
    entities
        .into_iter()
        .filter(|e| seen.insert(e.lowercase.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_multi_word_organization() {
        let entities =
            extract_entities("Goldman Sachs announced record results for the quarter.");

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].surface, "Goldman Sachs");
        assert_eq!(entities[0].lowercase, "goldman sachs");
        assert_eq!(entities[0].kind, EntityKind::Organization);
    }

    #[test]
    fn single_capitalized_words_are_not_entities() {
        let entities = extract_entities("Apple gained while the market slipped.");
        assert!(entities.is_empty());
    }

    #[test]
    fn connectors_join_spans_but_do_not_dangle() {
        let entities = extract_entities("The Bank of England and Ministry of Finance met.");
        let surfaces: Vec<&str> = entities.iter().map(|e| e.surface.as_str()).collect();

        assert!(surfaces.contains(&"Bank of England"));
        assert!(surfaces.contains(&"Ministry of Finance"));
    }

    #[test]
    fn classifies_by_marker_tables() {
        let entities = extract_entities(
            "Mr John Smith visited Incheon Airport before touring New York with Acme Corp.",
        );
        let kinds: Vec<(&str, EntityKind)> = entities
            .iter()
            .map(|e| (e.surface.as_str(), e.kind))
            .collect();

        assert!(kinds.contains(&("Mr John Smith", EntityKind::Person)));
        assert!(kinds.contains(&("Incheon Airport", EntityKind::Facility)));
        assert!(kinds.contains(&("New York", EntityKind::Geopolitical)));
        assert!(kinds.contains(&("Acme Corp", EntityKind::Organization)));
    }

    #[test]
    fn duplicate_mentions_collapse() {
        let entities =
            extract_entities("Goldman Sachs rose. Analysts at Goldman Sachs agreed.");
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn surface_map_restores_original_casing() {
        let entities = extract_entities("Goldman Sachs announced earnings at Deutsche Bank.");
        let map = surface_map(&entities);

        assert_eq!(map.get("goldman").map(String::as_str), Some("Goldman"));
        assert_eq!(map.get("sachs").map(String::as_str), Some("Sachs"));
        assert_eq!(map.get("bank").map(String::as_str), Some("Bank"));
    }
}
