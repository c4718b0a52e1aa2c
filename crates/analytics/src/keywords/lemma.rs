//! Rule-based English lemmatizer.
//!
//! Covers the inflections that matter for phrase grouping: plurals,
//! -ing forms, -ed forms, and a table of irregular verbs common in
//! financial prose. Unknown shapes pass through unchanged.

/// Irregular forms worth normalizing in market text.
const IRREGULARS: [(&str, &str); 14] = [
    ("rose", "rise"),
    ("fell", "fall"),
    ("said", "say"),
    ("held", "hold"),
    ("led", "lead"),
    ("met", "meet"),
    ("sold", "sell"),
    ("bought", "buy"),
    ("went", "go"),
    ("saw", "see"),
    ("took", "take"),
    ("made", "make"),
    ("paid", "pay"),
    ("grew", "grow"),
];

/// Lemmatizes one lowercase alphabetic token.
#[must_use]
pub fn lemmatize(token: &str) -> String {
    if let Some((_, lemma)) = IRREGULARS.iter().find(|(form, _)| *form == token) {
        return (*lemma).to_string();
    }
    if token.len() <= 3 {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = token.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if token.ends_with("xes") || token.ends_with("ches") || token.ends_with("shes") {
        return token[..token.len() - 2].to_string();
    }
    if token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") {
        return token[..token.len() - 1].to_string();
    }

    if token.len() > 5 {
        if let Some(stem) = token.strip_suffix("ing") {
            return finish_stem(stem);
        }
    }
    if token.len() > 4 {
        if let Some(stem) = token.strip_suffix("ed") {
            return finish_stem(stem);
        }
    }

    token.to_string()
}

/// Repairs a stem left after removing -ing/-ed.
fn finish_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();

    // Doubled final consonant: running -> run (but keep -ll, -ss).
    if n >= 2 && chars[n - 1] == chars[n - 2] && is_consonant(chars[n - 1]) {
        if chars[n - 1] != 'l' && chars[n - 1] != 's' {
            return chars[..n - 1].iter().collect();
        }
        return stem.to_string();
    }

    // Restore a dropped final e: trading -> trade, announced -> announce.
    let cvc = n >= 3
        && is_consonant(chars[n - 1])
        && !is_consonant(chars[n - 2])
        && is_consonant(chars[n - 3]);
    let soft_ending = matches!(chars.last(), Some('c' | 'v' | 'u' | 'z'));
    if cvc || soft_ending {
        return format!("{stem}e");
    }

    stem.to_string()
}

fn is_consonant(c: char) -> bool {
    c.is_alphabetic() && !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}
