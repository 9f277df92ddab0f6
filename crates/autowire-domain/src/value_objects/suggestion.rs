//! Near-miss suggestions for misspelled names

use strsim::levenshtein;

use super::natural;

/// Candidates close to `needle`
///
/// A candidate is suggested when its edit distance is at most a third of the
/// needle's length (rounded up), or when one contains the other. The closest
/// candidates come first.
pub fn suggest<'a, I>(candidates: I, needle: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let limit = needle.chars().count().div_ceil(3);
    let lowered = needle.to_lowercase();
    let mut found: Vec<(usize, String)> = candidates
        .into_iter()
        .filter(|candidate| *candidate != needle && !candidate.is_empty())
        .filter_map(|candidate| {
            let other = candidate.to_lowercase();
            let distance = levenshtein(&lowered, &other);
            let close = distance <= limit
                || other.contains(&lowered)
                || (!lowered.is_empty() && lowered.contains(&other));
            close.then(|| (distance, candidate.to_string()))
        })
        .collect();
    found.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| natural::compare(a, b)));
    let mut names: Vec<String> = found.into_iter().map(|(_, name)| name).collect();
    names.dedup();
    names
}

/// The single best suggestion, if any, formatted as a hint
pub fn hint<'a, I>(candidates: I, needle: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let found = suggest(candidates, needle);
    match found.as_slice() {
        [] => None,
        [only] => Some(format!("Did you mean '{only}'?")),
        many => Some(format!("Did you mean one of '{}'?", many.join("', '"))),
    }
}
