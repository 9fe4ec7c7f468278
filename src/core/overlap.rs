/// Trim and lowercase every name for comparison
pub fn normalize<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().map(|n| n.trim().to_lowercase()).collect()
}

/// Two normalised terms match when either contains the other.
///
/// Empty terms never match; an empty string is a substring of everything.
#[inline]
pub fn terms_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

/// Entries of `candidates` that match at least one entry of `targets`.
///
/// Both slices must already be normalised. Each candidate is counted once
/// regardless of how many targets it matches.
pub fn matched_terms<'a>(candidates: &'a [String], targets: &[String]) -> Vec<&'a str> {
    candidates
        .iter()
        .filter(|c| targets.iter().any(|t| terms_match(c, t)))
        .map(String::as_str)
        .collect()
}

/// Case-insensitive location comparison: equal or either contains the other
pub fn locations_match(user_location: &str, internship_location: &str) -> bool {
    let user = user_location.trim().to_lowercase();
    let internship = internship_location.trim().to_lowercase();
    user == internship || terms_match(&user, &internship)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_match_both_directions() {
        assert!(terms_match("react", "react native"));
        assert!(terms_match("react native", "react"));
        assert!(!terms_match("rust", "python"));
        assert!(!terms_match("", "python"));
    }

    #[test]
    fn test_matched_terms_counts_each_candidate_once() {
        let user = normalize(["JavaScript", "Java", "Go"]);
        let required = normalize(["javascript", "Java EE"]);

        let matched = matched_terms(&user, &required);

        assert_eq!(matched, vec!["javascript", "java"]);
    }

    #[test]
    fn test_locations_match() {
        assert!(locations_match("San Francisco", "san francisco, ca"));
        assert!(locations_match("  Lucknow ", "lucknow"));
        assert!(!locations_match("Delhi", "Mumbai"));
    }
}
