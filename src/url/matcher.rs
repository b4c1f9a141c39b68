/// Checks if a host matches a glob pattern
///
/// `*` matches any run of characters (including none) and `?` matches exactly one
/// character. Everything else matches itself, compared case-insensitively.
///
/// # Arguments
///
/// * `pattern` - The glob pattern, e.g. `*manhua*`
/// * `candidate` - The host to check against the pattern
///
/// # Examples
///
/// ```
/// use comic_ripple::url::matches_glob;
///
/// assert!(matches_glob("*manhua*", "www.manhuadb.com"));
/// assert!(matches_glob("example.com", "example.com"));
/// assert!(matches_glob("img?.example.com", "img3.example.com"));
/// assert!(!matches_glob("*manhua*", "example.org"));
/// ```
pub fn matches_glob(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let candidate: Vec<char> = candidate.to_lowercase().chars().collect();

    let (mut p, mut c) = (0, 0);
    // Position of the last `*` seen and the candidate index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while c < candidate.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == candidate[c]) {
            p += 1;
            c += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, c));
            p += 1;
        } else if let Some((star, tried)) = backtrack {
            // Let the star swallow one more character
            p = star + 1;
            c = tried + 1;
            backtrack = Some((star, c));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}
