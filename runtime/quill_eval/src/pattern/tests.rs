use super::*;

fn matches(pattern: &str, text: &str) -> bool {
    RegexMatcher::new()
        .is_match(pattern, text, false)
        .unwrap_or_else(|err| panic!("{pattern}: {err}"))
}

#[test]
fn matches_anywhere() {
    assert!(matches("bb", "abbc"));
    assert!(!matches("^b", "abbc"));
    assert!(matches("c$", "abbc"));
}

#[test]
fn ignore_case_flag() {
    let matcher = RegexMatcher::new();
    assert_eq!(matcher.is_match("ABC", "xabc", false), Ok(false));
    assert_eq!(matcher.is_match("ABC", "xabc", true), Ok(true));
}

#[test]
fn case_atoms_override_the_flag() {
    let matcher = RegexMatcher::new();
    assert_eq!(matcher.is_match("\\cABC", "xabc", false), Ok(true));
    assert_eq!(matcher.is_match("ABC\\C", "xabc", true), Ok(false));
}

#[test]
fn word_boundaries() {
    assert!(matches("\\<foo\\>", "a foo b"));
    assert!(!matches("\\<foo\\>", "foobar"));
}

#[test]
fn backslashed_multis() {
    assert!(matches("o\\+b", "foobar"));
    assert!(!matches("x\\+", "foobar"));
    assert!(matches("^fo\\=o", "fobar"));
    assert!(matches("^fx\\?o", "foo"));
    assert!(matches("^o\\{2}", "oob"));
    assert!(!matches("^o\\{3}", "oob"));
    assert!(matches("^a\\{,2}b", "ab"));
    assert!(matches("a\\{-1,}", "aaa"));
}

#[test]
fn groups_and_alternation() {
    assert!(matches("\\(foo\\|bar\\)baz", "barbaz"));
    assert!(matches("^\\%(ab\\)\\+$", "ababab"));
    assert!(matches("^cat\\|^dog", "dog food"));
}

#[test]
fn bare_specials_are_literal() {
    assert!(matches("a+b", "a+b"));
    assert!(!matches("a+b", "aab"));
    assert!(matches("(x)", "f(x)"));
    assert!(matches("a|b", "a|b"));
    assert!(matches("{1}", "{1}"));
    assert!(matches("a^b", "a^b"));
    assert!(matches("a$b", "a$b"));
    assert!(matches("*x", "*x"));
}

#[test]
fn character_classes() {
    assert!(matches("^[a-c]\\+$", "abcab"));
    assert!(!matches("^[^a-c]", "abc"));
    assert!(matches("[[:digit:]]", "a1"));
    assert!(matches("[]x]", "]"));
    assert!(matches("\\d\\s\\a", "1 z"));
    assert!(matches("[", "a[b"));
}

#[test]
fn cached_patterns_are_reused() {
    let matcher = RegexMatcher::new();
    for _ in 0..3 {
        assert_eq!(matcher.is_match("a.c", "abc", false), Ok(true));
    }
    assert_eq!(matcher.cache.borrow().len(), 1);
}

#[test]
fn invalid_pattern_is_reported() {
    let matcher = RegexMatcher::new();
    let err = matcher.is_match("\\(", "x", false).unwrap_err();
    assert!(err.message.starts_with("E383"));
    let err = matcher.is_match("a\\{x}", "a", false).unwrap_err();
    assert!(err.message.starts_with("E383"));
}
