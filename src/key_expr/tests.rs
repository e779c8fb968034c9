//! Tests for the key expression engine

use super::*;
use crate::error::ErrorKind;

fn ke(s: &str) -> KeyExpr {
    KeyExpr::new(s).unwrap()
}

#[test]
fn test_canonize_rewrites() {
    let cases = [
        ("a/b/c", "a/b/c"),
        ("a/**/**/b", "a/**/b"),
        ("a/**/*/b", "a/*/**/b"),
        ("a/**/*/**/*", "a/*/*/**"),
        ("a/$*/b", "a/*/b"),
        ("a/x$*$*y", "a/x$*y"),
        ("**/**", "**"),
        ("$*", "*"),
        ("**/*/**", "*/**"),
    ];
    for (input, expected) in cases {
        assert_eq!(canonize(input).unwrap(), expected, "canonize({input})");
    }
}

#[test]
fn test_invalid_expressions() {
    let invalid = [
        "", "/a", "a/", "a//b", "a/b#", "a?b", "a$b", "a*", "***", "a/$", "a/*b",
    ];
    for input in invalid {
        let err = KeyExpr::new(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError, "input {input:?}");
    }
}

#[test]
fn test_is_canon() {
    assert!(is_canon("a/b$*"));
    assert!(is_canon("a/*/**"));
    assert!(is_canon("**"));
    assert!(!is_canon("a/**/**"));
    assert!(!is_canon("a/**/*"));
    assert!(!is_canon("a/$*"));
    assert!(!is_canon("a/b$*$*"));
    assert!(!is_canon(""));
    assert!(!is_canon("a//b"));
}

#[test]
fn test_strict_mode_rejects_non_canonical() {
    assert!(KeyExpr::strict("a/*/**").is_ok());
    let err = KeyExpr::strict("a/**/**").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseError);
    assert_eq!(ke("a/**/**").as_str(), "a/**");
}

#[test]
fn test_includes_table() {
    let cases = [
        ("**", "a/b/c", true),
        ("**", "**", true),
        ("a/**", "a", true),
        ("a/**", "a/b/c", true),
        ("a/*", "a/b", true),
        ("a/*", "a/b/c", false),
        ("a/*", "a", false),
        ("a/*/c", "a/b/c", true),
        ("a/b", "a/*", false),
        ("a/*", "a/**", false),
        ("a/**", "a/*", true),
        ("a/b$*", "a/bcd", true),
        ("a/b$*", "a/b", true),
        ("a/b$*", "a/c", false),
        ("a/b$*", "a/bc$*", true),
        ("a/bc$*", "a/b$*", false),
        ("a/$*b$*", "a/xbx", true),
        ("a/*", "a/b$*", true),
        ("a/b$*", "a/*", false),
        ("**/c", "a/b/c", true),
        ("a/**/c", "a/c", true),
        ("a/**/c/**", "a/x/c", true),
        ("a/**/c", "a/x/d", false),
    ];
    for (a, b, expected) in cases {
        assert_eq!(ke(a).includes(&ke(b)), expected, "includes({a}, {b})");
    }
}

#[test]
fn test_intersects_table() {
    let cases = [
        ("a/*", "*/b", true),
        ("a/b", "a/c", false),
        ("a/**", "**/z", true),
        ("a/b$*", "a/$*c", true),
        ("a/b$*", "a/c$*", false),
        ("a/*/c", "a/**", true),
        ("a/*", "a", false),
        ("a/**", "a", true),
        ("**", "x", true),
        ("a/*/b", "a/x/y/b", false),
        ("a/**/b", "a/x/y/b", true),
        ("**/a/**", "**/b/**", true),
        ("a/**/b", "c/**", false),
    ];
    for (a, b, expected) in cases {
        assert_eq!(ke(a).intersects(&ke(b)), expected, "intersects({a}, {b})");
    }
}

#[test]
fn test_set_algebra_properties() {
    let samples: Vec<KeyExpr> = [
        "a", "a/b", "a/b/c", "a/*", "a/**", "*/b", "**", "a/*/c", "a/**/c", "*", "*/*",
        "a/b$*", "a/$*c", "x/y",
    ]
    .iter()
    .map(|s| ke(s))
    .collect();

    for a in &samples {
        assert!(a.includes(a), "reflexive: {a}");
        for b in &samples {
            assert_eq!(a.intersects(b), b.intersects(a), "symmetric: {a} {b}");
            if a.includes(b) {
                assert!(a.intersects(b), "includes implies intersects: {a} {b}");
            }
            for c in &samples {
                if a.includes(b) && b.includes(c) {
                    assert!(a.includes(c), "transitive: {a} {b} {c}");
                }
            }
        }
    }
}

#[test]
fn test_double_wild_includes_everything() {
    let all = ke("**");
    for s in ["a", "a/b/c", "*", "**", "a/*/**", "x$*/y"] {
        assert!(all.includes(&ke(s)), "** includes {s}");
    }
}

#[test]
fn test_canonicalization_idempotence() {
    for s in ["a/**/**/b", "a/$*/b", "x/**/*/y", "a/b$*$*c", "**"] {
        let first = ke(s);
        let second = ke(first.as_str());
        assert_eq!(first, second);
    }
}

#[test]
fn test_join_and_concat() {
    assert_eq!(ke("a/b").join("c").unwrap().as_str(), "a/b/c");
    assert_eq!(ke("a/**").join("**").unwrap().as_str(), "a/**");
    assert_eq!(ke("a/**").join("*/b").unwrap().as_str(), "a/*/**/b");
    assert_eq!(ke("a").join("").unwrap_err().kind(), ErrorKind::ParseError);
    assert_eq!(ke("a").join("/b").unwrap_err().kind(), ErrorKind::ParseError);

    assert_eq!(ke("a/b").concat("c/d").unwrap().as_str(), "a/bc/d");
    assert_eq!(ke("a/b").concat("$*").unwrap().as_str(), "a/b$*");
    assert_eq!(ke("a/*").concat("*").unwrap_err().kind(), ErrorKind::ParseError);
}

#[test]
fn test_accessors() {
    let k = ke("a/*/c");
    assert!(k.is_wild());
    assert_eq!(k.chunks().collect::<Vec<_>>(), vec!["a", "*", "c"]);
    assert!(!ke("a/b").is_wild());
    assert_eq!(format!("{}", k), "a/*/c");
    assert_eq!("a/**/**".parse::<KeyExpr>().unwrap().as_str(), "a/**");
}

#[test]
fn test_serde_validates() {
    let parsed: KeyExpr = serde_json::from_str("\"a/**/**\"").unwrap();
    assert_eq!(parsed.as_str(), "a/**");
    assert!(serde_json::from_str::<KeyExpr>("\"a//b\"").is_err());
    assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"a/**\"");
}
