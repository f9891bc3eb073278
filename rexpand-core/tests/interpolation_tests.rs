//! Integration tests for sandboxed interpolation
//!
//! These tests check the composed pattern text; matching behavior is covered
//! by the engine-backed tests of the `rexpand` crate.

use rexpand_core::{BoundaryViolation, CompileError, DOUBLE_PUNCTUATORS, Fragment, compose, partial};

fn hex(c: char) -> String {
    format!("\\x{:02X}", u32::from(c))
}

fn violation(result: rexpand_core::Result<String>) -> Option<BoundaryViolation> {
    match result {
        Err(CompileError::UnsafeFragmentBoundary { violation, .. }) => Some(violation),
        _ => None,
    }
}

mod default_context {
    use super::*;

    #[test]
    fn test_coerce_non_string_values() {
        assert_eq!(compose(&["", ""], [partial(9)]).unwrap(), "9");
        assert_eq!(compose(&["a", ""], [42u8]).unwrap(), "a(?:42)");
    }

    #[test]
    fn test_quantifier_applies_to_whole_fragment() {
        assert_eq!(compose(&["^", "+$"], [".abc"]).unwrap(), "^(?:.abc)+$");
    }

    #[test]
    fn test_alternation_is_contained() {
        assert_eq!(compose(&["^a", "d$"], ["b|c"]).unwrap(), "^a(?:b|c)d$");
    }

    #[test]
    fn test_self_contained_units_are_not_wrapped() {
        let cases = [
            ("x", "x"),
            (r"\w", r"\w"),
            (r"\p{L}", r"\p{L}"),
            ("(?:a|b)", "(?:a|b)"),
            ("[a-z]", "[a-z]"),
            ("(?<n>a)", "(?<n>a)"),
        ];
        for (value, expected) in cases {
            assert_eq!(compose(&["", "+"], [value]).unwrap(), format!("{expected}+"), "{value}");
        }
    }

    #[test]
    fn test_anchors_and_assertions_are_wrapped() {
        assert_eq!(compose(&["", "?"], ["^"]).unwrap(), "(?:^)?");
        assert_eq!(compose(&["", "?"], [r"\b"]).unwrap(), r"(?:\b)?");
        assert_eq!(compose(&["a", "b"], [""]).unwrap(), "a(?:)b");
    }

    #[test]
    fn test_unescaped_close_cannot_end_outer_group() {
        assert_eq!(
            violation(compose(&["(", ")"], [")"])),
            Some(BoundaryViolation::UnmatchedGroupClose)
        );
        assert_eq!(
            violation(compose(&["", ")"], ["(a"])),
            Some(BoundaryViolation::UnclosedGroup)
        );
        assert_eq!(compose(&["(", ")"], [r"\)"]).unwrap(), r"(\))");
        assert_eq!(compose(&["(", ")"], ["[)]"]).unwrap(), "([)])");
    }

    #[test]
    fn test_preceding_backslash_is_rejected() {
        assert_eq!(
            violation(compose(&["\\", ""], ["w"])),
            Some(BoundaryViolation::EscapedSpliceMarker)
        );
        assert_eq!(
            violation(compose(&["\\", ""], [Fragment::literal("w")])),
            Some(BoundaryViolation::EscapedSpliceMarker)
        );
    }

    #[test]
    fn test_error_status_of_preceding_token_unchanged() {
        for prefix in [r"\x", r"\x0", r"\u", r"\u{", r"\p{", r"\k<", r"\c", "(?", "(?<na", "a{2,"] {
            assert_eq!(
                violation(compose(&[prefix, ""], ["00"])),
                Some(BoundaryViolation::IncompleteToken),
                "{prefix}"
            );
        }
    }

    #[test]
    fn test_escape_cut_off_before_its_argument() {
        let cases = [
            (r"\p", "{L}"),
            (r"\P", "{L}"),
            (r"\q", "{a}"),
            (r"\k", "<a>"),
            (r"(?<a>x)\g", "<a>"),
        ];
        for (prefix, value) in cases {
            assert_eq!(
                violation(compose(&[prefix, ""], [value])),
                Some(BoundaryViolation::IncompleteToken),
                "{prefix}"
            );
        }
    }

    #[test]
    fn test_class_closed_inside_braces_leaves_class() {
        assert_eq!(compose(&[r"[\p{]}", ""], ["a|b"]).unwrap(), r"[\p{]}(?:a|b)");
    }

    #[test]
    fn test_fragment_cannot_leave_escape_for_the_next_segment() {
        for (value, following) in [(r"\p", "{L}"), (r"\k", "<a>"), (r"\g", "<a>")] {
            assert_eq!(
                violation(compose(&["(?<a>x)", following], [value])),
                Some(BoundaryViolation::IncompleteTrailingToken),
                "{value}"
            );
        }
    }

    #[test]
    fn test_meaning_of_preceding_token_unchanged() {
        assert_eq!(compose(&[r"\0", ""], ["0"]).unwrap(), r"\0(?:0)");
        assert_eq!(compose(&["", "0"], [r"\0"]).unwrap(), r"(?:\0)0");
        assert_eq!(compose(&[r"(a)\1", ""], ["0"]).unwrap(), r"(a)\1(?:0)");
    }

    #[test]
    fn test_trailing_backslash_is_rejected() {
        assert_eq!(
            violation(compose(&["", "w"], ["\\"])),
            Some(BoundaryViolation::TrailingBackslash)
        );
        assert_eq!(
            violation(compose(&["", "0"], [r"\x4"])),
            Some(BoundaryViolation::IncompleteTrailingToken)
        );
    }

    #[test]
    fn test_escaped_fragments_match_text() {
        assert_eq!(
            compose(&["^", "$"], [Fragment::escaped("1+1=2?")]).unwrap(),
            r"^(?:1\+1=2\?)$"
        );
        assert_eq!(compose(&["", "+"], [Fragment::escaped("*")]).unwrap(), r"\*+");
    }

    #[test]
    fn test_literal_fragments_are_trusted() {
        assert_eq!(compose(&["", "+"], [Fragment::literal("ab")]).unwrap(), "ab+");
        assert_eq!(compose(&[r"\x", ""], [Fragment::literal("41")]).unwrap(), r"\x41");
    }
}

mod class_context {
    use super::*;

    #[test]
    fn test_coerce_non_string_values() {
        assert_eq!(compose(&["[1-", "]"], [partial(9)]).unwrap(), "[1-9]");
    }

    #[test]
    fn test_lone_double_punctuator_at_range_boundary() {
        for c in DOUBLE_PUNCTUATORS.chars() {
            let end = compose(&[r"[\0-", "]"], [c]).unwrap();
            let start = compose(&["[", r"-\u{10FFFF}]"], [c]).unwrap();
            if c == '^' {
                assert_eq!(end, r"[\0-\x5E]");
                assert_eq!(start, r"[\x5E-\u{10FFFF}]");
            } else {
                assert_eq!(end, format!(r"[\0-{c}]"));
                assert_eq!(start, format!(r"[{c}-\u{{10FFFF}}]"));
            }
        }
    }

    #[test]
    fn test_single_characters_at_range_boundary() {
        let values = [
            "a",
            r"\b",
            r"\t",
            r"\0",
            r"\cA",
            r"\x01",
            r"\u0001",
            r"\u{10000}",
            r"\u{00000000001}",
            r"\{",
            r"\^",
            r"\-",
            r"\]",
            r"\\",
        ];
        for value in values {
            assert_eq!(
                compose(&[r"[\0-", "]"], [value]).unwrap(),
                format!(r"[\0-{value}]")
            );
            assert_eq!(
                compose(&["[", r"-\u{10FFFF}]"], [value]).unwrap(),
                format!(r"[{value}-\u{{10FFFF}}]")
            );
        }
    }

    #[test]
    fn test_unions_rejected_at_range_boundary() {
        let values = [
            "ab",
            r"\t\t",
            "~~",
            "[a]",
            "[ab]",
            r"\q{a}",
            r"\q{a|bc}",
            r"\p{RGI_Emoji}",
            r"\p{L}",
            r"\d",
            "}",
        ];
        for value in values {
            assert!(compose(&[r"[\0-", "]"], [value]).is_err(), "{value}");
            assert!(compose(&["[", r"-\u{10FFFF}]"], [value]).is_err(), "{value}");
        }
    }

    #[test]
    fn test_range_rejections_name_the_fragment() {
        assert_eq!(
            compose(&["[a-", "]"], ["bc"]),
            Err(CompileError::InvalidRangeBoundary {
                index: 0,
                position: 3,
                value: "bc".to_string(),
            })
        );
    }

    #[test]
    fn test_leading_caret_does_not_negate() {
        assert_eq!(compose(&["[", "a]"], ["^"]).unwrap(), r"[\x5Ea]");
        assert_eq!(compose(&["[", "-a]"], ["^"]).unwrap(), r"[\x5E-a]");
        assert!(matches!(
            compose(&["[", "]"], ["^^"]),
            Err(CompileError::AmbiguousClassSet { .. })
        ));
    }

    #[test]
    fn test_unescaped_close_cannot_end_class() {
        let unbalanced = |result: rexpand_core::Result<String>| {
            matches!(result, Err(CompileError::UnbalancedClassDelimiter { .. }))
        };
        assert!(unbalanced(compose(&["[", ""], ["]"])));
        assert!(unbalanced(compose(&["[a", "b]"], ["]"])));
        assert_eq!(compose(&["[", "]"], [r"\]"]).unwrap(), r"[\]]");
        assert!(unbalanced(compose(&["[a", "b]"], [r"\\]"])));
        assert_eq!(compose(&["[", "]"], [r"\\\]"]).unwrap(), r"[\\\]]");
        assert_eq!(compose(&["[", "]"], ["a[b]"]).unwrap(), "[a[b]]");
    }

    #[test]
    fn test_trailing_backslash_cannot_escape_next_char() {
        assert_eq!(
            violation(compose(&["[", "w]"], ["\\"])),
            Some(BoundaryViolation::TrailingBackslash)
        );
        assert_eq!(compose(&["[", "w]"], [r"\\"]).unwrap(), r"[\\w]");
        assert_eq!(
            violation(compose(&["[", "w]"], [r"\\\"])),
            Some(BoundaryViolation::TrailingBackslash)
        );
    }

    #[test]
    fn test_preceding_backslash_is_rejected() {
        assert_eq!(
            violation(compose(&["[\\", "]"], ["w"])),
            Some(BoundaryViolation::EscapedSpliceMarker)
        );
    }

    #[test]
    fn test_error_status_of_preceding_token_unchanged() {
        assert_eq!(
            violation(compose(&[r"[\x", "]"], ["00"])),
            Some(BoundaryViolation::IncompleteToken)
        );
    }

    #[test]
    fn test_escape_cut_off_before_its_argument() {
        for (prefix, value) in [(r"[\p", "{L}"), (r"[\P", "{L}"), (r"[\q", "{a}")] {
            assert_eq!(
                violation(compose(&[prefix, "]"], [value])),
                Some(BoundaryViolation::IncompleteToken),
                "{prefix}"
            );
        }
    }

    #[test]
    fn test_fragment_cannot_leave_escape_for_the_next_segment() {
        for (value, following) in [(r"\p", "{L}]"), (r"a\P", "{L}]"), (r"\q", "{a}]")] {
            assert_eq!(
                violation(compose(&["[", following], [value])),
                Some(BoundaryViolation::IncompleteTrailingToken),
                "{value}"
            );
        }
    }

    #[test]
    fn test_meaning_of_preceding_token_unchanged() {
        assert_eq!(compose(&[r"[\0", "]{2}"], ["0"]).unwrap(), r"[\0\x30]{2}");
        assert_eq!(compose(&["[", "0]{2}"], [r"\0"]).unwrap(), r"[\x000]{2}");
    }

    #[test]
    fn test_doubled_punctuators_rejected() {
        let mut values: Vec<String> = DOUBLE_PUNCTUATORS
            .chars()
            .map(|c| c.to_string().repeat(2))
            .collect();
        values.push("_^^".to_string());
        for value in &values {
            assert!(
                matches!(
                    compose(&["[", "]"], [value]),
                    Err(CompileError::AmbiguousClassSet { .. })
                ),
                "{value}"
            );
        }
    }

    #[test]
    fn test_lone_punctuator_bordered_by_itself() {
        for c in DOUBLE_PUNCTUATORS.chars() {
            let before = format!("[{c}");
            let after = format!("{c}]");
            assert_eq!(
                compose(&[before.as_str(), after.as_str()], [c]).unwrap(),
                format!("[{c}{}{c}]", hex(c)),
                "{c}"
            );
        }
        assert_eq!(compose(&["[_^", "^]"], ["^"]).unwrap(), r"[_^\x5E^]");
    }

    #[test]
    fn test_punctuator_in_union_bordered_by_itself() {
        for c in DOUBLE_PUNCTUATORS.chars() {
            let after = format!("{c}]");
            assert_eq!(
                compose(&["[", after.as_str()], [format!("a{c}")]).unwrap(),
                format!("[a{}{c}]", hex(c)),
                "{c}"
            );
        }
    }

    #[test]
    fn test_escaped_fragments_match_text() {
        assert_eq!(
            compose(&["[", "]"], [Fragment::escaped("a-z")]).unwrap(),
            r"[a\-z]"
        );
        assert_eq!(
            compose(&["[", "]"], [Fragment::escaped("&&")]).unwrap(),
            r"[\x26\x26]"
        );
    }
}
