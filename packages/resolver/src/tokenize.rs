//! Tokenizer for bracketed path strings such as
//! `/frr-isisd:isis/instance[area-tag='1'][vrf='default']`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ResolveError;

lazy_static! {
    static ref SEGMENT: Regex =
        Regex::new(r"^(?:([A-Za-z0-9-]*):)?([A-Za-z0-9-]*)((?:\[.*\])*)$").unwrap();
    static ref PREDICATE: Regex = Regex::new(r"\[([A-Za-z0-9-]*)='([A-Za-z0-9-./:]*)'\]").unwrap();
}

/// One `/`-separated piece of a bracketed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub module: Option<String>,
    pub name: String,
    /// `(key, value)` predicates in the order they were written.
    pub predicates: Vec<(String, String)>,
}

/// Split a bracketed path into raw segments.
///
/// Slashes inside `[...]` belong to predicate values and do not split.
pub fn tokenize(input: &str) -> Result<Vec<RawSegment>, ResolveError> {
    split_outside_brackets(input)
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .map(parse_segment)
        .collect()
}

fn split_outside_brackets(input: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                pieces.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&input[start..]);
    pieces
}

fn parse_segment(piece: &str) -> Result<RawSegment, ResolveError> {
    let syntax = || ResolveError::Syntax {
        segment: piece.to_string(),
    };
    let caps = SEGMENT.captures(piece).ok_or_else(syntax)?;
    let name = caps.get(2).map_or("", |m| m.as_str());
    if name.is_empty() {
        return Err(syntax());
    }
    let brackets = caps.get(3).map_or("", |m| m.as_str());

    let mut predicates = Vec::new();
    let mut consumed = 0;
    for pred in PREDICATE.captures_iter(brackets) {
        let whole = pred.get(0).map_or("", |m| m.as_str());
        consumed += whole.len();
        predicates.push((pred[1].to_string(), pred[2].to_string()));
    }
    // Anything in the bracket run that is not a well-formed predicate.
    if consumed != brackets.len() {
        return Err(syntax());
    }

    Ok(RawSegment {
        module: caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .filter(|m| !m.is_empty()),
        name: name.to_string(),
        predicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_segments() {
        let segs = tokenize("/users/user").unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].name, "users");
        assert_eq!(segs[0].module, None);
        assert!(segs[1].predicates.is_empty());
    }

    #[test]
    fn module_prefix_and_predicates() {
        let segs =
            tokenize("/frr-isisd:isis/frr-isisd:instance[area-tag='1'][vrf='default']").unwrap();
        assert_eq!(segs[0].module.as_deref(), Some("frr-isisd"));
        assert_eq!(segs[1].name, "instance");
        assert_eq!(
            segs[1].predicates,
            vec![
                ("area-tag".to_string(), "1".to_string()),
                ("vrf".to_string(), "default".to_string())
            ]
        );
    }

    #[test]
    fn slash_inside_predicate_does_not_split() {
        let segs = tokenize("/routes/route[prefix='10.0.0.0/24']/nexthop").unwrap();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].predicates[0].1, "10.0.0.0/24");
    }

    #[test]
    fn malformed_segment_is_syntax_error() {
        assert!(matches!(
            tokenize("/users/us er"),
            Err(ResolveError::Syntax { .. })
        ));
        assert!(matches!(
            tokenize("/users/user[name=hiroki]"),
            Err(ResolveError::Syntax { .. })
        ));
        assert!(matches!(tokenize("/m:"), Err(ResolveError::Syntax { .. })));
    }

    #[test]
    fn root_is_empty() {
        assert!(tokenize("/").unwrap().is_empty());
        assert!(tokenize("").unwrap().is_empty());
    }
}
