//! Parses a `gst-launch`-style pipeline description (`elem1 prop=val !
//! elem2 ! elem3`) into per-element specs. Grounded in the same
//! "surface grammar → canonical intent" shape as the teacher's YAML
//! pipeline compiler, adapted to a `!`-joined element chain.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptionError {
    #[error("empty pipeline description")]
    Empty,
    #[error("malformed element spec '{0}': expected 'kind [key=value ...]'")]
    MalformedElement(String),
    #[error("malformed property assignment '{0}' in element '{1}'")]
    MalformedProperty(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub kind: String,
    pub overrides: Vec<(String, String)>,
}

/// Splits `description` on `!`, trims each segment, and parses each into a
/// kind plus zero or more `key=value` property overrides. An empty or
/// whitespace-only description, or a segment with no kind token, or a
/// token in a segment that isn't a `key=value` pair, is a parse error
/// (SPEC_FULL.md "Reference/test Engine").
pub fn parse_description(description: &str) -> Result<Vec<ElementSpec>, DescriptionError> {
    let segments: Vec<&str> = description.split('!').map(str::trim).collect();
    if segments.iter().all(|segment| segment.is_empty()) {
        return Err(DescriptionError::Empty);
    }

    segments.into_iter().map(parse_element).collect()
}

fn parse_element(segment: &str) -> Result<ElementSpec, DescriptionError> {
    let mut tokens = segment.split_whitespace();
    let kind = tokens.next().ok_or_else(|| DescriptionError::MalformedElement(segment.to_string()))?;

    let mut overrides = Vec::new();
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| DescriptionError::MalformedProperty(token.to_string(), kind.to_string()))?;
        if key.is_empty() || value.is_empty() {
            return Err(DescriptionError::MalformedProperty(token.to_string(), kind.to_string()));
        }
        overrides.push((key.to_string(), value.to_string()));
    }

    Ok(ElementSpec { kind: kind.to_string(), overrides })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_three_element_chain() {
        let specs = parse_description("fakesrc num-buffers=10 ! queue ! fakesink").unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].kind, "fakesrc");
        assert_eq!(specs[0].overrides, vec![("num-buffers".to_string(), "10".to_string())]);
        assert_eq!(specs[1].kind, "queue");
        assert!(specs[1].overrides.is_empty());
    }

    #[test]
    fn empty_description_is_an_error() {
        assert_eq!(parse_description("   "), Err(DescriptionError::Empty));
    }

    #[test]
    fn malformed_property_is_an_error() {
        assert!(matches!(
            parse_description("volume mute"),
            Err(DescriptionError::MalformedProperty(..))
        ));
    }

    #[test]
    fn dangling_bang_is_an_error() {
        assert!(matches!(
            parse_description("fakesrc ! ! fakesink"),
            Err(DescriptionError::MalformedElement(_))
        ));
    }
}
