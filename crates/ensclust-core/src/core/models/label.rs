use std::fmt;
use thiserror::Error;

/// Separator between a bare chain name and its copy index (`name..k`).
pub const COPY_SEPARATOR: &str = "..";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LabelError {
    #[error("Label is empty")]
    Empty,
    #[error("Label '{label}' has an empty bare name before '{COPY_SEPARATOR}'")]
    EmptyBareName { label: String },
    #[error("Label '{label}' has an invalid copy index '{suffix}' (expected an integer >= 1)")]
    InvalidCopyIndex { label: String, suffix: String },
}

/// A parsed chain label: a bare name plus an optional copy index.
///
/// Labels sharing a bare name are interchangeable copies of the same physical chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainLabel {
    bare_name: String,
    copy: Option<u32>,
}

impl ChainLabel {
    pub fn parse(label: &str) -> Result<Self, LabelError> {
        if label.is_empty() {
            return Err(LabelError::Empty);
        }

        match label.split_once(COPY_SEPARATOR) {
            None => Ok(Self {
                bare_name: label.to_string(),
                copy: None,
            }),
            Some((bare, suffix)) => {
                if bare.is_empty() {
                    return Err(LabelError::EmptyBareName {
                        label: label.to_string(),
                    });
                }
                let copy = suffix
                    .parse::<u32>()
                    .ok()
                    .filter(|&k| k >= 1)
                    .ok_or_else(|| LabelError::InvalidCopyIndex {
                        label: label.to_string(),
                        suffix: suffix.to_string(),
                    })?;
                Ok(Self {
                    bare_name: bare.to_string(),
                    copy: Some(copy),
                })
            }
        }
    }

    pub fn bare_name(&self) -> &str {
        &self.bare_name
    }

    pub fn copy(&self) -> Option<u32> {
        self.copy
    }
}

impl fmt::Display for ChainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.copy {
            Some(k) => write!(f, "{}{}{}", self.bare_name, COPY_SEPARATOR, k),
            None => write!(f, "{}", self.bare_name),
        }
    }
}

/// Returns the bare name of a label without validating the copy suffix.
pub fn bare_name(label: &str) -> &str {
    label
        .split_once(COPY_SEPARATOR)
        .map_or(label, |(bare, _)| bare)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_label_has_no_copy_index() {
        let label = ChainLabel::parse("med2").unwrap();
        assert_eq!(label.bare_name(), "med2");
        assert_eq!(label.copy(), None);
        assert_eq!(label.to_string(), "med2");
    }

    #[test]
    fn parse_copy_qualified_label_splits_name_and_index() {
        let label = ChainLabel::parse("Rpb4..2").unwrap();
        assert_eq!(label.bare_name(), "Rpb4");
        assert_eq!(label.copy(), Some(2));
        assert_eq!(label.to_string(), "Rpb4..2");
    }

    #[test]
    fn parse_rejects_empty_label() {
        assert_eq!(ChainLabel::parse(""), Err(LabelError::Empty));
    }

    #[test]
    fn parse_rejects_missing_bare_name() {
        assert!(matches!(
            ChainLabel::parse("..1"),
            Err(LabelError::EmptyBareName { .. })
        ));
    }

    #[test]
    fn parse_rejects_zero_or_non_numeric_copy_index() {
        assert!(matches!(
            ChainLabel::parse("a..0"),
            Err(LabelError::InvalidCopyIndex { .. })
        ));
        assert!(matches!(
            ChainLabel::parse("a..x"),
            Err(LabelError::InvalidCopyIndex { .. })
        ));
        assert!(matches!(
            ChainLabel::parse("a.."),
            Err(LabelError::InvalidCopyIndex { .. })
        ));
    }

    #[test]
    fn bare_name_strips_suffix_without_validation() {
        assert_eq!(bare_name("a..3"), "a");
        assert_eq!(bare_name("b"), "b");
    }
}
