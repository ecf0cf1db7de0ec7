use crate::{ast::Segment, FieldPathError, MAX_PATH_DEPTH};

pub fn validate_segments(source: &str, segments: &[Segment]) -> Result<(), FieldPathError> {
    if segments.is_empty() {
        return Err(FieldPathError::invalid(
            source,
            "field path must contain at least one segment",
            None,
        ));
    }

    for (idx, segment) in segments.iter().enumerate() {
        validate_segment(source, idx, segment)?;
    }

    let depth: usize = segments
        .iter()
        .map(|segment| usize::from(segment.key.is_some()) + segment.selectors.len())
        .sum();
    if depth > MAX_PATH_DEPTH {
        return Err(FieldPathError::invalid(
            source,
            format!("path has {depth} steps, maximum is {MAX_PATH_DEPTH}"),
            None,
        ));
    }

    Ok(())
}

pub fn validate_segment(
    source: &str,
    position: usize,
    segment: &Segment,
) -> Result<(), FieldPathError> {
    match &segment.key {
        Some(key) if key.is_empty() => Err(FieldPathError::invalid(
            source,
            format!("segment {} has an empty key", position + 1),
            None,
        )),
        // A bare selector is only meaningful at the root of a sequence record.
        None if position > 0 => Err(FieldPathError::invalid(
            source,
            format!(
                "segment {} has selectors without a key; attach them to the previous segment",
                position + 1
            ),
            None,
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Selector;

    #[test]
    fn test_bare_selector_only_at_root() {
        let root = Segment {
            key: None,
            selectors: vec![Selector::Each],
        };
        assert!(validate_segment("[]", 0, &root).is_ok());
        assert!(validate_segment("a.[]", 1, &root).is_err());
    }
}
