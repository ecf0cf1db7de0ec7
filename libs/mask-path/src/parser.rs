use crate::{
    ast::{Segment, Selector},
    FieldPathError,
};
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while1, take_while_m_n},
    character::complete::{char, digit1, one_of},
    combinator::{cut, map, map_res, recognize, success},
    error::{convert_error, VerboseError},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, tuple},
    IResult,
};

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub fn parse_path(source: &str) -> Result<Vec<Segment>, FieldPathError> {
    let input = source.trim();
    let leading = source.len() - source.trim_start().len();
    if input.is_empty() {
        return Err(FieldPathError::invalid(source, "field path is empty", None));
    }

    match path_parser(input) {
        Ok((remaining, segments)) => {
            if !remaining.is_empty() {
                let offset = input.len() - remaining.len();
                let message = if remaining.starts_with('.') {
                    "empty path segment".to_string()
                } else if remaining.starts_with(']') {
                    "unmatched `]`".to_string()
                } else {
                    format!("unexpected trailing input: {remaining:?}")
                };
                return Err(FieldPathError::invalid(
                    source,
                    message,
                    compute_column(input, offset).map(|col| col + leading),
                ));
            }

            Ok(segments)
        }
        Err(err) => {
            let (message, column) = match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => {
                    let message = convert_error(input, e.clone());
                    let column = e.errors.first().and_then(|(fragment, _)| {
                        let offset = input.len().saturating_sub(fragment.len());
                        compute_column(input, offset)
                    });
                    (message, column.map(|col| col + leading))
                }
                nom::Err::Incomplete(_) => ("incomplete input".to_string(), None),
            };
            Err(FieldPathError::invalid(source, message.trim_end(), column))
        }
    }
}

pub fn path_parser(input: &str) -> Res<'_, Vec<Segment>> {
    separated_list1(char('.'), segment_parser)(input)
}

pub fn segment_parser(input: &str) -> Res<'_, Segment> {
    alt((
        map(
            pair(key_parser, many0(selector_parser)),
            |(key, selectors)| Segment {
                key: Some(key),
                selectors,
            },
        ),
        map(many1(selector_parser), |selectors| Segment {
            key: None,
            selectors,
        }),
    ))(input)
}

pub fn key_parser(input: &str) -> Res<'_, String> {
    alt((
        quoted_key_parser,
        map(take_while1(is_key_char), |key: &str| key.to_string()),
    ))(input)
}

pub fn quoted_key_parser(input: &str) -> Res<'_, String> {
    map_res(
        recognize(delimited(
            char('"'),
            many0(alt((
                recognize(tuple((char('\\'), one_of(r#""\\/bfnrt"#)))),
                recognize(tuple((
                    char('\\'),
                    char('u'),
                    take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
                ))),
                recognize(is_not("\\\"")),
            ))),
            cut(char('"')),
        )),
        |raw: &str| serde_json::from_str::<String>(raw),
    )(input)
}

pub fn selector_parser(input: &str) -> Res<'_, Selector> {
    delimited(
        char('['),
        alt((
            map(char('*'), |_| Selector::Each),
            map_res(digit1, |digits: &str| {
                digits.parse::<usize>().map(Selector::Index)
            }),
            success(Selector::Each),
        )),
        cut(char(']')),
    )(input)
}

fn is_key_char(c: char) -> bool {
    !matches!(c, '.' | '[' | ']' | '"') && !c.is_whitespace()
}

fn compute_column(input: &str, offset: usize) -> Option<usize> {
    if offset > input.len() || !input.is_char_boundary(offset) {
        return None;
    }
    Some(input[..offset].chars().count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_forms() {
        assert_eq!(selector_parser("[]").unwrap().1, Selector::Each);
        assert_eq!(selector_parser("[*]").unwrap().1, Selector::Each);
        assert_eq!(selector_parser("[12]").unwrap().1, Selector::Index(12));
        assert!(selector_parser("[x]").is_err());
    }

    #[test]
    fn test_compute_column() {
        assert_eq!(compute_column("abc", 0), Some(1));
        assert_eq!(compute_column("abc", 3), Some(4));
        assert_eq!(compute_column("abc", 4), None);
    }
}
