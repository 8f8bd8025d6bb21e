use std::cmp::Ordering;
use std::str::FromStr;

use crate::field_type::FieldType;

/// Return the `column`-th field (1-based) of `line` split on `delimiter`.
///
/// A column of 0 selects the complete line. Lines with fewer fields yield an empty string.
///
/// # Examples
/// ```
/// use flex_file_sort::key::extract_string_key;
/// assert_eq!(extract_string_key("a\tb\tc", '\t', 2), "b");
/// assert_eq!(extract_string_key("a\tb", '\t', 5), "");
/// ```
pub fn extract_string_key(line: &str, delimiter: char, column: usize) -> &str {
    if column == 0 {
        line
    } else {
        line.split(delimiter).nth(column - 1).unwrap_or("")
    }
}

/// Same field selection as [extract_string_key], parsed as a number.
///
/// Missing or unparsable fields yield 0.
///
/// # Examples
/// ```
/// use flex_file_sort::key::extract_numeric_key;
/// assert_eq!(extract_numeric_key("x,12.5", ',', 2), 12.5);
/// assert_eq!(extract_numeric_key("x,abc", ',', 2), 0.0);
/// assert_eq!(extract_numeric_key("x", ',', 2), 0.0);
/// ```
pub fn extract_numeric_key(line: &str, delimiter: char, column: usize) -> f64 {
    f64::from_str(extract_string_key(line, delimiter, column).trim()).unwrap_or(0.0)
}

/// Compare two complete lines. With `ignore_case` the lines are compared by their uppercase
/// fold first and ordinally on a tie, so that distinct lines never compare equal.
pub(crate) fn compare_lines(a: &str, b: &str, ignore_case: bool) -> Ordering {
    if ignore_case {
        a.chars()
            .flat_map(char::to_uppercase)
            .cmp(b.chars().flat_map(char::to_uppercase))
            .then_with(|| a.cmp(b))
    } else {
        a.cmp(b)
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Key {
    String {
        s: String
    },
    Number {
        n: f64
    },
}

impl Key {
    pub(crate) fn new(field: &str, field_type: FieldType, ignore_case: bool) -> Key {
        match field_type {
            FieldType::String => {
                let s = if ignore_case {
                    field.to_uppercase()
                } else {
                    field.to_string()
                };
                Key::String {
                    s
                }
            }
            FieldType::Number => {
                Key::Number {
                    n: f64::from_str(field.trim()).unwrap_or(0.0)
                }
            }
        }
    }
}

impl Eq for Key {}

impl PartialEq<Self> for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::String { s }, Key::String { s: o }) => {
                s.cmp(o)
            }
            (Key::Number { n }, Key::Number { n: o }) => {
                if n.is_nan() && o.is_nan() {
                    Ordering::Equal
                } else if !n.is_nan() && o.is_nan() {
                    Ordering::Greater
                } else if n.is_nan() && !o.is_nan() {
                    Ordering::Less
                } else {
                    n.partial_cmp(o).unwrap_or(Ordering::Equal)
                }
            }
            // keys of one sort always share a type
            (Key::String { .. }, Key::Number { .. }) => {
                Ordering::Less
            }
            (Key::Number { .. }, Key::String { .. }) => {
                Ordering::Greater
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use crate::field_type::FieldType;
    use crate::key::{compare_lines, extract_numeric_key, extract_string_key, Key};

    #[test]
    fn test_extract_string_key() {
        assert_eq!(extract_string_key("3\tx", '\t', 1), "3");
        assert_eq!(extract_string_key("3\tx", '\t', 2), "x");
        assert_eq!(extract_string_key("3\tx", '\t', 3), "");
        assert_eq!(extract_string_key("3\tx", '\t', 0), "3\tx");
        assert_eq!(extract_string_key("a,,c", ',', 2), "");
        assert_eq!(extract_string_key("", ',', 1), "");
    }

    #[test]
    fn test_extract_numeric_key() {
        assert_eq!(extract_numeric_key("10\ty", '\t', 1), 10.0);
        assert_eq!(extract_numeric_key(" -2.5 \ty", '\t', 1), -2.5);
        assert_eq!(extract_numeric_key("1e3", '\t', 1), 1000.0);
        assert_eq!(extract_numeric_key("ten\ty", '\t', 1), 0.0);
        assert_eq!(extract_numeric_key("10", '\t', 2), 0.0);
    }

    #[test]
    fn test_numeric_vs_lexicographic() {
        let ten_s = Key::new("10", FieldType::String, false);
        let nine_s = Key::new("9", FieldType::String, false);
        assert!(ten_s < nine_s);

        let ten_n = Key::new("10", FieldType::Number, false);
        let nine_n = Key::new("9", FieldType::Number, false);
        assert!(nine_n < ten_n);
    }

    #[test]
    fn test_ignore_case_key() {
        assert_eq!(Key::new("abc", FieldType::String, true), Key::new("ABC", FieldType::String, true));
        assert_ne!(Key::new("abc", FieldType::String, false), Key::new("ABC", FieldType::String, false));
    }

    #[test]
    fn test_nan_sorts_first() {
        let nan = Key::new("NaN", FieldType::Number, false);
        let low = Key::new("-1e300", FieldType::Number, false);
        assert!(nan < low);
        assert_eq!(nan, Key::new("nan", FieldType::Number, false));
    }

    #[test]
    fn test_compare_lines() {
        assert_eq!(compare_lines("B", "a", false), Ordering::Less);
        assert_eq!(compare_lines("B", "a", true), Ordering::Greater);
        assert_eq!(compare_lines("A", "a", true), Ordering::Less);
        assert_eq!(compare_lines("a", "a", true), Ordering::Equal);
    }
}
