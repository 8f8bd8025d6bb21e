use crate::field_type::FieldType;
use crate::key::{extract_string_key, Key};

/// The sort field of a line record: a 1-based column of a delimited line, or the complete line
/// when the index is 0.
#[derive(Clone, Debug)]
pub(crate) struct Field {
    index: usize,
    field_type: FieldType,
    separator: char,
    ignore_case: bool,
}

impl Field {
    pub(crate) fn new(index: usize, field_type: FieldType) -> Field {
        Field {
            index,
            field_type,
            separator: '\t',
            ignore_case: false,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub(crate) fn separator(&self) -> char {
        self.separator
    }

    pub(crate) fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub(crate) fn whole_line(&self) -> bool {
        self.index == 0
    }

    pub(crate) fn with_separator(mut self, separator: char) -> Field {
        self.separator = separator;
        self
    }

    pub(crate) fn with_ignore_case(mut self, ignore_case: bool) -> Field {
        self.ignore_case = ignore_case;
        self
    }

    /// Extract the sort key for `line`. Whole line fields have no separate key, the line itself
    /// is compared.
    pub(crate) fn key(&self, line: &str) -> Option<Key> {
        if self.whole_line() {
            None
        } else {
            Some(Key::new(extract_string_key(line, self.separator, self.index), self.field_type, self.ignore_case))
        }
    }
}
