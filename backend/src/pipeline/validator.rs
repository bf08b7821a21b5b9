//! Shape check run once, before any agent is looked up.

use super::decoder::RawRow;

/// Columns every upload must carry. `Notes` is optional and defaults to "".
pub const REQUIRED_COLUMNS: [&str; 2] = ["FirstName", "Phone"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid file format. The file contains no data rows")]
    Empty,
    #[error("Invalid file format. File must contain FirstName and Phone columns (missing: {})", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl SchemaError {
    /// Required columns that were not found. An empty file lacks all of them.
    pub fn missing(&self) -> Vec<String> {
        match self {
            SchemaError::Empty => REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            SchemaError::MissingColumns(missing) => missing.clone(),
        }
    }
}

/// Only the first row's keys are inspected; later rows are assumed to share
/// its shape.
pub fn validate(rows: &[RawRow]) -> Result<(), SchemaError> {
    let first = rows.first().ok_or(SchemaError::Empty)?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !first.contains(column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_sequence_is_invalid() {
        let err = validate(&[]).unwrap_err();
        assert_eq!(err, SchemaError::Empty);
        assert_eq!(err.missing(), vec!["FirstName", "Phone"]);
    }

    #[test]
    fn notes_column_is_optional() {
        assert!(validate(&[row(&[("FirstName", "A"), ("Phone", "1")])]).is_ok());
    }

    #[test]
    fn missing_phone_is_reported() {
        let err = validate(&[row(&[("FirstName", "A"), ("Notes", "x")])]).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumns(vec!["Phone".to_string()]));
    }

    #[test]
    fn only_the_first_row_is_checked() {
        let rows = [
            row(&[("FirstName", "A"), ("Phone", "1")]),
            row(&[("Notes", "no name, no phone")]),
        ];
        assert!(validate(&rows).is_ok());
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let err = validate(&[row(&[("firstname", "A"), ("phone", "1")])]).unwrap_err();
        assert_eq!(err.missing(), vec!["FirstName", "Phone"]);
    }
}
