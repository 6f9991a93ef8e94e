use crate::error::QueryError;

/// Names are stored and compared in uppercase.
pub fn canonical_case(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Validate a lookup query: a single word, not a number.
pub fn validate_query(raw: &str) -> Result<String, QueryError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(QueryError::Empty);
    }
    if s.chars().any(char::is_whitespace) {
        return Err(QueryError::ContainsWhitespace(s.to_string()));
    }
    if s.parse::<i64>().is_ok() {
        return Err(QueryError::Numeric(s.to_string()));
    }
    Ok(s.to_string())
}
