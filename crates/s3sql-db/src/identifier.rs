//! Table identifier validation.
//!
//! The metadata table name comes from configuration and cannot be a bound
//! parameter, so it is checked before being spliced into SQL.

use s3sql_core::{Error, Result};

/// PostgreSQL identifier length limit.
const MAX_IDENTIFIER_LEN: usize = 63;

fn validate_part(part: &str, full: &str) -> Result<()> {
    if part.is_empty() {
        return Err(Error::Config(format!(
            "Table name '{}' has an empty identifier part",
            full
        )));
    }

    if part.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::Config(format!(
            "Identifier '{}' exceeds {} character limit",
            part, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(first) = part.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::Config(format!(
                "Identifier '{}' must start with a letter or underscore",
                part
            )));
        }
    }

    if let Some(bad) = part
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_')
    {
        return Err(Error::Config(format!(
            "Identifier '{}' contains invalid character '{}'",
            part, bad
        )));
    }

    Ok(())
}

/// Validate a table name, optionally schema-qualified (`schema.table`).
///
/// # Examples
///
/// ```
/// use s3sql_db::validate_table_name;
///
/// assert!(validate_table_name("file_metadata").is_ok());
/// assert!(validate_table_name("app_data.file_metadata").is_ok());
/// assert!(validate_table_name("files; DROP TABLE x").is_err());
/// ```
pub fn validate_table_name(name: &str) -> Result<()> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(Error::Config(format!(
            "Table name '{}' may have at most one schema qualifier",
            name
        )));
    }
    for part in parts {
        validate_part(part, name)?;
    }
    Ok(())
}
