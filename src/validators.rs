//! Name validation run before any request leaves the client.

use std::sync::LazyLock;

use regex::Regex;

use crate::client::ClientError;

static MIND_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,31}$").expect("valid mind name pattern"));

static DATASOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,61}$").expect("valid datasource name pattern")
});

/// Check a mind name: a letter followed by letters, digits or underscores,
/// at most 32 characters.
///
/// # Example
/// ```
/// use minds::validators::validate_mind_name;
///
/// assert!(validate_mind_name("my_mind_1").is_ok());
/// assert!(validate_mind_name("123_mind").is_err());
/// assert!(validate_mind_name("my mind").is_err());
/// ```
pub fn validate_mind_name(name: &str) -> Result<(), ClientError> {
    if MIND_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ClientError::InvalidMindName(name.to_string()))
    }
}

/// Check a datasource name: same alphabet as minds, at most 62 characters.
pub fn validate_datasource_name(name: &str) -> Result<(), ClientError> {
    if DATASOURCE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ClientError::InvalidDatasourceName(name.to_string()))
    }
}
