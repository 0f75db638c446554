//! Splitting of the 1.0 compound `addr` field.
//!
//! In the 1.0 schema a controller address and a logical name shared one
//! field, `"<addr>.<name>"`. The 2.0 schema stores them independently.

/// Character joining the address and the name in a compound key.
pub const ADDR_SEPARATOR: char = '.';

/// Reasons a compound key cannot be split.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    /// The value has no separator, or the field is absent.
    #[error("compound key has no '.' separator")]
    MissingSeparator,

    /// The separator is the last character, leaving an empty name.
    #[error("compound key has an empty name after the separator")]
    EmptyName,
}

/// The two halves of a split compound key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitKey {
    /// Everything before the first separator.
    pub addr: String,
    /// Everything after the first separator, further separators included.
    pub name: String,
}

/// Whether a value still carries the compound separator.
pub fn is_compound(value: &str) -> bool {
    value.contains(ADDR_SEPARATOR)
}

/// Split a compound key on its first separator.
///
/// `"a.b.c"` yields `addr = "a"` and `name = "b.c"`.
pub fn split_addr(compound: &str) -> Result<SplitKey, SplitError> {
    let (addr, name) = compound
        .split_once(ADDR_SEPARATOR)
        .ok_or(SplitError::MissingSeparator)?;
    if name.is_empty() {
        return Err(SplitError::EmptyName);
    }
    Ok(SplitKey {
        addr: addr.to_owned(),
        name: name.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_separator_only() {
        let key = split_addr("a.b.c").unwrap();
        assert_eq!(key.addr, "a");
        assert_eq!(key.name, "b.c");
    }

    #[test]
    fn simple_key() {
        let key = split_addr("dev1.temp").unwrap();
        assert_eq!(
            key,
            SplitKey {
                addr: "dev1".to_owned(),
                name: "temp".to_owned()
            }
        );
    }

    #[test]
    fn missing_separator() {
        assert_eq!(split_addr("noseparator"), Err(SplitError::MissingSeparator));
        assert_eq!(split_addr(""), Err(SplitError::MissingSeparator));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(split_addr("dev1."), Err(SplitError::EmptyName));
    }

    #[test]
    fn empty_addr_is_kept() {
        let key = split_addr(".temp").unwrap();
        assert_eq!(key.addr, "");
        assert_eq!(key.name, "temp");
    }

    #[test]
    fn compound_detection() {
        assert!(is_compound("dev1.temp"));
        assert!(!is_compound("dev1"));
    }
}
