#![forbid(unsafe_code)]

//! Error type shared by every list and view in this crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollectionError>;

/// Failure of a list operation.
///
/// A mutator that returns an error has left the list untouched and sent no
/// change notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("range {start}..{start}+{count} out of bounds for length {len}")]
    RangeOutOfBounds {
        start: usize,
        count: usize,
        len: usize,
    },

    #[error("item not found")]
    ItemNotFound,
}

impl CollectionError {
    /// Check that `index` addresses an existing element.
    pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(Self::IndexOutOfBounds { index, len })
        }
    }

    /// Check that `index` is a valid insertion point (`0..=len`).
    pub(crate) fn check_insert(index: usize, len: usize) -> Result<()> {
        if index <= len {
            Ok(())
        } else {
            Err(Self::IndexOutOfBounds { index, len })
        }
    }

    /// Check that `start..start + count` lies within `0..len`.
    pub(crate) fn check_range(start: usize, count: usize, len: usize) -> Result<()> {
        match start.checked_add(count) {
            Some(end) if end <= len => Ok(()),
            _ => Err(Self::RangeOutOfBounds { start, count, len }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_checks() {
        assert!(CollectionError::check_index(0, 1).is_ok());
        assert_eq!(
            CollectionError::check_index(1, 1),
            Err(CollectionError::IndexOutOfBounds { index: 1, len: 1 })
        );
        assert!(CollectionError::check_insert(1, 1).is_ok());
        assert!(CollectionError::check_insert(2, 1).is_err());
    }

    #[test]
    fn range_check_rejects_overflow() {
        assert!(CollectionError::check_range(2, 3, 5).is_ok());
        assert!(CollectionError::check_range(3, 3, 5).is_err());
        assert!(CollectionError::check_range(usize::MAX, 2, 5).is_err());
    }

    #[test]
    fn display_messages() {
        let err = CollectionError::RangeOutOfBounds {
            start: 2,
            count: 4,
            len: 3,
        };
        assert_eq!(err.to_string(), "range 2..2+4 out of bounds for length 3");
        assert_eq!(CollectionError::ItemNotFound.to_string(), "item not found");
    }
}
