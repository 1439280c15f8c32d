pub mod array_linked_list;
pub mod sharded;

use slotlist_libs::thiserror;

pub use array_linked_list::ArrayLinkedList;
pub use sharded::{Sharded, ShardedArrayLinkedList};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArrayLinkedListError {
    #[error("capacity should be positive and greater than zero; capacity = {0}")]
    InvalidCapacity(u32),
    #[error("index {index} out of capacity bounds 0..{capacity}")]
    OutOfRange { index: u32, capacity: u32 },
    #[error("no element at index {0}")]
    EmptySlot(u32),
    #[error("no element assigned as first")]
    EmptyList,
    #[error("list is full; capacity = {0}")]
    Full(u32),
    #[error("sharded list needs at least one shard")]
    NoShards,
    #[error("inconsistent array linked list: {0}")]
    Corrupted(String),
    #[error("snapshot codec error: {0}")]
    Codec(String),
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ArrayLinkedListError::OutOfRange {
            index: 12,
            capacity: 10,
        };
        assert_eq!(err.to_string(), "index 12 out of capacity bounds 0..10");
        assert_eq!(
            ArrayLinkedListError::EmptySlot(3).to_string(),
            "no element at index 3"
        );
        let boxed: Box<dyn std::error::Error + Send + Sync> =
            Box::new(ArrayLinkedListError::Full(4));
        assert_eq!(boxed.to_string(), "list is full; capacity = 4");
    }
}
