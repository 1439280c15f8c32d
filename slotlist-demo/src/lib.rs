use std::fmt::Display;

use slotlist_arena::{sharded::get_index, ArrayLinkedList, ArrayLinkedListError, ShardedArrayLinkedList};
use slotlist_config::SlotListConfig;
use slotlist_libs::{
    rand::{rngs::SmallRng, Rng, SeedableRng},
    tracing,
};

/// Renders the list as `[a, b, c]` by walking it from the first index, `None` when empty.
pub fn format_elements<T: Display>(
    list: &ArrayLinkedList<T>,
) -> Result<Option<String>, ArrayLinkedListError> {
    if list.is_empty() {
        return Ok(None);
    }

    let mut out = String::from("[");
    let mut current_index = list.get_first()?;
    for i in 0..list.len() {
        out.push_str(&list.get(current_index)?.to_string());
        if i != list.len() - 1 {
            out.push_str(", ");
            current_index = list.get_next(current_index)?.ok_or_else(|| {
                ArrayLinkedListError::Corrupted(format!(
                    "list ended after {} of {} elements",
                    i + 1,
                    list.len()
                ))
            })?;
        }
    }
    out.push(']');
    Ok(Some(out))
}

/// Replays the reference insert/remove sequence and renders the list after every step.
pub fn run_walkthrough(
    capacity: u32,
) -> Result<Vec<(String, Option<String>)>, ArrayLinkedListError> {
    let mut list = ArrayLinkedList::with_capacity(capacity)?;
    let mut steps = Vec::new();

    let index0 = list.insert_first(0u64)?;
    let index1 = list.insert_after(index0, 1)?;
    let index2 = list.insert_after(index1, 2)?;
    let index3 = list.insert_after(index2, 3)?;
    let index4 = list.insert_after(index3, 4)?;
    let index5 = list.insert_after(index4, 5)?;
    list.insert_after(index5, 6)?;
    steps.push((
        "Inserting 0, 1, 2, 3, 4, 5, 6".to_string(),
        format_elements(&list)?,
    ));

    list.remove(index2)?;
    steps.push(("Removing 2".to_string(), format_elements(&list)?));

    list.remove(index0)?;
    steps.push(("Removing 0".to_string(), format_elements(&list)?));

    let new_entry_index = list.insert_after(index5, 9999)?;
    steps.push(("Inserting 9999 after 5".to_string(), format_elements(&list)?));

    list.insert_after(new_entry_index, 888888)?;
    steps.push((
        "Inserting 888888 after 9999".to_string(),
        format_elements(&list)?,
    ));

    list.remove(new_entry_index)?;
    steps.push(("Removing 9999".to_string(), format_elements(&list)?));

    tracing::debug!("walkthrough finished with {} elements", list.len());
    Ok(steps)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChurnReport {
    pub inserted: usize,
    pub removed: usize,
    pub rejected: usize,
    pub len: usize,
}

/// Seeded random inserts and removes spread over `num_shards` lists of `capacity` slots.
pub fn run_churn(config: &SlotListConfig) -> Result<ChurnReport, ArrayLinkedListError> {
    let sharded = ShardedArrayLinkedList::<u64>::with_capacity(config.num_shards, config.capacity)?;
    let mut live: Vec<Vec<u32>> = vec![Vec::new(); config.num_shards];
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut report = ChurnReport::default();

    for round in 0..config.churn_rounds {
        let key: u64 = rng.gen();
        let handles = &mut live[get_index(&key, config.num_shards)];
        let mut list = sharded.shard(&key).write();

        let inserted = match rng.gen_range(0..3) {
            0 => Some(list.insert_first(round as u64)),
            1 if !handles.is_empty() => {
                let prev_index = handles[rng.gen_range(0..handles.len())];
                Some(list.insert_after(prev_index, round as u64))
            }
            _ if !handles.is_empty() => {
                let index = handles.swap_remove(rng.gen_range(0..handles.len()));
                list.remove(index)?;
                report.removed += 1;
                None
            }
            _ => None,
        };

        match inserted {
            Some(Ok(index)) => {
                handles.push(index);
                report.inserted += 1;
            }
            Some(Err(ArrayLinkedListError::Full(_))) => report.rejected += 1,
            Some(Err(e)) => return Err(e),
            None => {}
        }
    }

    for idx in 0..sharded.num_shards() {
        if let Some(shard) = sharded.get_shard_by_index(idx) {
            let list = shard.read();
            list.check_integrity()?;
            tracing::info!(
                "shard {} holds {} of {} slots",
                idx,
                list.len(),
                list.capacity()
            );
        }
    }

    report.len = sharded.len();
    Ok(report)
}

#[cfg(test)]
mod demo_tests {
    use super::*;

    #[test]
    fn test_walkthrough_output() {
        let steps = run_walkthrough(10).unwrap();
        let rendered: Vec<&str> = steps
            .iter()
            .map(|(_, elements)| elements.as_deref().unwrap())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "[0, 1, 2, 3, 4, 5, 6]",
                "[0, 1, 3, 4, 5, 6]",
                "[1, 3, 4, 5, 6]",
                "[1, 3, 4, 5, 9999, 6]",
                "[1, 3, 4, 5, 9999, 888888, 6]",
                "[1, 3, 4, 5, 888888, 6]",
            ]
        );
    }

    #[test]
    fn test_walkthrough_too_small() {
        assert_eq!(
            run_walkthrough(6).unwrap_err(),
            ArrayLinkedListError::Full(6)
        );
        assert_eq!(
            run_walkthrough(0).unwrap_err(),
            ArrayLinkedListError::InvalidCapacity(0)
        );
    }

    #[test]
    fn test_format_empty() {
        let list = ArrayLinkedList::<u64>::with_capacity(2).unwrap();
        assert_eq!(format_elements(&list).unwrap(), None);
    }

    #[test]
    fn test_churn() {
        let config = SlotListConfig {
            capacity: 8,
            num_shards: 3,
            churn_rounds: 2000,
            seed: 11,
        };
        let report = run_churn(&config).unwrap();
        assert_eq!(report.inserted - report.removed, report.len);
        assert!(report.len <= 24);
        assert_eq!(run_churn(&config).unwrap(), report);
    }
}
