use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Get the partition number for a routing key.
/// The same key always lands on the same storage node for a fixed node count.
///
/// # Arguments
/// * `key` - Series routing key (`endpoint/counter`)
/// * `num_partitions` - Total number of storage nodes
///
/// # Returns
/// Partition number in range [0, num_partitions)
pub fn get_partition(key: &str, num_partitions: usize) -> usize {
    if num_partitions == 0 {
        return 0;
    }

    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    (hash % num_partitions as u64) as usize
}

/// Picks the node owning `key`, or `None` when there are no nodes.
pub fn pick<'a, T>(key: &str, nodes: &'a [T]) -> Option<&'a T> {
    if nodes.is_empty() {
        return None;
    }
    nodes.get(get_partition(key, nodes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partition_distribution() {
        let num_partitions = 2;
        let keys = vec![
            "h1/cpu.load", "h2/cpu.load", "h3/cpu.load", "h4/cpu.load", "h5/cpu.load",
            "h1/agent.alive", "h2/agent.alive", "h3/agent.alive", "h4/agent.alive", "h5/agent.alive",
        ];

        let mut partition_counts = HashMap::new();
        for key in keys {
            let partition = get_partition(key, num_partitions);
            *partition_counts.entry(partition).or_insert(0) += 1;

            assert_eq!(partition, get_partition(key, num_partitions));
        }

        for count in partition_counts.values() {
            assert!(*count > 0, "Each partition should have at least one series");
        }
    }

    #[test]
    fn test_pick_follows_partition() {
        let nodes = ["graph-00", "graph-01", "graph-02"];
        let key = "h1/cpu.load";

        assert_eq!(pick(key, &nodes), Some(&nodes[get_partition(key, 3)]));
        assert_eq!(pick::<&str>(key, &[]), None);
    }

    #[test]
    fn test_edge_cases() {
        assert_eq!(get_partition("h1/cpu.load", 0), 0);
        assert_eq!(get_partition("h1/cpu.load", 1), 0);

        let partition = get_partition("", 2);
        assert!(partition < 2);
    }
}
