//! keyed.rs
//!
//! Order-preserving group-by used wherever the engine deduplicates.

use std::collections::HashMap;
use std::hash::Hash;

/// Group `items` by `key`, keeping groups in first-seen order and items in
/// input order within each group.
pub fn group_by_key<T, K, I, F>(items: I, mut key: F) -> Vec<(K, Vec<T>)>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }

    groups
}

/// Keep the first item for every distinct key.
pub fn first_by_key<T, K, I, F>(items: I, key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    group_by_key(items, key)
        .into_iter()
        .filter_map(|(_, group)| group.into_iter().next())
        .collect()
}
