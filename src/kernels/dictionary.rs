//! This module contains the kernel for building a sorted string dictionary.
//!
//! Entries are de-duplicated with a hash map and then sorted bytewise, so the
//! dictionary (and every index into it) is a pure function of the input set
//! and does not depend on arrival order.

use hashbrown::HashMap;

/// A sorted dictionary plus, for every input value, its index into `entries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedDictionary {
    pub entries: Vec<Vec<u8>>,
    pub indices: Vec<u64>,
}

/// Counts distinct values without building the dictionary.
pub fn distinct_count<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut seen: hashbrown::HashSet<&'a [u8]> = hashbrown::HashSet::new();
    for v in values {
        seen.insert(v);
    }
    seen.len()
}

/// Builds the dictionary for `values`.
pub fn build<'a, I>(values: I) -> SortedDictionary
where
    I: IntoIterator<Item = &'a [u8]>,
{
    // First pass: provisional ids in arrival order.
    let mut provisional: HashMap<&'a [u8], u64> = HashMap::new();
    let mut arrival: Vec<&'a [u8]> = Vec::new();
    let mut raw_indices = Vec::new();

    for v in values {
        let id = *provisional.entry(v).or_insert_with(|| {
            arrival.push(v);
            (arrival.len() - 1) as u64
        });
        raw_indices.push(id);
    }

    // Second pass: remap provisional ids onto sorted positions.
    let mut order: Vec<usize> = (0..arrival.len()).collect();
    order.sort_unstable_by(|&a, &b| arrival[a].cmp(arrival[b]));
    let mut remap = vec![0u64; arrival.len()];
    for (sorted_pos, &provisional_id) in order.iter().enumerate() {
        remap[provisional_id] = sorted_pos as u64;
    }

    SortedDictionary {
        entries: order.iter().map(|&i| arrival[i].to_vec()).collect(),
        indices: raw_indices.iter().map(|&id| remap[id as usize]).collect(),
    }
}
