use shared_types::Record;
use std::collections::{BTreeMap, HashMap};

/// Per-record values the matcher compares, computed once per run.
pub(crate) struct Prepared<'a> {
    pub record: &'a Record,
    pub name: String,
    pub name_len: usize,
    pub organization: Option<String>,
}

impl<'a> Prepared<'a> {
    pub fn new(record: &'a Record) -> Self {
        let name = crate::similarity::normalize_name(&record.display_name);
        let name_len = name.chars().count();
        Self {
            record,
            name,
            name_len,
            organization: record.organization().map(str::to_lowercase),
        }
    }
}

/// Buckets that narrow the records worth comparing against a seed.
///
/// Exact rules only fire inside a shared name, phone or email bucket. The
/// similarity rules can only fire between names whose lengths fall inside a
/// window derived from the lowest similarity threshold, so the length index
/// bounds those checks without dropping any pair.
pub(crate) struct CandidateIndex<'a> {
    by_name: HashMap<&'a str, Vec<usize>>,
    by_phone: HashMap<&'a str, Vec<usize>>,
    by_email: HashMap<&'a str, Vec<usize>>,
    by_length: BTreeMap<usize, Vec<usize>>,
    min_similarity: f64,
}

impl<'a> CandidateIndex<'a> {
    pub fn build(prepared: &'a [Prepared<'a>], min_similarity: f64) -> Self {
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_phone: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_email: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_length: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        for (idx, entry) in prepared.iter().enumerate() {
            if !entry.name.is_empty() {
                by_name.entry(entry.name.as_str()).or_default().push(idx);
                by_length.entry(entry.name_len).or_default().push(idx);
            }
            for phone in &entry.record.phones {
                push_once(by_phone.entry(phone.as_str()).or_default(), idx);
            }
            for email in &entry.record.emails {
                push_once(by_email.entry(email.as_str()).or_default(), idx);
            }
        }

        Self {
            by_name,
            by_phone,
            by_email,
            by_length,
            min_similarity: min_similarity.min(1.0),
        }
    }

    /// Indices after `seed` that could match it, ascending.
    pub fn candidates(&self, seed: usize, prepared: &[Prepared<'_>]) -> Vec<usize> {
        let entry = &prepared[seed];
        let mut out = Vec::new();

        if !entry.name.is_empty() {
            if let Some(bucket) = self.by_name.get(entry.name.as_str()) {
                out.extend(bucket.iter().copied());
            }
            let (low, high) = self.length_window(entry.name_len);
            for bucket in self.by_length.range(low..=high).map(|(_, b)| b) {
                out.extend(bucket.iter().copied());
            }
        }
        for phone in &entry.record.phones {
            if let Some(bucket) = self.by_phone.get(phone.as_str()) {
                out.extend(bucket.iter().copied());
            }
        }
        for email in &entry.record.emails {
            if let Some(bucket) = self.by_email.get(email.as_str()) {
                out.extend(bucket.iter().copied());
            }
        }

        out.retain(|&idx| idx > seed);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Name lengths `l` for which `1 - |len - l| / max(len, l)` can exceed
    /// the minimum threshold. Widened to whole numbers on both ends.
    fn length_window(&self, len: usize) -> (usize, usize) {
        if self.min_similarity <= 0.0 {
            return (1, usize::MAX);
        }
        let low = (len as f64 * self.min_similarity).floor() as usize;
        let high = (len as f64 / self.min_similarity).ceil() as usize;
        (low.max(1), high)
    }
}

fn push_once(bucket: &mut Vec<usize>, idx: usize) {
    if bucket.last() != Some(&idx) {
        bucket.push(idx);
    }
}
