// src/pipeline/order.rs

use globset::GlobMatcher;

use crate::errors::Result;
use crate::pipeline::matcher::compile_glob;
use crate::pipeline::record::FileRecord;
use crate::types::UnmatchedPolicy;

/// Re-sequences records by an ordered list of glob patterns.
///
/// Records matching an earlier pattern come first. Records of the same rank
/// are sorted by path, which makes the output independent of how the input
/// was enumerated. Records matching no pattern follow in their input order,
/// or are dropped under [`UnmatchedPolicy::Drop`].
#[derive(Debug, Clone)]
pub struct Orderer {
    patterns: Vec<GlobMatcher>,
    policy: UnmatchedPolicy,
}

impl Orderer {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pat in patterns {
            let pat = pat.as_ref().trim_start_matches("./");
            compiled.push(compile_glob(pat)?.compile_matcher());
        }
        Ok(Self {
            patterns: compiled,
            policy: UnmatchedPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Index of the first pattern matching `path`.
    pub fn rank(&self, path: &str) -> Option<usize> {
        self.patterns.iter().position(|m| m.is_match(path))
    }

    pub fn order(&self, records: Vec<FileRecord>) -> Vec<FileRecord> {
        let mut matched: Vec<(usize, FileRecord)> = Vec::with_capacity(records.len());
        let mut unmatched = Vec::new();

        for record in records {
            match self.rank(&record.path) {
                Some(rank) => matched.push((rank, record)),
                None => unmatched.push(record),
            }
        }

        matched.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.path.cmp(&b.path)));

        let mut out: Vec<FileRecord> = matched.into_iter().map(|(_, r)| r).collect();
        if self.policy == UnmatchedPolicy::Append {
            out.extend(unmatched);
        }
        out
    }
}
