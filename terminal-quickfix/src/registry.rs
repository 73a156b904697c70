//! Rule registry keyed by command-line matcher text.
//!
//! Rules whose matchers have identical pattern text share a bucket. Buckets
//! are visited in the order their key was first seen, rules within a bucket
//! in registration order. Nothing is ever removed.

use crate::rule::QuickFixRule;
use std::collections::HashMap;

/// Rules sharing one command-line matcher. Never empty.
#[derive(Debug)]
struct RuleBucket {
    key: String,
    rules: Vec<QuickFixRule>,
}

/// Owned registry of quick fix rules for one terminal session.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    buckets: Vec<RuleBucket>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `rule` to the bucket for its matcher, creating it if needed.
    pub fn register(&mut self, rule: QuickFixRule) {
        let key = rule.key().to_string();
        tracing::trace!("Registering quick fix {} ({}) under {key}", rule.id, rule.source);
        match self.index.get(&key) {
            Some(&slot) => self.buckets[slot].rules.push(rule),
            None => {
                self.index.insert(key.clone(), self.buckets.len());
                self.buckets.push(RuleBucket {
                    key,
                    rules: vec![rule],
                });
            }
        }
    }

    /// Register several rules in order.
    pub fn register_all(&mut self, rules: impl IntoIterator<Item = QuickFixRule>) {
        for rule in rules {
            self.register(rule);
        }
    }

    /// Rules registered under `key`, in registration order.
    pub fn bucket(&self, key: &str) -> Option<&[QuickFixRule]> {
        self.index
            .get(key)
            .map(|&slot| self.buckets[slot].rules.as_slice())
    }

    /// Bucket keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.key.as_str())
    }

    /// Every rule in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &QuickFixRule> {
        self.buckets.iter().flat_map(|b| b.rules.iter())
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
