//! Inserts a single space between every pair of adjacent bytes.

use crate::record::Record;
use crate::stage::Transform;

pub struct Expander;

impl Transform for Expander {
    fn name(&self) -> &str {
        "expander"
    }

    fn transform(&mut self, input: &Record) -> Option<Record> {
        let bytes = input.as_bytes();
        if bytes.is_empty() {
            return Some(input.clone());
        }
        let mut expanded = Vec::with_capacity(bytes.len() * 2 - 1);
        for (i, b) in bytes.iter().enumerate() {
            if i > 0 {
                expanded.push(b' ');
            }
            expanded.push(*b);
        }
        Some(Record::from(expanded))
    }
}
