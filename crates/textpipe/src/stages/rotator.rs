//! Rotates the payload right by one byte on every record it sees: the last
//! byte moves to the front and everything else shifts up by one.

use crate::record::Record;
use crate::stage::Transform;
use tracing::trace;

pub struct Rotator {
    records_seen: u64,
}

impl Rotator {
    pub fn new() -> Self {
        Rotator { records_seen: 0 }
    }
}

impl Default for Rotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Rotator {
    fn name(&self) -> &str {
        "rotator"
    }

    fn transform(&mut self, input: &Record) -> Option<Record> {
        self.records_seen += 1;
        let bytes = input.as_bytes();
        if bytes.is_empty() {
            trace!(seen = self.records_seen, "rotator: empty record, no-op");
            return Some(input.clone());
        }
        let mut rotated = Vec::with_capacity(bytes.len());
        rotated.push(bytes[bytes.len() - 1]);
        rotated.extend_from_slice(&bytes[..bytes.len() - 1]);
        Some(Record::from(rotated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_right_by_one() {
        let mut stage = Rotator::new();
        assert_eq!(stage.transform(&Record::from("hello")), Some(Record::from("ohell")));
    }

    #[test]
    fn empty_record_is_a_no_op() {
        let mut stage = Rotator::new();
        assert_eq!(stage.transform(&Record::from("")), Some(Record::from("")));
    }

    #[test]
    fn n_applications_restores_the_original() {
        let mut stage = Rotator::new();
        let original = Record::from("abcde");
        let mut current = original.clone();
        for _ in 0..5 {
            current = stage.transform(&current).unwrap();
        }
        assert_eq!(current, original);
    }
}
