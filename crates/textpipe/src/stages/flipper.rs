//! Reverses the byte order of every payload record.

use crate::record::Record;
use crate::stage::Transform;

pub struct Flipper;

impl Transform for Flipper {
    fn name(&self) -> &str {
        "flipper"
    }

    fn transform(&mut self, input: &Record) -> Option<Record> {
        let mut bytes = input.as_bytes().to_vec();
        bytes.reverse();
        Some(Record::from(bytes))
    }
}
