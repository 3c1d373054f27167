//! Upper-cases every payload record. ASCII and non-ASCII UTF-8 alike go
//! through `str::to_uppercase`, which does the right thing for both.

use crate::record::Record;
use crate::stage::Transform;

pub struct Uppercaser;

impl Transform for Uppercaser {
    fn name(&self) -> &str {
        "uppercaser"
    }

    fn transform(&mut self, input: &Record) -> Option<Record> {
        Some(Record::from(input.as_str_lossy().to_uppercase()))
    }
}
