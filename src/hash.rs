//! Content fingerprints for comparison results

use crate::classify::DiffFlagSet;
use crate::merge::MergedTable;
use crate::table::{Cell, Value};
use blake3::Hasher;

/// A hash value represented as a hex string
pub type HashValue = String;

/// Hash computer for tables and flag sets
pub struct HashComputer;

impl HashComputer {
    /// Hash the merged columns, every cell and every flag.
    ///
    /// Two runs over the same inputs and plan produce the same fingerprint;
    /// cells are tagged by type so `Int(1)` and `Text("1")` hash apart.
    pub fn fingerprint(merged: &MergedTable, flags: &DiffFlagSet) -> HashValue {
        let mut hasher = Hasher::new();

        for column in merged.table().columns() {
            hasher.update(column.as_bytes());
            hasher.update(b"|");
        }
        hasher.update(b"||");

        for row in merged.rows() {
            for cell in row {
                hasher.update(&encode_cell(cell));
                hasher.update(b"|");
            }
            hasher.update(b"\n");
        }
        hasher.update(b"||");

        for (row, column) in flags.iter() {
            hasher.update(row.to_string().as_bytes());
            hasher.update(b":");
            hasher.update(column.as_bytes());
            hasher.update(b"|");
        }

        hasher.finalize().to_hex().to_string()
    }
}

fn encode_cell(cell: &Cell) -> Vec<u8> {
    match cell {
        None => b"~".to_vec(),
        Some(Value::Bool(b)) => format!("b:{}", b).into_bytes(),
        Some(Value::Int(i)) => format!("i:{}", i).into_bytes(),
        Some(Value::Float(f)) => format!("f:{}", f.0.to_bits()).into_bytes(),
        Some(Value::DateTime(dt)) => format!("d:{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")).into_bytes(),
        Some(Value::Text(s)) => {
            let mut out = format!("t{}:", s.len()).into_bytes();
            out.extend_from_slice(s.as_bytes());
            out
        }
    }
}
