//! Loads an opcode description document into an [`OpcodeTable`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::desc::OpcodeDesc;
use crate::table::{MachineCycle, OpcodeDef, OpcodeTable};

/// Errors that can result from loading an opcode description.
#[derive(Debug, Error)]
pub enum LoadError {
    /// An opcode entry has no machine cycles, either because the `mcycles` list is
    /// missing or because it is empty.
    #[error("op '{name}' has no mcycles!")]
    MissingMachineCycles {
        /// Name of the offending opcode.
        name: String,
    },
    /// An opcode entry declares an id that does not fit in a single byte.
    #[error("op '{name}' has id {id}, which is outside of 0..=255")]
    InvalidOpcodeByte {
        /// Name of the offending opcode.
        name: String,
        /// The declared id.
        id: i64,
    },
    /// The document is not valid YAML or does not have the expected shape.
    #[error("Error while parsing opcode description: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The document could not be read.
    #[error("Error while trying to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read the description document at `path` and load it with [`load`].
pub fn load_file(path: impl AsRef<Path>) -> Result<OpcodeTable, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load(&text)
}

/// Parse a description document into an [`OpcodeTable`].
///
/// Entries are processed in document order. Each is stored at the slot for its `id`; if
/// two entries declare the same `id`, the later one replaces the earlier one entirely.
/// The replacement is logged as a warning since it is almost certainly a mistake in the
/// document, but it is not an error.
pub fn load(text: &str) -> Result<OpcodeTable, LoadError> {
    let document: Mapping = serde_yaml::from_str(text)?;
    let mut table = OpcodeTable::new();
    for (key, value) in document {
        let name = entry_name(key)?;
        info!("name {}", name);
        // `NAME:` with nothing under it declares neither an id nor any cycles.
        if value.is_null() {
            return Err(LoadError::MissingMachineCycles { name });
        }
        let desc: OpcodeDesc = serde_yaml::from_value(value)?;
        let def = opcode_def(name, desc)?;
        let new_name = def.name.clone();
        if let Some(old) = table.insert(def) {
            warn!(
                "op '{}' replaces op '{}' at {:02X}; only the later declaration is kept",
                new_name, old.name, old.opcode
            );
        }
    }
    Ok(table)
}

/// Name of an entry. Scalar keys such as `0x10:` are used as written in their canonical
/// form; anything else must deserialize as a string.
fn entry_name(key: Value) -> Result<String, LoadError> {
    match key {
        Value::String(name) => Ok(name),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Ok(serde_yaml::from_value(other)?),
    }
}

/// Validate a single description entry and convert it to an [`OpcodeDef`].
fn opcode_def(name: String, desc: OpcodeDesc) -> Result<OpcodeDef, LoadError> {
    let mcycles = match desc.mcycles {
        Some(mcycles) if !mcycles.is_empty() => mcycles,
        _ => return Err(LoadError::MissingMachineCycles { name }),
    };
    let opcode = match u8::try_from(desc.id) {
        Ok(opcode) => opcode,
        Err(_) => return Err(LoadError::InvalidOpcodeByte { name, id: desc.id }),
    };
    Ok(OpcodeDef {
        name,
        opcode,
        mcycles: mcycles.into_iter().map(MachineCycle::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CycleKind;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const SAMPLE: &str = r#"
NEG_direct:
  id: 0
  mcycles:
    - type: fetch
    - type: generic
      action: "_neg(c, _GD())"
      tcycles: 3
NOP:
  id: 18
  mcycles:
    - type: generic
"#;

    #[test]
    fn loads_entries_into_their_slots() {
        init();
        let table = load(SAMPLE).unwrap();
        assert_eq!(table.defined_count(), 2);

        let neg = table.get(0x00).unwrap();
        assert_eq!(neg.name, "NEG_direct");
        assert_eq!(neg.mcycles.len(), 2);
        assert_eq!(neg.mcycles[0].kind, CycleKind::Fetch);
        assert_eq!(neg.mcycles[1].kind, CycleKind::Generic);
        assert_eq!(neg.mcycles[1].action.as_deref(), Some("_neg(c, _GD())"));
        assert_eq!(neg.mcycles[1].wait_states, 3);

        let nop = table.get(18).unwrap();
        assert_eq!(nop.name, "NOP");
        assert_eq!(nop.mcycles, vec![MachineCycle::generic(None::<String>)]);
    }

    #[test]
    fn missing_mcycles_is_an_error() {
        init();
        let err = load("BROKEN:\n  id: 4\n").unwrap_err();
        assert!(
            matches!(err, LoadError::MissingMachineCycles { ref name } if name == "BROKEN"),
            "{:?}",
            err
        );
    }

    #[test]
    fn null_entry_is_missing_mcycles() {
        init();
        let err = load("GOOD:\n  id: 1\n  mcycles:\n    - type: generic\nBARE:\n").unwrap_err();
        assert!(
            matches!(err, LoadError::MissingMachineCycles { ref name } if name == "BARE"),
            "{:?}",
            err
        );
    }

    #[test]
    fn numeric_keys_become_names() {
        init();
        let doc = concat!(
            "16:\n  id: 16\n  mcycles:\n    - type: generic\n",
            "true:\n  id: 17\n  mcycles:\n    - type: generic\n",
        );
        let table = load(doc).unwrap();
        assert_eq!(table.get(16).unwrap().name, "16");
        assert_eq!(table.get(17).unwrap().name, "true");
    }

    #[test]
    fn sequence_key_is_a_parse_error() {
        init();
        let doc = "? [a, b]\n: {id: 1, mcycles: [{type: generic}]}\n";
        assert!(matches!(load(doc), Err(LoadError::Parse(_))));
    }

    #[test]
    fn empty_mcycles_is_an_error() {
        init();
        let err = load("BROKEN:\n  id: 4\n  mcycles: []\n").unwrap_err();
        assert!(
            matches!(err, LoadError::MissingMachineCycles { .. }),
            "{:?}",
            err
        );
    }

    #[test]
    fn out_of_range_id_is_an_error() {
        init();
        let doc = "BIG:\n  id: 256\n  mcycles:\n    - type: generic\n";
        let err = load(doc).unwrap_err();
        assert!(
            matches!(err, LoadError::InvalidOpcodeByte { id: 256, .. }),
            "{:?}",
            err
        );
    }

    #[test]
    fn negative_tcycles_is_a_parse_error() {
        init();
        let doc = "NEG:\n  id: 1\n  mcycles:\n    - type: generic\n      tcycles: -1\n";
        assert!(matches!(load(doc), Err(LoadError::Parse(_))));
    }

    #[test]
    fn later_duplicate_replaces_earlier_entirely() {
        init();
        let doc = r#"
FIRST:
  id: 7
  mcycles:
    - type: fetch
    - type: generic
      action: "first()"
      tcycles: 5
SECOND:
  id: 7
  mcycles:
    - type: generic
      action: "second()"
"#;
        let table = load(doc).unwrap();
        assert_eq!(table.defined_count(), 1);
        let def = table.get(7).unwrap();
        assert_eq!(def.name, "SECOND");
        assert_eq!(def.mcycles, vec![MachineCycle::generic(Some("second()"))]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        init();
        let doc = "OP:\n  id: 3\n  cycles: 4\n  mcycles:\n    - type: read\n      bus: true\n";
        let table = load(doc).unwrap();
        assert_eq!(table.get(3).unwrap().mcycles[0].kind, CycleKind::Generic);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        init();
        let err = load_file("/nonexistent/cyclegen/desc.yml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "{:?}", err);
    }
}
