/*!

Reads the binary grammar file described in the runtime interface: a little-endian,
table-of-contents-based format carrying the type hierarchy, attribute table, and per-type
constraint dags the rest of the core runs against. This is the one place fatal, structured
errors are raised — a corrupted file, a bad magic number or version, a TOC entry or dag arc
pointing out of bounds — everywhere else in the core, failure is a value (`UnifyFailure` and
friends), not an `Error`.

*/

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

use crate::abstractions::{HashMap, IString};
use crate::core::attrs::{AttrId, AttributeTable};
use crate::core::graph::node::NodeId;
use crate::core::types::bitcode::Bitcode;
use crate::core::types::hierarchy::TypeHierarchyBuilder;
use crate::core::types::{TypeHierarchy, TypeId};
use crate::core::unify::engine::Engine;
use crate::core::unify::quick_check::QcTree;

pub const MAGIC: u32 = 0x0342_2711;
pub const VERSION: u32 = 16;

const TAG_SYMTAB: u32 = 0x5359_4d54;
const TAG_HIERARCHY: u32 = 0x4849_4552;
const TAG_FEATTABS: u32 = 0x4645_4154;
const TAG_SUPERTYPES: u32 = 0x5355_5052;
const TAG_CONSTRAINTS: u32 = 0x434f_4e53;
const TAG_PRINTNAMES: u32 = 0x5052_4e54;
const TAG_QCPATHS: u32 = 0x5143_5054;

const KNOWN_TAGS: [u32; 7] =
  [TAG_SYMTAB, TAG_HIERARCHY, TAG_FEATTABS, TAG_SUPERTYPES, TAG_CONSTRAINTS, TAG_PRINTNAMES, TAG_QCPATHS];

pub enum GrammarLoadError {
  Truncated { offset: usize, needed: usize, available: usize },
  BadMagic { offset: usize, found: u32 },
  BadVersion { offset: usize, found: u32 },
  TocEntryOutOfBounds { offset: usize, section_tag: u32, target: usize, file_len: usize },
  UnknownSection { offset: usize, tag: u32 },
  MissingSection { tag: u32 },
  NodeIndexOutOfRange { offset: usize, index: u32, node_count: usize },
  TypeIndexOutOfRange { offset: usize, index: u32, type_count: usize },
}

impl Display for GrammarLoadError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      GrammarLoadError::Truncated { offset, needed, available } => write!(
        f,
        "grammar file truncated at byte offset {offset}: needed {needed} more bytes, only {available} available"
      ),
      GrammarLoadError::BadMagic { offset, found } => write!(
        f,
        "bad magic number at byte offset {offset}: expected {MAGIC:#x}, found {found:#x}"
      ),
      GrammarLoadError::BadVersion { offset, found } => write!(
        f,
        "unsupported grammar file version at byte offset {offset}: expected {VERSION}, found {found}"
      ),
      GrammarLoadError::TocEntryOutOfBounds { offset, section_tag, target, file_len } => write!(
        f,
        "table-of-contents entry for section {section_tag:#x} at byte offset {offset} points to {target}, past end of file ({file_len} bytes)"
      ),
      GrammarLoadError::UnknownSection { offset, tag } => {
        write!(f, "unknown section tag {tag:#x} in table of contents at byte offset {offset}")
      }
      GrammarLoadError::MissingSection { tag } => {
        write!(f, "grammar file is missing required section {tag:#x}")
      }
      GrammarLoadError::NodeIndexOutOfRange { offset, index, node_count } => write!(
        f,
        "dag dump at byte offset {offset} references node index {index}, but only {node_count} nodes have been read so far"
      ),
      GrammarLoadError::TypeIndexOutOfRange { offset, index, type_count } => write!(
        f,
        "section at byte offset {offset} references type index {index}, but only {type_count} types are declared"
      ),
    }
  }
}

impl Debug for GrammarLoadError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

impl Error for GrammarLoadError {}

/// A cursor over the grammar file's bytes. Every read checks bounds and reports the byte
/// offset of the failure, per the error-handling design.
struct ByteReader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> ByteReader<'a> {
  fn new(bytes: &'a [u8]) -> Self {
    ByteReader { bytes, pos: 0 }
  }

  fn require(&self, needed: usize) -> Result<(), GrammarLoadError> {
    if self.pos + needed > self.bytes.len() {
      Err(GrammarLoadError::Truncated {
        offset: self.pos,
        needed,
        available: self.bytes.len().saturating_sub(self.pos),
      })
    } else {
      Ok(())
    }
  }

  fn read_u8(&mut self) -> Result<u8, GrammarLoadError> {
    self.require(1)?;
    let b = self.bytes[self.pos];
    self.pos += 1;
    Ok(b)
  }

  fn read_u32(&mut self) -> Result<u32, GrammarLoadError> {
    self.require(4)?;
    let bytes = [self.bytes[self.pos], self.bytes[self.pos + 1], self.bytes[self.pos + 2], self.bytes[self.pos + 3]];
    self.pos += 4;
    Ok(u32::from_le_bytes(bytes))
  }

  fn read_i32(&mut self) -> Result<i32, GrammarLoadError> {
    Ok(self.read_u32()? as i32)
  }

  fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], GrammarLoadError> {
    self.require(len)?;
    let slice = &self.bytes[self.pos..self.pos + len];
    self.pos += len;
    Ok(slice)
  }

  /// A length-prefixed (`u32`) UTF-8 string, lossily decoded (grammar files may carry
  /// print names outside strict UTF-8; lossy decoding keeps the loader from failing on them).
  fn read_string(&mut self) -> Result<IString, GrammarLoadError> {
    let len = self.read_u32()? as usize;
    let bytes = self.read_bytes(len)?;
    Ok(IString::from(String::from_utf8_lossy(bytes).as_ref()))
  }
}

struct TocEntry {
  tag: u32,
  offset: u32,
}

fn read_header(reader: &mut ByteReader) -> Result<IString, GrammarLoadError> {
  let magic_offset = reader.pos;
  let magic = reader.read_u32()?;
  if magic != MAGIC {
    return Err(GrammarLoadError::BadMagic { offset: magic_offset, found: magic });
  }
  let version_offset = reader.pos;
  let version = reader.read_u32()?;
  if version != VERSION {
    return Err(GrammarLoadError::BadVersion { offset: version_offset, found: version });
  }
  reader.read_string()
}

fn read_toc(reader: &mut ByteReader, file_len: usize) -> Result<Vec<TocEntry>, GrammarLoadError> {
  let mut entries = Vec::new();
  loop {
    let entry_offset = reader.pos;
    let tag = reader.read_u32()?;
    if tag == 0 {
      break;
    }
    let offset = reader.read_u32()?;
    if offset as usize > file_len {
      return Err(GrammarLoadError::TocEntryOutOfBounds {
        offset: entry_offset,
        section_tag: tag,
        target: offset as usize,
        file_len,
      });
    }
    entries.push(TocEntry { tag, offset });
  }
  Ok(entries)
}

/// Reads a depth-first, post-order dag dump: `nodeCount`, then that many `(type, narcs)`
/// records each followed by `narcs` `(attr, childIndex)` pairs. `childIndex` refers to an
/// already-emitted node in this same dump (post-order guarantees children precede parents). A
/// negative `type` marks an unexpanded node; its absolute value is still the type code. Returns
/// every node allocated, in dump order; the dump's root is always the last entry.
fn read_dag_dump(reader: &mut ByteReader, engine: &mut Engine) -> Result<Vec<NodeId>, GrammarLoadError> {
  let node_count = reader.read_u32()? as usize;
  let mut nodes: Vec<NodeId> = Vec::with_capacity(node_count);

  for _ in 0..node_count {
    let raw_type = reader.read_i32()?;
    let type_code = raw_type.unsigned_abs() as TypeId;
    let narcs = reader.read_u32()? as usize;

    let node_id = engine.alloc_permanent_node(type_code);
    for _ in 0..narcs {
      let arc_offset = reader.pos;
      let attr = reader.read_u32()? as AttrId;
      let child_index = reader.read_u32()?;
      if child_index as usize >= nodes.len() {
        return Err(GrammarLoadError::NodeIndexOutOfRange {
          offset: arc_offset,
          index: child_index,
          node_count: nodes.len(),
        });
      }
      engine.add_permanent_arc(node_id, attr, nodes[child_index as usize]);
    }
    nodes.push(node_id);
  }

  Ok(nodes)
}

/// The raw type-name tables read from `SYMTAB`, before `HIERARCHY`'s bitcodes are available to
/// actually construct proper-type entries.
struct SymtabData {
  proper: Vec<(IString, u8)>,
  leaves: Vec<(IString, u8, TypeId)>,
  attr_names: Vec<IString>,
}

/// `SYMTAB`: per-status type name arrays, the leaf/proper split, and the attribute count and
/// names. Populates the attribute table's names; attribute appropriateness (`appType`/
/// `maxApp`) is filled in by `FEATTABS`. Proper-type bitcodes live in `HIERARCHY`, read
/// separately and threaded into the builder by the caller once both sections are in hand.
fn read_symtab(reader: &mut ByteReader) -> Result<SymtabData, GrammarLoadError> {
  let proper_count = reader.read_u32()? as usize;
  let leaf_count = reader.read_u32()? as usize;
  let attr_count = reader.read_u32()? as usize;

  let mut proper = Vec::with_capacity(proper_count);
  for _ in 0..proper_count {
    let name = reader.read_string()?;
    let status = reader.read_u8()?;
    proper.push((name, status));
  }
  let mut leaves = Vec::with_capacity(leaf_count);
  for _ in 0..leaf_count {
    let name = reader.read_string()?;
    let status = reader.read_u8()?;
    let parent = reader.read_i32()?;
    leaves.push((name, status, parent));
  }

  let mut attr_names = Vec::with_capacity(attr_count);
  for _ in 0..attr_count {
    attr_names.push(reader.read_string()?);
  }

  Ok(SymtabData { proper, leaves, attr_names })
}

/// `HIERARCHY`: bitcode width followed by each proper type's bitcode, run-length encoded as
/// alternating (zero-run, one-run) lengths terminated by a zero pair.
fn read_hierarchy_bitcodes(reader: &mut ByteReader, proper_count: usize) -> Result<Vec<Bitcode>, GrammarLoadError> {
  let width = reader.read_u32()? as usize;
  let mut bitcodes = Vec::with_capacity(proper_count);
  for _ in 0..proper_count {
    let mut bitcode = Bitcode::with_capacity(width);
    let mut position = 0usize;
    loop {
      let zeros = reader.read_u32()? as usize;
      let ones = reader.read_u32()? as usize;
      position += zeros;
      for bit in position..position + ones {
        bitcode.set(bit);
      }
      position += ones;
      if zeros == 0 && ones == 0 {
        break;
      }
    }
    bitcodes.push(bitcode);
  }
  Ok(bitcodes)
}

/// `SUPERTYPES`: for each proper type, the count and indices of its immediate supertypes as the
/// grammar compiler computed them. The hierarchy's own `immediate_supertypes` is derived
/// entirely from bitcode containment at load time, so this section is read only as a
/// cross-check (bounds-validated, not wired into `TypeHierarchy`) rather than an independent
/// source of truth — the bitcodes and this list must already agree if the file was compiled
/// correctly, and re-deriving avoids ever letting the two sources of supertypes diverge.
fn read_supertypes(reader: &mut ByteReader, proper_count: usize) -> Result<(), GrammarLoadError> {
  for _ in 0..proper_count {
    let n = reader.read_u32()? as usize;
    for _ in 0..n {
      let offset = reader.pos;
      let parent = reader.read_u32()?;
      if parent as usize >= proper_count {
        return Err(GrammarLoadError::TypeIndexOutOfRange { offset, index: parent, type_count: proper_count });
      }
    }
  }
  Ok(())
}

/// `FEATTABS`: for each attribute, its introducing type and maximal appropriate type.
fn read_feattabs(
  reader: &mut ByteReader,
  attr_names: Vec<IString>,
  type_count: usize,
) -> Result<AttributeTable, GrammarLoadError> {
  let mut table = AttributeTable::with_capacity(attr_names.len());
  for name in attr_names {
    let offset = reader.pos;
    let introducing = reader.read_i32()?;
    let max_app = reader.read_i32()?;
    if introducing >= type_count as i32 || max_app >= type_count as i32 {
      return Err(GrammarLoadError::TypeIndexOutOfRange {
        offset,
        index: introducing.max(max_app) as u32,
        type_count,
      });
    }
    table.declare(name, introducing, max_app);
  }
  Ok(table)
}

/// The result of a successful grammar load: a populated type hierarchy, attribute table, the
/// engine carrying both plus the permanent constraint dags registered against it, and an
/// optional quick-check path tree.
pub struct LoadedGrammar {
  pub engine: Engine,
  pub qc_tree: Option<QcTree>,
}

pub fn load_grammar(bytes: &[u8], config: crate::core::unify::EngineConfig) -> Result<LoadedGrammar, GrammarLoadError> {
  let mut reader = ByteReader::new(bytes);
  let _description = read_header(&mut reader)?;
  let toc = read_toc(&mut reader, bytes.len())?;

  let mut sections: HashMap<u32, u32> = HashMap::new();
  for entry in &toc {
    if !KNOWN_TAGS.contains(&entry.tag) {
      return Err(GrammarLoadError::UnknownSection { offset: entry.offset as usize, tag: entry.tag });
    }
    sections.insert(entry.tag, entry.offset);
  }

  let symtab_offset = *sections.get(&TAG_SYMTAB).ok_or(GrammarLoadError::MissingSection { tag: TAG_SYMTAB })?;
  let mut symtab_reader = ByteReader::new(bytes);
  symtab_reader.pos = symtab_offset as usize;
  let symtab = read_symtab(&mut symtab_reader)?;
  let proper_count = symtab.proper.len();

  let bitcodes = if let Some(&hierarchy_offset) = sections.get(&TAG_HIERARCHY) {
    let mut hierarchy_reader = ByteReader::new(bytes);
    hierarchy_reader.pos = hierarchy_offset as usize;
    read_hierarchy_bitcodes(&mut hierarchy_reader, proper_count)?
  } else {
    // No HIERARCHY section: every proper type gets an empty bitcode, collapsing the whole
    // proper-type lattice to a single undifferentiated level. Only usable for grammars with
    // no proper-type hierarchy at all (e.g. test fixtures).
    (0..proper_count).map(|_| Bitcode::with_capacity(proper_count)).collect()
  };

  let mut builder = TypeHierarchyBuilder::new();
  for ((name, status), bitcode) in symtab.proper.into_iter().zip(bitcodes.into_iter()) {
    builder.push_proper(name.clone(), name, status, bitcode);
  }
  for (name, status, parent) in symtab.leaves {
    builder.push_static_leaf(name.clone(), name, status, parent);
  }

  if let Some(&supertypes_offset) = sections.get(&TAG_SUPERTYPES) {
    let mut supertypes_reader = ByteReader::new(bytes);
    supertypes_reader.pos = supertypes_offset as usize;
    read_supertypes(&mut supertypes_reader, proper_count)?;
  }

  // `TOP` is always proper type 0, `STRING` the first static leaf type, matching the loader's
  // declaration order above.
  let top: TypeId = 0;
  let string_type: TypeId = proper_count as TypeId;
  let hierarchy: TypeHierarchy = builder.build(top, string_type);

  let type_count = hierarchy.proper_type_count() + symtab.attr_names.len();
  let attrs = if let Some(&feattabs_offset) = sections.get(&TAG_FEATTABS) {
    let mut feattabs_reader = ByteReader::new(bytes);
    feattabs_reader.pos = feattabs_offset as usize;
    read_feattabs(&mut feattabs_reader, symtab.attr_names, type_count)?
  } else {
    AttributeTable::with_capacity(0)
  };

  let mut engine = Engine::new(hierarchy, attrs, config);

  if let Some(&constraints_offset) = sections.get(&TAG_CONSTRAINTS) {
    let mut constraints_reader = ByteReader::new(bytes);
    constraints_reader.pos = constraints_offset as usize;
    let type_with_constraint_count = constraints_reader.read_u32()? as usize;
    for _ in 0..type_with_constraint_count {
      let t = constraints_reader.read_i32()?;
      let nodes = read_dag_dump(&mut constraints_reader, &mut engine)?;
      if let Some(&root) = nodes.last() {
        engine.register_constraint(t, root);
      }
    }
  }

  let qc_tree = if let Some(&qc_offset) = sections.get(&TAG_QCPATHS) {
    let mut qc_reader = ByteReader::new(bytes);
    qc_reader.pos = qc_offset as usize;
    Some(read_qc_tree(&mut qc_reader)?)
  } else {
    None
  };

  Ok(LoadedGrammar { engine, qc_tree })
}

/// The quick-check path file: a small dag whose distinguished leaves carry a 1-based qc vector
/// position as their (otherwise-unused) type code.
fn read_qc_tree(reader: &mut ByteReader) -> Result<QcTree, GrammarLoadError> {
  let path_count = reader.read_u32()? as usize;
  let mut tree = QcTree::new();
  for _ in 0..path_count {
    let position = reader.read_u32()? as usize;
    let path_len = reader.read_u32()? as usize;
    let mut path = Vec::with_capacity(path_len);
    for _ in 0..path_len {
      path.push(reader.read_u32()? as AttrId);
    }
    tree.insert(&path, position.saturating_sub(1));
  }
  Ok(tree)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_bad_magic() {
    let bytes = 0xDEAD_BEEFu32.to_le_bytes();
    let mut reader = ByteReader::new(&bytes);
    let result = read_header(&mut reader);
    assert!(matches!(result, Err(GrammarLoadError::BadMagic { .. })));
  }

  #[test]
  fn rejects_truncated_header() {
    let bytes = MAGIC.to_le_bytes()[..2].to_vec();
    let mut reader = ByteReader::new(&bytes);
    let result = read_header(&mut reader);
    assert!(matches!(result, Err(GrammarLoadError::Truncated { .. })));
  }

  #[test]
  fn rejects_toc_entry_past_eof() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&TAG_SYMTAB.to_le_bytes());
    bytes.extend_from_slice(&1_000_000u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    let mut reader = ByteReader::new(&bytes);
    let result = read_toc(&mut reader, bytes.len());
    assert!(matches!(result, Err(GrammarLoadError::TocEntryOutOfBounds { .. })));
  }

  #[test]
  fn reads_a_small_dag_dump() {
    use crate::core::attrs::AttributeTable;
    use crate::core::types::bitcode::Bitcode;
    use crate::core::types::hierarchy::TypeHierarchyBuilder;
    use crate::core::unify::EngineConfig;

    let mut builder = TypeHierarchyBuilder::new();
    let mut bits = Bitcode::with_capacity(1);
    bits.set(0);
    let top = builder.push_proper(IString::from("TOP"), IString::from("TOP"), 0, bits);
    let hierarchy = builder.build(top, top);
    let mut engine = Engine::new(hierarchy, AttributeTable::with_capacity(0), EngineConfig::default());

    // Two nodes: a leaf (index 0), then a parent with one arc `0 -> leaf`.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u32.to_le_bytes()); // node count
    bytes.extend_from_slice(&0i32.to_le_bytes()); // node 0: type TOP, no arcs
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0i32.to_le_bytes()); // node 1: type TOP, one arc
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&7u32.to_le_bytes()); // attr 7
    bytes.extend_from_slice(&0u32.to_le_bytes()); // -> node 0

    let mut reader = ByteReader::new(&bytes);
    let nodes = read_dag_dump(&mut reader, &mut engine).unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(engine.find_arc(nodes[1], 7), Some(nodes[0]));
  }

  fn push_string(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
  }

  /// `TOP` (bits {0,1}) and `U` (bit {1}, so `U <= TOP`) as a minimal two-section file, to
  /// confirm `HIERARCHY`'s real bitcodes actually reach the built hierarchy rather than the
  /// empty placeholders `read_symtab` reserves.
  #[test]
  fn load_grammar_threads_real_bitcodes() {
    use crate::core::unify::EngineConfig;

    let header_len = 4 + 4 + 4; // magic + version + empty description
    let toc_len = 2 * 8 + 4; // two entries + terminator
    let symtab_offset = header_len + toc_len;

    let mut symtab = Vec::new();
    symtab.extend_from_slice(&2u32.to_le_bytes()); // proper_count
    symtab.extend_from_slice(&0u32.to_le_bytes()); // leaf_count
    symtab.extend_from_slice(&0u32.to_le_bytes()); // attr_count
    push_string(&mut symtab, "TOP");
    symtab.push(0); // status
    push_string(&mut symtab, "U");
    symtab.push(0);

    let hierarchy_offset = symtab_offset + symtab.len();

    let mut hierarchy = Vec::new();
    hierarchy.extend_from_slice(&2u32.to_le_bytes()); // width
    hierarchy.extend_from_slice(&0u32.to_le_bytes()); // TOP: 0 zeros, 2 ones
    hierarchy.extend_from_slice(&2u32.to_le_bytes());
    hierarchy.extend_from_slice(&0u32.to_le_bytes()); // terminator
    hierarchy.extend_from_slice(&0u32.to_le_bytes());
    hierarchy.extend_from_slice(&1u32.to_le_bytes()); // U: 1 zero, 1 one
    hierarchy.extend_from_slice(&1u32.to_le_bytes());
    hierarchy.extend_from_slice(&0u32.to_le_bytes()); // terminator
    hierarchy.extend_from_slice(&0u32.to_le_bytes());

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&MAGIC.to_le_bytes());
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes()); // empty description
    bytes.extend_from_slice(&TAG_SYMTAB.to_le_bytes());
    bytes.extend_from_slice(&(symtab_offset as u32).to_le_bytes());
    bytes.extend_from_slice(&TAG_HIERARCHY.to_le_bytes());
    bytes.extend_from_slice(&(hierarchy_offset as u32).to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes()); // TOC terminator
    bytes.extend_from_slice(&symtab);
    bytes.extend_from_slice(&hierarchy);

    let loaded = load_grammar(&bytes, EngineConfig::default()).unwrap();
    let hierarchy = loaded.engine.hierarchy();
    assert_eq!(hierarchy.proper_type_count(), 2);
    assert!(hierarchy.subtype(1, 0)); // U <= TOP, only true if U's real bitcode was threaded in
    assert!(!hierarchy.subtype(0, 1)); // TOP is not a subtype of U
    assert!(loaded.qc_tree.is_none());
  }

  #[test]
  fn rejects_unrecognized_toc_tag() {
    use crate::core::unify::EngineConfig;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&MAGIC.to_le_bytes());
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    let result = load_grammar(&bytes, EngineConfig::default());
    assert!(matches!(result, Err(GrammarLoadError::UnknownSection { .. })));
  }
}
