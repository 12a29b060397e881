/*!

Attributes ("features") are small non-negative integers. The grammar records, per attribute,
the **introducing type** (the most general type that has this feature) and the **maximal
appropriate type** (the type found at the end of that arc in the introducing type's dag) — the
two facts appropriateness checking and well-formedness expansion need.

*/

use crate::abstractions::IString;
use crate::core::types::TypeId;

pub type AttrId = u32;

#[derive(Clone, Debug, Default)]
pub struct AttributeTable {
  names   : Vec<IString>,
  app_type: Vec<TypeId>,
  max_app : Vec<TypeId>,
}

impl AttributeTable {
  pub fn with_capacity(capacity: usize) -> Self {
    AttributeTable {
      names   : Vec::with_capacity(capacity),
      app_type: Vec::with_capacity(capacity),
      max_app : Vec::with_capacity(capacity),
    }
  }

  /// Registers a new attribute, returning its id.
  pub fn declare(&mut self, name: IString, introducing_type: TypeId, maximal_appropriate_type: TypeId) -> AttrId {
    self.names.push(name);
    self.app_type.push(introducing_type);
    self.max_app.push(maximal_appropriate_type);
    (self.names.len() - 1) as AttrId
  }

  #[inline(always)]
  pub fn name(&self, attr: AttrId) -> &IString {
    &self.names[attr as usize]
  }

  #[inline(always)]
  pub fn introducing_type(&self, attr: AttrId) -> TypeId {
    self.app_type[attr as usize]
  }

  #[inline(always)]
  pub fn maximal_appropriate_type(&self, attr: AttrId) -> TypeId {
    self.max_app[attr as usize]
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn declare_and_lookup() {
    let mut table = AttributeTable::with_capacity(2);
    let f = table.declare(IString::from("F"), 0, 1);
    assert_eq!(table.introducing_type(f), 0);
    assert_eq!(table.maximal_appropriate_type(f), 1);
    assert_eq!(table.name(f).as_ref(), "F");
  }
}
