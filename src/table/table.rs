use std::sync::atomic::{AtomicUsize, Ordering};

use log::{info, warn};

use crate::{
    error::{DbError, DbResult},
    index::{IndexBackend, IndexKind},
    storage::{Key, Schema, Tuple},
};

/// Counter for naming tables derived by operators.
static DERIVED_COUNT: AtomicUsize = AtomicUsize::new(0);

/// A relation: schema, insertion-ordered tuple store and one optional
/// primary-key index.
///
/// The backend kind is a whole-table policy fixed at construction; tables
/// produced by operators inherit it. Every stored tuple's derived key
/// resolves in the index to some qualifying row; on key collision the later
/// insert supersedes the mapping while both rows stay in the store.
pub struct Table {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) tuples: Vec<Tuple>,
    pub(crate) index: Option<Box<dyn IndexBackend>>,
    pub(crate) kind: IndexKind,

    /// Key-attribute positions, resolved once. None when the schema cannot
    /// resolve its key (possible on operator-derived schemas).
    pub(crate) key_cols: Option<Vec<usize>>,
}

// constructors
impl Table {
    /// Construct an empty table from raw space-delimited specifications,
    /// indexed by the default backend.
    pub fn new(name: &str, attributes: &str, domains: &str, key: &str) -> DbResult<Table> {
        Self::with_index(name, attributes, domains, key, IndexKind::default())
    }

    /// Construct an empty table from raw specifications with an explicit
    /// backend choice.
    pub fn with_index(
        name: &str,
        attributes: &str,
        domains: &str,
        key: &str,
        kind: IndexKind,
    ) -> DbResult<Table> {
        let schema = Schema::parse(attributes, domains, key)?;
        info!("DDL> create table {} ({})", name, attributes);
        Ok(Self::with_schema(name, schema, kind))
    }

    /// Construct an empty table from a pre-built schema.
    pub fn with_schema(name: &str, schema: Schema, kind: IndexKind) -> Table {
        let key_cols = schema.key_positions();
        Table {
            name: name.to_string(),
            schema,
            tuples: Vec::new(),
            index: kind.make_index(),
            kind,
            key_cols,
        }
    }

    /// Build an operator result: same backend kind as the receiver, index
    /// rebuilt from the rows so derived tables satisfy the same coverage
    /// invariant as tables filled through `insert`.
    pub(crate) fn from_rows(
        name: String,
        schema: Schema,
        kind: IndexKind,
        rows: Vec<Tuple>,
    ) -> Table {
        let key_cols = schema.key_positions();
        let mut index = kind.make_index();
        if let Some(index) = index.as_mut() {
            match &key_cols {
                Some(cols) => {
                    for tuple in &rows {
                        index.put(Key::derive(tuple, cols), tuple.clone());
                    }
                }
                None => warn!(
                    "table {}: key does not resolve, leaving the index unpopulated",
                    name
                ),
            }
        }
        Table {
            name,
            schema,
            tuples: rows,
            index,
            kind,
            key_cols,
        }
    }

    pub(crate) fn derived_name(&self) -> String {
        format!("{}{}", self.name, DERIVED_COUNT.fetch_add(1, Ordering::Relaxed))
    }
}

// queries
impl Table {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn rows_count(&self) -> usize {
        self.tuples.len()
    }

    pub fn index_kind(&self) -> IndexKind {
        self.kind
    }

    /// Column position for the given attribute name, or -1 when absent.
    pub fn col(&self, attr: &str) -> i32 {
        match self.schema.position(attr) {
            Some(pos) => pos as i32,
            None => -1,
        }
    }

    /// Derive the primary key of a row of this table. None when the schema
    /// cannot resolve its key attributes.
    pub fn derive_key(&self, tuple: &Tuple) -> Option<Key> {
        self.key_cols.as_ref().map(|cols| Key::derive(tuple, cols))
    }
}

// data manipulation
impl Table {
    /// Insert a tuple: append to the store, derive the key and upsert it
    /// into the index (last write wins on key collision). Returns whether
    /// the tuple was accepted.
    pub fn insert(&mut self, tuple: Tuple) -> bool {
        info!("DML> insert into {} values ( {} )", self.name, tuple);

        if let Err(err) = self.type_check(&tuple) {
            warn!("insert into {} rejected: {}", self.name, err);
            return false;
        }

        if let (Some(index), Some(cols)) = (self.index.as_mut(), self.key_cols.as_ref()) {
            index.put(Key::derive(&tuple, cols), tuple.clone());
        }
        self.tuples.push(tuple);
        true
    }

    /// Check arity and the domain of every cell against the schema.
    fn type_check(&self, tuple: &Tuple) -> DbResult<()> {
        if tuple.arity() != self.schema.arity() {
            return Err(DbError::new(&format!(
                "tuple arity {} does not match schema arity {}",
                tuple.arity(),
                self.schema.arity()
            )));
        }
        for (pos, field) in self.schema.fields().iter().enumerate() {
            let cell = tuple.get_cell(pos);
            if cell.domain() != field.domain {
                return Err(DbError::new(&format!(
                    "attribute {} expects {}, got {}",
                    field.name,
                    field.domain,
                    cell.domain()
                )));
            }
        }
        Ok(())
    }
}
