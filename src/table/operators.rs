//! The relational algebra. Every operator reads its inputs, never mutates
//! them, and materializes a fresh table carrying the receiver's backend
//! kind. Failures (incompatible schemas, unknown attributes, mismatched join
//! lists) come back as errors the caller must check.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::info;

use crate::{
    error::{DbError, DbResult},
    storage::{Cell, Field, Key, Schema, Tuple},
    table::Table,
};

impl Table {
    /// Project onto the given space-delimited attributes.
    ///
    /// With an index present, each stored tuple's key is re-derived and the
    /// projected values are read from the index-resolved row, so rows whose
    /// key was superseded project the superseding values. Without an index
    /// the in-hand tuple is read directly.
    pub fn project(&self, attributes: &str) -> DbResult<Table> {
        info!("RA> {}.project ({})", self.name, attributes);

        let columns: Vec<&str> = attributes.split_whitespace().collect();
        let positions = self.schema.positions_of(&columns)?;
        let schema = self.schema.project(&columns)?;

        let mut rows = Vec::with_capacity(self.tuples.len());
        match (self.index.as_deref(), self.key_cols.as_ref()) {
            (Some(index), Some(cols)) => {
                for tuple in &self.tuples {
                    let key = Key::derive(tuple, cols);
                    let hit = index.get(&key).ok_or_else(|| {
                        DbError::new(&format!("index of {} misses key {}", self.name, key))
                    })?;
                    rows.push(Tuple::from_cells(hit.extract(&positions)));
                }
            }
            _ => {
                for tuple in &self.tuples {
                    rows.push(Tuple::from_cells(tuple.extract(&positions)));
                }
            }
        }

        Ok(Table::from_rows(self.derived_name(), schema, self.kind, rows))
    }

    /// Keep every row satisfying the predicate. Linear scan, identical
    /// schema.
    pub fn select<P>(&self, predicate: P) -> Table
    where
        P: Fn(&Tuple) -> bool,
    {
        info!("RA> {}.select (<predicate>)", self.name);

        let rows = self
            .tuples
            .iter()
            .filter(|tuple| predicate(tuple))
            .cloned()
            .collect();
        Table::from_rows(self.derived_name(), self.schema.clone(), self.kind, rows)
    }

    /// Point select: the rows whose primary key equals `key` (zero or one
    /// through the index). An absent key yields an empty table, never an
    /// error. Tables without an index compare the key-attribute cells of
    /// every row instead.
    pub fn select_key(&self, key: &Key) -> Table {
        info!("RA> {}.select ({})", self.name, key);

        let rows = match self.index.as_deref() {
            Some(index) => index.get(key).cloned().into_iter().collect(),
            None => self.scan_key(key),
        };
        Table::from_rows(self.derived_name(), self.schema.clone(), self.kind, rows)
    }

    fn scan_key(&self, key: &Key) -> Vec<Tuple> {
        match self.key_cols.as_ref() {
            Some(cols) => self
                .tuples
                .iter()
                .filter(|tuple| &Key::derive(tuple, cols) == key)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Set union with `other`: the value-deduplicated rows of both tables.
    /// Requires positional domain compatibility.
    pub fn union(&self, other: &Table) -> DbResult<Table> {
        info!("RA> {}.union ({})", self.name, other.name);
        self.schema.compatible(&other.schema)?;

        let mut rows: Vec<Tuple> = Vec::new();
        let mut seen: HashSet<&Tuple> = HashSet::new();
        for tuple in self.tuples.iter().chain(other.tuples.iter()) {
            if seen.insert(tuple) {
                rows.push(tuple.clone());
            }
        }
        Ok(Table::from_rows(
            self.derived_name(),
            self.schema.clone(),
            self.kind,
            rows,
        ))
    }

    /// Set difference: every row of this table with no value-equal
    /// counterpart in `other`. Requires positional domain compatibility.
    pub fn minus(&self, other: &Table) -> DbResult<Table> {
        info!("RA> {}.minus ({})", self.name, other.name);
        self.schema.compatible(&other.schema)?;

        let exclude: HashSet<&Tuple> = other.tuples.iter().collect();
        let rows = self
            .tuples
            .iter()
            .filter(|tuple| !exclude.contains(tuple))
            .cloned()
            .collect();
        Ok(Table::from_rows(
            self.derived_name(),
            self.schema.clone(),
            self.kind,
            rows,
        ))
    }

    /// Equi-join: every Cartesian pair whose `attributes1` values equal the
    /// `attributes2` values, concatenated left then right. Nested loop.
    ///
    /// Where an `attributes1` name collides with an attribute of `other`,
    /// the left copy of the name gets a "2" suffix; the result key is this
    /// table's key, unchanged.
    pub fn equi_join(&self, attributes1: &str, attributes2: &str, other: &Table) -> DbResult<Table> {
        info!(
            "RA> {}.join ({}, {}, {})",
            self.name, attributes1, attributes2, other.name
        );

        let (cols1, cols2) = self.join_columns(attributes1, attributes2, other)?;
        let rows = self
            .tuples
            .iter()
            .cartesian_product(other.tuples.iter())
            .filter(|(t1, t2)| t1.extract(&cols1) == t2.extract(&cols2))
            .map(|(t1, t2)| t1.concat(t2))
            .collect();

        let attrs1: Vec<&str> = attributes1.split_whitespace().collect();
        Ok(Table::from_rows(
            self.derived_name(),
            self.join_schema(&attrs1, other),
            self.kind,
            rows,
        ))
    }

    /// Equi-join through index point lookups on `other`: when `attributes2`
    /// is exactly `other`'s key and `other` carries an index, each left row
    /// probes the index instead of scanning. Falls back to the nested loop
    /// otherwise. Output matches [`Table::equi_join`].
    pub fn i_join(&self, attributes1: &str, attributes2: &str, other: &Table) -> DbResult<Table> {
        let attrs2: Vec<&str> = attributes2.split_whitespace().collect();
        let probes_key = attrs2.iter().copied().eq(other.schema.key().iter().map(|k| k.as_str()));
        let index = match other.index.as_deref() {
            Some(index) if probes_key => index,
            _ => return self.equi_join(attributes1, attributes2, other),
        };

        info!(
            "RA> {}.i_join ({}, {}, {})",
            self.name, attributes1, attributes2, other.name
        );

        let (cols1, _) = self.join_columns(attributes1, attributes2, other)?;
        let rows = self
            .tuples
            .iter()
            .filter_map(|t1| {
                let probe = Key::new(t1.extract(&cols1));
                index.get(&probe).map(|t2| t1.concat(t2))
            })
            .collect();

        let attrs1: Vec<&str> = attributes1.split_whitespace().collect();
        Ok(Table::from_rows(
            self.derived_name(),
            self.join_schema(&attrs1, other),
            self.kind,
            rows,
        ))
    }

    /// Equi-join through a hash table over `other`'s join columns, probed
    /// with this table's rows in store order so the emitted rows match
    /// [`Table::equi_join`].
    pub fn h_join(&self, attributes1: &str, attributes2: &str, other: &Table) -> DbResult<Table> {
        info!(
            "RA> {}.h_join ({}, {}, {})",
            self.name, attributes1, attributes2, other.name
        );

        let (cols1, cols2) = self.join_columns(attributes1, attributes2, other)?;

        let mut built: HashMap<Vec<Cell>, Vec<&Tuple>> = HashMap::new();
        for t2 in &other.tuples {
            built.entry(t2.extract(&cols2)).or_default().push(t2);
        }

        let mut rows = Vec::new();
        for t1 in &self.tuples {
            if let Some(matches) = built.get(&t1.extract(&cols1)) {
                for t2 in matches {
                    rows.push(t1.concat(t2));
                }
            }
        }

        let attrs1: Vec<&str> = attributes1.split_whitespace().collect();
        Ok(Table::from_rows(
            self.derived_name(),
            self.join_schema(&attrs1, other),
            self.kind,
            rows,
        ))
    }

    /// Natural join: equality over every attribute name common to both
    /// schemas (in the order they occur in `other`), duplicate columns
    /// removed, first occurrence wins.
    ///
    /// With no common attribute the result degenerates to the unfiltered
    /// Cartesian product; that quirk is part of the contract and covered by
    /// tests, do not "fix" it to an empty result.
    pub fn natural_join(&self, other: &Table) -> DbResult<Table> {
        info!("RA> {}.join ({})", self.name, other.name);

        let common: Vec<&str> = other
            .schema
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .filter(|name| self.schema.has_attribute(name))
            .collect();
        let keep2: Vec<usize> = other
            .schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| !self.schema.has_attribute(&f.name))
            .map(|(pos, _)| pos)
            .collect();

        let cols1 = self.schema.positions_of(&common)?;
        let cols2 = other.schema.positions_of(&common)?;

        let rows: Vec<Tuple> = self
            .tuples
            .iter()
            .cartesian_product(other.tuples.iter())
            .filter(|(t1, t2)| {
                common.is_empty() || t1.extract(&cols1) == t2.extract(&cols2)
            })
            .map(|(t1, t2)| {
                let mut cells = t1.cells().to_vec();
                cells.extend(t2.extract(&keep2));
                Tuple::from_cells(cells)
            })
            .collect();

        let mut fields = self.schema.fields().to_vec();
        fields.extend(keep2.iter().map(|&p| other.schema.fields()[p].clone()));
        let key = if self
            .schema
            .key()
            .iter()
            .all(|k| fields.iter().any(|f| &f.name == k))
        {
            self.schema.key().to_vec()
        } else {
            fields.iter().map(|f| f.name.clone()).collect()
        };

        Ok(Table::from_rows(
            self.derived_name(),
            Schema::new(fields, key),
            self.kind,
            rows,
        ))
    }

    /// Resolve both join attribute lists, checking they pair up.
    fn join_columns(
        &self,
        attributes1: &str,
        attributes2: &str,
        other: &Table,
    ) -> DbResult<(Vec<usize>, Vec<usize>)> {
        let attrs1: Vec<&str> = attributes1.split_whitespace().collect();
        let attrs2: Vec<&str> = attributes2.split_whitespace().collect();
        if attrs1.len() != attrs2.len() {
            return Err(DbError::new(&format!(
                "cannot join: {} attributes against {}",
                attrs1.len(),
                attrs2.len()
            )));
        }
        Ok((
            self.schema.positions_of(&attrs1)?,
            other.schema.positions_of(&attrs2)?,
        ))
    }

    /// Result schema of an equi-join: a copy of this schema with colliding
    /// join-attribute names disambiguated, concatenated with `other`'s
    /// schema (which is never touched).
    fn join_schema(&self, attrs1: &[&str], other: &Table) -> Schema {
        let mut fields: Vec<Field> = self.schema.fields().to_vec();
        for field in fields.iter_mut() {
            if attrs1.contains(&field.name.as_str()) && other.schema.has_attribute(&field.name) {
                field.name.push('2');
            }
        }
        fields.extend(other.schema.fields().iter().cloned());
        Schema::new(fields, self.schema.key().to_vec())
    }
}
