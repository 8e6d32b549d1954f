//! Synthetic tuple generation.
//!
//! Relations register in dependency order; generation then produces, per
//! relation, rows whose primary keys are unique and whose foreign-key
//! attribute groups copy the referenced values of previously generated
//! parent rows. The rows feed a [`Table`](crate::Table) through plain
//! `insert`.

use std::collections::HashSet;

use log::info;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    error::{DbError, DbResult},
    storage::{Cell, Domain, Schema, Tuple},
};

/// Give up on a relation after this many duplicate-key draws per row.
const MAX_KEY_ATTEMPTS: usize = 1000;

const STRING_LEN: usize = 10;

/// A foreign-key declaration: an attribute group of this relation references
/// an attribute group of an earlier relation.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub attributes: Vec<String>,
    pub ref_relation: String,
    pub ref_attributes: Vec<String>,
}

impl ForeignKey {
    /// Build from space-delimited attribute lists, e.g.
    /// `ForeignKey::new("crsCode semester", "Teaching", "crsCode semester")`.
    pub fn new(attributes: &str, ref_relation: &str, ref_attributes: &str) -> Self {
        Self {
            attributes: attributes.split_whitespace().map(String::from).collect(),
            ref_relation: ref_relation.to_string(),
            ref_attributes: ref_attributes.split_whitespace().map(String::from).collect(),
        }
    }
}

/// A foreign key resolved against the registry: column positions in the
/// owning schema, the parent relation's index, column positions there.
struct ResolvedFk {
    cols: Vec<usize>,
    ref_rel: usize,
    ref_cols: Vec<usize>,
}

struct RelSchema {
    name: String,
    schema: Schema,
    fks: Vec<ResolvedFk>,
}

/// Registry of relation schemas plus the generator filling them.
pub struct TupleGenerator {
    rels: Vec<RelSchema>,
}

// registration
impl TupleGenerator {
    pub fn new() -> Self {
        Self { rels: Vec::new() }
    }

    /// Register a relation schema. Relations referenced by foreign keys must
    /// already be registered.
    pub fn add_rel_schema(
        &mut self,
        name: &str,
        attributes: &str,
        domains: &str,
        key: &str,
        foreign_keys: &[ForeignKey],
    ) -> DbResult<()> {
        let schema = Schema::parse(attributes, domains, key)?;

        let mut fks = Vec::with_capacity(foreign_keys.len());
        for fk in foreign_keys {
            if fk.attributes.len() != fk.ref_attributes.len() {
                return Err(DbError::new(&format!(
                    "foreign key of {} pairs {} attributes with {}",
                    name,
                    fk.attributes.len(),
                    fk.ref_attributes.len()
                )));
            }
            let ref_rel = self
                .rels
                .iter()
                .position(|r| r.name == fk.ref_relation)
                .ok_or_else(|| {
                    DbError::new(&format!(
                        "foreign key of {} references unknown relation {}",
                        name, fk.ref_relation
                    ))
                })?;

            let own: Vec<&str> = fk.attributes.iter().map(|a| a.as_str()).collect();
            let referenced: Vec<&str> = fk.ref_attributes.iter().map(|a| a.as_str()).collect();
            fks.push(ResolvedFk {
                cols: schema.positions_of(&own)?,
                ref_rel,
                ref_cols: self.rels[ref_rel].schema.positions_of(&referenced)?,
            });
        }

        self.rels.push(RelSchema {
            name: name.to_string(),
            schema,
            fks,
        });
        Ok(())
    }
}

// generation
impl TupleGenerator {
    /// Generate rows for every registered relation, one count per relation
    /// in registration order.
    pub fn generate(&self, counts: &[usize]) -> DbResult<Vec<Vec<Tuple>>> {
        self.generate_with(counts, &mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng>(&self, counts: &[usize], rng: &mut R) -> DbResult<Vec<Vec<Tuple>>> {
        if counts.len() != self.rels.len() {
            return Err(DbError::new(&format!(
                "{} row counts for {} relations",
                counts.len(),
                self.rels.len()
            )));
        }

        let mut generated: Vec<Vec<Tuple>> = Vec::with_capacity(self.rels.len());
        for (rel, &count) in self.rels.iter().zip(counts) {
            let rows = self.generate_relation(rel, count, &generated, rng)?;
            info!("generated {} rows for {}", rows.len(), rel.name);
            generated.push(rows);
        }
        Ok(generated)
    }

    fn generate_relation<R: Rng>(
        &self,
        rel: &RelSchema,
        count: usize,
        generated: &[Vec<Tuple>],
        rng: &mut R,
    ) -> DbResult<Vec<Tuple>> {
        let key_cols = rel
            .schema
            .key_positions()
            .ok_or_else(|| DbError::new(&format!("{}: key does not resolve", rel.name)))?;

        let mut rows = Vec::with_capacity(count);
        let mut seen: HashSet<Vec<Cell>> = HashSet::new();
        for _ in 0..count {
            let mut attempts = 0;
            loop {
                let tuple = self.random_tuple(rel, generated, rng)?;
                if seen.insert(tuple.extract(&key_cols)) {
                    rows.push(tuple);
                    break;
                }
                attempts += 1;
                if attempts > MAX_KEY_ATTEMPTS {
                    return Err(DbError::new(&format!(
                        "cannot draw {} distinct keys for {}",
                        count, rel.name
                    )));
                }
            }
        }
        Ok(rows)
    }

    fn random_tuple<R: Rng>(
        &self,
        rel: &RelSchema,
        generated: &[Vec<Tuple>],
        rng: &mut R,
    ) -> DbResult<Tuple> {
        let mut cells: Vec<Option<Cell>> = vec![None; rel.schema.arity()];

        // foreign-key groups copy the referenced cells of one parent row
        for fk in &rel.fks {
            let parent_rows = &generated[fk.ref_rel];
            if parent_rows.is_empty() {
                return Err(DbError::new(&format!(
                    "{}: referenced relation {} has no rows",
                    rel.name, self.rels[fk.ref_rel].name
                )));
            }
            let parent = &parent_rows[rng.gen_range(0, parent_rows.len())];
            for (&col, &ref_col) in fk.cols.iter().zip(&fk.ref_cols) {
                cells[col] = Some(parent.get_cell(ref_col).clone());
            }
        }

        let cells = rel
            .schema
            .fields()
            .iter()
            .zip(cells)
            .map(|(field, cell)| cell.unwrap_or_else(|| random_cell(field.domain, rng)))
            .collect();
        Ok(Tuple::from_cells(cells))
    }
}

impl Default for TupleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn random_cell<R: Rng>(domain: Domain, rng: &mut R) -> Cell {
    match domain {
        Domain::Integer => Cell::Int(rng.gen_range(0, 1_000_000)),
        Domain::Long => Cell::Long(rng.gen_range(0, 1_000_000_000i64)),
        Domain::Short => Cell::Short(rng.gen_range(0, i16::MAX)),
        Domain::Byte => Cell::Byte(rng.gen()),
        Domain::Double => Cell::Double(rng.gen::<f64>() * 1e6),
        Domain::Float => Cell::Float(rng.gen::<f32>() * 1e3),
        Domain::Character => Cell::Char(rng.gen_range(b'a', b'z' + 1) as char),
        Domain::String => {
            let s: String = rng.sample_iter(&Alphanumeric).take(STRING_LEN).collect();
            Cell::Str(s)
        }
    }
}
