use log::{error, warn};

use crate::error::{DbError, DbResult};
use crate::storage::Domain;

/// One named, typed attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub domain: Domain,
}

impl Field {
    pub fn new(name: &str, domain: Domain) -> Self {
        Self {
            name: name.to_string(),
            domain,
        }
    }
}

/// Table schema: ordered attributes with parallel domains, plus the ordered
/// primary-key subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
    key: Vec<String>,
}

// constructors
impl Schema {
    /// Build a schema from space-delimited specification strings, validating
    /// attribute/domain arity, attribute uniqueness and key membership. This
    /// is the user-facing construction path; operator-derived schemas go
    /// through [`Schema::new`] instead.
    pub fn parse(attributes: &str, domains: &str, key: &str) -> DbResult<Schema> {
        let names: Vec<&str> = attributes.split_whitespace().collect();
        let tags: Vec<&str> = domains.split_whitespace().collect();
        let key: Vec<&str> = key.split_whitespace().collect();

        if names.is_empty() {
            return Err(DbError::new("schema needs at least one attribute"));
        }
        if names.len() != tags.len() {
            return Err(DbError::new(&format!(
                "{} attributes but {} domains",
                names.len(),
                tags.len()
            )));
        }
        if key.is_empty() {
            return Err(DbError::new("schema needs a non-empty key"));
        }

        let mut fields = Vec::with_capacity(names.len());
        for (name, tag) in names.iter().zip(&tags) {
            if fields.iter().any(|f: &Field| f.name == *name) {
                return Err(DbError::new(&format!("duplicate attribute: {}", name)));
            }
            fields.push(Field::new(name, Domain::parse(tag)?));
        }
        for k in &key {
            if !names.contains(k) {
                return Err(DbError::new(&format!("key attribute {} not in schema", k)));
            }
        }

        Ok(Schema {
            fields,
            key: key.iter().map(|k| k.to_string()).collect(),
        })
    }

    /// Build a schema from pre-structured parts.
    ///
    /// Duplicate attribute names and unresolvable key attributes are only
    /// warned about: the equi-join keeps the left table's key through the
    /// collision rename, so derived schemas may legally violate both.
    pub fn new(fields: Vec<Field>, key: Vec<String>) -> Schema {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                warn!("schema carries duplicate attribute {}", field.name);
            }
        }
        for k in &key {
            if !fields.iter().any(|f| &f.name == k) {
                warn!("key attribute {} does not resolve in schema", k);
            }
        }

        Schema { fields, key }
    }
}

// queries
impl Schema {
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn key(&self) -> &[String] {
        &self.key
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Position of the attribute (first match on duplicates).
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Positions of every named column, failing on the first unknown name.
    pub fn positions_of(&self, columns: &[&str]) -> DbResult<Vec<usize>> {
        columns
            .iter()
            .map(|c| {
                self.position(c)
                    .ok_or_else(|| DbError::new(&format!("no attribute named {}", c)))
            })
            .collect()
    }

    /// Positions of the key attributes, or None when one does not resolve
    /// (possible on operator-derived schemas).
    pub fn key_positions(&self) -> Option<Vec<usize>> {
        self.key.iter().map(|k| self.position(k)).collect()
    }

    /// Check union/minus compatibility: same arity and the same domain at
    /// every position. Attribute names do not matter.
    pub fn compatible(&self, other: &Schema) -> DbResult<()> {
        if self.arity() != other.arity() {
            error!("compatible: tables have different arity");
            return Err(DbError::new("tables have different arity"));
        }
        for (pos, (a, b)) in self.fields.iter().zip(&other.fields).enumerate() {
            if a.domain != b.domain {
                error!("compatible: tables disagree on domain {}", pos);
                return Err(DbError::new(&format!("tables disagree on domain {}", pos)));
            }
        }
        Ok(())
    }

    /// Schema of a projection onto `columns`. The key survives when the
    /// projection contains every key attribute; otherwise the projected
    /// columns become the key.
    pub fn project(&self, columns: &[&str]) -> DbResult<Schema> {
        let positions = self.positions_of(columns)?;
        let fields = positions.iter().map(|&p| self.fields[p].clone()).collect();
        let key = if self.key.iter().all(|k| columns.contains(&k.as_str())) {
            self.key.clone()
        } else {
            columns.iter().map(|c| c.to_string()).collect()
        };
        Ok(Schema::new(fields, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_checks_the_specification_strings() {
        assert!(Schema::parse("title year", "String Integer", "title").is_ok());

        // arity mismatch
        assert!(Schema::parse("title year", "String", "title").is_err());
        // unknown domain tag
        assert!(Schema::parse("title", "Varchar", "title").is_err());
        // key outside the schema
        assert!(Schema::parse("title", "String", "year").is_err());
        // duplicate attribute
        assert!(Schema::parse("title title", "String String", "title").is_err());
        // empty key
        assert!(Schema::parse("title", "String", "").is_err());
    }

    #[test]
    fn projection_key_rule() {
        let schema = Schema::parse(
            "title year length genre",
            "String Integer Integer String",
            "title year",
        )
        .unwrap();

        let keeps = schema.project(&["title", "year", "genre"]).unwrap();
        assert_eq!(keeps.key(), &["title".to_string(), "year".to_string()]);

        let rewrites = schema.project(&["title", "genre"]).unwrap();
        assert_eq!(rewrites.key(), &["title".to_string(), "genre".to_string()]);
    }
}
