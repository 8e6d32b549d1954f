//! Whole-table persistence.
//!
//! A table image is a length-prefixed little-endian byte stream: name,
//! backend kind, schema, then the stored rows. The index is not serialized;
//! loading rebuilds it from the rows.

use std::{
    convert::TryInto,
    env,
    fs::{self, File},
    io::{Read, Write},
    mem::size_of,
    path::PathBuf,
};

use log::info;
use once_cell::sync::Lazy;

use crate::{
    error::{DbError, DbResult},
    index::IndexKind,
    storage::{Cell, Domain, Field, Schema, Tuple},
    table::Table,
};

/// Filename extension for database files.
const EXT: &str = "dbf";

/// Storage directory, resolved once per process; override through the
/// `SMALL_REL_STORE` environment variable.
static STORE_DIR: Lazy<PathBuf> = Lazy::new(|| {
    env::var_os("SMALL_REL_STORE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("store"))
});

fn table_path(name: &str) -> PathBuf {
    STORE_DIR.join(name).with_extension(EXT)
}

fn io_err(err: std::io::Error) -> DbError {
    DbError::new(&format!("io error: {}", err))
}

impl Table {
    /// Save the whole table image under the storage directory, keyed by the
    /// table name.
    pub fn save(&self) -> DbResult<()> {
        fs::create_dir_all(&*STORE_DIR).map_err(io_err)?;
        let path = table_path(&self.name);

        let mut buf = Vec::new();
        self.encode(&mut buf);
        let mut file = File::create(&path).map_err(io_err)?;
        file.write_all(&buf).map_err(io_err)?;

        info!("saved table {} to {:?}", self.name, path);
        Ok(())
    }

    /// Load the table with the given name back into memory; the index is
    /// rebuilt from the stored rows.
    pub fn load(name: &str) -> DbResult<Table> {
        let path = table_path(name);
        let mut file = File::open(&path).map_err(io_err)?;
        let table = Table::decode_from(&mut file)?;

        info!("loaded table {} from {:?}", name, path);
        Ok(table)
    }
}

pub trait Encodeable {
    fn encode(&self, buf: &mut Vec<u8>);
}

pub trait Decodeable: Sized {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self>;
}

fn read_exact<R: Read>(reader: &mut R, count: usize) -> DbResult<Vec<u8>> {
    let mut buf = vec![0u8; count];
    reader.read_exact(&mut buf).map_err(io_err)?;
    Ok(buf)
}

macro_rules! impl_number_codec {
    (for $($t:ty),+) => {
        $(
            impl Encodeable for $t {
                fn encode(&self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_le_bytes());
                }
            }

            impl Decodeable for $t {
                fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
                    let bytes = read_exact(reader, size_of::<Self>())?;
                    Ok(<$t>::from_le_bytes(bytes.as_slice().try_into().unwrap()))
                }
            }
        )*
    }
}

impl_number_codec!(for u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// # Format
/// - 2 bytes: payload size
/// - n bytes: payload
impl Encodeable for String {
    fn encode(&self, buf: &mut Vec<u8>) {
        (self.len() as u16).encode(buf);
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Decodeable for String {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
        let size = u16::decode_from(reader)?;
        let bytes = read_exact(reader, size as usize)?;
        String::from_utf8(bytes).map_err(|_| DbError::new("corrupt string payload"))
    }
}

impl Encodeable for Domain {
    fn encode(&self, buf: &mut Vec<u8>) {
        let tag: u8 = match self {
            Domain::Integer => 0,
            Domain::Long => 1,
            Domain::Short => 2,
            Domain::Byte => 3,
            Domain::Double => 4,
            Domain::Float => 5,
            Domain::Character => 6,
            Domain::String => 7,
        };
        tag.encode(buf);
    }
}

impl Decodeable for Domain {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
        match u8::decode_from(reader)? {
            0 => Ok(Domain::Integer),
            1 => Ok(Domain::Long),
            2 => Ok(Domain::Short),
            3 => Ok(Domain::Byte),
            4 => Ok(Domain::Double),
            5 => Ok(Domain::Float),
            6 => Ok(Domain::Character),
            7 => Ok(Domain::String),
            tag => Err(DbError::new(&format!("corrupt domain tag: {}", tag))),
        }
    }
}

/// # Format
/// - 1 byte: domain tag
/// - n bytes: payload in the domain's encoding
impl Encodeable for Cell {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.domain().encode(buf);
        match self {
            Cell::Int(v) => v.encode(buf),
            Cell::Long(v) => v.encode(buf),
            Cell::Short(v) => v.encode(buf),
            Cell::Byte(v) => v.encode(buf),
            Cell::Double(v) => v.encode(buf),
            Cell::Float(v) => v.encode(buf),
            Cell::Char(v) => (*v as u32).encode(buf),
            Cell::Str(v) => v.encode(buf),
        }
    }
}

impl Decodeable for Cell {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
        match Domain::decode_from(reader)? {
            Domain::Integer => Ok(Cell::Int(i32::decode_from(reader)?)),
            Domain::Long => Ok(Cell::Long(i64::decode_from(reader)?)),
            Domain::Short => Ok(Cell::Short(i16::decode_from(reader)?)),
            Domain::Byte => Ok(Cell::Byte(i8::decode_from(reader)?)),
            Domain::Double => Ok(Cell::Double(f64::decode_from(reader)?)),
            Domain::Float => Ok(Cell::Float(f32::decode_from(reader)?)),
            Domain::Character => {
                let code = u32::decode_from(reader)?;
                std::char::from_u32(code)
                    .map(Cell::Char)
                    .ok_or_else(|| DbError::new("corrupt character payload"))
            }
            Domain::String => Ok(Cell::Str(String::decode_from(reader)?)),
        }
    }
}

impl Encodeable for Tuple {
    fn encode(&self, buf: &mut Vec<u8>) {
        (self.arity() as u16).encode(buf);
        for cell in self.cells() {
            cell.encode(buf);
        }
    }
}

impl Decodeable for Tuple {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
        let arity = u16::decode_from(reader)?;
        let mut cells = Vec::with_capacity(arity as usize);
        for _ in 0..arity {
            cells.push(Cell::decode_from(reader)?);
        }
        Ok(Tuple::from_cells(cells))
    }
}

impl Encodeable for Schema {
    fn encode(&self, buf: &mut Vec<u8>) {
        (self.fields().len() as u16).encode(buf);
        for field in self.fields() {
            field.name.encode(buf);
            field.domain.encode(buf);
        }
        (self.key().len() as u16).encode(buf);
        for k in self.key() {
            k.encode(buf);
        }
    }
}

impl Decodeable for Schema {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
        let field_count = u16::decode_from(reader)?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let name = String::decode_from(reader)?;
            let domain = Domain::decode_from(reader)?;
            fields.push(Field { name, domain });
        }
        let key_count = u16::decode_from(reader)?;
        let mut key = Vec::with_capacity(key_count as usize);
        for _ in 0..key_count {
            key.push(String::decode_from(reader)?);
        }
        Ok(Schema::new(fields, key))
    }
}

impl Encodeable for IndexKind {
    fn encode(&self, buf: &mut Vec<u8>) {
        let tag: u8 = match self {
            IndexKind::None => 0,
            IndexKind::Tree => 1,
            IndexKind::LinearHash => 2,
            IndexKind::BpTree => 3,
        };
        tag.encode(buf);
    }
}

impl Decodeable for IndexKind {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
        match u8::decode_from(reader)? {
            0 => Ok(IndexKind::None),
            1 => Ok(IndexKind::Tree),
            2 => Ok(IndexKind::LinearHash),
            3 => Ok(IndexKind::BpTree),
            tag => Err(DbError::new(&format!("corrupt index kind: {}", tag))),
        }
    }
}

impl Encodeable for Table {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.name.encode(buf);
        self.kind.encode(buf);
        self.schema.encode(buf);
        (self.tuples.len() as u64).encode(buf);
        for tuple in &self.tuples {
            tuple.encode(buf);
        }
    }
}

impl Decodeable for Table {
    fn decode_from<R: Read>(reader: &mut R) -> DbResult<Self> {
        let name = String::decode_from(reader)?;
        let kind = IndexKind::decode_from(reader)?;
        let schema = Schema::decode_from(reader)?;
        let count = u64::decode_from(reader)?;
        let mut rows = Vec::with_capacity(count as usize);
        for _ in 0..count {
            rows.push(Tuple::decode_from(reader)?);
        }
        Ok(Table::from_rows(name, schema, kind, rows))
    }
}
