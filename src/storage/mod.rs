mod cell;
mod key;
mod schema;
mod tuple;

pub use cell::{Cell, Domain};
pub use key::Key;
pub use schema::{Field, Schema};
pub use tuple::Tuple;
