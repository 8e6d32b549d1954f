use std::fmt;

use crate::table::Table;

/// Width of one printed column.
const COL_WIDTH: usize = 15;

impl fmt::Display for Table {
    /// The fixed-width text dump, stable enough for golden-output
    /// comparisons.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let border = format!("|-{}-|", "-".repeat(COL_WIDTH).repeat(self.schema.arity()));

        writeln!(f)?;
        writeln!(f, " Table {}", self.name)?;
        writeln!(f, "{}", border)?;
        write!(f, "| ")?;
        for field in self.schema.fields() {
            write!(f, "{:>width$}", field.name, width = COL_WIDTH)?;
        }
        writeln!(f, " |")?;
        writeln!(f, "{}", border)?;
        for tuple in &self.tuples {
            write!(f, "| ")?;
            for cell in tuple.cells() {
                write!(f, "{:>width$}", cell.to_string(), width = COL_WIDTH)?;
            }
            writeln!(f, " |")?;
        }
        writeln!(f, "{}", border)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<Table {}, rows: {}>", self.name, self.tuples.len())
    }
}

impl Table {
    /// Print the table.
    pub fn print(&self) {
        println!("{}", self);
    }

    /// Print the index contents, one `key -> row` line per entry.
    pub fn print_index(&self) {
        println!();
        println!(" Index for {}", self.name);
        println!("-------------------");
        if let Some(index) = self.index.as_deref() {
            for (key, tuple) in index.iter() {
                println!("{} -> {}", key, tuple);
            }
        }
        println!("-------------------");
    }
}
