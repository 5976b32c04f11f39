//! Static description of the queryable academic tables.
//!
//! The descriptor is handed to the reasoning endpoint verbatim, so its
//! rendering must stay deterministic: table and column order are fixed and
//! the text is computed once per process.

use std::fmt::Write as _;
use std::sync::{LazyLock, OnceLock};

/// Version tag embedded in the rendered schema text. Bump it whenever the
/// tables below change so prompt fixtures can be regenerated deliberately.
pub const SCHEMA_VERSION: &str = "2025.2";

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    pub sql_type: &'static str,
    /// Semantic meaning, including enumerated code values.
    pub note: Option<&'static str>,
    pub primary_key: bool,
}

impl ColumnDescriptor {
    fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            note: None,
            primary_key: false,
        }
    }

    fn note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// A foreign-key relationship from a column of this table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

/// One queryable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: &'static str,
    /// Human label rendered as a section comment.
    pub title: &'static str,
    pub columns: Vec<ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDescriptor {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn foreign_key_for(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

/// Ordered, immutable description of the database the gateway queries.
#[derive(Debug)]
pub struct SchemaDescriptor {
    pub version: &'static str,
    pub tables: Vec<TableDescriptor>,
    rendered: OnceLock<String>,
}

impl SchemaDescriptor {
    pub fn new(version: &'static str, tables: Vec<TableDescriptor>) -> Self {
        Self {
            version,
            tables,
            rendered: OnceLock::new(),
        }
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.table(table)
            .and_then(|t| t.column(column))
            .is_some()
    }

    /// DDL-style text of every table, in declaration order.
    pub fn render(&self) -> &str {
        self.rendered.get_or_init(|| self.render_uncached())
    }

    fn render_uncached(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "-- Schema version: {}", self.version);

        for (idx, table) in self.tables.iter().enumerate() {
            out.push('\n');
            let _ = writeln!(out, "-- {}. {}", idx + 1, table.title);
            let _ = writeln!(out, "CREATE TABLE {} (", table.name);

            let last = table.columns.len().saturating_sub(1);
            for (col_idx, column) in table.columns.iter().enumerate() {
                let _ = write!(out, "  {} {}", column.name, column.sql_type);
                if column.primary_key {
                    out.push_str(" PRIMARY KEY");
                }

                let fk = table.foreign_key_for(column.name);
                match (column.note, fk) {
                    (Some(note), Some(fk)) => {
                        let _ = write!(
                            out,
                            " COMMENT '{} (Foreign Key: {}.{})'",
                            note, fk.references_table, fk.references_column
                        );
                    }
                    (Some(note), None) => {
                        let _ = write!(out, " COMMENT '{}'", note);
                    }
                    (None, Some(fk)) => {
                        let _ = write!(
                            out,
                            " COMMENT 'Foreign Key: {}.{}'",
                            fk.references_table, fk.references_column
                        );
                    }
                    (None, None) => {}
                }

                if col_idx != last {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(");\n");
        }

        out
    }
}

static ACADEMIC_SCHEMA: LazyLock<SchemaDescriptor> = LazyLock::new(|| {
    SchemaDescriptor::new(
        SCHEMA_VERSION,
        vec![
            TableDescriptor {
                name: "dept",
                title: "Departments (Faculties)",
                columns: vec![
                    ColumnDescriptor::new("id", "int unsigned").primary_key(),
                    ColumnDescriptor::new("name", "varchar(50)")
                        .note("Faculty Name (e.g., Lassonde School of Engineering)"),
                ],
                foreign_keys: vec![],
            },
            TableDescriptor {
                name: "emp",
                title: "Faculty & Staff",
                columns: vec![
                    ColumnDescriptor::new("id", "int unsigned").primary_key(),
                    ColumnDescriptor::new("name", "varchar(20)").note("Staff Name"),
                    ColumnDescriptor::new("gender", "tinyint unsigned").note("1:Male, 2:Female"),
                    ColumnDescriptor::new("phone", "char(11)"),
                    ColumnDescriptor::new("job", "tinyint unsigned")
                        .note("Role: 1:Course Director, 2:Lecturer, 3:Admin"),
                    ColumnDescriptor::new("salary", "int unsigned").note("Annual Salary (CAD)"),
                    ColumnDescriptor::new("entry_date", "date").note("Hire Date"),
                    ColumnDescriptor::new("dept_id", "int unsigned"),
                ],
                foreign_keys: vec![ForeignKey {
                    column: "dept_id",
                    references_table: "dept",
                    references_column: "id",
                }],
            },
            TableDescriptor {
                name: "clazz",
                title: "Course Sections",
                columns: vec![
                    ColumnDescriptor::new("id", "int unsigned").primary_key(),
                    ColumnDescriptor::new("name", "varchar(30)")
                        .note("Course Code (e.g., EECS 1012 Section A)"),
                    ColumnDescriptor::new("room", "varchar(20)")
                        .note("Lecture Hall (e.g., LAS A)"),
                    ColumnDescriptor::new("begin_date", "date").note("Term Start"),
                    ColumnDescriptor::new("end_date", "date").note("Term End"),
                    ColumnDescriptor::new("master_id", "int unsigned").note("Instructor ID"),
                    ColumnDescriptor::new("subject", "tinyint unsigned")
                        .note("Program: 1:CS, 2:SE, 3:Digital Media, 4:IT, 5:Comp Eng"),
                ],
                foreign_keys: vec![ForeignKey {
                    column: "master_id",
                    references_table: "emp",
                    references_column: "id",
                }],
            },
            TableDescriptor {
                name: "student",
                title: "Student Records",
                columns: vec![
                    ColumnDescriptor::new("id", "int unsigned").primary_key(),
                    ColumnDescriptor::new("name", "varchar(20)").note("Student Name"),
                    ColumnDescriptor::new("no", "char(10)")
                        .note("Student Number (starts with 2)"),
                    ColumnDescriptor::new("gender", "tinyint unsigned").note("1:Male, 2:Female"),
                    ColumnDescriptor::new("phone", "varchar(11)").note("Contact Number"),
                    ColumnDescriptor::new("year_level", "tinyint unsigned")
                        .note("Academic Year: 1-4, 5:Grad"),
                    ColumnDescriptor::new("enrollment_status", "tinyint unsigned")
                        .note("1:Full-time, 0:Part-time"),
                    ColumnDescriptor::new("gpa", "decimal(3,1)")
                        .note("Cumulative GPA (Scale: 0.0 - 9.0)"),
                    ColumnDescriptor::new("credits", "int").note("Total Credits Earned"),
                    ColumnDescriptor::new("clazz_id", "int unsigned")
                        .note("Enrolled Course Section"),
                ],
                foreign_keys: vec![ForeignKey {
                    column: "clazz_id",
                    references_table: "clazz",
                    references_column: "id",
                }],
            },
        ],
    )
});

/// The process-wide academic schema.
pub fn academic_schema() -> &'static SchemaDescriptor {
    &ACADEMIC_SCHEMA
}
