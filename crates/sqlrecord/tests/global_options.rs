//! The global registry picks up options set before first use.
//!
//! Kept in its own test binary: the global registry is per process.

use sqlrecord::{
    CompileOptions, InsertConflict, PlaceholderStyle, SchemaResult, SemanticType, SqlRecord,
    TableRegistry, TableSchema, Value,
};

struct Event {
    id: i64,
    body: String,
}

impl SqlRecord for Event {
    const TABLE: &'static str = "events";

    fn table_schema() -> SchemaResult<TableSchema> {
        TableSchema::builder(Self::TABLE)
            .column("id", SemanticType::Int64)
            .column("body", SemanticType::Text)
            .build()
    }

    fn to_values(&self) -> Vec<Value> {
        vec![self.id.into(), self.body.as_str().into()]
    }

    fn from_values(values: Vec<Value>) -> SchemaResult<Self> {
        let mut it = values.into_iter();
        let mut next = || it.next().unwrap_or(Value::Null);
        Ok(Self {
            id: next().try_into()?,
            body: next().try_into()?,
        })
    }
}

#[test]
fn init_global_applies_options() {
    let options = CompileOptions::new()
        .placeholder(PlaceholderStyle::Positional)
        .insert_conflict(InsertConflict::Fail);
    let registry = TableRegistry::init_global(options).unwrap();
    assert_eq!(registry.options(), &options);

    let event = Event {
        id: 1,
        body: "hello".into(),
    };
    assert_eq!(
        event.insert_statement().unwrap().sql(),
        r#"INSERT INTO "events" ("id", "body") VALUES(?, ?);"#
    );

    assert!(TableRegistry::init_global(options).is_ok());
    let err = TableRegistry::init_global(CompileOptions::default()).unwrap_err();
    assert!(err.is_configuration());
}
