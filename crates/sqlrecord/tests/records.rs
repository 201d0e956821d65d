//! Record types against the global registry.

use sqlrecord::{
    SchemaError, SchemaResult, SemanticType, SqlRecord, TableRegistration, TableRegistry,
    TableSchema, Value,
};

// ── Record definitions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Plan {
    Free = 0,
    Pro = 2,
}

impl TryFrom<u8> for Plan {
    type Error = SchemaError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Plan::Free),
            2 => Ok(Plan::Pro),
            other => Err(SchemaError::conversion("Plan", format!("unknown plan {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Member {
    org: u32,
    id: i64,
    handle: char,
    plan: Plan,
    nickname: Option<String>,
}

impl SqlRecord for Member {
    const TABLE: &'static str = "members";

    fn table_schema() -> SchemaResult<TableSchema> {
        TableSchema::builder(Self::TABLE)
            .column("org", SemanticType::UInt32)
            .column("id", SemanticType::Int64)
            .column("handle", SemanticType::Char)
            .column("plan", SemanticType::Enum(sqlrecord::IntWidth::U8))
            .nullable_column("nickname", SemanticType::Text)
            .primary_keys(2)
            .build()
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.org.into(),
            self.id.into(),
            self.handle.into(),
            Value::enumeration(self.plan as u8),
            self.nickname.clone().into(),
        ]
    }

    fn from_values(values: Vec<Value>) -> SchemaResult<Self> {
        let mut it = values.into_iter();
        let mut next = || it.next().unwrap_or(Value::Null);
        Ok(Self {
            org: next().try_into()?,
            id: next().try_into()?,
            handle: next().try_into()?,
            plan: u8::try_from(next().into_discriminant()?)?.try_into()?,
            nickname: next().into_optional()?,
        })
    }
}

struct Tag {
    post: i64,
    label: String,
}

impl SqlRecord for Tag {
    const TABLE: &'static str = "record_tags";

    fn table_schema() -> SchemaResult<TableSchema> {
        TableSchema::builder(Self::TABLE)
            .column("post", SemanticType::Int64)
            .column("label", SemanticType::Text)
            .primary_keys(2)
            .build()
    }

    fn to_values(&self) -> Vec<Value> {
        vec![self.post.into(), self.label.as_str().into()]
    }

    fn from_values(values: Vec<Value>) -> SchemaResult<Self> {
        let [post, label]: [Value; 2] = values
            .try_into()
            .map_err(|_| SchemaError::decode(Self::TABLE, "expected 2 columns"))?;
        Ok(Self {
            post: post.try_into()?,
            label: label.try_into()?,
        })
    }
}

fn register_tags(registry: &TableRegistry) -> SchemaResult<()> {
    registry.register_record::<Tag>()
}

sqlrecord::inventory::submit! {
    TableRegistration { register_fn: register_tags }
}

fn member() -> Member {
    Member {
        org: 3_000_000_000,
        id: 42,
        handle: 'q',
        plan: Plan::Pro,
        nickname: None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[test]
fn insert_binds_storage_values() {
    let stmt = member().insert_statement().unwrap();
    assert_eq!(
        stmt.sql(),
        r#"INSERT INTO "members" ("org", "id", "handle", "plan", "nickname") VALUES($1, $2, $3, $4, $5) ON CONFLICT("org", "id") DO NOTHING;"#
    );
    assert_eq!(
        stmt.values(),
        &[
            Value::I32(3_000_000_000u32 as i32),
            Value::I64(42),
            Value::Text("q".into()),
            Value::I16(2),
            Value::Null,
        ]
    );
    assert_eq!(stmt.params_ref().len(), 5);
}

#[test]
fn update_binds_data_then_key() {
    let mut m = member();
    m.nickname = Some("quinn".into());
    m.plan = Plan::Free;
    let stmt = m.update_statement().unwrap();
    assert_eq!(
        stmt.sql(),
        r#"UPDATE "members" SET "handle" = $1, "plan" = $2, "nickname" = $3 WHERE "org" = $4 AND "id" = $5;"#
    );
    assert_eq!(
        stmt.values(),
        &[
            Value::Text("q".into()),
            Value::I16(0),
            Value::Text("quinn".into()),
            Value::I32(-1_294_967_296),
            Value::I64(42),
        ]
    );
}

#[test]
fn upsert_and_delete() {
    let m = member();
    let upsert = m.upsert_statement().unwrap();
    assert!(upsert.sql().ends_with(
        r#"ON CONFLICT("org", "id") DO UPDATE SET "handle" = $3, "plan" = $4, "nickname" = $5;"#
    ));
    assert_eq!(upsert.values().len(), 5);

    let delete = m.delete_statement().unwrap();
    assert_eq!(delete.sql(), r#"DELETE FROM "members" WHERE "org" = $1 AND "id" = $2;"#);
    assert_eq!(delete.values(), &[Value::I32(-1_294_967_296), Value::I64(42)]);
}

#[test]
fn keyed_accessors_by_column_names() {
    let by_org = Member::select_by(&["org"], [7u32]).unwrap();
    assert_eq!(by_org.sql(), r#"SELECT * FROM "members" WHERE "org" = $1;"#);
    assert_eq!(by_org.values(), &[Value::I32(7)]);

    let by_id = Member::delete_by(&["id"], [9i64]).unwrap();
    assert_eq!(by_id.sql(), r#"DELETE FROM "members" WHERE "id" = $1;"#);

    assert!(Member::select_by(&["id", "org"], [1i64, 2i64]).unwrap_err().is_configuration());
    assert!(Member::select_by(&["nickname"], ["x"]).unwrap_err().is_configuration());
    assert!(Member::select_by(&["org"], [1i64, 2i64]).unwrap_err().is_configuration());
}

#[test]
fn storage_values_read_back_into_records() {
    let mut m = member();
    let stored = m.insert_statement().unwrap().values().to_vec();
    assert_eq!(Member::from_storage_values(stored).unwrap(), m);

    m.org = u32::MAX;
    m.plan = Plan::Free;
    m.nickname = Some("quinn".into());
    let stored = m.insert_statement().unwrap().values().to_vec();
    assert_eq!(stored[0], Value::I32(-1));
    assert_eq!(Member::from_storage_values(stored).unwrap(), m);
}

#[test]
fn unreadable_rows_name_the_column() {
    let stored = vec![
        Value::I32(1),
        Value::I64(2),
        Value::Text("q".into()),
        Value::I16(7),
        Value::Null,
    ];
    // 7 is a valid u8 but not a Plan.
    assert!(Member::from_storage_values(stored).unwrap_err().is_conversion());

    let stored = vec![
        Value::I32(1),
        Value::Null,
        Value::Text("q".into()),
        Value::I16(0),
        Value::Null,
    ];
    let err = Member::from_storage_values(stored).unwrap_err();
    assert!(matches!(err, SchemaError::Decode { ref column, .. } if column == "id"));
}

#[test]
fn wrong_value_type_is_a_conversion_error() {
    let err = Member::select_by(&["org"], ["seven"]).unwrap_err();
    assert!(err.is_conversion(), "{err}");
}

#[test]
fn inventory_registrations_seed_global_registry() {
    let registry = TableRegistry::global();
    let tags = registry.require("record_tags").unwrap();
    assert!(tags.update.is_none());
    assert_eq!(tags.accessors.len(), 3);

    let tag = Tag {
        post: 1,
        label: "rust".into(),
    };
    assert!(tag.update_statement().unwrap_err().is_configuration());
    assert_eq!(
        tag.upsert_statement().unwrap().sql(),
        r#"INSERT INTO "record_tags" ("post", "label") VALUES($1, $2) ON CONFLICT("post", "label") DO NOTHING;"#
    );
}

#[test]
fn register_record_compiles_into_a_local_registry() {
    let registry = TableRegistry::new();
    registry.register_record::<Member>().unwrap();
    registry.register_record::<Tag>().unwrap();
    assert_eq!(registry.table_names(), vec!["members", "record_tags"]);
    assert_eq!(registry.require("members").unwrap().accessors.len(), 3);
}

#[test]
fn create_table_sql_is_cached() {
    let sql = Member::create_table_sql().unwrap();
    assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "members" ("#));
    assert!(sql.contains(r#""org" INTEGER NOT NULL"#));
    assert!(sql.contains(r#""plan" SMALLINT NOT NULL"#));
    assert!(sql.contains(r#""nickname" TEXT,"#));
    assert!(sql.contains(r#"PRIMARY KEY("org", "id")"#));
    let first = Member::compiled().unwrap();
    let second = Member::compiled().unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}
