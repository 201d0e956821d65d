//! End-to-end runs of the `sqlrecord` command against scratch directories.

use std::path::PathBuf;

const CONFIG: &str = r#"
version = "1"
out = "catalog"

[compile]
insert_conflict = "fail"

[[tables]]
name = "memberships"
primary_keys = 2

[[tables.columns]]
name = "org"
type = "u32"
references = { table = "orgs", column = "id" }

[[tables.columns]]
name = "user"
type = "i64"

[[tables.columns]]
name = "role"
type = "enum:u8"
check = "< 4"
"#;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sqlrecord-cli-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(args: &[&str]) -> anyhow::Result<()> {
    let args = std::iter::once("sqlrecord")
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect();
    sqlrecord_cli::run(args)
}

#[test]
fn gen_writes_catalog_and_check_passes() {
    let dir = scratch("gen");
    let config = dir.join("sqlrecord.toml");
    std::fs::write(&config, CONFIG).unwrap();
    let config = config.to_str().unwrap();

    assert!(run(&["gen", "--config", config, "--check"]).is_err());
    run(&["gen", "--config", config]).unwrap();
    run(&["gen", "--config", config, "--check"]).unwrap();

    let sql = std::fs::read_to_string(dir.join("catalog").join("memberships.sql")).unwrap();
    assert!(sql.contains(
        r#"CREATE TABLE IF NOT EXISTS "memberships" ("org" INTEGER NOT NULL, "user" BIGINT NOT NULL, "role" SMALLINT NOT NULL, PRIMARY KEY("org", "user"), CHECK("role" < 4), FOREIGN KEY("org") REFERENCES "orgs"("id"));"#
    ));
    assert!(sql.contains(
        "-- name: insert\n-- params: org u32, user i64, role enum:u8\nINSERT INTO \"memberships\" (\"org\", \"user\", \"role\") VALUES($1, $2, $3);\n"
    ));
    assert!(sql.contains(r#"UPDATE "memberships" SET "role" = $1 WHERE "org" = $2 AND "user" = $3;"#));
    assert!(sql.contains("-- name: select_by_user\n"));
    assert!(sql.contains("-- name: delete_by_org_user\n"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn ddl_and_missing_tables() {
    let dir = scratch("ddl");
    let config = dir.join("sqlrecord.toml");
    std::fs::write(&config, CONFIG).unwrap();
    run(&["ddl", "--config", config.to_str().unwrap()]).unwrap();

    let empty = dir.join("empty.toml");
    std::fs::write(&empty, "version = \"1\"\n").unwrap();
    let err = run(&["gen", "--config", empty.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("no [[tables]]"), "{err}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = scratch("init");
    let config = dir.join("conf").join("sqlrecord.toml");
    let config = config.to_str().unwrap();
    run(&["init", "--config", config]).unwrap();
    run(&["gen", "--config", config, "--dry-run"]).unwrap();
    assert!(run(&["init", "--config", config]).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}

fn table(name: &str) -> String {
    format!(
        "\n[[tables]]\nname = \"{name}\"\n\n[[tables.columns]]\nname = \"id\"\ntype = \"i64\"\n"
    )
}

#[test]
fn tables_sharing_a_file_name_are_rejected() {
    let dir = scratch("collide");
    let config = dir.join("sqlrecord.toml");
    std::fs::write(
        &config,
        format!("version = \"1\"\nout = \"out\"\n{}{}", table("a b"), table("a_b")),
    )
    .unwrap();

    let err = run(&["gen", "--config", config.to_str().unwrap()]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("'a b' and 'a_b'"), "{msg}");
    assert!(!dir.join("out").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn gen_prunes_tables_dropped_from_config() {
    let dir = scratch("prune");
    let config = dir.join("sqlrecord.toml");
    let out = dir.join("out");
    let header = "version = \"1\"\nout = \"out\"\n";
    let config_str = config.to_str().unwrap();

    std::fs::write(&config, format!("{header}{}{}", table("keep"), table("gone"))).unwrap();
    run(&["gen", "--config", config_str]).unwrap();
    assert!(out.join("gone.sql").exists());
    std::fs::write(out.join("notes.sql"), "-- hand written\n").unwrap();

    std::fs::write(&config, format!("{header}{}", table("keep"))).unwrap();
    let err = run(&["gen", "--config", config_str, "--check"]).unwrap_err();
    assert!(err.to_string().contains("gone (removed)"), "{err}");
    run(&["gen", "--config", config_str, "--dry-run"]).unwrap();
    assert!(out.join("gone.sql").exists());

    run(&["gen", "--config", config_str]).unwrap();
    assert!(!out.join("gone.sql").exists());
    assert!(out.join("keep.sql").exists());
    assert!(out.join("notes.sql").exists());
    run(&["gen", "--config", config_str, "--check"]).unwrap();

    let _ = std::fs::remove_dir_all(&dir);
}
