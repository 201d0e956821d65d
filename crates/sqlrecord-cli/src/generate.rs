use crate::catalog::generate_catalog;
use crate::cli::{DdlArgs, GenArgs};
use crate::config::ProjectConfig;
use crate::write::{SyncMode, sync_catalog};
use sqlrecord::CompiledTable;

pub fn run(args: GenArgs) -> anyhow::Result<()> {
    let project = load_with_tables(&args.config)?;
    let tables = compile_tables(&project)?;
    let out_dir = project.out_dir();
    let files = generate_catalog(&out_dir, &tables)?;

    let mode = SyncMode::from_flags(args.dry_run, args.check);
    let summary = sync_catalog(&out_dir, &files, mode)?;

    let prefix = if mode == SyncMode::DryRun { "would be " } else { "" };
    for c in summary.pending() {
        println!("{:<10} {prefix}{} ({})", c.table, c.status, c.path.display());
    }
    println!("{}: {summary}", out_dir.display());

    Ok(())
}

pub fn print_ddl(args: DdlArgs) -> anyhow::Result<()> {
    let project = load_with_tables(&args.config)?;
    for schema in project.file.schemas()? {
        println!("{}", sqlrecord::ddl::create_table(&schema).sql);
    }
    Ok(())
}

fn load_with_tables(config: &std::path::Path) -> anyhow::Result<ProjectConfig> {
    let project = ProjectConfig::load(config.to_path_buf())?;
    if project.file.tables.is_empty() {
        anyhow::bail!(
            "no [[tables]] configured in {}; run `sqlrecord init` to create a template",
            config.display()
        );
    }
    Ok(project)
}

pub fn compile_tables(project: &ProjectConfig) -> anyhow::Result<Vec<CompiledTable>> {
    let options = project.file.compile;
    project
        .file
        .schemas()?
        .into_iter()
        .map(|schema| {
            let name = schema.table_name().to_string();
            CompiledTable::compile(schema, options)
                .map_err(|e| anyhow::anyhow!("table '{name}': {e}"))
        })
        .collect()
}
