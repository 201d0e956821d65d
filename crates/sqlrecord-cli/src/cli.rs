use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Gen,
    Ddl,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Gen(GenArgs),
    Ddl(DdlArgs),
    Init(InitArgs),
}

#[derive(Debug, Clone)]
pub struct GenArgs {
    pub config: PathBuf,
    pub dry_run: bool,
    pub check: bool,
}

#[derive(Debug, Clone)]
pub struct DdlArgs {
    pub config: PathBuf,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

const DEFAULT_CONFIG: &str = "sqlrecord.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "gen" => parse_gen(it.map(|s| s.as_str())),
        "ddl" => parse_ddl(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_gen<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut dry_run = false;
    let mut check = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Gen)),
            "--dry-run" => dry_run = true,
            "--check" => check = true,
            other => {
                if !parse_config_flag(other, &mut it, &mut config)? {
                    anyhow::bail!("unknown argument: {other}");
                }
            }
        }
    }

    if dry_run && check {
        anyhow::bail!("--dry-run and --check cannot be combined");
    }

    Ok(Command::Gen(GenArgs {
        config,
        dry_run,
        check,
    }))
}

fn parse_ddl<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Ddl)),
            other => {
                if !parse_config_flag(other, &mut it, &mut config)? {
                    anyhow::bail!("unknown argument: {other}");
                }
            }
        }
    }

    Ok(Command::Ddl(DdlArgs { config }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            other => {
                if !parse_config_flag(other, &mut it, &mut config)? {
                    anyhow::bail!("unknown argument: {other}");
                }
            }
        }
    }

    Ok(Command::Init(InitArgs { config }))
}

/// Handle `--config <FILE>` / `--config=<FILE>`; returns false for any other token.
fn parse_config_flag<'a>(
    token: &str,
    it: &mut impl Iterator<Item = &'a str>,
    config: &mut PathBuf,
) -> anyhow::Result<bool> {
    if token == "--config" {
        let Some(v) = it.next() else {
            anyhow::bail!("--config requires a value");
        };
        *config = PathBuf::from(v);
        return Ok(true);
    }
    if let Some(v) = token.strip_prefix("--config=") {
        if v.is_empty() {
            anyhow::bail!("--config requires a value");
        }
        *config = PathBuf::from(v);
        return Ok(true);
    }
    Ok(false)
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlrecord - compile table definitions into a SQL catalog

USAGE:
  sqlrecord <COMMAND> [OPTIONS]

COMMANDS:
  gen           Write <out>/<table>.sql for every configured table
  ddl           Print CREATE TABLE statements to stdout
  init          Write a template sqlrecord.toml

Run `sqlrecord <command> --help` for more."
            );
        }
        HelpTopic::Gen => {
            println!(
                "\
USAGE:
  sqlrecord gen [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlrecord.toml)
  --dry-run             Print files that would change
  --check               Exit non-zero if output would change
  -h, --help            Print help"
            );
        }
        HelpTopic::Ddl => {
            println!(
                "\
USAGE:
  sqlrecord ddl [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlrecord.toml)
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  sqlrecord init [OPTIONS]

OPTIONS:
  --config <FILE>       Path of the template to create (default: sqlrecord.toml)
  -h, --help            Print help"
            );
        }
    }
}
