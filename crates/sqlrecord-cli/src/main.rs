fn main() {
    if let Err(e) = sqlrecord_cli::run(std::env::args().collect()) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
