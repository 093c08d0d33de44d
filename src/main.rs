fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = defectprep::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
