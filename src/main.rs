fn main() {
    if let Err(err) = facelabel::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
