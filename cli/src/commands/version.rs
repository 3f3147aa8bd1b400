pub fn run() {
    println!("sentinel {}", env!("CARGO_PKG_VERSION"));
}
