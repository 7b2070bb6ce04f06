fn main() {
    node_records::cli::run();
}
