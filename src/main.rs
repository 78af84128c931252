fn main() -> Result<(), Box<dyn std::error::Error>> {
    relaybot::cli::main()
}
