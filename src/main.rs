fn main() -> Result<(), Box<dyn std::error::Error>> {
    sampleshelf::runtime::run()
}
