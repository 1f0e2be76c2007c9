fn main() -> anyhow::Result<()> {
    calnotes::cli::run()
}
