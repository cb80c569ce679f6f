fn main() -> anyhow::Result<()> {
    survey_cli::run()?;
    Ok(())
}
