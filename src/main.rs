use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = ext_sorter::cli::parse();
    let code = app::run(args)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
