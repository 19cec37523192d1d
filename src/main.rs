use clap::Parser;

use bom::bom::options::Options;

fn main() -> anyhow::Result<()> {
    let opt = Options::parse();

    // The logger is built once, here, from the --log-level flag; RUST_LOG
    // and RUST_LOG_STYLE can still override it.  Log output goes to stderr
    // so a BOM written to stdout stays clean.
    env_logger::Builder::new()
        .filter_level(opt.log_level)
        .parse_default_env()
        .init();

    let ec = bom::run_bom(opt)?;
    std::process::exit(ec);
}
