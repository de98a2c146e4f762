//! Binary entrypoint for sysfont-cli (made by FontLab https://www.fontlab.com/)

fn main() {
    if let Err(err) = sysfont_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
