use matmul_plot::plot::{parse_cli, run};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = parse_cli();
    println!(
        "read data from {} (output directory {})",
        cfg.csvin.display(),
        cfg.output_dir.display()
    );
    if let Err(e) = run(&cfg) {
        error!("{}", e);
        std::process::exit(1);
    }
}
