// src/main.rs

use lockstep::{EXIT_CONFIG_ERROR, EXIT_TASK_FAILURE, cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("lockstep error: {err:?}");
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("lockstep error: {err}");
            if err.is_config_error() {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_TASK_FAILURE
            }
        }
    };
    std::process::exit(code);
}
