use clap::Parser;
use std::process::{ExitCode, Termination};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(clap::Parser, Debug)]
#[command(
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "vigild",
    long_about = None
)]
pub struct Vigild {
    #[command(flatten)]
    pub run: vigil_server::Run,
}

impl Vigild {
    async fn run(self) -> ExitCode {
        match self.run.run().await {
            Ok(code) => code,
            Err(err) => {
                log::error!("Error: {err}");
                for (n, err) in err.chain().skip(1).enumerate() {
                    if n == 0 {
                        log::error!("Caused by:");
                    }
                    log::error!("\t{err}");
                }

                ExitCode::FAILURE
            }
        }
    }
}

fn init_log() {
    const RUST_LOG: &str = "info";

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        eprintln!("RUST_LOG is unset, using default: '{RUST_LOG}'");
        EnvFilter::new(RUST_LOG)
    });

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_level(true)
                .compact(),
        )
        .try_init();

    if let Err(err) = result {
        eprintln!("Error initializing logging: {:?}", err);
    }
}

#[actix_web::main]
async fn main() -> impl Termination {
    init_log();
    Vigild::parse().run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Vigild::command().debug_assert();
    }
}
