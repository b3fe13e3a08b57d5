use std::process::ExitCode;

use certpush::cli;

fn install_rustls_provider() {
    use rustls::crypto::{ring, CryptoProvider};

    if CryptoProvider::get_default().is_none() {
        // Losing a race with another installer is fine; a default is set either way.
        let _ = ring::default_provider().install_default();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    install_rustls_provider();

    match cli::run_cli().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("certpush: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
