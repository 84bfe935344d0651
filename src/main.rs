use clap::Parser;

use clinicdesk_lib::config::ServerConfig;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();
    clinicdesk_lib::init_tracing();

    if let Err(e) = clinicdesk_lib::run(config).await {
        tracing::error!("ClinicDesk exited with error: {e}");
        std::process::exit(1);
    }
}
