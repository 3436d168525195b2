mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use product_gate::error::AppError;

/// Run the CLI and return the process status to exit with.
pub async fn run() -> Result<i32, AppError> {
    cli::run().await
}
