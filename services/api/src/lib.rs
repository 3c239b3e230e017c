mod cli;
mod infra;
mod routes;
mod server;
mod simulate;

use minpaku_sim::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
