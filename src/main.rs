#[tokio::main]
async fn main() {
    // Errors are already logged where they happen; just set the exit code.
    if combat_core::run_with_config().await.is_err() {
        std::process::exit(1);
    }
}
