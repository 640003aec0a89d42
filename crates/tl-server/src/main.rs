#[tokio::main]
async fn main() -> std::io::Result<()> {
    tl_server::logging::init();
    tl_server::logging::register_interrupt();
    tl_server::run().await
}
