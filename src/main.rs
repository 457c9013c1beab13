use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  cie_portal::start_server().await
}
