use envconfig::Envconfig;
use eyre::{Result, WrapErr};
use http_server::{init_tracing, run_service};
use product_service::{config::Config, Product};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::init_from_env().wrap_err("invalid configuration")?;
    init_tracing(config.log_json);

    run_service::<Product>(config.service_settings()).await?;
    Ok(())
}
