use envconfig::Envconfig;
use eyre::{Result, WrapErr};
use http_server::{init_tracing, run_service};
use order_service::{config::Config, Order};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::init_from_env().wrap_err("invalid configuration")?;
    init_tracing(config.log_json);

    run_service::<Order>(config.service_settings()).await?;
    Ok(())
}
