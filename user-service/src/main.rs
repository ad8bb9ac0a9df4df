use envconfig::Envconfig;
use eyre::{Result, WrapErr};
use http_server::{init_tracing, run_service};
use user_service::{config::Config, User};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::init_from_env().wrap_err("invalid configuration")?;
    init_tracing(config.log_json);

    run_service::<User>(config.service_settings()).await?;
    Ok(())
}
