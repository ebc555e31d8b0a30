use anyhow::Result;
use calrows_auth::Authenticator;
use calrows_calendar::{CalendarClient, PersistOutcome, Pipeline};
use calrows_core::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    calrows_core::init()?;

    let (config, _validation) = Config::load_validated()
        .inspect_err(|e| tracing::error!("{}", e.user_message()))?;

    let token = Authenticator::from_config(&config.auth)
        .inspect_err(|e| tracing::error!("{}", e.user_message()))?
        .access_token()
        .await
        .inspect_err(|e| tracing::error!("{}", e.user_message()))?;

    let client = CalendarClient::new(&token, &config.calendar.api_base_url);
    let pipeline = Pipeline::new(config.calendar, config.sink);

    let output = pipeline
        .run(&client)
        .await
        .inspect_err(|e| tracing::error!("{}", e.user_message()))?;

    print!("{}", output.table);

    match output.persist {
        PersistOutcome::Persisted(n) => tracing::info!("Persisted {} rows", n),
        PersistOutcome::Failed => tracing::warn!("Rows were not persisted"),
        PersistOutcome::Disabled => {}
    }

    Ok(())
}
