use reelcipe::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    reelcipe::init_tracing(settings.log_json);
    reelcipe::run(settings).await
}
