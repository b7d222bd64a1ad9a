/// Load AWS SDK config for "us-east-1", etc. or None for default region chain
pub async fn aws_config_from_env(region: Option<&str>) -> aws_config::SdkConfig {
    let loader = aws_config::from_env();
    let sdk_config = match region {
        Some(region) => {
            loader
                .region(aws_config::Region::new(region.to_string()))
                .load()
                .await
        }
        None => loader.load().await,
    };

    tracing::debug!(region = ?sdk_config.region(), "AWS SDK config loaded");
    sdk_config
}
