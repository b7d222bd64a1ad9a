/// main() for AWS Lambda
#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    use lambda_runtime::{run, service_fn};

    // CloudWatch adds its own timestamps
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    run(service_fn(lambda_handler)).await?;
    Ok(())
}

/// Lambda handler, invoked by the schedule. Event payload is ignored.
async fn lambda_handler(
    _event: lambda_runtime::LambdaEvent<serde_json::Value>,
) -> Result<serde_json::Value, lambda_runtime::Error> {
    use acm_expiry_checker::*;

    // Fresh configuration snapshot per invocation
    let config = AuditConfig::from_env()?;
    let result = check_certificates(&config).await?;

    Ok(serde_json::to_value(&result)?)
}
