use crate::Error;

/// Destination of audit and report notifications
#[async_trait::async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), Error>;
}

/// Amazon SNS topics
#[derive(Clone, Debug)]
pub struct SnsPublisher {
    sns_client: aws_sdk_sns::Client,
}

impl SnsPublisher {
    pub fn new(aws_sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            sns_client: aws_sdk_sns::Client::new(aws_sdk_config),
        }
    }
}

#[async_trait::async_trait]
impl NotificationPublisher for SnsPublisher {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), Error> {
        // Call SNS Publish API
        let resp = self
            .sns_client
            .publish()
            .topic_arn(topic)
            .subject(subject)
            .message(message)
            .send()
            .await?;

        tracing::debug!(message_id = resp.message_id(), "SNS message published");
        Ok(())
    }
}

/// Print notifications instead of sending them, for dry runs
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutPublisher;

#[async_trait::async_trait]
impl NotificationPublisher for StdoutPublisher {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<(), Error> {
        println!("To: {}\nSubject: {}\n\n{}\n", topic, subject, message);
        Ok(())
    }
}
