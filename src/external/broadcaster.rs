use crate::config::BroadcastConfig;
use crate::error::{AppError, AppResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use uuid::Uuid;

/// 中奖事件推送器。投递为 fire-and-forget：失败只记日志，
/// 不影响抽奖主流程，也不重试。
#[derive(Clone)]
pub struct Broadcaster {
    client: Client,
    config: BroadcastConfig,
}

impl Broadcaster {
    pub fn new(config: BroadcastConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.webhook_url.is_some()
    }

    /// 投递一条事件并立即返回，实际发送在后台任务中完成。
    pub fn notify(&self, topic: &str, payload: Value) {
        let Some(url) = self.config.webhook_url.clone() else {
            log::debug!("Broadcast disabled, dropping event: {}", topic);
            return;
        };

        let envelope = json!({
            "id": Uuid::new_v4(),
            "topic": topic,
            "emitted_at": Utc::now(),
            "payload": payload,
        });

        let client = self.client.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            match Self::send(&client, &url, &envelope).await {
                Ok(()) => log::info!("Broadcast event delivered: {}", topic),
                Err(e) => log::warn!("Broadcast event failed: {}, Error: {}", topic, e),
            }
        });
    }

    async fn send(client: &Client, url: &str, envelope: &Value) -> AppResult<()> {
        let response = client.post(url).json(envelope).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::InternalError(format!(
                "Webhook returned {status}: {error_text}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_webhook_url() {
        let broadcaster = Broadcaster::new(BroadcastConfig::default());
        assert!(!broadcaster.is_enabled());
    }

    #[tokio::test]
    async fn test_notify_without_webhook_is_a_no_op() {
        let broadcaster = Broadcaster::new(BroadcastConfig::default());
        // 未配置 webhook 时不得 panic，也不产生后台任务
        broadcaster.notify("spin.reward-won", json!({"ticket_id": 1}));
    }
}
