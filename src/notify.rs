// ABOUTME: Pushes the run outcome to an ntfy-style notification endpoint
// ABOUTME: Delivery is best effort; the caller logs a failure and moves on

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::info;

use crate::backup::{OutcomeCode, RunOutcome};
use crate::config::NotifyConfig;
use crate::error::BackupError;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts the outcome as `{"title": ..., "message": ...}` to the configured
/// endpoint. With no `[notify]` section configured this is a no-op.
pub async fn send(config: Option<&NotifyConfig>, outcome: &RunOutcome) -> Result<(), BackupError> {
    let Some(config) = config else {
        info!("no notification endpoint configured, skipping");
        return Ok(());
    };

    let client = Client::builder().timeout(SEND_TIMEOUT).build()?;

    let mut request = client.post(&config.url).json(&json!({
        "title": outcome.title,
        "message": body_for(outcome),
    }));
    if let Some(token) = &config.token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }

    let response = request.send().await?;

    if response.status() != StatusCode::OK {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(BackupError::Api { status, body });
    }

    info!(url = %config.url, "outcome notification delivered");
    Ok(())
}

/// Success notifications carry the status lines as-is; failures lead with
/// the numeric code so a phone notification is diagnosable at a glance.
fn body_for(outcome: &RunOutcome) -> String {
    if outcome.code == OutcomeCode::Success {
        outcome.message.clone()
    } else {
        format!(
            "code: {}, msg: {}",
            outcome.code.as_code(),
            outcome.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_is_the_status_lines() {
        let lines = vec![
            "Task a: state=FINISHED, time=t".to_string(),
            "Task b: state=FINISHED, time=t".to_string(),
        ];
        let outcome = RunOutcome::success(&lines);
        assert_eq!(
            body_for(&outcome),
            "Task a: state=FINISHED, time=t\nTask b: state=FINISHED, time=t"
        );
    }

    #[test]
    fn failure_body_leads_with_the_code() {
        let outcome = RunOutcome::source_not_ready();
        assert_eq!(
            body_for(&outcome),
            "code: 1, msg: source system not ready, run aborted"
        );
    }
}
