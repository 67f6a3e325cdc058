//! Application wiring and the Telegram long-polling loop.

use crate::bot::{Bot, MessagingTransport, SessionStore, TelegramClient, Update};
use crate::generator::{GenerationService, Generator};
use crate::models::Config;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{error, info, warn};

/// Seconds Telegram may hold a `getUpdates` request open.
const LONG_POLL_SECS: u32 = 60;
/// Pause after `getUpdates` keeps failing before the loop tries again.
const OUTAGE_PAUSE: Duration = Duration::from_secs(5);

/// Owns the transport and dispatches every incoming update on its own task.
pub struct App {
    transport: Arc<dyn MessagingTransport>,
    bot: Bot,
    long_poll_secs: u32,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// Integration tests use this to inject mocks.
    pub fn with_services(
        transport: Arc<dyn MessagingTransport>,
        generator: Arc<dyn GenerationService>,
        sessions: SessionStore,
    ) -> Self {
        let bot = Bot::new(transport.clone(), generator, sessions);
        Self {
            transport,
            bot,
            long_poll_secs: LONG_POLL_SECS,
        }
    }

    pub fn with_long_poll_secs(mut self, secs: u32) -> Self {
        self.long_poll_secs = secs;
        self
    }

    /// Construct the Telegram bot from configuration (`Config::from_env`).
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.telegram_token()?;

        // Reuse one HTTP connection pool across clients.
        let http_client = reqwest::Client::new();

        let transport: Arc<dyn MessagingTransport> = Arc::new(TelegramClient::new_with_client(
            token,
            &config.telegram_api_url,
            http_client.clone(),
        ));
        let generator: Arc<dyn GenerationService> =
            Arc::new(Generator::from_config(&config.fusion, http_client));

        info!(
            "Generation target: pipelines matching '{}' at {} ({} polls, {:?} apart)",
            config.fusion.model_name,
            config.fusion.base_url,
            config.fusion.poll_attempts,
            config.fusion.poll_delay
        );

        Ok(Self::with_services(
            transport,
            generator,
            SessionStore::new(config.default_language),
        ))
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Runs until Ctrl-C. Requests already in flight are not waited for.
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Polls for updates until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        info!("Bot started, waiting for messages");

        tokio::pin!(shutdown);
        let mut offset = None;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping update polling");
                    break;
                }
                polled = self.poll_once(offset) => {
                    match polled {
                        Ok((next_offset, _handlers)) => offset = next_offset,
                        Err(e) => {
                            error!("Giving up on getUpdates for now: {}", e);
                            tokio::select! {
                                _ = &mut shutdown => {
                                    info!("Shutdown requested, stopping update polling");
                                    break;
                                }
                                _ = tokio::time::sleep(OUTAGE_PAUSE) => {}
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Fetches one batch of updates and spawns a handler for each of them.
    ///
    /// Returns the offset for the next call together with the handler tasks.
    pub async fn poll_once(
        &self,
        offset: Option<i64>,
    ) -> Result<(Option<i64>, Vec<JoinHandle<()>>)> {
        let updates = self.fetch_updates(offset).await?;
        let next_offset = next_offset(offset, &updates);
        Ok((next_offset, self.dispatch(updates)))
    }

    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(250)
            .max_delay(Duration::from_secs(30))
            .take(4);

        Retry::spawn(retry_strategy, || async move {
            self.transport
                .get_updates(offset, self.long_poll_secs)
                .await
                .map_err(|e| {
                    warn!("getUpdates failed: {}. Will retry...", e);
                    e
                })
        })
        .await
    }

    fn dispatch(&self, updates: Vec<Update>) -> Vec<JoinHandle<()>> {
        updates
            .into_iter()
            .map(|update| {
                let bot = self.bot.clone();
                tokio::spawn(async move { bot.handle_update(update).await })
            })
            .collect()
    }
}

/// Telegram confirms updates once they are requested with a higher offset.
fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .max(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{MockTransport, SentMessage};
    use crate::generator::MockGenerator;

    fn build_test_app(transport: &MockTransport, generator: &MockGenerator) -> App {
        App::with_services(
            Arc::new(transport.clone()),
            Arc::new(generator.clone()),
            SessionStore::default(),
        )
        .with_long_poll_secs(0)
    }

    #[test]
    fn test_next_offset() {
        let updates = vec![
            MockTransport::text_update(7, 1, "a"),
            MockTransport::text_update(9, 1, "b"),
        ];
        assert_eq!(next_offset(None, &updates), Some(10));
        assert_eq!(next_offset(Some(10), &[]), Some(10));
        assert_eq!(next_offset(None, &[]), None);
    }

    #[tokio::test]
    async fn test_poll_once_dispatches_every_update() {
        let transport = MockTransport::new().with_updates(vec![
            MockTransport::text_update(1, 10, "/start"),
            MockTransport::text_update(2, 20, "a cat"),
        ]);
        let generator = MockGenerator::new();
        let app = build_test_app(&transport, &generator);

        let (offset, handlers) = app.poll_once(None).await.unwrap();
        for handler in handlers {
            handler.await.unwrap();
        }

        assert_eq!(offset, Some(3));
        assert_eq!(generator.get_prompts(), vec!["a cat".to_string()]);
        let photos = transport
            .get_sent()
            .into_iter()
            .filter(|m| matches!(m, SentMessage::Photo { chat_id: 20, .. }))
            .count();
        assert_eq!(photos, 1);
    }

    #[tokio::test]
    async fn test_slow_generation_does_not_block_other_chats() {
        let release = Arc::new(tokio::sync::Notify::new());
        let transport = MockTransport::new().with_updates(vec![
            MockTransport::text_update(1, 10, "slow cat"),
            MockTransport::text_update(2, 20, "/help"),
        ]);
        let generator = MockGenerator::new().with_blocking_prompt("slow cat", release.clone());
        let app = build_test_app(&transport, &generator);

        let (_, handlers) = app.poll_once(None).await.unwrap();

        let help_sent = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let answered = transport
                    .get_sent()
                    .iter()
                    .any(|m| matches!(m, SentMessage::Text { chat_id: 20, .. }));
                if answered {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(help_sent.is_ok(), "chat 20 waited on chat 10");
        assert!(!transport
            .get_sent()
            .iter()
            .any(|m| matches!(m, SentMessage::Photo { .. })));

        release.notify_one();
        for handler in handlers {
            handler.await.unwrap();
        }

        let photos: Vec<_> = transport
            .get_sent()
            .into_iter()
            .filter(|m| matches!(m, SentMessage::Photo { chat_id: 10, .. }))
            .collect();
        assert_eq!(photos.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_outage_pause() {
        let transport = (0..5).fold(MockTransport::new(), |t, _| {
            t.with_update_failure("Bad Gateway")
        });
        let app = build_test_app(&transport, &MockGenerator::new());

        let observer = transport.clone();
        let gave_up_at = Arc::new(std::sync::Mutex::new(None));
        let marker = gave_up_at.clone();
        let gave_up = async move {
            while observer.get_requested_offsets().len() < 5 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            *marker.lock().unwrap() = Some(tokio::time::Instant::now());
        };

        let stopped = tokio::time::timeout(Duration::from_secs(30), app.run_until(gave_up)).await;
        let returned_at = tokio::time::Instant::now();

        assert!(matches!(stopped, Ok(Ok(()))));
        let gave_up_at = gave_up_at.lock().unwrap().expect("shutdown fired");
        assert!(returned_at - gave_up_at < OUTAGE_PAUSE / 2);
        assert_eq!(transport.get_requested_offsets().len(), 5);
    }

    #[tokio::test]
    async fn test_poll_once_retries_transient_failures() {
        let transport = MockTransport::new()
            .with_update_failure("Bad Gateway")
            .with_updates(vec![MockTransport::text_update(4, 10, "/help")]);
        let app = build_test_app(&transport, &MockGenerator::new());

        let (offset, handlers) = app.poll_once(Some(4)).await.unwrap();
        for handler in handlers {
            handler.await.unwrap();
        }

        assert_eq!(offset, Some(5));
        assert_eq!(transport.get_requested_offsets(), vec![Some(4), Some(4)]);
        assert_eq!(transport.get_texts().len(), 1);
    }
}
