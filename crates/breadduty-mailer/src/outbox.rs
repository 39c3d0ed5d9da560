//! Outbox — queued, fire-and-forget mail dispatch.
//!
//! Callers enqueue and move on; a background worker performs the sends,
//! each on its own task so one slow recipient never delays the rest of a
//! batch. Every attempt produces a [`DispatchOutcome`] on a broadcast
//! channel, which interested parties (tests, future metrics) can subscribe
//! to. Nothing waits on it by default.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::smtp::MailTransport;

/// One mail waiting to be sent.
#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
}

/// Result of one send attempt.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub to: String,
    pub subject: String,
    /// `None` on success, the transport error message otherwise.
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Handle to the background send worker. Cheap to clone.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutboundMail>,
    outcomes: broadcast::Sender<DispatchOutcome>,
}

impl Outbox {
    /// Spawn the worker loop on the current tokio runtime.
    pub fn spawn(transport: Arc<dyn MailTransport>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMail>();
        let (outcome_tx, _) = broadcast::channel(64);
        let worker_outcomes = outcome_tx.clone();

        tokio::spawn(async move {
            while let Some(mail) = rx.recv().await {
                let transport = transport.clone();
                let outcomes = worker_outcomes.clone();
                tokio::spawn(async move {
                    let result = transport
                        .send_mail(&mail.to, &mail.to_name, &mail.subject, &mail.body)
                        .await;
                    let error = match result {
                        Ok(()) => None,
                        Err(e) => {
                            tracing::warn!("Mail to {} failed: {e}", mail.to);
                            Some(e.to_string())
                        }
                    };
                    // No subscribers is fine — outcomes are advisory.
                    let _ = outcomes.send(DispatchOutcome {
                        to: mail.to,
                        subject: mail.subject,
                        error,
                    });
                });
            }
            tracing::debug!("Outbox worker stopped");
        });

        Self {
            tx,
            outcomes: outcome_tx,
        }
    }

    /// Queue a mail. Never blocks; the send happens in the background.
    pub fn enqueue(&self, mail: OutboundMail) {
        if self.tx.send(mail).is_err() {
            tracing::warn!("Outbox worker is gone; mail dropped");
        }
    }

    /// Subscribe to send outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchOutcome> {
        self.outcomes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use breadduty_core::{Error, Result};
    use std::sync::Mutex;

    /// Records sends; fails addresses listed in `fail_for`.
    struct FakeTransport {
        sent: Mutex<Vec<(String, String)>>,
        fail_for: Vec<String>,
    }

    impl FakeTransport {
        fn new(fail_for: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail_for: fail_for.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    #[async_trait]
    impl MailTransport for FakeTransport {
        async fn send_mail(
            &self,
            to: &str,
            _to_name: &str,
            subject: &str,
            _body: &str,
        ) -> Result<()> {
            if self.fail_for.iter().any(|f| f == to) {
                return Err(Error::Transport(format!("refused: {to}")));
            }
            self.sent.lock().unwrap().push((to.into(), subject.into()));
            Ok(())
        }
    }

    fn mail(to: &str) -> OutboundMail {
        OutboundMail {
            to: to.into(),
            to_name: "Someone".into(),
            subject: "Reminder".into(),
            body: "hello".into(),
        }
    }

    #[tokio::test]
    async fn test_enqueue_delivers_and_reports() {
        let transport = FakeTransport::new(&[]);
        let outbox = Outbox::spawn(transport.clone());
        let mut outcomes = outbox.subscribe();

        outbox.enqueue(mail("ana@office.test"));
        let outcome = outcomes.recv().await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.to, "ana@office.test");
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_propagated() {
        let transport = FakeTransport::new(&["down@office.test"]);
        let outbox = Outbox::spawn(transport.clone());
        let mut outcomes = outbox.subscribe();

        // enqueue() itself cannot fail.
        outbox.enqueue(mail("down@office.test"));
        let outcome = outcomes.recv().await.unwrap();
        assert!(!outcome.is_ok());
        assert!(outcome.error.unwrap().contains("refused"));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_all_attempted() {
        let transport = FakeTransport::new(&["b@office.test"]);
        let outbox = Outbox::spawn(transport.clone());
        let mut outcomes = outbox.subscribe();

        for to in ["a@office.test", "b@office.test", "c@office.test"] {
            outbox.enqueue(mail(to));
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(outcomes.recv().await.unwrap());
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.iter().filter(|o| o.is_ok()).count(), 2);
    }
}
