// src/services/notification.rs

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

/// Mensagens enviadas fora do ciclo da requisição.
#[derive(Clone, Serialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum Notification {
    Credentials {
        to: String,
        display_name: String,
        role: String,
        temporary_password: String,
    },
    PasswordReset {
        to: String,
        display_name: String,
        temporary_password: String,
    },
}

impl Notification {
    pub fn recipient(&self) -> &str {
        match self {
            Notification::Credentials { to, .. } | Notification::PasswordReset { to, .. } => to,
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Notification::Credentials { .. } => "credentials",
            Notification::PasswordReset { .. } => "password_reset",
        }
    }
}

// Senhas nunca aparecem em logs.
impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("template", &self.template())
            .field("to", &self.recipient())
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Entrega via serviço de e-mail HTTP (POST JSON).
pub struct HttpNotifier {
    url: String,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build notifier HTTP client")?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .context("failed to reach notifier")?
            .error_for_status()
            .context("notifier returned error")?;
        Ok(())
    }
}

/// Usado quando nenhum serviço de e-mail está configurado.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        tracing::info!("📧 Notificação (apenas log): {:?}", notification);
        Ok(())
    }
}

/// Dispara e esquece: falhas são registradas e nunca chegam ao chamador.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification, timeout: Duration) {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, notifier.send(&notification)).await {
            Ok(Ok(())) => tracing::debug!("Notificação entregue: {:?}", notification),
            Ok(Err(e)) => tracing::error!("Falha ao entregar {:?}: {:#}", notification, e),
            Err(_) => tracing::error!("Tempo esgotado ao entregar {:?}", notification),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier(AtomicUsize);

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(&self, _: &Notification) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _: &Notification) -> anyhow::Result<()> {
            anyhow::bail!("smtp down")
        }
    }

    fn credentials() -> Notification {
        Notification::Credentials {
            to: "tech@acme.fr".into(),
            display_name: "Tech".into(),
            role: "technician".into(),
            temporary_password: "SuperSecret123".into(),
        }
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("tech@acme.fr"));
        assert!(!rendered.contains("SuperSecret123"));
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let notifier = Arc::new(CountingNotifier(AtomicUsize::new(0)));
        dispatch(notifier.clone(), credentials(), Duration::from_secs(1));
        for _ in 0..50 {
            if notifier.0.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_swallows_failures() {
        dispatch(Arc::new(FailingNotifier), credentials(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[test]
    fn payload_is_tagged_by_template() {
        let json = serde_json::to_value(credentials()).unwrap();
        assert_eq!(json["template"], "credentials");
        assert_eq!(json["to"], "tech@acme.fr");
    }
}
