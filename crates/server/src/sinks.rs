//! Builds the intake sinks from settings. Each client is constructed once
//! and shared by every request.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use intake::{IntakeContext, NotifyAddresses};
use mailer::{Mailer, MailerConfig, Notifier};
use storage::{RestTableStore, Storage, SubmissionStore};
use tracing::{error, info};

use crate::config::{store_target, Settings, StoreTarget};

pub(crate) async fn build_intake_context(settings: &Settings) -> anyhow::Result<IntakeContext> {
    let sink_timeout = Duration::from_secs(settings.sink_timeout_secs.max(1));

    let store: Option<Arc<dyn SubmissionStore>> = match store_target(settings)? {
        Some(StoreTarget::Sqlite(database_url)) => {
            let storage = Storage::new(&database_url).await.map_err(|error| {
                error!(
                    %database_url,
                    %error,
                    "failed to open SQLite database; verify parent directory exists and permissions are correct"
                );
                error
            })?;
            info!(%database_url, "persisting submissions to sqlite");
            Some(Arc::new(storage))
        }
        Some(StoreTarget::Rest { url, service_key }) => {
            let store = RestTableStore::new(&url, service_key, sink_timeout)?;
            info!(%url, "persisting submissions through rest table api");
            Some(Arc::new(store))
        }
        None => None,
    };

    let notifier: Option<Arc<dyn Notifier>> = match settings.email_api_key.as_deref() {
        Some(api_key) => {
            let mailer = Mailer::new(MailerConfig {
                api_url: settings.email_api_url.clone(),
                api_key: api_key.to_string(),
                timeout: sink_timeout,
            })
            .context("failed to configure notification mailer")?;
            info!(endpoint = %mailer.endpoint(), to = %settings.notify_to, "notification email enabled");
            Some(Arc::new(mailer))
        }
        None => None,
    };

    if store.is_none() && notifier.is_none() {
        info!("no submission sinks configured; submissions will be written to the log");
    }

    Ok(IntakeContext {
        store,
        notifier,
        addresses: NotifyAddresses {
            from: settings.email_from.clone(),
            to: settings.notify_to.clone(),
        },
        sink_timeout,
    })
}
