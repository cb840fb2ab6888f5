//! Observable status text shown to the user

use meshscope_core::{ChangeNotifier, SubscriptionId};
use std::sync::RwLock;

/// The current status message plus change notification
#[derive(Debug, Default)]
pub struct StatusLine {
    text: RwLock<String>,
    notifier: ChangeNotifier<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the status text; subscribers are notified only on change
    pub fn set(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut current = self.text.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            if *current == text {
                return;
            }
            current.clone_from(&text);
        }

        tracing::info!(status = %text);
        self.notifier.notify(&text);
    }

    pub fn get(&self) -> String {
        self.text
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.set(String::new());
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}
