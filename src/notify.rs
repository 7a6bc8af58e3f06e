//! Notification sink for human-readable announcements
//!
//! Fire-and-forget: the core never waits on or reads back from the sink.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::core::types::Color;

pub trait NotificationSink: Send {
    fn notify(&mut self, message: &str, color: Color);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub color: Color,
}

/// Sink that forwards announcements to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&mut self, message: &str, _color: Color) {
        tracing::info!("{}", message);
    }
}

/// Sink that keeps every announcement, for UIs that poll
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.entries)
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&mut self, message: &str, color: Color) {
        self.entries.push(Notification {
            message: message.to_string(),
            color,
        });
    }
}

/// A log the world writes to while another owner reads it
pub type SharedLog = Arc<Mutex<NotificationLog>>;

impl<S: NotificationSink> NotificationSink for Arc<Mutex<S>> {
    fn notify(&mut self, message: &str, color: Color) {
        match self.lock() {
            Ok(mut sink) => sink.notify(message, color),
            Err(_) => tracing::warn!("Notification sink poisoned, dropping {:?}", message),
        }
    }
}
