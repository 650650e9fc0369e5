//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use yass_build::Reporter;

/// One message received by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Section(String),
    Info(String),
    Line(String),
    Warn(String),
}

/// Reporter that keeps every message for later assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.collect(|e| match e {
            Event::Line(l) => Some(l.clone()),
            _ => None,
        })
    }

    pub fn infos(&self) -> Vec<String> {
        self.collect(|e| match e {
            Event::Info(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<String> {
        self.collect(|e| match e {
            Event::Warn(m) => Some(m.clone()),
            _ => None,
        })
    }

    fn collect(&self, f: impl Fn(&Event) -> Option<String>) -> Vec<String> {
        self.events.lock().unwrap().iter().filter_map(f).collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, title: &str) {
        self.push(Event::Section(title.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(Event::Info(message.to_string()));
    }

    fn line(&self, line: &str) {
        self.push(Event::Line(line.to_string()));
    }

    fn warn(&self, message: &str) {
        self.push(Event::Warn(message.to_string()));
    }
}
