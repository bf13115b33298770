//! Name to logger lookup
//!
//! The registry is an ordinary value: construct one at the composition root
//! and pass it to whatever needs to look loggers up by name.

use super::error::{LoggerError, Result};
use super::logger::Logger;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct LoggerRegistry {
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `logger` under `name`, returning the logger it replaced
    pub fn register(&self, name: impl Into<String>, logger: Arc<Logger>) -> Option<Arc<Logger>> {
        self.loggers.lock().insert(name.into(), logger)
    }

    /// Register `logger` under its own name
    pub fn register_logger(&self, logger: Arc<Logger>) -> Option<Arc<Logger>> {
        let name = logger.name().to_string();
        self.register(name, logger)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Logger>> {
        self.get(name).ok_or_else(|| LoggerError::not_found(name))
    }

    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.lock().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.lock().remove(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.loggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.lock().is_empty()
    }

    /// Shut down every registered logger. The registry lock is not held
    /// while loggers drain.
    pub fn shutdown_all(&self) {
        let loggers: Vec<Arc<Logger>> = self.loggers.lock().values().cloned().collect();
        for logger in loggers {
            logger.shutdown();
        }
    }
}
