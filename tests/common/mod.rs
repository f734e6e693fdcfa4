// SPDX-License-Identifier: MIT

use learner_kit::config::Config;
use learner_kit::storage::{KeyValueStore, MemoryStore};
use learner_kit::LearnerKit;
use std::sync::Arc;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test subscriber once (RUST_LOG controls verbosity).
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Create an in-memory store shared between "launches".
#[allow(dead_code)]
pub fn test_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

/// Create a kit over the given store, already kickstarted.
#[allow(dead_code)]
pub fn test_kit_on(storage: Arc<dyn KeyValueStore>) -> LearnerKit {
    init_tracing();
    let mut kit = LearnerKit::new(Config::default(), storage);
    kit.kickstart(None, &[]);
    kit
}

/// Create a kit with a fresh private store.
#[allow(dead_code)]
pub fn test_kit() -> LearnerKit {
    test_kit_on(test_store())
}

/// Create a kickstarted kit pointed at a mock server.
#[allow(dead_code)]
pub fn test_kit_against(server_url: &str, storage: Arc<dyn KeyValueStore>) -> LearnerKit {
    init_tracing();
    let mut config = Config::default();
    config.server_url = server_url.to_string();
    let mut kit = LearnerKit::new(config, storage);
    kit.kickstart(None, &[]);
    kit
}
