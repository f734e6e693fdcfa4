// SPDX-License-Identifier: MIT

//! Services module - learner, ledger, and sync logic.

pub mod activity;
pub mod analytics;
pub mod api;
pub mod learner;

pub use activity::{ActivityService, ValuePolicy};
pub use api::ApiClient;
pub use learner::LearnerService;
