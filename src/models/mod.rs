// SPDX-License-Identifier: MIT

//! Data models for the learner profile and activity ledger.

pub mod activity;
pub mod assessment;
pub mod learner;

pub use activity::{ActivityLogEntry, ActivityValue};
pub use assessment::{Assessment, LetterMastery};
pub use learner::{LearnerRecord, PropertyValue};
