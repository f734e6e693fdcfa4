// SPDX-License-Identifier: MIT

//! Assessment results returned by the remote analytics store.

use serde::{Deserialize, Serialize};

/// Mastery scores for one letter, split by exercise modality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterMastery {
    pub letter: String,
    pub sound: f64,
    pub shape: f64,
    pub sound_exercises: u32,
    pub shape_exercises: u32,
}

/// Server-computed assessment over the learner's shape/sound activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub letter_mastery: Vec<LetterMastery>,
    pub engagement_level: i32,
}

impl Assessment {
    /// Up to four letters the learner has practiced, weakest first.
    ///
    /// A letter qualifies once it has at least one exercise in either
    /// modality; ranking uses the worse of the two scores.
    pub fn letters_for_revision(&self) -> Vec<String> {
        let mut practiced: Vec<&LetterMastery> = self
            .letter_mastery
            .iter()
            .filter(|m| m.sound_exercises > 0 || m.shape_exercises > 0)
            .collect();

        practiced.sort_by(|a, b| {
            let a_min = a.sound.min(a.shape);
            let b_min = b.sound.min(b.shape);
            a_min.partial_cmp(&b_min).unwrap_or(std::cmp::Ordering::Equal)
        });

        practiced
            .into_iter()
            .take(4)
            .map(|m| m.letter.clone())
            .collect()
    }
}
