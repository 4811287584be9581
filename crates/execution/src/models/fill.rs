// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

use std::fmt::Display;

use meridian_core::correctness::{FAILED, check_in_range_inclusive_f64};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A probabilistic overlay over the matching engine injecting queue-position
/// and slippage realism.
///
/// With a fixed seed the model is deterministic: identical inputs produce
/// identical fill decisions.
#[derive(Clone, Debug)]
pub struct FillModel {
    /// The probability of a limit order filling when the market merely touches
    /// its price (models queue-position uncertainty).
    prob_fill_on_limit: f64,
    /// The probability of a stop order triggering when its price is merely
    /// touched (versus crossed).
    prob_fill_on_stop: f64,
    /// The probability of a market/stop-market fill slipping one tick adverse.
    prob_slippage: f64,
    rng: StdRng,
}

impl FillModel {
    /// Creates a new [`FillModel`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if any probability parameter is outside [0, 1].
    pub fn new(
        prob_fill_on_limit: f64,
        prob_fill_on_stop: f64,
        prob_slippage: f64,
        random_seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        check_in_range_inclusive_f64(prob_fill_on_limit, 0.0, 1.0, "prob_fill_on_limit")
            .expect(FAILED);
        check_in_range_inclusive_f64(prob_fill_on_stop, 0.0, 1.0, "prob_fill_on_stop")
            .expect(FAILED);
        check_in_range_inclusive_f64(prob_slippage, 0.0, 1.0, "prob_slippage").expect(FAILED);
        let rng = match random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            prob_fill_on_limit,
            prob_fill_on_stop,
            prob_slippage,
            rng,
        })
    }

    /// Returns `true` if a touched limit order should fill.
    pub fn is_limit_filled(&mut self) -> bool {
        self.event_success(self.prob_fill_on_limit)
    }

    /// Returns `true` if a touched stop order should trigger.
    pub fn is_stop_filled(&mut self) -> bool {
        self.event_success(self.prob_fill_on_stop)
    }

    /// Returns `true` if a fill should slip by one tick.
    pub fn is_slipped(&mut self) -> bool {
        self.event_success(self.prob_slippage)
    }

    fn event_success(&mut self, probability: f64) -> bool {
        match probability {
            0.0 => false,
            1.0 => true,
            _ => self.rng.random_bool(probability),
        }
    }
}

impl Display for FillModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FillModel(prob_fill_on_limit: {}, prob_fill_on_stop: {}, prob_slippage: {})",
            self.prob_fill_on_limit, self.prob_fill_on_stop, self.prob_slippage
        )
    }
}

impl Default for FillModel {
    /// Creates a new default [`FillModel`] instance with slippage disabled.
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.0, Some(0)).unwrap()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn fill_model() -> FillModel {
        FillModel::new(0.5, 0.5, 0.1, Some(42)).unwrap()
    }

    #[rstest]
    #[should_panic(
        expected = "Condition failed: invalid f64 for 'prob_fill_on_limit' not in range [0, 1], was 1.1"
    )]
    fn test_prob_fill_on_limit_out_of_range() {
        let _ = FillModel::new(1.1, 0.5, 0.1, None);
    }

    #[rstest]
    #[should_panic(
        expected = "Condition failed: invalid f64 for 'prob_slippage' not in range [0, 1], was -0.1"
    )]
    fn test_prob_slippage_out_of_range() {
        let _ = FillModel::new(0.5, 0.5, -0.1, None);
    }

    #[rstest]
    fn test_certain_probabilities() {
        let mut model = FillModel::new(1.0, 0.0, 0.0, Some(42)).unwrap();
        assert!(model.is_limit_filled());
        assert!(!model.is_stop_filled());
        assert!(!model.is_slipped());
    }

    #[rstest]
    fn test_seeded_determinism(fill_model: FillModel) {
        let mut a = fill_model.clone();
        let mut b = fill_model;
        let draws_a: Vec<bool> = (0..32).map(|_| a.is_limit_filled()).collect();
        let draws_b: Vec<bool> = (0..32).map(|_| b.is_limit_filled()).collect();
        assert_eq!(draws_a, draws_b);
    }
}
