//! Trading signal labels derived from the spread z-score

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-class trading signal
///
/// Class indices follow the training targets: buy = 0, hold = 1, sell = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Spread is unusually low, expect reversion upwards
    Buy,
    /// Spread within the threshold band
    Hold,
    /// Spread is unusually high, expect reversion downwards
    Sell,
}

impl Signal {
    pub const NUM_CLASSES: usize = 3;

    /// Label a z-score
    ///
    /// `z > threshold` is a sell, `z < -threshold` a buy, everything else
    /// (including both boundaries) a hold.
    pub fn from_zscore(zscore: f64, threshold: f64) -> Self {
        if zscore > threshold {
            Signal::Sell
        } else if zscore < -threshold {
            Signal::Buy
        } else {
            Signal::Hold
        }
    }

    /// Target index used by the classifier
    pub fn class_index(self) -> i64 {
        match self {
            Signal::Buy => 0,
            Signal::Hold => 1,
            Signal::Sell => 2,
        }
    }

    pub fn from_class_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Signal::Buy),
            1 => Some(Signal::Hold),
            2 => Some(Signal::Sell),
            _ => None,
        }
    }

    /// Position direction: +1 long, 0 flat, -1 short
    pub fn direction(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Hold => 0,
            Signal::Sell => -1,
        }
    }

    pub fn all() -> [Signal; 3] {
        [Signal::Buy, Signal::Hold, Signal::Sell]
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Buy => "buy",
            Signal::Hold => "hold",
            Signal::Sell => "sell",
        };
        write!(f, "{name}")
    }
}

/// Label every z-score with the same threshold
pub fn label_zscores(zscores: &[f64], threshold: f64) -> Vec<Signal> {
    zscores
        .iter()
        .map(|&z| Signal::from_zscore(z, threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(Signal::from_zscore(1.5, 1.0), Signal::Sell);
        assert_eq!(Signal::from_zscore(-1.5, 1.0), Signal::Buy);
        assert_eq!(Signal::from_zscore(0.2, 1.0), Signal::Hold);
    }

    #[test]
    fn test_boundaries_are_hold() {
        assert_eq!(Signal::from_zscore(1.0, 1.0), Signal::Hold);
        assert_eq!(Signal::from_zscore(-1.0, 1.0), Signal::Hold);
        assert_eq!(Signal::from_zscore(1.0 + 1e-12, 1.0), Signal::Sell);
        assert_eq!(Signal::from_zscore(-1.0 - 1e-12, 1.0), Signal::Buy);
    }

    #[test]
    fn test_every_zscore_gets_one_label() {
        let zscores: Vec<f64> = (-300..=300).map(|i| i as f64 / 100.0).collect();
        let labels = label_zscores(&zscores, 1.0);

        assert_eq!(labels.len(), zscores.len());
        let buys = labels.iter().filter(|&&s| s == Signal::Buy).count();
        let holds = labels.iter().filter(|&&s| s == Signal::Hold).count();
        let sells = labels.iter().filter(|&&s| s == Signal::Sell).count();
        assert_eq!(buys, 200);
        assert_eq!(holds, 201);
        assert_eq!(sells, 200);
    }

    #[test]
    fn test_class_index_mapping() {
        for signal in Signal::all() {
            assert_eq!(Signal::from_class_index(signal.class_index()), Some(signal));
        }
        assert_eq!(Signal::from_class_index(3), None);
        assert_eq!(Signal::Buy.direction(), 1);
        assert_eq!(Signal::Sell.direction(), -1);
    }
}
