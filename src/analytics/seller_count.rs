//! Seller-count resolution
//!
//! Shared leaf used by the discovery, velocity and category paths: picks
//! the new-offer-count slot of the statistics arrays for a requested
//! averaging window. Pure function of its inputs.

use crate::keepa::types::{CsvType, Product};

/// Averaging window for seller-count lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SellerCountWindow {
    Current,
    Day30,
    #[default]
    Day90,
    Day180,
    Day365,
}

impl SellerCountWindow {
    /// Parses a window token; unknown tokens resolve to `None` so callers
    /// can apply the 90-day default with a marked description.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "current" => Some(SellerCountWindow::Current),
            "30day" => Some(SellerCountWindow::Day30),
            "90day" => Some(SellerCountWindow::Day90),
            "180day" => Some(SellerCountWindow::Day180),
            "365day" => Some(SellerCountWindow::Day365),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SellerCountWindow::Current => "current",
            SellerCountWindow::Day30 => "30-day average",
            SellerCountWindow::Day90 => "90-day average",
            SellerCountWindow::Day180 => "180-day average",
            SellerCountWindow::Day365 => "365-day average",
        }
    }
}

/// Seller count with a human-readable description of its window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerCountInfo {
    pub count: i64,
    pub description: String,
}

/// Resolves the seller count for a product and window
///
/// Defaults to 1 when the statistics block or the slot is absent, never 0:
/// downstream margin math divides by competition-derived quantities.
pub fn resolve_seller_count(product: &Product, window: SellerCountWindow) -> SellerCountInfo {
    let Some(stats) = product.stats.as_ref() else {
        return SellerCountInfo {
            count: 1,
            description: "90-day average (no stats available)".to_string(),
        };
    };

    let count = match window {
        SellerCountWindow::Current => stats.current(CsvType::CountNew),
        SellerCountWindow::Day30 => stats.avg30(CsvType::CountNew),
        SellerCountWindow::Day90 => stats.avg90(CsvType::CountNew),
        SellerCountWindow::Day180 => stats.avg180(CsvType::CountNew),
        SellerCountWindow::Day365 => stats.avg365(CsvType::CountNew),
    };

    SellerCountInfo {
        count: count.unwrap_or(1),
        description: window.description().to_string(),
    }
}

/// Resolves from a raw window token; unknown tokens fall back to the
/// 90-day window with a "(default)"-marked description.
pub fn resolve_seller_count_token(product: &Product, token: &str) -> SellerCountInfo {
    match SellerCountWindow::parse(token) {
        Some(window) => resolve_seller_count(product, window),
        None => {
            let mut info = resolve_seller_count(product, SellerCountWindow::Day90);
            if product.stats.is_some() {
                info.description = "90-day average (default)".to_string();
            }
            info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepa::types::Stats;

    fn product_with_counts() -> Product {
        let index = CsvType::CountNew.index();
        let mut current = vec![None; index + 1];
        current[index] = Some(4);
        let mut avg30 = vec![None; index + 1];
        avg30[index] = Some(5);
        let mut avg90 = vec![None; index + 1];
        avg90[index] = Some(6);
        let mut avg180 = vec![None; index + 1];
        avg180[index] = Some(7);
        let mut avg365 = vec![None; index + 1];
        avg365[index] = Some(8);

        Product {
            asin: "B000TEST01".into(),
            stats: Some(Stats {
                current,
                avg30,
                avg90,
                avg180,
                avg365,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_each_window_reads_its_slot() {
        let product = product_with_counts();
        let cases = [
            (SellerCountWindow::Current, 4, "current"),
            (SellerCountWindow::Day30, 5, "30-day average"),
            (SellerCountWindow::Day90, 6, "90-day average"),
            (SellerCountWindow::Day180, 7, "180-day average"),
            (SellerCountWindow::Day365, 8, "365-day average"),
        ];
        for (window, expected, description) in cases {
            let info = resolve_seller_count(&product, window);
            assert_eq!(info.count, expected);
            assert_eq!(info.description, description);
        }
    }

    #[test]
    fn test_missing_stats_defaults_to_one() {
        let product = Product::default();
        let info = resolve_seller_count(&product, SellerCountWindow::Day30);
        assert_eq!(info.count, 1);
        assert_eq!(info.description, "90-day average (no stats available)");
    }

    #[test]
    fn test_missing_slot_defaults_to_one() {
        let product = Product {
            stats: Some(Stats::default()),
            ..Default::default()
        };
        let info = resolve_seller_count(&product, SellerCountWindow::Day365);
        assert_eq!(info.count, 1);
        assert_eq!(info.description, "365-day average");
    }

    #[test]
    fn test_unknown_token_falls_back_to_90_day_default() {
        let product = product_with_counts();
        let info = resolve_seller_count_token(&product, "42day");
        assert_eq!(info.count, 6);
        assert_eq!(info.description, "90-day average (default)");
    }

    #[test]
    fn test_resolution_is_pure() {
        let product = product_with_counts();
        let first = resolve_seller_count(&product, SellerCountWindow::Day90);
        let second = resolve_seller_count(&product, SellerCountWindow::Day90);
        assert_eq!(first, second);
    }
}
