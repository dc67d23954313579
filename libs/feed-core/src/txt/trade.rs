//! `priceIndicatorMarker` byte values and the trade-type dispatch built on
//! top of them (§4.4.2). Byte values match
//! `mx_price_indicator_markers.h`'s `PriceIndicatorMarker` enum.

use types::event::TradeType;

const CROSSED: u8 = b'D';
const COMMITTED: u8 = b'T';
const BLOCK_TRADE: u8 = b'B';
const EFR_REPORTING: u8 = b'R';
const EFP_REPORTING: u8 = b'E';
const STRATEGY_REPORTING: u8 = b'P';
const REFERENCE_PRICE: u8 = b'S';

/// `true` when the marker means "this isn't a trade at all, it's a
/// reference/settlement price update" (§4.4.2, the original's
/// `tradeQty <= 0` branch: a `FuturesTrade` carrying `ReferencePrice`
/// updates the indicative settlement price instead of printing a trade).
pub fn is_reference_price(marker: u8) -> bool {
    marker == REFERENCE_PRICE
}

/// `true` when the marker means "don't print this as a trade at all, just
/// log it" (§4.4.2: `StrategyReporting` -> log only).
pub fn is_strategy_reporting(marker: u8) -> bool {
    marker == STRATEGY_REPORTING
}

/// Maps a trade print's marker to our `TradeType`. `Crossed` and
/// `Committed` both mean an OTC guaranteed cross (§4.4.2); callers should
/// check [`is_strategy_reporting`] and [`is_reference_price`] before
/// calling this, since neither marker should reach a `Trade` event.
pub fn trade_type(marker: u8) -> TradeType {
    match marker {
        CROSSED | COMMITTED => TradeType::OtcGuaranteedCross,
        BLOCK_TRADE => TradeType::OtcBlockTrade,
        EFR_REPORTING => TradeType::OtcExchangeForSwap,
        EFP_REPORTING => TradeType::OtcExchangeForPhysicalEquityIndex,
        _ => TradeType::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_price_marker_is_not_a_trade() {
        assert!(is_reference_price(REFERENCE_PRICE));
        assert!(!is_reference_price(BLOCK_TRADE));
    }

    #[test]
    fn block_trade_and_efp_map_to_their_otc_categories() {
        assert_eq!(trade_type(BLOCK_TRADE), TradeType::OtcBlockTrade);
        assert_eq!(trade_type(EFP_REPORTING), TradeType::OtcExchangeForPhysicalEquityIndex);
        assert_eq!(trade_type(EFR_REPORTING), TradeType::OtcExchangeForSwap);
    }

    #[test]
    fn unmarked_prints_are_normal() {
        assert_eq!(trade_type(0), TradeType::Normal);
    }

    #[test]
    fn committed_is_a_guaranteed_cross_like_crossed() {
        assert_eq!(trade_type(COMMITTED), TradeType::OtcGuaranteedCross);
        assert_eq!(trade_type(CROSSED), TradeType::OtcGuaranteedCross);
    }

    #[test]
    fn strategy_reporting_is_flagged_log_only() {
        assert!(is_strategy_reporting(STRATEGY_REPORTING));
        assert!(!is_strategy_reporting(BLOCK_TRADE));
    }
}
