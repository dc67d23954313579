//! TXT status-marker mapping (§4.4.3). Byte values match the Montreal
//! HSVF `statusMarker` field carried on every `FutureMarketDepth` record.

use types::event::StatusValue;

const PRE_OPENING: u8 = b'Y';
const OPENING: u8 = b'O';
const CONTINUOUS_TRADING: u8 = b'T';
const FORBIDDEN: u8 = b'F';
const INTERVENTION_BEFORE_OPENING: u8 = b'E';
const HALTED_TRADING: u8 = b'H';
const RESERVED: u8 = b'R';
const SUSPENDED: u8 = b'S';
const SURVEILLANCE_INTERVENTION: u8 = b'A';
const END_OF_DAY_INQUIRIES: u8 = b'C';

pub fn status_value(marker: u8) -> StatusValue {
    match marker {
        PRE_OPENING => StatusValue::PreOpen,
        OPENING => StatusValue::Auction,
        CONTINUOUS_TRADING => StatusValue::Open,
        FORBIDDEN => StatusValue::Closed,
        INTERVENTION_BEFORE_OPENING => StatusValue::PreTrading,
        HALTED_TRADING => StatusValue::Freeze,
        RESERVED => StatusValue::Reserve,
        SUSPENDED => StatusValue::PreOpen,
        SURVEILLANCE_INTERVENTION => StatusValue::PostTrading,
        END_OF_DAY_INQUIRIES => StatusValue::Closed,
        _ => StatusValue::Open, // IfNotUsed
    }
}

pub fn is_continuous_trading(marker: u8) -> bool {
    marker == CONTINUOUS_TRADING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_trading_maps_to_open() {
        assert_eq!(status_value(CONTINUOUS_TRADING), StatusValue::Open);
        assert!(is_continuous_trading(CONTINUOUS_TRADING));
    }

    #[test]
    fn suspended_maps_to_preopen_like_forbidden_maps_to_closed() {
        assert_eq!(status_value(SUSPENDED), StatusValue::PreOpen);
        assert_eq!(status_value(FORBIDDEN), StatusValue::Closed);
    }

    #[test]
    fn unused_marker_falls_back_to_open() {
        assert_eq!(status_value(b'?'), StatusValue::Open);
    }

    #[test]
    fn pre_opening_and_intervention_before_opening_match_the_wire_letters() {
        assert_eq!(status_value(PRE_OPENING), StatusValue::PreOpen);
        assert_eq!(status_value(INTERVENTION_BEFORE_OPENING), StatusValue::PreTrading);
        assert_eq!(status_value(SURVEILLANCE_INTERVENTION), StatusValue::PostTrading);
        assert_eq!(status_value(END_OF_DAY_INQUIRIES), StatusValue::Closed);
    }
}
