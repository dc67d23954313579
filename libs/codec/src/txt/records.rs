//! Market-data record bodies, keyed by the two-letter `msgType` that
//! follows a record's sequence number (§4.4.1). Each `decode` takes the
//! record's bytes *after* `next_frame` has stripped the `STX`/`ETX` pair
//! and *including* the `LongMsgHeader`/`MsgHeader`, since several records
//! need fields out of the header (the timestamp, mostly) alongside their
//! own body.

use crate::error::{DecodeError, DecodeResult};
use crate::txt::ascii::{decode_price, parse_digits, parse_digits_i64, parse_signed, WirePrice};
use crate::txt::header::LongMsgHeader;

fn require(buf: &[u8], need: usize, context: &'static str) -> DecodeResult<()> {
    if buf.len() < need {
        return Err(DecodeError::truncated(context, need, buf.len()));
    }
    Ok(())
}

/// `identifier = rootSymbol + symbolMonth + symbolYear + expiryDay`, the
/// key every futures-family record uses to look up its instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuturesKey {
    pub root_symbol: [u8; 6],
    pub symbol_month: u8,
    pub symbol_year: [u8; 2],
    pub expiry_day: [u8; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLevel {
    /// Numbered depth level (0-based) when [`Self::is_implied`] is false;
    /// `0` and meaningless otherwise -- the wire's `A` marker carries no
    /// numeric depth of its own.
    pub level: u8,
    /// Set when the wire's level byte was `'A'` (the implied level) rather
    /// than a digit `'1'..'5'`.
    pub is_implied: bool,
    pub bid_price: WirePrice,
    pub bid_size: i32,
    pub bid_orders_num: i32,
    pub ask_price: WirePrice,
    pub ask_size: i32,
    pub ask_orders_num: i32,
}

impl DepthLevel {
    pub const SIZE: usize = 31;

    fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT DepthLevel")?;
        let is_implied = buf[0] == b'A';
        let level = if is_implied { 0 } else { buf[0].saturating_sub(b'0').saturating_sub(1) };
        Ok(Self {
            level,
            is_implied,
            bid_price: WirePrice::decode("bidPrice", &buf[1..8], buf[8])?,
            bid_size: parse_digits_i64("bidSize", &buf[9..14])? as i32,
            bid_orders_num: parse_digits_i64("bidOrdersNum", &buf[14..16])? as i32,
            ask_price: WirePrice::decode("askPrice", &buf[16..23], buf[23])?,
            ask_size: parse_digits_i64("askSize", &buf[24..29])? as i32,
            ask_orders_num: parse_digits_i64("askOrdersNum", &buf[29..31])? as i32,
        })
    }
}

/// `H`/`HF`/`HB`/`HS`: top-of-book-and-below depth snapshot for one
/// instrument, up to 5 levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FutureMarketDepth {
    pub header: LongMsgHeader,
    pub key: FuturesKey,
    pub status_marker: u8,
    pub levels: Vec<DepthLevel>,
}

impl FutureMarketDepth {
    const FIXED_LEN: usize = 46;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::FIXED_LEN, "TXT FutureMarketDepth fixed block")?;
        let header = LongMsgHeader::decode(buf)?;
        let key = FuturesKey {
            root_symbol: buf[33..39].try_into().unwrap(),
            symbol_month: buf[39],
            symbol_year: buf[40..42].try_into().unwrap(),
            expiry_day: buf[42..44].try_into().unwrap(),
        };
        let status_marker = buf[44];
        let num_levels = (buf[45] - b'0') as usize;
        let need = Self::FIXED_LEN + num_levels * DepthLevel::SIZE;
        require(buf, need, "TXT FutureMarketDepth levels")?;

        let mut levels = Vec::with_capacity(num_levels);
        for i in 0..num_levels {
            let off = Self::FIXED_LEN + i * DepthLevel::SIZE;
            levels.push(DepthLevel::decode(&buf[off..off + DepthLevel::SIZE])?);
        }

        Ok(Self {
            header,
            key,
            status_marker,
            levels,
        })
    }
}

/// `N`/`NF`/`NB`/`NS`: daily summary stats (OHLC, settlement, volume,
/// open interest) for one instrument.
///
/// `GetVolume()` in the reference implementation reads from the 7-byte
/// `lastPrice` field with a length of 8 instead of the `volume` field --
/// an off-by-field bug (see the design notes). This decoder reads
/// `volume` correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuturesSummary {
    pub header: LongMsgHeader,
    pub key: FuturesKey,
    pub bid_price: WirePrice,
    pub bid_size: i32,
    pub ask_price: WirePrice,
    pub ask_size: i32,
    pub last_price: WirePrice,
    pub open_price: WirePrice,
    pub high_price: WirePrice,
    pub low_price: WirePrice,
    pub settlement_price: WirePrice,
    pub net_change: i64,
    pub volume: i64,
    pub previous_settlement_price: WirePrice,
    pub open_interest: i64,
    pub reason: u8,
}

impl FuturesSummary {
    pub const SIZE: usize = 157;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT FuturesSummary")?;
        let header = LongMsgHeader::decode(buf)?;
        let key = FuturesKey {
            root_symbol: buf[33..39].try_into().unwrap(),
            symbol_month: buf[39],
            symbol_year: buf[40..42].try_into().unwrap(),
            expiry_day: buf[42..44].try_into().unwrap(),
        };
        let bid_price = WirePrice::decode("bidPrice", &buf[44..51], buf[51])?;
        let bid_size = parse_digits_i64("bidSize", &buf[52..57])? as i32;
        let ask_price = WirePrice::decode("askPrice", &buf[57..64], buf[64])?;
        let ask_size = parse_digits_i64("askSize", &buf[65..70])? as i32;
        let last_price = WirePrice::decode("lastPrice", &buf[70..77], buf[77])?;
        let open_price = WirePrice::decode("openPrice", &buf[78..85], buf[85])?;
        let high_price = WirePrice::decode("highPrice", &buf[86..93], buf[93])?;
        let low_price = WirePrice::decode("lowPrice", &buf[94..101], buf[101])?;
        let settlement_price = WirePrice::decode("settlementPrice", &buf[102..109], buf[109])?;
        let net_change = parse_signed("netChange", buf[110], &buf[111..118])?;
        let volume = parse_digits_i64("volume", &buf[119..127])?;
        let previous_settlement_price =
            WirePrice::decode("previousSettlementPrice", &buf[127..134], buf[134])?;
        let open_interest = parse_digits_i64("openInterest", &buf[135..142])?;
        let reason = buf[148];

        Ok(Self {
            header,
            key,
            bid_price,
            bid_size,
            ask_price,
            ask_size,
            last_price,
            open_price,
            high_price,
            low_price,
            settlement_price,
            net_change,
            volume,
            previous_settlement_price,
            open_interest,
            reason,
        })
    }
}

/// `C`/`CF`/`CB`/`CS`: one print on the trade tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuturesTrade {
    pub header: LongMsgHeader,
    pub key: FuturesKey,
    pub volume: i64,
    pub trade_price: WirePrice,
    pub net_change: i64,
    pub price_indicator_marker: u8,
    pub trade_number: u64,
}

impl FuturesTrade {
    pub const SIZE: usize = 78;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT FuturesTrade")?;
        let header = LongMsgHeader::decode(buf)?;
        let key = FuturesKey {
            root_symbol: buf[33..39].try_into().unwrap(),
            symbol_month: buf[39],
            symbol_year: buf[40..42].try_into().unwrap(),
            expiry_day: buf[42..44].try_into().unwrap(),
        };
        let volume = parse_digits_i64("volume", &buf[44..52])?;
        let trade_price = WirePrice::decode("tradePrice", &buf[52..59], buf[59])?;
        let net_change = parse_signed("netChange", buf[60], &buf[61..68])?;
        let price_indicator_marker = buf[69];
        let trade_number = parse_digits("tradeNumber", &buf[70..78])?;

        Ok(Self {
            header,
            key,
            volume,
            trade_price,
            net_change,
            price_indicator_marker,
            trade_number,
        })
    }
}

/// `J`/`JF`/`JB`/`JS`: static instrument definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuturesInstrumentKeys {
    pub header: LongMsgHeader,
    pub key: FuturesKey,
    pub max_contracts_per_order: i64,
    pub min_contracts_per_order: i64,
    pub max_threshold_price: i64,
    pub min_threshold_price: i64,
    pub tick_increment: i64,
    pub tick_increment_decimals: i32,
    pub group_instrument: [u8; 2],
    pub instrument: [u8; 4],
    pub contract_size: i64,
    pub tick_value: i64,
    pub currency_code: u16,
    pub underlying_symbol: [u8; 12],
}

impl FuturesInstrumentKeys {
    pub const SIZE: usize = 181;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT FuturesInstrumentKeys")?;
        let header = LongMsgHeader::decode(buf)?;
        let key = FuturesKey {
            root_symbol: buf[33..39].try_into().unwrap(),
            symbol_month: buf[39],
            symbol_year: buf[40..42].try_into().unwrap(),
            expiry_day: buf[42..44].try_into().unwrap(),
        };
        let max_contracts_per_order = parse_digits_i64("maxNumOfContractsPerOrder", &buf[50..56])?;
        let min_contracts_per_order = parse_digits_i64("minNumOfContractsPerOrder", &buf[56..62])?;
        let max_threshold_price = decode_price("maxThresholdPrice", &buf[62..69], buf[69])?;
        let min_threshold_price = decode_price("minThresholdPrice", &buf[70..77], buf[77])?;
        let tick_increment_fi = buf[85];
        let tick_increment = decode_price("tickIncrement", &buf[78..85], tick_increment_fi)?;
        let tick_increment_decimals =
            crate::txt::ascii::fraction_indicator_decimals(tick_increment_fi);
        let group_instrument = buf[88..90].try_into().unwrap();
        let instrument = buf[90..94].try_into().unwrap();
        let contract_size = parse_digits_i64("contractSize", &buf[124..132])?;
        let tick_value = decode_price("tickValue", &buf[132..139], buf[139])?;
        let currency_code = parse_digits("currency", &buf[140..143])? as u16;
        let underlying_symbol = buf[143..155].try_into().unwrap();

        Ok(Self {
            header,
            key,
            max_contracts_per_order,
            min_contracts_per_order,
            max_threshold_price,
            min_threshold_price,
            tick_increment,
            tick_increment_decimals,
            group_instrument,
            instrument,
            contract_size,
            tick_value,
            currency_code,
            underlying_symbol,
        })
    }
}

/// One strategy leg, decoded out of a repeated block appended to a
/// strategy instrument-keys record. `group_instrument` + `instrument`
/// together are the leg's identifier, matched against the outright
/// `groupInstrument`/`instrument` pair captured off that outright's own
/// `FuturesInstrumentKeys` (distinct from the `rootSymbol`-based
/// identifier every other futures record is keyed by).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLeg {
    pub group_instrument: [u8; 2],
    pub instrument: [u8; 4],
    pub ratio: i32,
    /// Leg-ratio fraction indicator byte; `'A'..'G'` selects `Ask`,
    /// everything else `Bid` (§4.4.2).
    pub ratio_fi: u8,
    pub price: i64,
}

impl RawLeg {
    pub const SIZE: usize = 19;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT Legs")?;
        Ok(Self {
            group_instrument: buf[0..2].try_into().unwrap(),
            instrument: buf[2..6].try_into().unwrap(),
            ratio: parse_digits_i64("legRatio", &buf[6..10])? as i32,
            ratio_fi: buf[10],
            price: decode_price("legPrice", &buf[11..18], buf[18])?,
        })
    }
}

pub fn decode_legs(buf: &[u8], count: usize) -> DecodeResult<Vec<RawLeg>> {
    require(buf, count * RawLeg::SIZE, "TXT Legs block")?;
    (0..count)
        .map(|i| RawLeg::decode(&buf[i * RawLeg::SIZE..(i + 1) * RawLeg::SIZE]))
        .collect()
}

/// `JS`: strategy instrument definition -- a wholly different fixed
/// layout from the outright `J`/`JF`/`JB` keys record (no `FuturesKey`,
/// a `strategySymbol` instead of `rootSymbol`, and up to 40 trailing
/// `Legs` blocks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyInstrumentKeys {
    pub header: LongMsgHeader,
    pub strategy_symbol: [u8; 30],
    pub tick_increment_raw: [u8; 7],
    pub tick_increment_fi: u8,
    pub group_instrument: [u8; 2],
    pub instrument: [u8; 4],
    pub legs: Vec<RawLeg>,
}

impl StrategyInstrumentKeys {
    const FIXED_LEN: usize = 162;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::FIXED_LEN, "TXT StrategyInstrumentKeys fixed block")?;
        let header = LongMsgHeader::decode(buf)?;
        let strategy_symbol = buf[33..63].try_into().unwrap();
        let tick_increment_raw = buf[96..103].try_into().unwrap();
        let tick_increment_fi = buf[103];
        let group_instrument = buf[106..108].try_into().unwrap();
        let instrument = buf[108..112].try_into().unwrap();
        let legs_num = parse_digits("legsNum", &buf[160..162])? as usize;
        let need = Self::FIXED_LEN + legs_num * RawLeg::SIZE;
        require(buf, need, "TXT StrategyInstrumentKeys legs")?;
        let legs = decode_legs(&buf[Self::FIXED_LEN..], legs_num)?;

        Ok(Self {
            header,
            strategy_symbol,
            tick_increment_raw,
            tick_increment_fi,
            group_instrument,
            instrument,
            legs,
        })
    }

    /// The literal tick-increment digits as ASCII, used to tell a numeric
    /// increment (e.g. `b"0000025"`) apart from a tick-table reference
    /// (`b"TT01   "`, left-justified with trailing spaces) the way the
    /// reference handler's string-prefix check does.
    pub fn tick_increment_is_table_ref(&self) -> bool {
        self.tick_increment_raw.starts_with(b"TT")
    }

    pub fn tick_table_name(&self) -> [u8; 2] {
        [self.tick_increment_raw[2], self.tick_increment_raw[3]]
    }

    /// Decodes the literal numeric tick increment (only meaningful when
    /// [`Self::tick_increment_is_table_ref`] is `false`).
    pub fn tick_increment_numeric(&self) -> DecodeResult<i64> {
        decode_price("tickIncrement", &self.tick_increment_raw, self.tick_increment_fi)
    }

    pub fn tick_increment_decimals(&self) -> i32 {
        crate::txt::ascii::fraction_indicator_decimals(self.tick_increment_fi)
    }
}

/// `GR`: instrument-group trading-status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupStatus {
    pub header: LongMsgHeader,
    pub root_symbol: [u8; 6],
    pub group_status: u8,
}

impl GroupStatus {
    pub const SIZE: usize = 40;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT GroupStatus")?;
        Ok(Self {
            header: LongMsgHeader::decode(buf)?,
            root_symbol: buf[33..39].try_into().unwrap(),
            group_status: buf[39],
        })
    }
}

/// `GS`: same as `GroupStatus` but addressed to a strategy group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupStatusStrategies {
    pub header: LongMsgHeader,
    pub inst_group: [u8; 2],
    pub group_status: u8,
}

impl GroupStatusStrategies {
    pub const SIZE: usize = 36;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT GroupStatusStrategies")?;
        Ok(Self {
            header: LongMsgHeader::decode(buf)?,
            inst_group: buf[33..35].try_into().unwrap(),
            group_status: buf[35],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTableEntry {
    pub min_price: i64,
    pub tick_price: i64,
}

impl TickTableEntry {
    pub const SIZE: usize = 16;

    fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT TTEntry")?;
        Ok(Self {
            min_price: decode_price("minPrice", &buf[0..7], buf[7])?,
            tick_price: decode_price("tickPrice", &buf[8..15], buf[15])?,
        })
    }
}

/// `TT`: named tick table, published once per name and referenced by
/// instrument definitions thereafter (§4.4.2's tick-table handling).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickTable {
    pub header: LongMsgHeader,
    pub name: [u8; 50],
    pub short_name: [u8; 2],
    pub entries: Vec<TickTableEntry>,
}

impl TickTable {
    const FIXED_LEN: usize = 87;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::FIXED_LEN, "TXT TickTable fixed block")?;
        let header = LongMsgHeader::decode(buf)?;
        let name = buf[33..83].try_into().unwrap();
        let short_name = buf[83..85].try_into().unwrap();
        let entries_num = parse_digits("entriesNum", &buf[85..87])? as usize;
        let need = Self::FIXED_LEN + entries_num * TickTableEntry::SIZE;
        require(buf, need, "TXT TickTable entries")?;

        let entries = (0..entries_num)
            .map(|i| {
                let off = Self::FIXED_LEN + i * TickTableEntry::SIZE;
                TickTableEntry::decode(&buf[off..off + TickTableEntry::SIZE])
            })
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self {
            header,
            name,
            short_name,
            entries,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOfDay {
    pub header: LongMsgHeader,
    pub business_date: [u8; 8],
}

impl StartOfDay {
    pub const SIZE: usize = 41;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT StartOfDay")?;
        Ok(Self {
            header: LongMsgHeader::decode(buf)?,
            business_date: buf[33..41].try_into().unwrap(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfTransmission {
    pub header: LongMsgHeader,
}

impl EndOfTransmission {
    pub const SIZE: usize = 39;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT EndOfTransmission")?;
        Ok(Self {
            header: LongMsgHeader::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfSales {
    pub header: LongMsgHeader,
}

impl EndOfSales {
    pub const SIZE: usize = 39;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT EndOfSales")?;
        Ok(Self {
            header: LongMsgHeader::decode(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub header: LongMsgHeader,
}

impl Heartbeat {
    pub const SIZE: usize = 38;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT Heartbeat")?;
        Ok(Self {
            header: LongMsgHeader::decode(buf)?,
        })
    }
}

/// The four `Q*` "beginning of summary" records carry no fields beyond
/// the header; they exist only to bound a batch of `N`-family records
/// within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeginningOfSummary {
    pub header: LongMsgHeader,
}

impl BeginningOfSummary {
    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        Ok(Self {
            header: LongMsgHeader::decode(buf)?,
        })
    }
}

/// `D`: futures request-for-quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuturesRequestForQuote {
    pub header: LongMsgHeader,
    pub key: FuturesKey,
    pub requested_size: i64,
    pub requested_market_side: u8,
}

impl FuturesRequestForQuote {
    pub const SIZE: usize = 53;

    pub fn decode(buf: &[u8]) -> DecodeResult<Self> {
        require(buf, Self::SIZE, "TXT FuturesRequestForQuote")?;
        let header = LongMsgHeader::decode(buf)?;
        let key = FuturesKey {
            root_symbol: buf[33..39].try_into().unwrap(),
            symbol_month: buf[39],
            symbol_year: buf[40..42].try_into().unwrap(),
            expiry_day: buf[42..44].try_into().unwrap(),
        };
        let requested_size = parse_digits_i64("requestedSize", &buf[44..52])?;
        let requested_market_side = buf[52];

        Ok(Self {
            header,
            key,
            requested_size,
            requested_market_side,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txt::header::{ETX, STX};

    fn sample_header(seq: &str, msg_type: &[u8; 2]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(seq.as_bytes());
        buf.extend_from_slice(msg_type);
        buf.extend_from_slice(&[b'0'; 20]);
        buf
    }

    #[test]
    fn decodes_futures_summary_volume_from_the_volume_field_not_last_price() {
        let mut buf = sample_header("0000000001", b"NF");
        buf.extend_from_slice(b"X"); // exchangeId
        buf.extend_from_slice(b"ESH25 "); // rootSymbol[6]
        buf.push(b'H'); // symbolMonth
        buf.extend_from_slice(b"25"); // symbolYear
        buf.extend_from_slice(b"18"); // expiryDay
        buf.extend_from_slice(b"0001234"); // bidPrice
        buf.push(b'2'); // bidFI
        buf.extend_from_slice(b"00010"); // bidSize
        buf.extend_from_slice(b"0001235"); // askPrice
        buf.push(b'2'); // askFI
        buf.extend_from_slice(b"00012"); // askSize
        buf.extend_from_slice(b"0009999"); // lastPrice -- deliberately NOT equal to volume
        buf.push(b'2'); // lastFI
        buf.extend_from_slice(b"0001200"); // openPrice
        buf.push(b'2');
        buf.extend_from_slice(b"0001300"); // highPrice
        buf.push(b'2');
        buf.extend_from_slice(b"0001100"); // lowPrice
        buf.push(b'2');
        buf.extend_from_slice(b"0001250"); // settlementPrice
        buf.push(b'2');
        buf.push(b'+'); // netChangeSign
        buf.extend_from_slice(b"0000050"); // netChange
        buf.push(b'2'); // netChangeFI
        buf.extend_from_slice(b"00004242"); // volume -- the real value
        buf.extend_from_slice(b"0001240"); // previousSettlementPrice
        buf.push(b'2');
        buf.extend_from_slice(b"0001000"); // openInterest
        buf.extend_from_slice(b"250118"); // openInterestDate
        buf.push(b'E'); // reason
        buf.extend_from_slice(b"0001230"); // externalPriceAtSource
        buf.push(b'2');

        let decoded = FuturesSummary::decode(&buf).unwrap();
        assert_eq!(decoded.volume, 4242);
        assert_ne!(decoded.volume, decoded.last_price.raw);
    }

    #[test]
    fn depth_record_reads_only_the_declared_level_count() {
        let mut buf = sample_header("0000000002", b"H ");
        buf.push(b'X');
        buf.extend_from_slice(b"ESH25 ");
        buf.push(b'H');
        buf.extend_from_slice(b"25");
        buf.extend_from_slice(b"18");
        buf.push(b'O'); // statusMarker
        buf.push(b'1'); // numOfLevel = 1
        // one DepthLevel, 31 bytes
        buf.push(b'1'); // level
        buf.extend_from_slice(b"0001000"); // bidPrice
        buf.push(b'2');
        buf.extend_from_slice(b"00005"); // bidSize
        buf.extend_from_slice(b"02"); // bidOrdersNum
        buf.extend_from_slice(b"0001001"); // askPrice
        buf.push(b'2');
        buf.extend_from_slice(b"00007"); // askSize
        buf.extend_from_slice(b"03"); // askOrdersNum

        let decoded = FutureMarketDepth::decode(&buf).unwrap();
        assert_eq!(decoded.levels.len(), 1);
        assert_eq!(decoded.levels[0].bid_size, 5);
        assert_eq!(decoded.levels[0].ask_orders_num, 3);
        assert!(!decoded.levels[0].is_implied);
        assert_eq!(decoded.levels[0].level, 0);
    }

    #[test]
    fn depth_level_a_marker_decodes_as_implied() {
        let mut buf = sample_header("0000000004", b"HB");
        buf.push(b'X');
        buf.extend_from_slice(b"ESH25 ");
        buf.push(b'H');
        buf.extend_from_slice(b"25");
        buf.extend_from_slice(b"18");
        buf.push(b'O');
        buf.push(b'1');
        buf.push(b'A'); // implied level marker
        buf.extend_from_slice(b"0001000");
        buf.push(b'2');
        buf.extend_from_slice(b"00003");
        buf.extend_from_slice(b"01");
        buf.extend_from_slice(b"0001001");
        buf.push(b'2');
        buf.extend_from_slice(b"00004");
        buf.extend_from_slice(b"02");

        let decoded = FutureMarketDepth::decode(&buf).unwrap();
        assert!(decoded.levels[0].is_implied);
        assert_eq!(decoded.levels[0].level, 0);
        assert_eq!(decoded.levels[0].bid_size, 3);
    }

    #[test]
    fn frame_strips_stx_etx_before_record_decode() {
        let mut framed = vec![STX];
        framed.extend_from_slice(b"0000000003");
        framed.extend_from_slice(b"V ");
        framed.extend_from_slice(&[b'0'; 20]);
        framed.extend_from_slice(b"120000");
        framed.push(ETX);

        let (record, _) = crate::txt::header::next_frame(&framed, 0).unwrap().unwrap();
        let hb = Heartbeat::decode(record).unwrap();
        assert_eq!(hb.header.seq_num, 3);
    }
}
