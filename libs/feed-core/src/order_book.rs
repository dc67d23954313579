//! Order-Book State (§4.2, TXT only). A per-identifier, per-side vector of
//! `{price, qty}` sized by level, maintained by the Channel Processor as it
//! applies `LevelBook` deltas from depth records.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Level {
    pub price: i64,
    pub qty: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderBookError {
    #[error("level {level} is out of range for a book with {len} levels on this side")]
    LevelOutOfRange { level: usize, len: usize },
}

/// Top-of-book reading from [`OrderBook::top_bid_equals_top_ask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TheoreticalOpen {
    pub matched: bool,
    pub price: i64,
    pub qty: i64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: Vec<Level>,
    asks: Vec<Level>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Level> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    fn side(&self, side: Side) -> &[Level] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// `level == len` appends a new bottom level; `level < len` overwrites
    /// an existing one; anything else is a protocol violation (a level
    /// gap), since real-time depth updates are meant to arrive densely.
    pub fn new_or_change(&mut self, side: Side, level: usize, price: i64, qty: i64) -> Result<(), OrderBookError> {
        let levels = self.side_mut(side);
        if level == levels.len() {
            levels.push(Level { price, qty });
            Ok(())
        } else if level < levels.len() {
            levels[level] = Level { price, qty };
            Ok(())
        } else {
            Err(OrderBookError::LevelOutOfRange { level, len: levels.len() })
        }
    }

    /// Truncates every level at or beyond `level`.
    pub fn delete_from(&mut self, side: Side, level: usize) {
        let levels = self.side_mut(side);
        if level < levels.len() {
            levels.truncate(level);
        }
    }

    pub fn top(&self, side: Side) -> Option<Level> {
        self.side(side).first().copied()
    }

    /// §4.2: "iff both sides non-empty and `bids[0].price == asks[0].price`".
    pub fn top_bid_equals_top_ask(&self) -> TheoreticalOpen {
        match (self.top(Side::Bid), self.top(Side::Ask)) {
            (Some(bid), Some(ask)) if bid.price == ask.price => TheoreticalOpen {
                matched: true,
                price: bid.price,
                qty: bid.qty.min(ask.qty),
            },
            _ => TheoreticalOpen { matched: false, price: 0, qty: 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appending_levels_in_order_builds_the_book() {
        let mut book = OrderBook::new();
        book.new_or_change(Side::Bid, 0, 100, 5).unwrap();
        book.new_or_change(Side::Bid, 1, 99, 7).unwrap();
        assert_eq!(book.top(Side::Bid), Some(Level { price: 100, qty: 5 }));
    }

    #[test]
    fn overwriting_an_existing_level_replaces_it_in_place() {
        let mut book = OrderBook::new();
        book.new_or_change(Side::Bid, 0, 100, 5).unwrap();
        book.new_or_change(Side::Bid, 0, 101, 9).unwrap();
        assert_eq!(book.top(Side::Bid), Some(Level { price: 101, qty: 9 }));
    }

    #[test]
    fn a_level_gap_is_rejected() {
        let mut book = OrderBook::new();
        let err = book.new_or_change(Side::Bid, 2, 100, 5).unwrap_err();
        assert!(matches!(err, OrderBookError::LevelOutOfRange { level: 2, len: 0 }));
    }

    #[test]
    fn delete_from_truncates_deeper_levels() {
        let mut book = OrderBook::new();
        book.new_or_change(Side::Bid, 0, 100, 5).unwrap();
        book.new_or_change(Side::Bid, 1, 99, 7).unwrap();
        book.delete_from(Side::Bid, 0);
        assert_eq!(book.top(Side::Bid), None);
    }

    #[test]
    fn matched_top_of_book_reports_the_smaller_quantity() {
        let mut book = OrderBook::new();
        book.new_or_change(Side::Bid, 0, 100, 5).unwrap();
        book.new_or_change(Side::Ask, 0, 100, 3).unwrap();
        let open = book.top_bid_equals_top_ask();
        assert_eq!(open, TheoreticalOpen { matched: true, price: 100, qty: 3 });
    }

    #[test]
    fn unmatched_top_of_book_reports_not_matched() {
        let mut book = OrderBook::new();
        book.new_or_change(Side::Bid, 0, 100, 5).unwrap();
        book.new_or_change(Side::Ask, 0, 101, 3).unwrap();
        assert_eq!(book.top_bid_equals_top_ask(), TheoreticalOpen { matched: false, price: 0, qty: 0 });
    }
}
