//! Downstream consumer interface (§6 "Downstream sink").
//!
//! Invoked only from the worker executor (§5); the sink itself decides how
//! to fan events out (a ring buffer, an mpsc channel, a direct in-process
//! handler). Segment/channel processors never buffer events on the sink's
//! behalf.

use types::event::{ChannelStatus, MarketEvent};
use types::ids::{ChannelId, InstrumentDesc};
use types::instrument::InstrumentDefinition;

/// Which book an instrument definition update targets, mirroring the
/// BIN/TXT book-type split carried in the definition callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookType {
    Outright,
    Implied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionAction {
    Add,
    Update,
    Delete,
}

pub trait MarketDataSink {
    fn on_instrument_definition(
        &mut self,
        indesc: InstrumentDesc,
        channel_id: ChannelId,
        book_type: BookType,
        implied_book_type: BookType,
        action: DefinitionAction,
        definition: &InstrumentDefinition,
    );

    fn on_incremental(&mut self, event: MarketEvent);

    fn on_snapshot(&mut self, event: MarketEvent);

    fn on_channel_status(&mut self, channel_id: ChannelId, status: ChannelStatus);
}

/// Test/example sink that records everything it's handed, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub definitions: Vec<(InstrumentDesc, DefinitionAction)>,
    pub definition_bodies: Vec<InstrumentDefinition>,
    pub incremental: Vec<MarketEvent>,
    pub snapshot: Vec<MarketEvent>,
    pub statuses: Vec<(ChannelId, ChannelStatus)>,
}

impl MarketDataSink for RecordingSink {
    fn on_instrument_definition(
        &mut self,
        indesc: InstrumentDesc,
        _channel_id: ChannelId,
        _book_type: BookType,
        _implied_book_type: BookType,
        action: DefinitionAction,
        definition: &InstrumentDefinition,
    ) {
        self.definitions.push((indesc, action));
        self.definition_bodies.push(definition.clone());
    }

    fn on_incremental(&mut self, event: MarketEvent) {
        self.incremental.push(event);
    }

    fn on_snapshot(&mut self, event: MarketEvent) {
        self.snapshot.push(event);
    }

    fn on_channel_status(&mut self, channel_id: ChannelId, status: ChannelStatus) {
        self.statuses.push((channel_id, status));
    }
}
