//! Diagnostic [`MarketDataSink`] for standalone operation. Same shape as
//! `bin-adapter`'s: downstream relaying is out of scope (§2 Non-goals),
//! this just logs what the channel processor emits.

use feed_core::sink::{BookType, DefinitionAction, MarketDataSink};
use tracing::{debug, info};
use types::event::{ChannelStatus, MarketEvent};
use types::ids::{ChannelId, InstrumentDesc};
use types::instrument::InstrumentDefinition;

#[derive(Debug, Default)]
pub struct TracingSink;

impl MarketDataSink for TracingSink {
    fn on_instrument_definition(
        &mut self,
        indesc: InstrumentDesc,
        channel_id: ChannelId,
        book_type: BookType,
        implied_book_type: BookType,
        action: DefinitionAction,
        definition: &InstrumentDefinition,
    ) {
        info!(
            ?channel_id,
            indesc = indesc.0,
            identifier = %definition.identifier,
            ?book_type,
            ?implied_book_type,
            ?action,
            "instrument definition"
        );
    }

    fn on_incremental(&mut self, event: MarketEvent) {
        debug!(channel_id = event.envelope.channel_id.0, indesc = event.envelope.indesc.0, payload = ?event.payload, "incremental");
    }

    fn on_snapshot(&mut self, event: MarketEvent) {
        debug!(channel_id = event.envelope.channel_id.0, indesc = event.envelope.indesc.0, payload = ?event.payload, "snapshot");
    }

    fn on_channel_status(&mut self, channel_id: ChannelId, status: ChannelStatus) {
        info!(?channel_id, ?status, "channel status");
    }
}
