use ephemeral_chat::event_producer::NullEventProducer;
use ephemeral_chat::messenger::Messenger;
use ephemeral_chat::storage::memory::InMemoryStorage;
use ephemeral_chat::ttl_reaper::TtlReaper;
use std::sync::Arc;

/// Builds a Messenger over the literal-value capacities spec §8 uses for
/// its end-to-end scenarios (`MaxChats=3`, `MaxChatSize=5`).
pub fn scenario_messenger() -> Messenger {
    Messenger::new(
        Arc::new(InMemoryStorage::new(5, 3)),
        Arc::new(NullEventProducer),
        Arc::new(TtlReaper::new()),
    )
}
