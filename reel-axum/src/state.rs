use reel_media::{Catalog, DeliveryService, IngestService, Moderator};

/// Shared by every handler. Each service is cheap to clone.
#[derive(Clone)]
pub struct ReelState {
    pub ingest: IngestService,
    pub moderator: Moderator,
    pub delivery: DeliveryService,
    pub catalog: Catalog,
}

impl ReelState {
    pub fn new(
        ingest: IngestService,
        moderator: Moderator,
        delivery: DeliveryService,
        catalog: Catalog,
    ) -> Self {
        Self {
            ingest,
            moderator,
            delivery,
            catalog,
        }
    }
}
