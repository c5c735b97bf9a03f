use tracing::info;

use crate::client::CalendarClient;
use crate::dispatch::ApiRequest;
use crate::errors::Error;
use crate::types::{Event, EventDraft, EventListEnvelope};

impl CalendarClient {
    pub async fn events(&self) -> Result<Vec<Event>, Error> {
        let response = self.execute(ApiRequest::get("/api/events")).await?;
        let envelope: EventListEnvelope = Self::decode(response).await?;
        info!("events fetched: count={}", envelope.data.len());
        Ok(envelope.data)
    }

    pub async fn create_event(&self, draft: &EventDraft) -> Result<(), Error> {
        let body = serde_json::to_value(draft)?;
        self.execute(ApiRequest::post("/api/events", body)).await?;
        info!("event created: title='{}'", draft.title);
        Ok(())
    }

    pub async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<(), Error> {
        let body = serde_json::to_value(draft)?;
        self.execute(ApiRequest::put(event_path(id), body)).await?;
        info!("event updated: id='{}'", id);
        Ok(())
    }

    pub async fn delete_event(&self, id: &str) -> Result<(), Error> {
        self.execute(ApiRequest::delete(event_path(id))).await?;
        info!("event deleted: id='{}'", id);
        Ok(())
    }
}

// Event ids come from the backend and land in a path segment, so anything
// outside the unreserved set gets percent-encoded.
fn event_path(id: &str) -> String {
    format!("/api/events/{}", urlencoding::encode(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_path_escapes_reserved_characters() {
        assert_eq!(event_path("abc123"), "/api/events/abc123");
        assert_eq!(event_path("ev 42/x"), "/api/events/ev%2042%2Fx");
    }
}
