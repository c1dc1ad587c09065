// rest/sse.rs — SSE push event bridge.
//
// GET /api/v1/assessments/{id}/events
//
// Streams platform events for one assessment as Server-Sent Events. The UI
// uses this to show auto-save and report-generation progress. The client
// subscribes to the daemon's broadcast channel and forwards matching events.

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::stream;
use std::sync::Arc;
use std::time::Duration;

use crate::AppContext;

pub async fn assessment_events_sse(
    State(ctx): State<Arc<AppContext>>,
    Path(assessment_id): Path<String>,
) -> impl IntoResponse {
    let rx = ctx.events.subscribe();

    let s = stream::unfold((rx, assessment_id), move |(mut rx, aid)| async move {
        loop {
            match rx.recv().await {
                Ok(event_str) => {
                    let event: serde_json::Value = match serde_json::from_str(&event_str) {
                        Ok(v) => v,
                        Err(_) => continue,
                    };

                    // Forward events for this assessment or global ones.
                    let event_assessment = event
                        .get("params")
                        .and_then(|p| p.get("assessment_id"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("");

                    if event_assessment == aid || event_assessment.is_empty() {
                        let name = event
                            .get("event")
                            .and_then(|v| v.as_str())
                            .unwrap_or("event")
                            .to_string();
                        let sse_event = Event::default().data(event_str).event(name);
                        return Some((Ok::<Event, std::convert::Infallible>(sse_event), (rx, aid)));
                    }
                    // Not our assessment — keep waiting.
                }
                Err(_) => return None,
            }
        }
    });

    Sse::new(s).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
