use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    SaveCv,
    ScanCv,
    MatchJob,
    ImproveCv,
    ExportPdf,
}

impl RequestKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "save_cv" => Some(RequestKind::SaveCv),
            "scan_cv" => Some(RequestKind::ScanCv),
            "match_job" => Some(RequestKind::MatchJob),
            "improve_cv" => Some(RequestKind::ImproveCv),
            "export_pdf" => Some(RequestKind::ExportPdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Settled { ok: bool },
}

type Slots = Arc<Mutex<HashMap<(Uuid, RequestKind), RequestState>>>;

/// At most one in-flight request per user and kind.
#[derive(Clone, Default)]
pub struct RequestTracker {
    slots: Slots,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, user_id: Uuid, kind: RequestKind) -> RequestState {
        let slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.get(&(user_id, kind)).copied().unwrap_or_default()
    }

    /// Marks the slot pending. A second call while pending is a `Conflict`.
    pub fn begin(&self, user_id: Uuid, kind: RequestKind) -> Result<RequestTicket> {
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        let slot = slots.entry((user_id, kind)).or_default();
        if *slot == RequestState::Pending {
            return Err(Error::Conflict(
                "A request of this kind is already in progress".to_string(),
            ));
        }
        *slot = RequestState::Pending;
        Ok(RequestTicket {
            slots: self.slots.clone(),
            key: (user_id, kind),
            finished: false,
        })
    }
}

/// Settles its slot on `finish`, or as failed when dropped unfinished.
pub struct RequestTicket {
    slots: Slots,
    key: (Uuid, RequestKind),
    finished: bool,
}

impl RequestTicket {
    pub fn finish(mut self, ok: bool) {
        self.settle(ok);
    }

    /// Settles from a result and hands it back unchanged.
    pub fn finish_with<T, E>(self, result: std::result::Result<T, E>) -> std::result::Result<T, E> {
        self.finish(result.is_ok());
        result
    }

    fn settle(&mut self, ok: bool) {
        if self.finished {
            return;
        }
        self.finished = true;
        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        slots.insert(self.key, RequestState::Settled { ok });
    }
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        self.settle(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_pending_settled() {
        let tracker = RequestTracker::new();
        let user = Uuid::new_v4();
        assert_eq!(tracker.state(user, RequestKind::ScanCv), RequestState::Idle);

        let ticket = tracker.begin(user, RequestKind::ScanCv).unwrap();
        assert_eq!(tracker.state(user, RequestKind::ScanCv), RequestState::Pending);
        assert!(matches!(
            tracker.begin(user, RequestKind::ScanCv),
            Err(Error::Conflict(_))
        ));
        // Other kinds and users are independent.
        assert!(tracker.begin(user, RequestKind::SaveCv).is_ok());
        assert!(tracker.begin(Uuid::new_v4(), RequestKind::ScanCv).is_ok());

        ticket.finish(true);
        assert_eq!(
            tracker.state(user, RequestKind::ScanCv),
            RequestState::Settled { ok: true }
        );
        assert!(tracker.begin(user, RequestKind::ScanCv).is_ok());
    }

    #[test]
    fn dropped_ticket_settles_as_failure() {
        let tracker = RequestTracker::new();
        let user = Uuid::new_v4();
        {
            let _ticket = tracker.begin(user, RequestKind::MatchJob).unwrap();
        }
        assert_eq!(
            tracker.state(user, RequestKind::MatchJob),
            RequestState::Settled { ok: false }
        );
    }

    #[test]
    fn finish_with_passes_result_through() {
        let tracker = RequestTracker::new();
        let user = Uuid::new_v4();
        let ticket = tracker.begin(user, RequestKind::ExportPdf).unwrap();
        let out: std::result::Result<u8, &str> = ticket.finish_with(Err("boom"));
        assert_eq!(out, Err("boom"));
        assert_eq!(
            tracker.state(user, RequestKind::ExportPdf),
            RequestState::Settled { ok: false }
        );
    }

    #[test]
    fn kinds_parse_from_path() {
        assert_eq!(RequestKind::parse("save_cv"), Some(RequestKind::SaveCv));
        assert_eq!(RequestKind::parse("nope"), None);
    }
}
