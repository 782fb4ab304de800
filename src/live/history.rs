use serde::Serialize;
use std::collections::VecDeque;
use utoipa::ToSchema;

/// One charting point derived from a telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct HistoryPoint {
    /// Sample time, Unix milliseconds.
    #[serde(rename = "t")]
    pub time_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
}

/// Bounded ring of the most recent history points, oldest evicted first.
#[derive(Debug)]
pub struct History {
    cap: usize,
    points: VecDeque<HistoryPoint>,
}

impl History {
    pub fn new(cap: usize) -> Self {
        History {
            cap,
            points: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, point: HistoryPoint) {
        if self.cap == 0 {
            return;
        }
        if self.points.len() == self.cap {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_vec(&self) -> Vec<HistoryPoint> {
        self.points.iter().copied().collect()
    }
}
