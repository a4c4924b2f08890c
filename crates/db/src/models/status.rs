//! Job status ids, matching the rows seeded into `video_statuses`.

/// `SMALLINT` status id as stored in `videos.status_id`.
pub type StatusId = i16;

/// Video job lifecycle. `Completed` and `Failed` are terminal; a job never
/// leaves a terminal state.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoStatus {
    Processing = 1,
    Completed = 2,
    Failed = 3,
}

impl VideoStatus {
    pub const ALL: [Self; 3] = [Self::Processing, Self::Completed, Self::Failed];

    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Name as seeded in `video_statuses` and reported to pollers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Processing
    }
}

impl From<VideoStatus> for StatusId {
    fn from(status: VideoStatus) -> Self {
        status.id()
    }
}
