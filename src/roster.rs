/// Media kind carried by a publish or unpublish event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// What happened to a remote participant's published media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterEventKind {
    Published(MediaKind),
    Unpublished(MediaKind),
    Left,
}

/// One entry in the ordered event log driving the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEvent {
    /// Vendor-assigned remote user id
    pub uid: u64,
    pub kind: RosterEventKind,
}

/// A remote participant currently publishing media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub uid: u64,
    pub has_audio: bool,
    pub has_video: bool,
}

/// Locally tracked set of remote participants in a session.
///
/// Mutated exclusively by replaying transport events through `apply`, in the
/// order they arrived. Only video publishers get an entry: an audio publish
/// updates the flag on an existing entry (playback is handled at the
/// transport boundary) but does not create one. An entry is removed when its
/// video track is unpublished or the participant leaves. No historical
/// roster is retained.
#[derive(Debug, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single transport event
    /// Idempotent for repeated publish events from the same uid
    pub fn apply(&mut self, event: RosterEvent) {
        match event.kind {
            RosterEventKind::Published(MediaKind::Video) => {
                match self.participants.iter_mut().find(|p| p.uid == event.uid) {
                    Some(p) => p.has_video = true,
                    None => self.participants.push(Participant {
                        uid: event.uid,
                        has_audio: false,
                        has_video: true,
                    }),
                }
            }
            RosterEventKind::Published(MediaKind::Audio) => {
                if let Some(p) = self.participants.iter_mut().find(|p| p.uid == event.uid) {
                    p.has_audio = true;
                }
            }
            RosterEventKind::Unpublished(MediaKind::Video) | RosterEventKind::Left => {
                self.participants.retain(|p| p.uid != event.uid);
            }
            RosterEventKind::Unpublished(MediaKind::Audio) => {
                if let Some(p) = self.participants.iter_mut().find(|p| p.uid == event.uid) {
                    p.has_audio = false;
                }
            }
        }
    }

    /// Replay an ordered batch of events
    pub fn replay<I: IntoIterator<Item = RosterEvent>>(&mut self, events: I) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn contains(&self, uid: u64) -> bool {
        self.participants.iter().any(|p| p.uid == uid)
    }

    pub fn get(&self, uid: u64) -> Option<&Participant> {
        self.participants.iter().find(|p| p.uid == uid)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Drop every entry (called when leaving a call)
    pub fn clear(&mut self) {
        self.participants.clear();
    }
}
