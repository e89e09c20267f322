//! Speech synthesis serialization
//!
//! One announcer actor owns the synthesis backend; requests are either
//! queued FIFO or interrupt whatever is currently being read aloud.

mod announcer;

pub use announcer::{
    AnnounceDone, AnnouncementOptions, AnnouncerTask, SpeakOutcome, SpeechAnnouncer, SpeechRequest,
};

#[cfg(test)]
pub(crate) use announcer::AnnouncerMsg;
