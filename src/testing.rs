//! In-memory platform used by unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::platform::{PlatformError, RequestId, SpeechPlatform, Utterance};
use crate::voice::Voice;

#[derive(Debug, Default)]
pub(crate) struct FakePlatform {
    pub voices: Vec<Voice>,
    pub spoken: Vec<Utterance>,
    pub cancelled: Vec<RequestId>,
    pub reject_next: Option<String>,
}

impl FakePlatform {
    pub fn shared(voices: Vec<Voice>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            voices,
            ..Default::default()
        }))
    }

    pub fn last_spoken(&self) -> Option<&Utterance> {
        self.spoken.last()
    }
}

impl SpeechPlatform for FakePlatform {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), PlatformError> {
        if let Some(reason) = self.reject_next.take() {
            return Err(PlatformError(reason));
        }
        self.spoken.push(utterance);
        Ok(())
    }

    fn cancel(&mut self, request: RequestId) {
        self.cancelled.push(request);
    }
}

pub(crate) fn english_voices() -> Vec<Voice> {
    vec![Voice::new("Samantha", "en-US", true)]
}
