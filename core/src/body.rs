//! Draining a response body into one contiguous buffer.
//!
//! The engine is asked how many bytes are available, the buffer grows by
//! that much, and the bytes are read in, until the engine reports zero.

use tracing::{trace, warn};

use crate::http::Degradation;
use crate::transport::RequestHandle;

/// Result of draining a body. `body` is `None` when nothing was received.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DrainedBody {
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) degradation: Option<Degradation>,
}

impl DrainedBody {
    fn finish(body: Vec<u8>, degradation: Option<Degradation>) -> Self {
        Self {
            body: (!body.is_empty()).then_some(body),
            degradation,
        }
    }
}

/// Read every remaining body byte from `request`.
///
/// A failing availability query or read ends the body early and keeps what
/// arrived before. If the buffer cannot grow, everything is dropped.
pub(crate) fn drain_body<R: RequestHandle>(request: &mut R) -> DrainedBody {
    let mut body = Vec::new();
    loop {
        let available = match request.data_available() {
            Ok(0) => break,
            Ok(available) => available,
            Err(err) => {
                warn!(error = %err, received = body.len(), "body availability query failed, keeping partial body");
                return DrainedBody::finish(body, Some(Degradation::BodyTruncated));
            }
        };

        // One spare byte for the terminator the C surface appends.
        let grown = match available.checked_add(1) {
            Some(extra) => body.try_reserve(extra).map_err(|err| err.to_string()),
            None => Err("requested size overflows".to_string()),
        };
        if let Err(err) = grown {
            warn!(error = %err, received = body.len(), available, "body buffer could not grow, discarding body");
            return DrainedBody {
                body: None,
                degradation: Some(Degradation::BodyDiscarded),
            };
        }

        let start = body.len();
        body.resize(start + available, 0);
        match request.read(&mut body[start..]) {
            Ok(0) => {
                body.truncate(start);
                break;
            }
            Ok(read) => {
                body.truncate(start + read);
                trace!(read, total = body.len(), "body chunk");
            }
            Err(err) => {
                body.truncate(start);
                warn!(error = %err, received = body.len(), "body read failed, keeping partial body");
                return DrainedBody::finish(body, Some(Degradation::BodyTruncated));
            }
        }
    }
    DrainedBody::finish(body, None)
}
