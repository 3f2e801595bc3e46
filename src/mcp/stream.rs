//! Turns a dispatch outcome into server-sent event frames
//!
//! A `tools/call` whose result is a sequence is emitted as one progress
//! notification per item followed by a terminal reply aggregating every item
//! under `items`. Anything else becomes exactly one reply frame.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::mcp::envelope::RequestContext;
use crate::mcp::rpc::{
    progress_notification, reply_failure, reply_result, wrap_tool_content, ProgressInfo,
};
use crate::mcp::server::TOOLS_CALL;
use crate::mcp::types::{ToolFailure, ToolOutput};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to encode stream item {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode response: {0}")]
    Response(#[source] serde_json::Error),
    #[error("event stream closed by the client")]
    Closed,
}

/// Destination for encoded frames. Frames handed over are considered flushed.
pub trait EventSink {
    fn send(&mut self, frame: Bytes) -> Result<(), StreamError>;
}

impl EventSink for Vec<Bytes> {
    fn send(&mut self, frame: Bytes) -> Result<(), StreamError> {
        self.push(frame);
        Ok(())
    }
}

/// What the dispatcher produced for one request.
#[derive(Debug)]
pub struct Outcome {
    pub result: Result<ToolOutput, ToolFailure>,
    /// Set when the call resolved to a raw tool.
    pub raw: bool,
}

pub fn sse_frame<T: Serialize>(message: &T) -> Result<Bytes, serde_json::Error> {
    let mut frame = b"data: ".to_vec();
    serde_json::to_writer(&mut frame, message)?;
    frame.extend_from_slice(b"\n\n");
    Ok(Bytes::from(frame))
}

/// Encodes `outcome` into `sink`. Returns the number of frames written.
///
/// Items are written strictly in order and the terminal reply is always last.
/// On failure, frames already handed to the sink stay written.
pub fn encode_outcome(
    context: &RequestContext,
    outcome: Outcome,
    sink: &mut dyn EventSink,
) -> Result<usize, StreamError> {
    let Outcome { result, raw } = outcome;
    let is_tool_call = context.method == TOOLS_CALL;

    let reply = match result {
        Ok(ToolOutput::Sequence(items)) if is_tool_call => {
            return encode_sequence(context, items, raw, sink);
        }
        Ok(output) if is_tool_call && !raw => {
            let content = wrap_tool_content(output.into_value()).map_err(StreamError::Response)?;
            reply_result(context.request_id, content)
        }
        Ok(output) => reply_result(context.request_id, output.into_value()),
        Err(failure) => reply_failure(context.request_id, failure),
    };

    sink.send(sse_frame(&reply).map_err(StreamError::Response)?)?;
    Ok(1)
}

fn encode_sequence(
    context: &RequestContext,
    items: Vec<Value>,
    raw: bool,
    sink: &mut dyn EventSink,
) -> Result<usize, StreamError> {
    let stream_id = context
        .stream_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let total = items.len();

    for (index, item) in items.iter().enumerate() {
        let content = if raw {
            item.clone()
        } else {
            wrap_tool_content(item.clone())
                .map_err(|source| StreamError::Item { index, source })?
        };
        let notification = progress_notification(
            &stream_id,
            content,
            ProgressInfo {
                token: context.progress_token.clone(),
                progress: index + 1,
                total,
            },
        );
        let frame =
            sse_frame(&notification).map_err(|source| StreamError::Item { index, source })?;
        sink.send(frame)?;
    }

    let aggregate = json!({ "items": items });
    let result = if raw {
        aggregate
    } else {
        wrap_tool_content(aggregate).map_err(StreamError::Response)?
    };
    let frame =
        sse_frame(&reply_result(context.request_id, result)).map_err(StreamError::Response)?;
    sink.send(frame)?;

    Ok(total + 1)
}
