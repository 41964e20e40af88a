use super::{Codec, CommandResult};

/// Raw console text in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CxrfCodec;

impl Codec for CxrfCodec {
    fn encode(&self, cmd: &str) -> Vec<Vec<u8>> {
        vec![format!("{cmd}\r\n").into_bytes()]
    }

    fn decode(&self, answer: &str) -> CommandResult {
        CommandResult::new(0, vec![answer.trim().to_string()])
    }
}
