use super::{checksum_hex, parse_hex_u32, Codec, CommandResult, FrameFault};

/// Bytes of the command carried by the first write.
const HEAD_LEN: usize = 10;
/// Bytes per continuation write; the device drops longer bursts.
const CHUNK_LEN: usize = 15;

/// `C:<sum>:<cmd>` requests, `R|E:<sum>:<status> <code> [data..]` answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CxrCodec;

impl Codec for CxrCodec {
    fn encode(&self, cmd: &str) -> Vec<Vec<u8>> {
        let sum = checksum_hex(cmd);
        let bytes = cmd.as_bytes();
        if bytes.len() <= HEAD_LEN {
            return vec![format!("C:{sum}:{cmd}\r\n").into_bytes()];
        }

        let mut writes = Vec::new();
        let mut head = format!("C:{sum}:").into_bytes();
        head.extend_from_slice(&bytes[..HEAD_LEN]);
        writes.push(head);

        let mut rest = &bytes[HEAD_LEN..];
        while rest.len() > CHUNK_LEN {
            writes.push(rest[..CHUNK_LEN].to_vec());
            rest = &rest[CHUNK_LEN..];
        }
        let mut tail = rest.to_vec();
        tail.extend_from_slice(b"\r\n");
        writes.push(tail);
        writes
    }

    fn decode(&self, answer: &str) -> CommandResult {
        let parts: Vec<&str> = answer.trim().split(':').collect();
        let [magic, sum, payload] = parts[..] else {
            return CommandResult::fault(FrameFault::AnswerLength);
        };

        if magic != "R" && magic != "E" {
            return CommandResult::fault(FrameFault::Magic);
        }
        if sum != checksum_hex(payload) {
            return CommandResult::fault(FrameFault::Checksum);
        }

        let data: Vec<&str> = payload.split(' ').collect();
        let shape_ok = match magic {
            "R" => data.len() >= 2,
            _ => data.len() == 2,
        };
        if !shape_ok {
            return CommandResult::fault(FrameFault::DataLength);
        }

        let code = parse_hex_u32(data[1]);
        if data[0] != "OK" {
            return CommandResult::new(code, Vec::new());
        }
        CommandResult::new(code, data[2..].iter().map(|s| s.to_string()).collect())
    }
}
