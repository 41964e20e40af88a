use super::{checksum_hex, parse_hex_u32, Codec, CommandResult, FrameFault};

/// Commands this long need the device primed with [`SETCMDLONG`].
pub const LONG_COMMAND_LEN: usize = 0x40;
pub const SETCMDLONG: &str = "SETCMDLONG FF FF";

/// `<cmd>:<sum>` requests; answers are one or more `<line>:<sum>` lines, the
/// last of which carries `<status> <code>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwCodec;

impl Codec for SwCodec {
    fn encode(&self, cmd: &str) -> Vec<Vec<u8>> {
        vec![format!("{cmd}:{}\r\n", checksum_hex(cmd)).into_bytes()]
    }

    fn prelude(&self, cmd: &str) -> Option<&'static str> {
        (cmd.len() >= LONG_COMMAND_LEN).then_some(SETCMDLONG)
    }

    fn decode(&self, answer: &str) -> CommandResult {
        let mut lines = Vec::new();
        for line in answer.trim().split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let Some((content, sum)) = line.split_once(':') else {
                return CommandResult::fault(FrameFault::AnswerLength);
            };
            if sum != checksum_hex(content) {
                return CommandResult::fault(FrameFault::Checksum);
            }
            lines.push(format!("{content}\n"));
        }

        let last = lines.last().map(|l| l.trim_end_matches('\n')).unwrap_or("");
        let ret: Vec<&str> = last.split(' ').collect();
        if ret.len() < 2 || !is_status_code(ret[1]) {
            return CommandResult::new(0, lines);
        }

        let code = parse_hex_u32(ret[1]);
        if lines.len() == 1 {
            return CommandResult::new(code, ret[2..].iter().map(|s| s.to_string()).collect());
        }
        let body = lines.len() - 1;
        lines.truncate(body);
        CommandResult::new(code, lines)
    }
}

fn is_status_code(token: &str) -> bool {
    token.len() == 8 && token.bytes().all(|b| b.is_ascii_hexdigit())
}
