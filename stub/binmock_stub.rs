//! Binmock stub executable.
//!
//! Compiled once per mock with a plain `rustc` call, so it may only use the
//! standard library. The two constants below are substituted before
//! compilation; the binary needs no runtime configuration.
//!
//! Each run reports its arguments, environment and stdin lines to the
//! coordinator, then reproduces the scripted stdout, stderr and exit code.
//! A failed exchange aborts the process so it can never pass for a
//! successful call.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::process;

const IDENTIFIER: &str = "__BINMOCK_IDENTIFIER__";
const COORDINATOR_ADDR: &str = "__BINMOCK_COORDINATOR_ADDR__";
const INVOKE_PATH: &str = "/invoke";

#[derive(Debug, PartialEq)]
struct Reply {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

fn main() {
    match run() {
        Ok(reply) => {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(reply.stdout.as_bytes());
            let _ = stdout.flush();
            let mut stderr = io::stderr();
            let _ = stderr.write_all(reply.stderr.as_bytes());
            let _ = stderr.flush();
            process::exit(reply.exit_code);
        }
        Err(message) => {
            eprintln!("binmock stub {}: {}", IDENTIFIER, message);
            process::abort();
        }
    }
}

fn run() -> Result<Reply, String> {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let env: Vec<String> = std::env::vars_os()
        .map(|(key, value)| format!("{}={}", key.to_string_lossy(), value.to_string_lossy()))
        .collect();
    let stdin = read_stdin_lines()?;

    let body = encode_request(IDENTIFIER, &args, &env, &stdin);
    let raw = post(COORDINATOR_ADDR, INVOKE_PATH, &body)?;
    let payload = response_body(&raw)?;
    decode_reply(&payload)
}

fn read_stdin_lines() -> Result<Vec<String>, String> {
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .map_err(|e| format!("failed to read stdin: {}", e))?;
    Ok(split_lines(&String::from_utf8_lossy(&input)))
}

fn split_lines(input: &str) -> Vec<String> {
    input.lines().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Request encoding
// ---------------------------------------------------------------------------

fn encode_request(id: &str, args: &[String], env: &[String], stdin: &[String]) -> String {
    let mut out = String::from("{\"id\":");
    push_json_string(&mut out, id);
    out.push_str(",\"args\":");
    push_json_array(&mut out, args);
    out.push_str(",\"env\":");
    push_json_array(&mut out, env);
    out.push_str(",\"stdin\":");
    push_json_array(&mut out, stdin);
    out.push('}');
    out
}

fn push_json_array(out: &mut String, items: &[String]) {
    out.push('[');
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        push_json_string(out, item);
    }
    out.push(']');
}

fn push_json_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

// ---------------------------------------------------------------------------
// HTTP exchange
// ---------------------------------------------------------------------------

fn post(addr: &str, path: &str, body: &str) -> Result<Vec<u8>, String> {
    let mut stream = TcpStream::connect(addr)
        .map_err(|e| format!("failed to connect to coordinator at {}: {}", addr, e))?;
    let head = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        path,
        addr,
        body.len()
    );
    stream
        .write_all(head.as_bytes())
        .and_then(|_| stream.write_all(body.as_bytes()))
        .and_then(|_| stream.flush())
        .map_err(|e| format!("failed to send request: {}", e))?;

    let mut raw = Vec::new();
    stream
        .read_to_end(&mut raw)
        .map_err(|e| format!("failed to read response: {}", e))?;
    Ok(raw)
}

fn response_body(raw: &[u8]) -> Result<String, String> {
    let split = find_subslice(raw, b"\r\n\r\n").ok_or("malformed HTTP response")?;
    let head = String::from_utf8_lossy(&raw[..split]);
    let rest = &raw[split + 4..];

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    if status_line.split_whitespace().nth(1) != Some("200") {
        return Err(format!(
            "coordinator answered '{}': {}",
            status_line,
            String::from_utf8_lossy(rest)
        ));
    }

    let mut chunked = false;
    let mut content_length = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name == "transfer-encoding" && value.to_ascii_lowercase().contains("chunked") {
                chunked = true;
            } else if name == "content-length" {
                content_length = value.parse::<usize>().ok();
            }
        }
    }

    let body = if chunked {
        decode_chunked(rest)?
    } else {
        match content_length {
            Some(length) if length <= rest.len() => rest[..length].to_vec(),
            Some(_) => return Err("truncated response body".to_string()),
            None => rest.to_vec(),
        }
    };
    String::from_utf8(body).map_err(|e| format!("response is not UTF-8: {}", e))
}

fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>, String> {
    let mut body = Vec::new();
    loop {
        let line_end = find_subslice(data, b"\r\n").ok_or("malformed chunk header")?;
        let size_text = String::from_utf8_lossy(&data[..line_end]);
        let size_text = size_text.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_text, 16)
            .map_err(|_| format!("invalid chunk size '{}'", size_text))?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Ok(body);
        }
        if data.len() < size + 2 {
            return Err("truncated chunk".to_string());
        }
        body.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// Response decoding
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum JsonValue {
    Str(String),
    Int(i64),
    Other,
}

fn decode_reply(json: &str) -> Result<Reply, String> {
    let mut parser = JsonParser::new(json);
    let fields = parser.parse_object()?;

    let mut reply = Reply {
        stdout: String::new(),
        stderr: String::new(),
        exit_code: 0,
    };
    let mut saw_exit_code = false;
    for (key, value) in fields {
        match (key.as_str(), value) {
            ("stdout", JsonValue::Str(s)) => reply.stdout = s,
            ("stderr", JsonValue::Str(s)) => reply.stderr = s,
            ("exitCode", JsonValue::Int(code)) => {
                reply.exit_code =
                    i32::try_from(code).map_err(|_| format!("exit code {} out of range", code))?;
                saw_exit_code = true;
            }
            ("stdout", _) | ("stderr", _) | ("exitCode", _) => {
                return Err(format!("unexpected type for field '{}'", key));
            }
            _ => {}
        }
    }
    if !saw_exit_code {
        return Err("response has no exitCode".to_string());
    }
    Ok(reply)
}

struct JsonParser {
    chars: Vec<char>,
    pos: usize,
}

impl JsonParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\n' | '\r' | '\t')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        self.skip_whitespace();
        match self.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{}' but found '{}'", expected, c)),
            None => Err(format!("expected '{}' but input ended", expected)),
        }
    }

    fn parse_object(&mut self) -> Result<Vec<(String, JsonValue)>, String> {
        self.expect('{')?;
        let mut fields = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(fields);
        }
        loop {
            self.skip_whitespace();
            let key = self.parse_string()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            fields.push((key, value));
            self.skip_whitespace();
            match self.next() {
                Some(',') => continue,
                Some('}') => return Ok(fields),
                _ => return Err("malformed object".to_string()),
            }
        }
    }

    fn parse_value(&mut self) -> Result<JsonValue, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('"') => Ok(JsonValue::Str(self.parse_string()?)),
            Some('{') => {
                self.parse_object()?;
                Ok(JsonValue::Other)
            }
            Some('[') => {
                self.skip_array()?;
                Ok(JsonValue::Other)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(_) => {
                for literal in ["true", "false", "null"] {
                    if self.consume_literal(literal) {
                        return Ok(JsonValue::Other);
                    }
                }
                Err("unexpected token".to_string())
            }
            None => Err("input ended inside a value".to_string()),
        }
    }

    fn consume_literal(&mut self, literal: &str) -> bool {
        let end = self.pos + literal.len();
        if end <= self.chars.len()
            && self.chars[self.pos..end].iter().copied().eq(literal.chars())
        {
            self.pos = end;
            return true;
        }
        false
    }

    fn skip_array(&mut self) -> Result<(), String> {
        self.expect('[')?;
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(());
        }
        loop {
            self.parse_value()?;
            self.skip_whitespace();
            match self.next() {
                Some(',') => continue,
                Some(']') => return Ok(()),
                _ => return Err("malformed array".to_string()),
            }
        }
    }

    fn parse_number(&mut self) -> Result<JsonValue, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || "-+.eE".contains(c)) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        match text.parse::<i64>() {
            Ok(value) => Ok(JsonValue::Int(value)),
            Err(_) if text.parse::<f64>().is_ok() => Ok(JsonValue::Other),
            Err(_) => Err(format!("invalid number '{}'", text)),
        }
    }

    fn parse_string(&mut self) -> Result<String, String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.next() {
                Some('"') => return Ok(out),
                Some('\\') => match self.next() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('/') => out.push('/'),
                    Some('b') => out.push('\u{8}'),
                    Some('f') => out.push('\u{c}'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('u') => out.push(self.parse_unicode_escape()?),
                    _ => return Err("invalid escape sequence".to_string()),
                },
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn parse_hex4(&mut self) -> Result<u32, String> {
        let end = self.pos + 4;
        if end > self.chars.len() {
            return Err("truncated unicode escape".to_string());
        }
        let text: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&text, 16).map_err(|_| format!("invalid unicode escape '{}'", text))
    }

    fn parse_unicode_escape(&mut self) -> Result<char, String> {
        let first = self.parse_hex4()?;
        let code = if (0xD800..0xDC00).contains(&first) {
            if self.next() != Some('\\') || self.next() != Some('u') {
                return Err("unpaired surrogate".to_string());
            }
            let second = self.parse_hex4()?;
            if !(0xDC00..0xE000).contains(&second) {
                return Err("unpaired surrogate".to_string());
            }
            0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
        } else {
            first
        };
        char::from_u32(code).ok_or_else(|| format!("invalid code point {:x}", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_request() {
        let json = encode_request(
            "mock-id",
            &strings(&["foo", "quote\"d"]),
            &strings(&["foo=bar"]),
            &strings(&["tab\there"]),
        );
        assert_eq!(
            json,
            r#"{"id":"mock-id","args":["foo","quote\"d"],"env":["foo=bar"],"stdin":["tab\there"]}"#
        );
    }

    #[test]
    fn test_encode_escapes_control_characters() {
        let mut out = String::new();
        push_json_string(&mut out, "a\u{1}b\\");
        assert_eq!(out, r#""a\u0001b\\""#);
    }

    #[test]
    fn test_decode_reply() {
        let json = r#"{"stdout":"out é\n","stderr":"err \"x\"","exitCode":42}"#;
        let reply = decode_reply(json).unwrap();
        assert_eq!(
            reply,
            Reply {
                stdout: "out \u{e9}\n".to_string(),
                stderr: "err \"x\"".to_string(),
                exit_code: 42,
            }
        );
    }

    #[test]
    fn test_decode_reply_surrogate_pair() {
        let reply = decode_reply(r#"{"exitCode":0,"stdout":"\ud83d\ude00"}"#).unwrap();
        assert_eq!(reply.stdout, "\u{1F600}");
    }

    #[test]
    fn test_decode_reply_requires_exit_code() {
        assert!(decode_reply(r#"{"stdout":"x"}"#).is_err());
        let reply = decode_reply(r#"{"exitCode":3,"extra":[1,{"a":null}]}"#).unwrap();
        assert_eq!(reply.exit_code, 3);
        assert_eq!(reply.stdout, "");
    }

    #[test]
    fn test_response_body_content_length() {
        let raw = b"HTTP/1.1 200 OK\r\ncontent-length: 14\r\n\r\n{\"exitCode\":0}";
        assert_eq!(response_body(raw).unwrap(), "{\"exitCode\":0}");
    }

    #[test]
    fn test_response_body_chunked() {
        let raw = b"HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        assert_eq!(response_body(raw).unwrap(), "hello world");
    }

    #[test]
    fn test_response_body_rejects_non_200() {
        let raw = b"HTTP/1.1 404 Not Found\r\ncontent-length: 4\r\n\r\nnope";
        let err = response_body(raw).unwrap_err();
        assert!(err.contains("404"), "{}", err);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("stdin\nnextStdin\n"), strings(&["stdin", "nextStdin"]));
        assert_eq!(split_lines("a\r\nb"), strings(&["a", "b"]));
        assert!(split_lines("").is_empty());
    }
}
