//! Décodage en flux de payloads délimités par `\n` (NDJSON).
//!
//! Chunks may split a line, or a UTF-8 sequence, anywhere. Only the
//! unterminated remainder is buffered.

use serde_json::Value;

use crate::payload::Decoded;
use crate::registry::DecoderRegistry;

/// Default cap on the buffered remainder, in bytes.
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;

/// Décodeur incrémental.
///
/// # Example
/// ```
/// use ac_codec::registry::DecoderRegistry;
/// use ac_codec::stream::StreamDecoder;
///
/// let registry = DecoderRegistry::standard();
/// let mut stream = StreamDecoder::new(&registry);
/// let line = br##"{"type":"rle","data":[["#",1]],"metadata":{"width":1,"height":1}}"##;
/// assert!(stream.feed(&line[..10]).is_empty());
/// assert!(stream.feed(&line[10..]).is_empty());
/// let frames = stream.feed(b"\nnot json\n");
/// assert_eq!(frames.len(), 1);
/// assert_eq!(stream.skipped(), 1);
/// ```
#[derive(Debug)]
pub struct StreamDecoder<'r> {
    registry: &'r DecoderRegistry,
    buffer: Vec<u8>,
    max_buffer: usize,
    /// Dropping an oversized line until its terminator.
    discarding: bool,
    decoded: usize,
    skipped: usize,
}

impl<'r> StreamDecoder<'r> {
    /// Decoder with the default buffer cap.
    #[must_use]
    pub fn new(registry: &'r DecoderRegistry) -> Self {
        Self::with_max_buffer(registry, DEFAULT_MAX_BUFFER)
    }

    /// Decoder keeping at most `max_buffer` bytes of unterminated input.
    #[must_use]
    pub fn with_max_buffer(registry: &'r DecoderRegistry, max_buffer: usize) -> Self {
        Self {
            registry,
            buffer: Vec::new(),
            max_buffer: max_buffer.max(1),
            discarding: false,
            decoded: 0,
            skipped: 0,
        }
    }

    /// Feed a chunk; returns every payload completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        let mut out = Vec::new();
        let mut rest = chunk;
        while let Some(nl) = rest.iter().position(|&b| b == b'\n') {
            let (line, tail) = rest.split_at(nl);
            rest = &tail[1..];
            if self.discarding {
                self.discarding = false;
                continue;
            }
            self.buffer.extend_from_slice(line);
            let line = std::mem::take(&mut self.buffer);
            if let Some(decoded) = self.decode_line(&line) {
                out.push(decoded);
            }
        }

        if !self.discarding {
            self.buffer.extend_from_slice(rest);
            if self.buffer.len() > self.max_buffer {
                log::warn!(
                    "Flux : ligne de plus de {} octets abandonnée",
                    self.max_buffer
                );
                self.buffer.clear();
                self.discarding = true;
                self.skipped += 1;
            }
        }
        out
    }

    /// Decode a final unterminated payload, if any.
    pub fn finish(&mut self) -> Option<Decoded> {
        self.discarding = false;
        let line = std::mem::take(&mut self.buffer);
        let last = self.decode_line(&line);
        log::info!(
            "Flux terminé : {} payload(s) décodé(s), {} ignoré(s)",
            self.decoded,
            self.skipped
        );
        last
    }

    /// Lines skipped so far (malformed, undecodable, or oversized).
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Payloads decoded so far.
    #[must_use]
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Bytes currently buffered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<Decoded> {
        let text = match std::str::from_utf8(line) {
            Ok(text) => text.trim(),
            Err(e) => return self.skip(&format!("UTF-8 invalide ({e})")),
        };
        if text.is_empty() {
            return None;
        }
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return self.skip(&format!("JSON invalide ({e})")),
        };
        match self.registry.decode_value(&value) {
            Ok(decoded) => {
                self.decoded += 1;
                Some(decoded)
            }
            Err(e) => self.skip(&e.to_string()),
        }
    }

    fn skip(&mut self, reason: &str) -> Option<Decoded> {
        self.skipped += 1;
        log::warn!("Flux : ligne ignorée : {reason}");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_A: &str = r#"{"type":"ultraMinimal","data":{"愛":[0]},"metadata":{"width":2,"height":1}}"#;
    const FRAME_B: &str = r##"{"type":"rle","data":[["_",1],["#",1]],"metadata":{"width":2,"height":1}}"##;

    fn ndjson() -> Vec<u8> {
        format!("{FRAME_A}\n\n{{broken\n{FRAME_B}\r\n").into_bytes()
    }

    #[test]
    fn every_split_point_gives_the_same_frames() {
        let registry = DecoderRegistry::standard();
        let bytes = ndjson();
        for split in 0..=bytes.len() {
            let mut stream = StreamDecoder::new(&registry);
            let mut frames = stream.feed(&bytes[..split]);
            frames.extend(stream.feed(&bytes[split..]));
            assert!(stream.finish().is_none());
            let lines: Vec<Vec<String>> = frames.iter().map(Decoded::lines).collect();
            assert_eq!(lines, vec![vec!["愛 ".to_string()], vec![" #".to_string()]], "split {split}");
            assert_eq!(stream.skipped(), 1);
            assert_eq!(stream.decoded(), 2);
        }
    }

    #[test]
    fn byte_by_byte_feeding() {
        let registry = DecoderRegistry::standard();
        let mut stream = StreamDecoder::new(&registry);
        let frames: Vec<Decoded> = ndjson().iter().flat_map(|b| stream.feed(&[*b])).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn finish_decodes_unterminated_tail() {
        let registry = DecoderRegistry::standard();
        let mut stream = StreamDecoder::new(&registry);
        assert!(stream.feed(FRAME_B.as_bytes()).is_empty());
        assert_eq!(stream.finish().unwrap().lines(), vec![" #"]);
    }

    #[test]
    fn invalid_payload_is_skipped_not_fatal() {
        let registry = DecoderRegistry::standard();
        let mut stream = StreamDecoder::new(&registry);
        let input = format!(
            "{}\n{FRAME_B}\n",
            r#"{"type":"rle","data":[],"metadata":{"width":0,"height":1}}"#
        );
        let frames = stream.feed(input.as_bytes());
        assert_eq!(frames.len(), 1);
        assert_eq!(stream.skipped(), 1);
    }

    #[test]
    fn oversized_line_is_dropped_until_newline() {
        let registry = DecoderRegistry::standard();
        let mut stream = StreamDecoder::with_max_buffer(&registry, 16);
        assert!(stream.feed(&[b'x'; 20]).is_empty());
        assert_eq!(stream.pending(), 0);
        assert!(stream.feed(&[b'y'; 40]).is_empty());
        assert_eq!(stream.pending(), 0);
        assert!(stream.feed(b"zz\n").is_empty());
        assert_eq!(stream.skipped(), 1);
        let next = format!("{FRAME_B}\n");
        let mut stream = StreamDecoder::with_max_buffer(&registry, 16);
        assert_eq!(stream.feed(next.as_bytes()).len(), 1);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let registry = DecoderRegistry::standard();
        let mut stream = StreamDecoder::new(&registry);
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(FRAME_B.as_bytes());
        input.push(b'\n');
        assert_eq!(stream.feed(&input).len(), 1);
        assert_eq!(stream.skipped(), 1);
    }
}
