use std::io;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Converts a legacy-charset byte stream to UTF-8 ahead of the CSV
/// reader. Stateful: partial multi-byte sequences stay buffered until
/// the next chunk (or EOF) completes them.
pub struct CharsetTranscoder {
    decoder: encoding_rs::Decoder,
}

impl CharsetTranscoder {
    pub fn new(encoding: &'static encoding_rs::Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder(),
        }
    }

    fn transcode(&mut self, src: &mut BytesMut, last: bool) -> Option<BytesMut> {
        if src.is_empty() {
            return None;
        }
        let worst = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len() * 3);
        let mut out = BytesMut::zeroed(worst);
        let (_result, read, written, _replaced) =
            self.decoder.decode_to_utf8(&src[..], &mut out, last);
        if last {
            src.clear();
        } else {
            let _ = src.split_to(read);
        }
        if written == 0 {
            // Need more input to make progress (mid-sequence).
            return None;
        }
        out.truncate(written);
        Some(out)
    }
}

impl Decoder for CharsetTranscoder {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.transcode(src, false))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.transcode(src, true))
    }
}
