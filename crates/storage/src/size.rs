//! Serialized size estimation.

use std::io;

use serde::Serialize;

/// Sink that only counts the bytes written to it.
#[derive(Debug, Default)]
struct ByteCounter(u64);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Length in bytes of the compact JSON encoding of `value`, computed without
/// building the encoded string.
pub fn serialized_size<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<u64> {
    let mut counter = ByteCounter::default();
    serde_json::to_writer(&mut counter, value)?;
    Ok(counter.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader_types::Chapter;

    #[test]
    fn matches_encoded_length() {
        let chapters = vec![Chapter::new("第一章", "正文\n\"quoted\""), Chapter::new("b", "")];
        let encoded = serde_json::to_vec(&chapters).unwrap();
        assert_eq!(serialized_size(&chapters).unwrap(), encoded.len() as u64);
    }

    #[test]
    fn empty_list() {
        let chapters: Vec<Chapter> = Vec::new();
        assert_eq!(serialized_size(&chapters).unwrap(), 2);
    }
}
