use num_bigint::BigUint;
use zeroize::Zeroize;

use super::tag;

/**
    Append-only DER writer.

    Sequences are built by pushing onto a stack of open buffers; closing a
    sequence prefixes its contents with the tag and the final length.
*/
#[derive(Debug, Default)]
pub struct DerWriter {
    stack: Vec<Vec<u8>>,
    out: Vec<u8>,
}

impl DerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Open a SEQUENCE; everything written until the matching
        [`DerWriter::end_sequence`] becomes its contents.
    */
    pub fn begin_sequence(&mut self) -> &mut Self {
        self.stack.push(Vec::new());
        self
    }

    /**
        Close the innermost open SEQUENCE.

        # Panics

        Panics if no sequence is open.
    */
    pub fn end_sequence(&mut self) -> &mut Self {
        let mut contents = self
            .stack
            .pop()
            .expect("end_sequence called without a matching begin_sequence");
        self.write_element(tag::SEQUENCE, &contents);
        contents.zeroize();
        self
    }

    /**
        Write a non-negative INTEGER in minimal two's-complement form.
    */
    pub fn integer(&mut self, value: &BigUint) -> &mut Self {
        let mut bytes = value.to_bytes_be();
        if bytes.is_empty() {
            bytes.push(0);
        }
        if bytes[0] & 0x80 != 0 {
            bytes.insert(0, 0);
        }
        self.write_element(tag::INTEGER, &bytes);
        bytes.zeroize();
        self
    }

    pub fn null(&mut self) -> &mut Self {
        self.write_element(tag::NULL, &[]);
        self
    }

    /**
        Consume the writer and return the encoded bytes.

        # Panics

        Panics if a sequence is still open.
    */
    pub fn finish(self) -> Vec<u8> {
        assert!(self.stack.is_empty(), "unterminated DER sequence");
        self.out
    }

    fn write_element(&mut self, tag: u8, contents: &[u8]) {
        let target = self.stack.last_mut().unwrap_or(&mut self.out);
        target.push(tag);
        push_length(target, contents.len());
        target.extend_from_slice(contents);
    }
}

fn push_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}
