use num_bigint::BigUint;

use super::{DerError, tag};

/**
    Forward-only DER reader over a borrowed buffer.

    Constructed elements are descended into with [`DerReader::enter`], which
    returns a new reader scoped to the element's contents; the parent reader
    has already moved past the whole element at that point.
*/
#[derive(Debug, Clone)]
pub struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /**
        Returns true once every element has been consumed.
    */
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /**
        Tag of the next element, without consuming it.
    */
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /**
        Read one complete element, returning its tag and contents.
    */
    pub fn read_element(&mut self) -> Result<(u8, &'a [u8]), DerError> {
        let tag = self.read_byte()?;
        if tag & 0x1F == 0x1F {
            return Err(DerError::UnsupportedTag(tag));
        }
        let len = self.read_length()?;
        let contents = self.read_bytes(len)?;
        Ok((tag, contents))
    }

    /**
        Read one element and check its tag.
    */
    pub fn read_tagged(&mut self, expected: u8) -> Result<&'a [u8], DerError> {
        let start = self.pos;
        let (actual, contents) = self.read_element()?;
        if actual != expected {
            self.pos = start;
            return Err(DerError::UnexpectedTag { expected, actual });
        }
        Ok(contents)
    }

    /**
        Step over the next element, whatever it is.
    */
    pub fn skip(&mut self) -> Result<(), DerError> {
        self.read_element().map(|_| ())
    }

    /**
        Descend into a constructed element with the given tag.
    */
    pub fn enter(&mut self, expected: u8) -> Result<DerReader<'a>, DerError> {
        self.read_tagged(expected).map(DerReader::new)
    }

    pub fn enter_sequence(&mut self) -> Result<DerReader<'a>, DerError> {
        self.enter(tag::SEQUENCE)
    }

    /**
        Read a non-negative INTEGER.
    */
    pub fn read_integer(&mut self) -> Result<BigUint, DerError> {
        let bytes = self.read_tagged(tag::INTEGER)?;
        match bytes.first() {
            None => Err(DerError::InvalidInteger),
            Some(&first) if first & 0x80 != 0 => Err(DerError::InvalidInteger),
            Some(_) => Ok(BigUint::from_bytes_be(bytes)),
        }
    }

    /**
        Read an OBJECT IDENTIFIER in dotted-decimal form.
    */
    pub fn read_oid(&mut self) -> Result<String, DerError> {
        let bytes = self.read_tagged(tag::OBJECT_IDENTIFIER)?;
        decode_oid(bytes)
    }

    /**
        Read a BIT STRING and return its octets with the unused-bits
        prefix stripped. Only octet-aligned strings are accepted.
    */
    pub fn read_bit_string(&mut self) -> Result<&'a [u8], DerError> {
        let bytes = self.read_tagged(tag::BIT_STRING)?;
        match bytes.split_first() {
            Some((0, rest)) => Ok(rest),
            _ => Err(DerError::InvalidBitString),
        }
    }

    pub fn read_octet_string(&mut self) -> Result<&'a [u8], DerError> {
        self.read_tagged(tag::OCTET_STRING)
    }

    pub fn read_null(&mut self) -> Result<(), DerError> {
        if self.read_tagged(tag::NULL)?.is_empty() {
            Ok(())
        } else {
            Err(DerError::InvalidLength)
        }
    }

    fn read_byte(&mut self) -> Result<u8, DerError> {
        let byte = *self.data.get(self.pos).ok_or(DerError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DerError> {
        let end = self.pos.checked_add(n).ok_or(DerError::InvalidLength)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(DerError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    /**
        Definite-length only. Long-form lengths must be minimal, as DER requires.
    */
    fn read_length(&mut self) -> Result<usize, DerError> {
        let first = self.read_byte()?;
        if first < 0x80 {
            return Ok(first as usize);
        }

        let count = (first & 0x7F) as usize;
        if count == 0 || count > size_of::<u32>() {
            return Err(DerError::InvalidLength);
        }

        let bytes = self.read_bytes(count)?;
        if bytes[0] == 0 {
            return Err(DerError::InvalidLength);
        }
        let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
        if len < 0x80 {
            return Err(DerError::InvalidLength);
        }
        Ok(len)
    }
}

fn decode_oid(bytes: &[u8]) -> Result<String, DerError> {
    if bytes.is_empty() || bytes[bytes.len() - 1] & 0x80 != 0 {
        return Err(DerError::InvalidObjectIdentifier);
    }

    let mut arcs: Vec<u64> = Vec::new();
    let mut value: u64 = 0;
    for &byte in bytes {
        if value > (u64::MAX >> 7) {
            return Err(DerError::InvalidObjectIdentifier);
        }
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            if arcs.is_empty() {
                // First subidentifier packs the first two arcs
                let (first, second) = match value {
                    0..40 => (0, value),
                    40..80 => (1, value - 40),
                    _ => (2, value - 80),
                };
                arcs.push(first);
                arcs.push(second);
            } else {
                arcs.push(value);
            }
            value = 0;
        }
    }

    let dotted: Vec<String> = arcs.iter().map(u64::to_string).collect();
    Ok(dotted.join("."))
}
