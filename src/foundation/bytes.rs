use crate::foundation::error::{CarError, CarResult};

/// Bounds-checked cursor over container bytes.
///
/// Every read names the structure being parsed so a short buffer reports which record was
/// truncated. BOM structures are big-endian, catalog structures little-endian; callers pick.
#[derive(Clone, Debug)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], what: &'static str) -> Self {
        Self { data, pos: 0, what }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        &data[self.pos..]
    }

    fn array<const N: usize>(&mut self) -> CarResult<[u8; N]> {
        let data: &'a [u8] = self.data;
        let head = *data[self.pos..]
            .first_chunk::<N>()
            .ok_or_else(|| self.short(N))?;
        self.pos += N;
        Ok(head)
    }

    pub(crate) fn take(&mut self, len: usize) -> CarResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.short(len));
        }
        let data: &'a [u8] = self.data;
        let out = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, len: usize) -> CarResult<()> {
        self.take(len).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> CarResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16_le(&mut self) -> CarResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u16_be(&mut self) -> CarResult<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub(crate) fn u32_le(&mut self) -> CarResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32_be(&mut self) -> CarResult<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub(crate) fn i32_le(&mut self) -> CarResult<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub(crate) fn f32_le(&mut self) -> CarResult<f32> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub(crate) fn f64_le(&mut self) -> CarResult<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Fixed-width, NUL-padded string field.
    pub(crate) fn fixed_str(&mut self, width: usize) -> CarResult<String> {
        let raw = self.take(width)?;
        Ok(c_string(raw))
    }

    fn short(&self, wanted: usize) -> CarError {
        CarError::invalid_format(format!(
            "{}: needs {wanted} bytes at offset {}, {} available",
            self.what,
            self.pos,
            self.remaining()
        ))
    }
}

/// Decode bytes up to the first NUL as lossy UTF-8.
pub(crate) fn c_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Four-character code as stored by the catalog writer (little-endian on disk).
pub(crate) const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/bytes.rs"]
mod tests;
