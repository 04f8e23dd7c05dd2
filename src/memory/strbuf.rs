use super::arena::Arena;
use std::fmt;
use std::ptr::NonNull;

/// Incremental text accumulation at the tail of an arena.
///
/// Every append allocates from the arena cursor, so the accumulated text is
/// one contiguous byte run starting where the builder was created. The
/// exclusive arena borrow guarantees nothing interleaves with it.
///
/// The text stays in the arena when the builder goes away; [`as_str`]
/// borrows it, and the start address is stable for the arena's lifetime.
///
/// [`as_str`]: Self::as_str
pub struct StringBuilder<'a> {
    arena: &'a mut Arena,
    start: usize,
    len: usize,
}

impl<'a> StringBuilder<'a> {
    pub fn new(arena: &'a mut Arena) -> Self {
        let start = arena.used();
        Self {
            arena,
            start,
            len: 0,
        }
    }

    /// Append a string slice. Fatal on arena exhaustion.
    pub fn append_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let dst = self.arena.alloc(bytes.len());
        // Safety: dst was just allocated with bytes.len() bytes of room.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.as_ptr(), bytes.len());
        }
        self.len += bytes.len();
    }

    /// Append a single character.
    pub fn append_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.append_str(c.encode_utf8(&mut buf));
    }

    /// Append a NUL byte. It counts towards [`len`](Self::len), for callers
    /// assembling C strings in place.
    pub fn append_null(&mut self) {
        self.append_char('\0');
    }

    /// Append formatted text.
    pub fn format(&mut self, args: fmt::Arguments<'_>) {
        // write_str never fails; a Display impl returning Err merely
        // truncates its own output.
        let _ = fmt::Write::write_fmt(self, args);
    }

    /// Bytes accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the first byte of the accumulated text.
    #[must_use]
    pub fn address(&self) -> NonNull<u8> {
        // Safety: start is at or below the cursor, inside the reservation.
        unsafe { NonNull::new_unchecked(self.arena.base().as_ptr().add(self.start)) }
    }

    /// The accumulated text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Safety: start..start+len was written from &str fragments and lies
        // below the arena cursor.
        unsafe {
            let bytes = std::slice::from_raw_parts(self.address().as_ptr(), self.len);
            std::str::from_utf8_unchecked(bytes)
        }
    }
}

impl fmt::Write for StringBuilder<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_str(s);
        Ok(())
    }
}
