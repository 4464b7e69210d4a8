use std::io::{self, Read, Write};

// PartialReader yields data for `fail_after_reads` reads then errors, simulating a
// connection dropped mid-transfer
pub struct PartialReader {
    data: Vec<u8>,
    pos: usize,
    fail_after_reads: usize,
    reads: usize,
}

impl PartialReader {
    pub fn new(data: &[u8], fail_after_reads: usize) -> Self {
        Self { data: data.to_vec(), pos: 0, fail_after_reads, reads: 0 }
    }
}

impl Read for PartialReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.reads >= self.fail_after_reads {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "simulated remote read failure",
            ));
        }
        self.reads += 1;
        if self.pos >= self.data.len() {
            return Ok(0);
        }
        let n = std::cmp::min(buf.len(), self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

// InterruptingReader returns ErrorKind::Interrupted `interrupts` times before
// handing out its data
pub struct InterruptingReader {
    inner: io::Cursor<Vec<u8>>,
    interrupts: usize,
}

impl InterruptingReader {
    pub fn new(data: &[u8], interrupts: usize) -> Self {
        Self { inner: io::Cursor::new(data.to_vec()), interrupts }
    }
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupts > 0 {
            self.interrupts -= 1;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        self.inner.read(buf)
    }
}

// FailingWriter accepts some writes then errors, simulating a full disk
pub struct FailingWriter {
    fail_after_writes: usize,
    writes: usize,
}

impl FailingWriter {
    pub fn new(fail_after_writes: usize) -> Self {
        Self { fail_after_writes, writes: 0 }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.writes >= self.fail_after_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated local write failure"));
        }
        self.writes += 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
