//! Per-call buffer views.
//!
//! A [`StreamIo`] is what `set_buffers` produces: a borrowed input slice and
//! a borrowed output slice, each with a cursor. It lives for exactly one call
//! into a stream, so a session can never hold on to caller memory.

/// Input and output views for one streaming call.
#[derive(Debug)]
pub struct StreamIo<'a> {
    input: &'a [u8],
    output: &'a mut [u8],
    in_pos: usize,
    out_pos: usize,
}

impl<'a> StreamIo<'a> {
    /// Wrap the caller's buffers for one call.
    pub fn new(input: &'a [u8], output: &'a mut [u8]) -> Self {
        Self {
            input,
            output,
            in_pos: 0,
            out_pos: 0,
        }
    }

    /// Bytes of input not yet consumed.
    #[inline]
    pub fn input_remaining(&self) -> usize {
        self.input.len() - self.in_pos
    }

    /// Bytes of output space not yet written.
    #[inline]
    pub fn output_remaining(&self) -> usize {
        self.output.len() - self.out_pos
    }

    /// Input consumed so far in this call.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.in_pos
    }

    /// Output produced so far in this call.
    #[inline]
    pub fn produced(&self) -> usize {
        self.out_pos
    }

    /// Unconsumed input.
    #[inline]
    pub fn remaining_input(&self) -> &'a [u8] {
        let input = self.input;
        &input[self.in_pos..]
    }

    /// Consume up to `n` bytes of input and return them.
    pub fn take_input(&mut self, n: usize) -> &'a [u8] {
        let input = self.input;
        let n = n.min(input.len() - self.in_pos);
        let taken = &input[self.in_pos..self.in_pos + n];
        self.in_pos += n;
        taken
    }

    /// Copy as much of `data` as fits into the output. Returns the count.
    pub fn write_output(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.output_remaining());
        self.output[self.out_pos..self.out_pos + n].copy_from_slice(&data[..n]);
        self.out_pos += n;
        n
    }

    /// Output written so far in this call.
    pub fn written(&self) -> &[u8] {
        &self.output[..self.out_pos]
    }
}
